//! Line-preserving parser and editor for `[export ]KEY=VALUE` files.
//!
//! Every input line becomes a [`Line::Data`] entry (indexed by key), a
//! [`Line::Opaque`] line (comment, blank, or anything unparseable), or a
//! [`Line::Binary`] line that is not valid UTF-8. Opaque and binary lines are
//! written back verbatim, and each line keeps its own `\n` or `\r\n`
//! terminator. Serializing an untouched document reproduces the input byte
//! for byte, apart from a missing final newline.

use std::fmt;

use bidwatch_core::UpdateSet;

/// A single `[export ]KEY=VALUE` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Source text up to and including the first `=`.
    head: String,
    key: String,
    exported: bool,
    /// Everything after the first `=`, untrimmed, without the terminator.
    value: String,
    /// `"\n"` or `"\r\n"`.
    eol: &'static str,
}

impl Entry {
    /// A plain `key=value` line, as appended for keys not yet in the file.
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            head: format!("{key}="),
            key: key.to_string(),
            exported: false,
            value: value.to_string(),
            eol: "\n",
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }
}

/// One line of a key=value document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Data(Entry),
    /// Line text without its `\n`; a `\r` before it stays in the text.
    Opaque(String),
    /// A line that is not valid UTF-8, without its `\n`.
    Binary(Vec<u8>),
}

impl Line {
    /// Parse one line with its trailing `\n` already removed.
    fn parse_bytes(raw: &[u8]) -> Self {
        match std::str::from_utf8(raw) {
            Ok(text) => Self::parse(text),
            Err(_) => Line::Binary(raw.to_vec()),
        }
    }

    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Line::Opaque(raw.to_string());
        }

        let (content, eol) = match raw.strip_suffix('\r') {
            Some(content) => (content, "\r\n"),
            None => (raw, "\n"),
        };

        let start = content.trim_start();
        let (exported, body) = match strip_export(start) {
            Some(rest) => (true, rest),
            None => (false, start),
        };

        let Some(eq) = body.find('=') else {
            return Line::Opaque(raw.to_string());
        };
        let key = body[..eq].trim();
        if key.is_empty() {
            return Line::Opaque(raw.to_string());
        }

        // `body` is a suffix of `content`, so this is the `=` position in `content`.
        let split = content.len() - body.len() + eq;
        Line::Data(Entry {
            head: content[..=split].to_string(),
            key: key.to_string(),
            exported,
            value: content[split + 1..].to_string(),
            eol,
        })
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Line::Data(entry) => {
                out.extend_from_slice(entry.head.as_bytes());
                out.extend_from_slice(entry.value.as_bytes());
                out.extend_from_slice(entry.eol.as_bytes());
            }
            Line::Opaque(raw) => {
                out.extend_from_slice(raw.as_bytes());
                out.push(b'\n');
            }
            Line::Binary(raw) => {
                out.extend_from_slice(raw);
                out.push(b'\n');
            }
        }
    }
}

/// Renders the line with its terminator. Binary lines are shown lossily.
impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

/// `export` followed by at least one space or tab.
fn strip_export(s: &str) -> Option<&str> {
    let rest = s.strip_prefix("export")?;
    if rest.starts_with([' ', '\t']) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// An ordered, round-trippable key=value document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueDocument {
    lines: Vec<Line>,
}

impl KeyValueDocument {
    /// Parse `text`. Never fails: anything that is not an assignment is kept
    /// as an opaque line.
    pub fn parse(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Parse raw file content. Lines that are not valid UTF-8 become
    /// [`Line::Binary`] and are never matched against keys.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            lines: bytes
                .split_inclusive(|b| *b == b'\n')
                .map(|line| Line::parse_bytes(line.strip_suffix(b"\n").unwrap_or(line)))
                .collect(),
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Value of `key`. When a key is assigned more than once the last
    /// assignment wins, matching how env-file consumers read it.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries()
            .filter(|entry| entry.key == key)
            .last()
            .map(Entry::value)
    }

    /// Replace the value of every data line for `key`, keeping its export
    /// marker, key text and line terminator. Appends `key=value` if no line
    /// matches.
    ///
    /// Returns `true` if an existing line was updated.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let mut replaced = false;
        for line in &mut self.lines {
            if let Line::Data(entry) = line {
                if entry.key == key {
                    entry.value = value.to_string();
                    replaced = true;
                }
            }
        }
        if !replaced {
            self.lines.push(Line::Data(Entry::new(key, value)));
        }
        replaced
    }

    /// Apply every key of `updates` independently.
    pub fn apply(&mut self, updates: &UpdateSet) {
        for (key, value) in updates.iter() {
            let replaced = self.set(key.as_str(), value);
            tracing::debug!(
                "{} {key}={value}",
                if replaced { "replaced" } else { "appended" }
            );
        }
    }

    /// Render the document exactly as it would be written. The last line
    /// always ends in a terminator; an empty document renders as nothing.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for line in &self.lines {
            line.write_to(&mut out);
        }
        out
    }

    /// [`Self::to_bytes`] as text. Lossy only for [`Line::Binary`] lines.
    pub fn serialize(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Data(entry) => Some(entry),
            Line::Opaque(_) | Line::Binary(_) => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
