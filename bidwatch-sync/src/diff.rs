//! Dry-run unified diff support for `bidwatch diff`.

use std::path::Path;

use similar::TextDiff;

use bidwatch_core::UpdateSet;

use crate::{envfile::KeyValueDocument, store::read_existing, SyncError};

/// Render what applying `updates` to `path` would change, as a unified diff.
///
/// Returns `None` when the file would be left byte-identical. No files are
/// written.
pub fn preview(path: &Path, updates: &UpdateSet) -> Result<Option<String>, SyncError> {
    let existing = read_existing(path)?.unwrap_or_default();
    let mut doc = KeyValueDocument::from_bytes(&existing);
    doc.apply(updates);
    let rendered = doc.to_bytes();

    if existing == rendered {
        return Ok(None);
    }

    let existing = String::from_utf8_lossy(&existing);
    let rendered = String::from_utf8_lossy(&rendered);

    let old_header = format!("a/{}", path.display());
    let new_header = format!("b/{}", path.display());
    let unified = TextDiff::from_lines(&*existing, &*rendered)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();
    Ok(Some(unified))
}
