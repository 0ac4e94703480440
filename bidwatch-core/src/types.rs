//! Domain types for the bidder parameter watcher.
//!
//! A [`ParameterSnapshot`] is what one poll of the remote source returned, a
//! [`Baseline`] is what was last applied to disk, and an [`UpdateSet`] is the
//! difference that still has to be written.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::detect::format_decimal;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// The stable textual identifier a parameter is stored under in the config
/// file (an environment variable name such as `BID_SMALL_AMOUNT`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamKey(pub String);

impl ParamKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ParamKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ParamKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A primitive parameter value.
///
/// Equality is exact, including for decimals: `0.1` and `0.1000000001` are
/// different values even though both render as `0.1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Decimal(f64),
    Integer(i64),
}

impl ParamValue {
    /// The textual form written to disk and compared during confirmation.
    pub fn canonical(&self) -> String {
        match self {
            ParamValue::Decimal(v) => format_decimal(*v),
            ParamValue::Integer(v) => v.to_string(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

// ---------------------------------------------------------------------------
// Reference parameter table
// ---------------------------------------------------------------------------

/// Config key for the small-bid amount.
pub const BID_SMALL_AMOUNT: &str = "BID_SMALL_AMOUNT";
/// Config key for the large-bid amount.
pub const BID_LARGE_AMOUNT: &str = "BID_LARGE_AMOUNT";
/// Config key for the prover concurrency cap.
pub const BIDDER_MAX_CONCURRENT_PROOFS: &str = "BIDDER_MAX_CONCURRENT_PROOFS";

/// JSON body served by the remote parameter endpoint.
///
/// Every field is optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemotePayload {
    #[serde(default)]
    pub small_bid: Option<f64>,
    #[serde(default)]
    pub large_bid: Option<f64>,
    #[serde(default)]
    pub max_concurrency: Option<i64>,
}

impl From<RemotePayload> for ParameterSnapshot {
    fn from(payload: RemotePayload) -> Self {
        let mut snapshot = ParameterSnapshot::new();
        if let Some(v) = payload.small_bid {
            snapshot.insert(BID_SMALL_AMOUNT, ParamValue::Decimal(v));
        }
        if let Some(v) = payload.large_bid {
            snapshot.insert(BID_LARGE_AMOUNT, ParamValue::Decimal(v));
        }
        if let Some(v) = payload.max_concurrency {
            snapshot.insert(BIDDER_MAX_CONCURRENT_PROOFS, ParamValue::Integer(v));
        }
        snapshot
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One poll's worth of parameter values. Parameters the source did not
/// report are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSnapshot {
    values: BTreeMap<ParamKey, ParamValue>,
}

impl ParameterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and fixed sources.
    pub fn with(mut self, key: impl Into<ParamKey>, value: ParamValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<ParamKey>, value: ParamValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<ParamValue> {
        self.values.get(&ParamKey::from(key)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &ParamValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Baseline
// ---------------------------------------------------------------------------

/// Last-applied parameter values, held in memory only.
///
/// A key's presence in the map is its "has been set" flag. `initialized`
/// flips to `true` after the first confirmed write and never goes back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    initialized: bool,
    values: BTreeMap<ParamKey, ParamValue>,
}

impl Baseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn get(&self, key: &ParamKey) -> Option<ParamValue> {
        self.values.get(key).copied()
    }

    /// Record every parameter present in `snapshot` as applied.
    ///
    /// Parameters absent from the snapshot keep their previous entry.
    pub fn advance(&mut self, snapshot: &ParameterSnapshot) {
        for (key, value) in snapshot.iter() {
            self.values.insert(key.clone(), *value);
        }
        self.initialized = true;
    }
}

// ---------------------------------------------------------------------------
// UpdateSet
// ---------------------------------------------------------------------------

/// Keys that must be written this cycle, mapped to their canonical values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSet {
    entries: BTreeMap<ParamKey, String>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<ParamKey>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&ParamKey::from(key)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn keys(&self) -> Vec<ParamKey> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for UpdateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
