//! Event records.
//!
//! The event source itself (files, streaming, iteration) lives outside this
//! crate. The matcher only needs three things from an event: the per-path
//! trigger decisions, the run number, and the trigger-object collection.
//! [`EventView`] names exactly that contract; [`Event`] is a plain in-memory
//! implementation that also carries the reconstructed candidates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::object::{RecoObjects, TriggerObject};

/// Whether a sample is recorded data or simulation.
///
/// Chosen once per sample; it selects the combination catalog and decides
/// whether run ranges apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Recorded collision data (run-stamped).
    Data,
    /// Simulation.
    Mc,
}

impl DataKind {
    /// Parse the key used in definition documents.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "data" => Some(Self::Data),
            "mc" => Some(Self::Mc),
            _ => None,
        }
    }

    /// The key used in definition documents.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Mc => "mc",
        }
    }

    /// True for recorded data.
    #[must_use]
    pub const fn is_data(self) -> bool {
        matches!(self, Self::Data)
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for DataKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("unknown data kind '{s}' (expected 'data' or 'mc')"))
    }
}

/// Event fields consumed by the matcher.
pub trait EventView {
    /// Run number (meaningful for data only).
    fn run(&self) -> u32;

    /// Did the named trigger path fire? Unknown paths did not fire.
    fn path_fired(&self, path: &str) -> bool;

    /// Trigger objects of this event.
    fn trigger_objects(&self) -> &[TriggerObject];
}

/// Remove a trailing `_v<N>` version label from a path name.
///
/// ```
/// use hlt_match::core::strip_version_label;
///
/// assert_eq!(strip_version_label("HLT_IsoMu24_v4"), "HLT_IsoMu24");
/// assert_eq!(strip_version_label("HLT_IsoMu24"), "HLT_IsoMu24");
/// assert_eq!(strip_version_label("HLT_Foo_v"), "HLT_Foo_v");
/// ```
#[must_use]
pub fn strip_version_label(path: &str) -> &str {
    if let Some(pos) = path.rfind("_v") {
        let suffix = &path[pos + 2..];
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            return &path[..pos];
        }
    }
    path
}

/// An in-memory event record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Run number.
    #[serde(default)]
    pub run: u32,

    /// Trigger decision per path name, without version labels.
    #[serde(default, deserialize_with = "deserialize_path_decisions")]
    pub paths: FxHashMap<String, bool>,

    /// Trigger objects.
    #[serde(default)]
    pub trigger_objects: Vec<TriggerObject>,

    /// Reconstructed candidates, flattened into the record.
    #[serde(flatten)]
    pub reco: RecoObjects,
}

/// Read path decisions, folding `HLT_X_vN` into `HLT_X`.
fn deserialize_path_decisions<'de, D>(deserializer: D) -> Result<FxHashMap<String, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let recorded = FxHashMap::<String, bool>::deserialize(deserializer)?;
    let mut paths = FxHashMap::default();
    for (path, fired) in recorded {
        *paths
            .entry(strip_version_label(&path).to_string())
            .or_insert(false) |= fired;
    }
    Ok(paths)
}

impl Event {
    /// Create an empty event in the given run.
    pub fn new(run: u32) -> Self {
        Self {
            run,
            ..Self::default()
        }
    }

    /// Record a path decision (builder pattern).
    ///
    /// Version labels are stripped so `HLT_X_v3` answers for `HLT_X`.
    #[must_use]
    pub fn with_path(mut self, path: &str, fired: bool) -> Self {
        self.set_path(path, fired);
        self
    }

    /// Add a trigger object (builder pattern).
    #[must_use]
    pub fn with_trigger_object(mut self, object: TriggerObject) -> Self {
        self.trigger_objects.push(object);
        self
    }

    /// Set the reconstructed candidates (builder pattern).
    #[must_use]
    pub fn with_reco(mut self, reco: RecoObjects) -> Self {
        self.reco = reco;
        self
    }

    /// Record a path decision.
    ///
    /// Several versions of one path OR together.
    pub fn set_path(&mut self, path: &str, fired: bool) {
        let entry = self
            .paths
            .entry(strip_version_label(path).to_string())
            .or_insert(false);
        *entry |= fired;
    }

    /// Strip version labels from all recorded path names.
    ///
    /// Only needed after inserting into `paths` directly; deserialization
    /// and [`Event::set_path`] already strip them.
    pub fn normalize_path_names(&mut self) {
        if !self.paths.keys().any(|p| strip_version_label(p) != p) {
            return;
        }
        let paths = std::mem::take(&mut self.paths);
        for (path, fired) in paths {
            self.set_path(&path, fired);
        }
    }
}

impl EventView for Event {
    fn run(&self) -> u32 {
        self.run
    }

    fn path_fired(&self, path: &str) -> bool {
        self.paths.get(path).copied().unwrap_or(false)
    }

    fn trigger_objects(&self) -> &[TriggerObject] {
        &self.trigger_objects
    }
}
