//! Trigger combinations (channels).
//!
//! A combination is a named OR of trigger paths, such as all the paths an
//! analysis accepts for the muon-tau channel in one year. Separate
//! catalogs exist for data and simulation because a path retired mid-year
//! in data can still be the right choice for simulation.
//!
//! The paths of a channel need not share one leg structure. A single-muon
//! path can sit next to muon-tau cross triggers: it then serves the muon
//! slot and contributes nothing to the tau slot. Combinations whose paths
//! cannot be folded into one [`ChannelShape`] are rejected at load.

use std::collections::BTreeMap;

use crate::core::{DataKind, EventView, ObjectKind};
use crate::error::{Result, TriggerError};

use super::paths::{LegIndex, PathKind, TriggerPath, TriggerPathCatalog};

/// Leg structure of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelShape {
    /// No paths: fires for every event and has no legs.
    Empty,
    /// One object of a kind.
    Single(ObjectKind),
    /// Two distinct objects of one kind.
    Double(ObjectKind),
    /// One object of each kind, lighter kind first.
    Cross(ObjectKind, ObjectKind),
}

impl ChannelShape {
    /// Shape of a single path.
    #[must_use]
    pub fn of_path(path: &TriggerPath) -> Self {
        let first = path.leg(LegIndex::First).object;
        match path.kind {
            PathKind::Single => Self::Single(first),
            PathKind::Double => Self::Double(first),
            PathKind::Cross => Self::Cross(first, path.leg(LegIndex::Second).object),
        }
    }

    /// Derive the shape of a combination by folding its paths.
    ///
    /// Paths missing from `paths` are skipped. Fails with
    /// [`TriggerError::Schema`] if two paths cannot be merged (see
    /// [`ChannelShape::merge`]).
    pub fn of(combination: &TriggerCombination, paths: &TriggerPathCatalog) -> Result<Self> {
        let mut shape = Self::Empty;
        let mut previous: Option<&str> = None;
        for path in combination.paths.iter().filter_map(|name| paths.get(name)) {
            let this = Self::of_path(path);
            shape = shape.merge(this).ok_or_else(|| {
                TriggerError::schema(format!(
                    "channel '{}' mixes {shape} path '{}' with {this} path '{}'",
                    combination.name,
                    previous.unwrap_or_default(),
                    path.name
                ))
            })?;
            previous = Some(&path.name);
        }
        Ok(shape)
    }

    /// Combine the shapes of two paths of one channel.
    ///
    /// A single-object shape folds into a double or cross shape that has a
    /// leg of its kind. Any other pair of differing shapes has no common
    /// leg layout.
    ///
    /// ```
    /// use hlt_match::core::ObjectKind::{Muon, Tau};
    /// use hlt_match::definitions::ChannelShape::*;
    ///
    /// assert_eq!(Single(Muon).merge(Cross(Muon, Tau)), Some(Cross(Muon, Tau)));
    /// assert_eq!(Double(Tau).merge(Single(Tau)), Some(Double(Tau)));
    /// assert_eq!(Single(Muon).merge(Single(Tau)), None);
    /// ```
    #[must_use]
    pub fn merge(self, other: Self) -> Option<Self> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Self::Empty, s) | (s, Self::Empty) => Some(s),
            (Self::Single(k), Self::Double(d)) | (Self::Double(d), Self::Single(k)) if k == d => {
                Some(Self::Double(d))
            }
            (Self::Single(k), Self::Cross(a, b)) | (Self::Cross(a, b), Self::Single(k))
                if k == a || k == b =>
            {
                Some(Self::Cross(a, b))
            }
            _ => None,
        }
    }

    /// Object kind of a leg slot, if the shape has one.
    #[must_use]
    pub const fn leg_kind(self, index: LegIndex) -> Option<ObjectKind> {
        match (self, index) {
            (Self::Empty, _) => None,
            (Self::Single(k) | Self::Double(k), _) => Some(k),
            (Self::Cross(k, _), LegIndex::First) => Some(k),
            (Self::Cross(_, k), LegIndex::Second) => Some(k),
        }
    }

    /// Distinct legs to report: 0, 1 or 2.
    #[must_use]
    pub const fn leg_count(self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) | Self::Double(_) => 1,
            Self::Cross(..) => 2,
        }
    }

    /// Does the channel need a candidate pair?
    #[must_use]
    pub const fn is_pair(self) -> bool {
        matches!(self, Self::Double(_) | Self::Cross(..))
    }
}

impl std::fmt::Display for ChannelShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Single(k) => write!(f, "single-{k}"),
            Self::Double(k) => write!(f, "double-{k}"),
            Self::Cross(a, b) => write!(f, "{a}-{b} cross"),
        }
    }
}

/// A named OR of trigger paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerCombination {
    /// Channel name ("etau", "SingleMuon", ...).
    pub name: String,

    /// Constituent paths, in document order.
    pub paths: Vec<String>,
}

impl TriggerCombination {
    /// Create a combination.
    pub fn new(name: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            name: name.into(),
            paths,
        }
    }

    /// Did any constituent path fire?
    ///
    /// A combination without paths always fires. Analyses use an empty
    /// list to mean "no trigger requirement".
    ///
    /// ```
    /// use hlt_match::core::Event;
    /// use hlt_match::definitions::TriggerCombination;
    ///
    /// let event = Event::new(1).with_path("HLT_B", true);
    /// let comb = TriggerCombination::new("mutau", vec!["HLT_A".into(), "HLT_B".into()]);
    /// assert!(comb.fired(&event));
    /// assert!(TriggerCombination::new("any", vec![]).fired(&Event::new(1)));
    /// ```
    #[must_use]
    pub fn fired<E: EventView + ?Sized>(&self, event: &E) -> bool {
        self.paths.is_empty() || self.paths.iter().any(|p| event.path_fired(p))
    }

    /// `A || B || ...`, or `(any)` for an empty combination.
    #[must_use]
    pub fn description(&self) -> String {
        if self.paths.is_empty() {
            "(any)".to_string()
        } else {
            self.paths.join(" || ")
        }
    }

    /// Is this the permissive empty combination?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Combinations of one data kind, by channel name.
#[derive(Clone, Debug)]
pub struct CombinationCatalog {
    data_kind: DataKind,
    combinations: BTreeMap<String, TriggerCombination>,
}

impl CombinationCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new(data_kind: DataKind) -> Self {
        Self {
            data_kind,
            combinations: BTreeMap::new(),
        }
    }

    /// Build a catalog from one data-kind section of `hltcombs`.
    ///
    /// Every listed path must exist in `paths`, and the paths of a channel
    /// must fold into one [`ChannelShape`].
    pub fn from_raw(
        data_kind: DataKind,
        channels: &BTreeMap<String, Vec<String>>,
        paths: &TriggerPathCatalog,
    ) -> Result<Self> {
        let mut catalog = Self::new(data_kind);
        for (channel, names) in channels {
            if let Some(missing) = names.iter().find(|n| !paths.contains(n)) {
                return Err(TriggerError::UnknownPath {
                    path: missing.clone(),
                    channel: channel.clone(),
                    data_kind: data_kind.to_string(),
                    available: paths.names(),
                });
            }
            if names.is_empty() {
                tracing::warn!(channel = %channel, data_kind = %data_kind, "Empty combination fires for every event");
            }
            let combination = TriggerCombination::new(channel.clone(), names.clone());
            let shape = ChannelShape::of(&combination, paths)?;
            tracing::trace!(channel = %channel, data_kind = %data_kind, shape = %shape, "Combination loaded");
            catalog.register(combination);
        }
        Ok(catalog)
    }

    /// Register a combination, replacing any of the same name.
    pub fn register(&mut self, combination: TriggerCombination) {
        self.combinations
            .insert(combination.name.clone(), combination);
    }

    /// Register a combination (builder pattern).
    #[must_use]
    pub fn with(mut self, combination: TriggerCombination) -> Self {
        self.register(combination);
        self
    }

    /// Data kind this catalog serves.
    #[must_use]
    pub const fn data_kind(&self) -> DataKind {
        self.data_kind
    }

    /// Look up a channel.
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&TriggerCombination> {
        self.combinations.get(channel)
    }

    /// Look up a channel, failing with the list of loaded ones.
    pub fn require(&self, channel: &str) -> Result<&TriggerCombination> {
        self.get(channel).ok_or_else(|| TriggerError::UnknownChannel {
            channel: channel.to_string(),
            available: self.channels(),
        })
    }

    /// Channel names, sorted.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        self.combinations.keys().cloned().collect()
    }

    /// Iterate over combinations in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TriggerCombination> {
        self.combinations.values()
    }

    /// Number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    /// Is the catalog empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }
}
