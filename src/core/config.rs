//! Matching configuration.
//!
//! The trigger tables come from the definition document; everything the
//! matcher itself can be tuned with lives here:
//! - `MatchConfig`: cone radii, pair and trigger-object separation, and
//!   working points
//! - `WorkingPointLadder`: ascending object-ID thresholds per object kind
//!
//! None of these values is derived from data. They are chosen by the
//! analysis and fixed for the whole run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::object::ObjectKind;

/// Default ΔR cone for trigger-object matching.
pub const DEFAULT_CONE_RADIUS: f64 = 0.3;

/// Default minimum ΔR between the two reconstructed members of a pair.
pub const DEFAULT_PAIR_SEPARATION: f64 = 0.5;

/// Default minimum ΔR between the two trigger objects of a cross pair.
pub const DEFAULT_OBJECT_SEPARATION: f64 = 0.3;

/// A named object-ID threshold.
///
/// A candidate passes the working point when its ID value is at least
/// `threshold`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingPoint {
    /// Display name ("all", "medium", ...).
    pub name: String,

    /// Minimum object-ID value.
    pub threshold: u32,
}

impl WorkingPoint {
    /// Create a working point.
    pub fn new(name: impl Into<String>, threshold: u32) -> Self {
        Self {
            name: name.into(),
            threshold,
        }
    }

    /// Does a candidate with this ID value pass?
    #[must_use]
    pub const fn passes(&self, id: u32) -> bool {
        id >= self.threshold
    }
}

/// Working points of one object kind, in ascending threshold order.
///
/// Always starts with the inclusive `all` point (threshold 0), so the first
/// counter of a ladder is the plain match count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingPointLadder {
    points: Vec<WorkingPoint>,
}

impl Default for WorkingPointLadder {
    fn default() -> Self {
        Self {
            points: vec![WorkingPoint::new("all", 0)],
        }
    }
}

impl WorkingPointLadder {
    /// Tau MVA isolation working points, one bit per step.
    pub const TAU_MVA: [&'static str; 7] = [
        "vvloose", "vloose", "loose", "medium", "tight", "vtight", "vvtight",
    ];

    /// Create a ladder holding only `all`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tau MVA ladder restricted to the named points.
    ///
    /// Point `i` of [`Self::TAU_MVA`] has threshold `2^i`. Unknown names
    /// are rejected with the list of valid ones.
    pub fn tau_mva(names: &[&str]) -> Result<Self, String> {
        let mut ladder = Self::new();
        for name in names {
            let index = Self::TAU_MVA
                .iter()
                .position(|wp| wp == name)
                .ok_or_else(|| {
                    format!(
                        "unknown tau working point '{name}' (available: {})",
                        Self::TAU_MVA.join(", ")
                    )
                })?;
            ladder = ladder.with_point(*name, 1 << index);
        }
        Ok(ladder)
    }

    /// Add a working point (builder pattern).
    ///
    /// Keeps ascending order; a point with an existing name is replaced.
    #[must_use]
    pub fn with_point(mut self, name: impl Into<String>, threshold: u32) -> Self {
        let point = WorkingPoint::new(name, threshold);
        self.points.retain(|p| p.name != point.name);
        let at = self.points.partition_point(|p| p.threshold <= threshold);
        self.points.insert(at, point);
        self
    }

    /// All points, ascending.
    #[must_use]
    pub fn points(&self) -> &[WorkingPoint] {
        &self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// A ladder is never empty once built through the public API.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// How many leading points a candidate with this ID value passes.
    #[must_use]
    pub fn passed(&self, id: u32) -> usize {
        self.points.iter().take_while(|p| p.passes(id)).count()
    }
}

/// Tunable matching parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// ΔR cone applied unless a channel overrides it.
    pub cone_radius: f64,

    /// Per-channel cone overrides.
    pub channel_cones: BTreeMap<String, f64>,

    /// Minimum ΔR between the two reconstructed members of a pair.
    pub pair_separation: f64,

    /// Minimum ΔR between the two trigger objects a cross pair is matched
    /// through. Zero disables the cut.
    pub object_separation: f64,

    /// Working points per object kind.
    pub working_points: BTreeMap<ObjectKind, WorkingPointLadder>,

    /// Drop candidates failing every path's offline pT/|η| cut before matching.
    pub offline_cuts: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            cone_radius: DEFAULT_CONE_RADIUS,
            channel_cones: BTreeMap::new(),
            pair_separation: DEFAULT_PAIR_SEPARATION,
            object_separation: DEFAULT_OBJECT_SEPARATION,
            working_points: ObjectKind::ALL
                .iter()
                .map(|&kind| (kind, WorkingPointLadder::default()))
                .collect(),
            offline_cuts: false,
        }
    }
}

impl MatchConfig {
    /// Create a configuration with the default radii.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default cone radius.
    #[must_use]
    pub fn with_cone_radius(mut self, radius: f64) -> Self {
        assert!(radius > 0.0, "Cone radius must be positive");
        self.cone_radius = radius;
        self
    }

    /// Override the cone radius of one channel.
    #[must_use]
    pub fn with_channel_cone(mut self, channel: impl Into<String>, radius: f64) -> Self {
        assert!(radius > 0.0, "Cone radius must be positive");
        self.channel_cones.insert(channel.into(), radius);
        self
    }

    /// Set the minimum separation of pair members.
    #[must_use]
    pub fn with_pair_separation(mut self, separation: f64) -> Self {
        assert!(separation >= 0.0, "Pair separation must not be negative");
        self.pair_separation = separation;
        self
    }

    /// Set the minimum separation of the trigger objects of a cross pair.
    #[must_use]
    pub fn with_object_separation(mut self, separation: f64) -> Self {
        assert!(separation >= 0.0, "Object separation must not be negative");
        self.object_separation = separation;
        self
    }

    /// Set the working-point ladder of one object kind.
    #[must_use]
    pub fn with_working_points(mut self, kind: ObjectKind, ladder: WorkingPointLadder) -> Self {
        assert!(!ladder.is_empty(), "Working-point ladder must not be empty");
        self.working_points.insert(kind, ladder);
        self
    }

    /// Apply the legs' offline thresholds to candidates.
    #[must_use]
    pub fn with_offline_cuts(mut self) -> Self {
        self.offline_cuts = true;
        self
    }

    /// Cone radius used for a channel.
    #[must_use]
    pub fn cone_for(&self, channel: &str) -> f64 {
        self.channel_cones
            .get(channel)
            .copied()
            .unwrap_or(self.cone_radius)
    }

    /// Working-point ladder of an object kind.
    #[must_use]
    pub fn ladder(&self, kind: ObjectKind) -> WorkingPointLadder {
        self.working_points.get(&kind).cloned().unwrap_or_default()
    }
}
