//! # hlt-match
//!
//! Trigger-definition loading and trigger-object matching for offline
//! validation of high-level trigger (HLT) decisions.
//!
//! ## Design Principles
//!
//! 1. **Data-Driven**: Filter bits, paths, thresholds, run ranges and
//!    channel combinations all come from a per-year JSON document. The year
//!    selects a file, never a code path.
//!
//! 2. **Fail Fast**: A document is loaded completely or not at all. An
//!    unresolved filter or path name is an error naming the valid
//!    alternatives, never a silent zero mask.
//!
//! 3. **Outcomes, Not Errors**: "Did not fire", "no trigger object" and
//!    "zero matches" are ordinary values of [`MatchOutcome`], kept apart so
//!    an inefficiency can be traced to its cause.
//!
//! ## Modules
//!
//! - `core`: Trigger objects, candidates, events, matching configuration
//! - `definitions`: Filter-bit table, path catalog, combinations, loader
//! - `matching`: Leg matching and pair enumeration
//! - `evaluator`: Per-event channel evaluation and bookkeeping
//! - `error`: Error type
//!
//! ## Example
//!
//! ```
//! use hlt_match::{
//!     Candidate, ChannelEvaluator, DataKind, Event, LegIndex, MatchConfig, MatchOutcome,
//!     ObjectKind, TriggerDefinitions, TriggerObject,
//! };
//!
//! let defs = TriggerDefinitions::from_json_str(r#"{
//!     "filterbits": {"Tau": {"A": 1, "B": 2}},
//!     "hltpaths": {"HLT_X": {"Tau": {"ptmin": 40, "filterbits": ["A", "B"]}}},
//!     "hltcombs": {"mc": {"tau": ["HLT_X"]}}
//! }"#)?;
//!
//! let evaluator = ChannelEvaluator::new(&defs, DataKind::Mc, MatchConfig::new())?;
//! let event = Event::new(1)
//!     .with_path("HLT_X_v3", true)
//!     .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 0b11));
//!
//! let tau = Candidate::new(45.0, 0.12, 0.18);
//! let outcome = evaluator.match_leg(&event, "tau", &tau, LegIndex::First)?;
//! assert_eq!(outcome, MatchOutcome::Matches(1));
//! # Ok::<(), hlt_match::TriggerError>(())
//! ```

pub mod error;
pub mod core;
pub mod definitions;
pub mod matching;
pub mod evaluator;

// Re-export commonly used types
pub use crate::error::{Result, TriggerError};

pub use crate::core::{
    delta_phi, delta_r, strip_version_label,
    Candidate, ObjectKind, RecoObjects, TriggerObject,
    DataKind, Event, EventView,
    MatchConfig, WorkingPoint, WorkingPointLadder,
};

pub use crate::definitions::{
    FilterBitTable,
    LegIndex, LegSpec, PathKind, RunRange, TriggerPath, TriggerPathCatalog,
    ChannelShape, CombinationCatalog, TriggerCombination,
    TriggerDefinitions,
};

pub use crate::matching::{LegMatch, LegMatcher, LegScan, MatchOutcome, PairSummary};

pub use crate::evaluator::{
    ChannelEvaluator, ChannelReport, EventReport, LegReport,
    Bookkeeper, Cutflow, CutflowStep, OutcomeHistogram,
};
