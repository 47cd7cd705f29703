//! Trigger-object matching.
//!
//! - `outcome`: the tri-state [`MatchOutcome`] and [`LegMatch`]
//! - `leg`: [`LegMatcher`], matching candidates to the legs of one channel
//! - `pair`: pair enumeration and end-to-end pair matching

pub mod outcome;
pub mod leg;
pub mod pair;

pub use outcome::{LegMatch, MatchOutcome};
pub use leg::{LegMatcher, LegScan};
pub use pair::{candidate_pairs, pair_baseline, PairObjects, PairRule, PairSummary};
