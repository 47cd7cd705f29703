//! Trigger definitions: filter bits, paths, and combinations.
//!
//! Everything here is built once from a definition document and is
//! read-only afterwards. Loading is all-or-nothing: an unresolved filter or
//! path name fails the whole load with the list of valid alternatives.
//!
//! ## Data Flow
//!
//! ```text
//! document ─► FilterBitTable ─► TriggerPathCatalog ─► CombinationCatalog (data, mc)
//! ```

pub mod schema;
pub mod filter_bits;
pub mod paths;
pub mod combination;
pub mod loader;

pub use schema::{DefinitionFile, RawLeg, RawPath};
pub use filter_bits::FilterBitTable;
pub use paths::{LegIndex, LegSpec, PathKind, RunRange, TriggerPath, TriggerPathCatalog};
pub use combination::{ChannelShape, CombinationCatalog, TriggerCombination};
pub use loader::{DefinitionSummary, TriggerDefinitions};
