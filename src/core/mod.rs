//! Core types: physics objects, events, and matching configuration.
//!
//! This module holds everything the trigger tables and the matcher share.
//! None of it depends on a particular year or definition document.

pub mod object;
pub mod event;
pub mod config;

pub use object::{delta_phi, delta_r, Candidate, ObjectKind, RecoObjects, TriggerObject};
pub use event::{strip_version_label, DataKind, Event, EventView};
pub use config::{
    MatchConfig, WorkingPoint, WorkingPointLadder, DEFAULT_CONE_RADIUS, DEFAULT_OBJECT_SEPARATION,
    DEFAULT_PAIR_SEPARATION,
};
