//! Channel evaluation and efficiency bookkeeping.
//!
//! [`ChannelEvaluator`] turns one event into an [`EventReport`];
//! [`Bookkeeper`] accumulates reports into cutflows and outcome histograms.

pub mod channel;
pub mod bookkeeping;

pub use channel::{ChannelEvaluator, ChannelReport, EventReport, LegReport};
pub use bookkeeping::{Bookkeeper, ChannelBook, Cutflow, CutflowStep, OutcomeHistogram};
