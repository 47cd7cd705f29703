//! Efficiency bookkeeping across events.
//!
//! Per channel: a cutflow (`NoCut → Trigger → Leg1 → Leg2 → Pair →
//! Matched`) and one outcome histogram per leg plus one for pairs. The
//! histograms keep the three non-match states apart so an inefficiency can
//! be traced to its cause.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::definitions::ChannelShape;
use crate::matching::MatchOutcome;

use super::channel::EventReport;

/// One step of a channel cutflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CutflowStep {
    /// Every event.
    NoCut,
    /// The channel fired.
    Trigger,
    /// A leg-1 candidate is matched.
    Leg1,
    /// A leg-2 candidate is matched (a second leg-1 candidate for
    /// double-object channels).
    Leg2,
    /// A separated pair has both members matched.
    Pair,
    /// The pair (or, for single-object channels, the candidate) is matched
    /// through distinct trigger objects.
    Matched,
}

impl CutflowStep {
    /// All steps in order.
    pub const ALL: [CutflowStep; 6] = [
        CutflowStep::NoCut,
        CutflowStep::Trigger,
        CutflowStep::Leg1,
        CutflowStep::Leg2,
        CutflowStep::Pair,
        CutflowStep::Matched,
    ];

    /// Steps that apply to a channel shape, in order.
    #[must_use]
    pub fn for_shape(shape: ChannelShape) -> &'static [CutflowStep] {
        use CutflowStep::*;
        match shape {
            ChannelShape::Empty => &[NoCut, Trigger],
            ChannelShape::Single(_) => &[NoCut, Trigger, Leg1, Matched],
            ChannelShape::Double(_) | ChannelShape::Cross(..) => {
                &[NoCut, Trigger, Leg1, Leg2, Pair, Matched]
            }
        }
    }

    /// Short label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoCut => "no cut",
            Self::Trigger => "trigger",
            Self::Leg1 => "leg 1",
            Self::Leg2 => "leg 2",
            Self::Pair => "pair",
            Self::Matched => "matched",
        }
    }
}

/// Event counts per cutflow step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cutflow {
    counts: BTreeMap<CutflowStep, u64>,
}

impl Cutflow {
    /// Create an empty cutflow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cutflow listing `steps`, each at zero.
    #[must_use]
    pub fn with_steps(steps: &[CutflowStep]) -> Self {
        Self {
            counts: steps.iter().map(|&step| (step, 0)).collect(),
        }
    }

    /// Count one event that passed `steps`.
    pub fn record(&mut self, steps: &[CutflowStep]) {
        for &step in steps {
            *self.counts.entry(step).or_insert(0) += 1;
        }
    }

    /// Events that passed a step.
    #[must_use]
    pub fn count(&self, step: CutflowStep) -> u64 {
        self.counts.get(&step).copied().unwrap_or(0)
    }

    /// Listed steps with their counts, in order. Steps no event reached
    /// are included at zero.
    pub fn iter(&self) -> impl Iterator<Item = (CutflowStep, u64)> + '_ {
        self.counts.iter().map(|(&step, &n)| (step, n))
    }
}

impl fmt::Display for Cutflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.count(CutflowStep::NoCut);
        for (step, n) in self.iter() {
            let fraction = if total == 0 {
                0.0
            } else {
                100.0 * n as f64 / total as f64
            };
            writeln!(f, "  {:<8} {n:>10} {fraction:>7.2}%", step.label())?;
        }
        Ok(())
    }
}

/// Counts of outcome codes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeHistogram {
    bins: BTreeMap<i64, u64>,
}

impl OutcomeHistogram {
    /// Create an empty histogram.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entry.
    pub fn fill(&mut self, outcome: MatchOutcome) {
        *self.bins.entry(outcome.code()).or_insert(0) += 1;
    }

    /// Entries in the bin of `outcome`.
    #[must_use]
    pub fn count(&self, outcome: MatchOutcome) -> u64 {
        self.bins.get(&outcome.code()).copied().unwrap_or(0)
    }

    /// Total entries.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.values().sum()
    }

    /// Non-empty bins in code order.
    pub fn iter(&self) -> impl Iterator<Item = (MatchOutcome, u64)> + '_ {
        self.bins
            .iter()
            .filter_map(|(&code, &n)| MatchOutcome::from_code(code).map(|o| (o, n)))
    }
}

impl fmt::Display for OutcomeHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (outcome, n) in self.iter() {
            writeln!(f, "    {:>4} {:<14} {n:>10}", outcome.code(), outcome.label())?;
        }
        Ok(())
    }
}

/// Accumulated results of one channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBook {
    /// Cutflow.
    pub cutflow: Cutflow,

    /// Leg summary outcomes, one histogram per distinct leg.
    pub legs: Vec<OutcomeHistogram>,

    /// Pair outcomes (two-object channels only).
    pub pairs: OutcomeHistogram,
}

impl ChannelBook {
    /// Empty results for a channel of `shape`.
    #[must_use]
    pub fn new(shape: ChannelShape) -> Self {
        Self {
            cutflow: Cutflow::with_steps(CutflowStep::for_shape(shape)),
            legs: vec![OutcomeHistogram::new(); shape.leg_count()],
            pairs: OutcomeHistogram::new(),
        }
    }
}

/// Accumulates [`EventReport`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookkeeper {
    events: u64,
    channels: BTreeMap<String, ChannelBook>,
}

impl Bookkeeper {
    /// Create an empty bookkeeper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one event.
    pub fn record(&mut self, report: &EventReport) {
        self.events += 1;
        for channel in &report.channels {
            let book = self
                .channels
                .entry(channel.channel.clone())
                .or_insert_with(|| ChannelBook::new(channel.shape));
            book.cutflow.record(&channel.passed_steps());
            if book.legs.len() < channel.legs.len() {
                book.legs.resize_with(channel.legs.len(), OutcomeHistogram::new);
            }
            for (hist, leg) in book.legs.iter_mut().zip(&channel.legs) {
                hist.fill(leg.summary);
            }
            if let Some(pair) = &channel.pair {
                book.pairs.fill(pair.outcome);
            }
        }
    }

    /// Number of recorded events.
    #[must_use]
    pub const fn events(&self) -> u64 {
        self.events
    }

    /// Results of one channel.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&ChannelBook> {
        self.channels.get(name)
    }

    /// Channel results in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChannelBook)> {
        self.channels.iter().map(|(name, book)| (name.as_str(), book))
    }
}

impl fmt::Display for Bookkeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} events", self.events)?;
        for (name, book) in self.iter() {
            writeln!(f, "{name}:")?;
            write!(f, "{}", book.cutflow)?;
            for (i, hist) in book.legs.iter().enumerate() {
                writeln!(f, "  leg {} outcomes:", i + 1)?;
                write!(f, "{hist}")?;
            }
            if book.pairs.total() > 0 {
                writeln!(f, "  pair outcomes:")?;
                write!(f, "{}", book.pairs)?;
            }
        }
        Ok(())
    }
}
