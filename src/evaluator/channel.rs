//! Per-event channel evaluation.
//!
//! For every configured channel the evaluator answers three questions:
//! did it fire, which candidates match which leg, and (for two-object
//! channels) is some candidate pair matched end to end.
//!
//! Everything is fixed at construction: the data kind picks the
//! combination catalog, and every channel's legs are resolved against the
//! path catalog once. Evaluating an event touches no shared mutable state.

use smallvec::SmallVec;

use crate::core::{
    Candidate, DataKind, Event, EventView, MatchConfig, ObjectKind, RecoObjects,
    WorkingPointLadder,
};
use crate::definitions::{ChannelShape, LegIndex, TriggerDefinitions};
use crate::error::{Result, TriggerError};
use crate::matching::{
    candidate_pairs, pair_baseline, LegMatch, LegMatcher, MatchOutcome, PairObjects, PairRule,
    PairSummary,
};

use super::bookkeeping::CutflowStep;

/// Matching results of one leg in one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegReport {
    /// Leg slot.
    pub leg: LegIndex,

    /// Object kind of the leg.
    pub object: ObjectKind,

    /// `NotFired`, `NoTriggerObject`, or the total number of
    /// (candidate, trigger object) matches.
    pub summary: MatchOutcome,

    /// One match per candidate, in candidate order.
    pub matches: Vec<LegMatch>,

    /// Summary count per working point of the leg's kind.
    pub by_working_point: Vec<i64>,
}

impl LegReport {
    /// Per-candidate outcomes.
    pub fn outcomes(&self) -> impl Iterator<Item = MatchOutcome> + '_ {
        self.matches.iter().map(|m| m.outcome)
    }

    /// Number of candidates matched to at least one trigger object.
    #[must_use]
    pub fn matched_candidates(&self) -> usize {
        self.matches.iter().filter(|m| m.is_matched()).count()
    }
}

/// Results of one channel in one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelReport {
    /// Channel name.
    pub channel: String,

    /// Leg structure.
    pub shape: ChannelShape,

    /// Did the channel fire?
    pub fired: bool,

    /// One report per distinct leg.
    pub legs: SmallVec<[LegReport; 2]>,

    /// Pair results, for two-object channels.
    pub pair: Option<PairSummary>,
}

impl ChannelReport {
    /// Report of a leg slot. Single and double channels answer both slots
    /// with their only leg.
    #[must_use]
    pub fn leg(&self, index: LegIndex) -> Option<&LegReport> {
        match index {
            LegIndex::Second if self.legs.len() == 2 => self.legs.get(1),
            _ => self.legs.first(),
        }
    }

    /// Cutflow steps passed by this event, in order.
    #[must_use]
    pub fn passed_steps(&self) -> SmallVec<[CutflowStep; 6]> {
        let mut passed = SmallVec::new();
        for &step in CutflowStep::for_shape(self.shape) {
            if !self.passes(step) {
                break;
            }
            passed.push(step);
        }
        passed
    }

    fn passes(&self, step: CutflowStep) -> bool {
        let leg1 = self.leg(LegIndex::First);
        match step {
            CutflowStep::NoCut => true,
            CutflowStep::Trigger => self.fired,
            CutflowStep::Leg1 => leg1.is_some_and(|l| l.matched_candidates() > 0),
            CutflowStep::Leg2 => match self.shape {
                ChannelShape::Double(_) => leg1.is_some_and(|l| l.matched_candidates() >= 2),
                _ => self
                    .leg(LegIndex::Second)
                    .is_some_and(|l| l.matched_candidates() > 0),
            },
            CutflowStep::Pair => self.pair.as_ref().is_some_and(|p| p.both_matched > 0),
            CutflowStep::Matched => match &self.pair {
                Some(pair) => pair.is_matched(),
                None => leg1.is_some_and(|l| l.matched_candidates() > 0),
            },
        }
    }
}

/// Results of all channels in one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventReport {
    /// Run number of the event.
    pub run: u32,

    /// One report per channel, in channel-name order.
    pub channels: Vec<ChannelReport>,
}

impl EventReport {
    /// Report of a channel.
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&ChannelReport> {
        self.channels.iter().find(|c| c.channel == channel)
    }
}

#[derive(Clone, Debug)]
struct Channel {
    shape: ChannelShape,
    matcher: LegMatcher,
    ladders: [WorkingPointLadder; 2],
}

/// Evaluates a fixed set of channels on events.
#[derive(Clone, Debug)]
pub struct ChannelEvaluator {
    data_kind: DataKind,
    config: MatchConfig,
    channels: Vec<Channel>,
}

impl ChannelEvaluator {
    /// Evaluate every channel defined for `data_kind`.
    pub fn new(defs: &TriggerDefinitions, data_kind: DataKind, config: MatchConfig) -> Result<Self> {
        let names = defs.combinations(data_kind).channels();
        Self::with_channels(defs, data_kind, config, &names)
    }

    /// Evaluate the named channels only.
    ///
    /// Fails with [`TriggerError::UnknownChannel`] if a name is not defined
    /// for `data_kind`.
    pub fn with_channels<S: AsRef<str>>(
        defs: &TriggerDefinitions,
        data_kind: DataKind,
        config: MatchConfig,
        names: &[S],
    ) -> Result<Self> {
        let catalog = defs.combinations(data_kind);
        let mut channels = Vec::with_capacity(names.len());
        for name in names {
            let combination = catalog.require(name.as_ref())?;
            let cone = config.cone_for(&combination.name);
            let matcher = LegMatcher::new(combination, defs.paths(), data_kind, cone)?;
            let shape = matcher.shape();
            let ladders = [LegIndex::First, LegIndex::Second].map(|index| {
                shape
                    .leg_kind(index)
                    .map(|kind| config.ladder(kind))
                    .unwrap_or_default()
            });
            tracing::debug!(
                channel = %combination.name,
                shape = %shape,
                cone,
                paths = %combination.description(),
                "Channel ready"
            );
            channels.push(Channel { shape, matcher, ladders });
        }
        channels.sort_by(|a, b| a.matcher.channel().cmp(b.matcher.channel()));
        channels.dedup_by(|a, b| a.matcher.channel() == b.matcher.channel());

        Ok(Self {
            data_kind,
            config,
            channels,
        })
    }

    /// Data kind fixed at construction.
    #[must_use]
    pub const fn data_kind(&self) -> DataKind {
        self.data_kind
    }

    /// Matching configuration.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Evaluated channel names, sorted.
    #[must_use]
    pub fn channels(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.matcher.channel()).collect()
    }

    /// Shape of a channel.
    pub fn shape(&self, channel: &str) -> Result<ChannelShape> {
        Ok(self.channel(channel)?.shape)
    }

    /// Leg matcher of a channel.
    pub fn matcher(&self, channel: &str) -> Result<&LegMatcher> {
        Ok(&self.channel(channel)?.matcher)
    }

    /// Did a channel fire in this event?
    pub fn fired<E: EventView + ?Sized>(&self, event: &E, channel: &str) -> Result<bool> {
        Ok(self.channel(channel)?.matcher.fired(event))
    }

    /// Match one candidate to a leg of a channel.
    pub fn match_leg<E: EventView + ?Sized>(
        &self,
        event: &E,
        channel: &str,
        candidate: &Candidate,
        leg: LegIndex,
    ) -> Result<MatchOutcome> {
        Ok(self
            .channel(channel)?
            .matcher
            .match_candidate(event, candidate, leg))
    }

    /// Evaluate every channel on an event with its own candidates.
    #[must_use]
    pub fn evaluate_event(&self, event: &Event) -> EventReport {
        self.evaluate(event, &event.reco)
    }

    /// Evaluate every channel on an event.
    #[must_use]
    pub fn evaluate<E: EventView + ?Sized>(&self, event: &E, reco: &RecoObjects) -> EventReport {
        EventReport {
            run: event.run(),
            channels: self
                .channels
                .iter()
                .map(|c| self.evaluate_channel(c, event, reco))
                .collect(),
        }
    }

    fn evaluate_channel<E: EventView + ?Sized>(
        &self,
        channel: &Channel,
        event: &E,
        reco: &RecoObjects,
    ) -> ChannelReport {
        let matcher = &channel.matcher;
        let shape = channel.shape;
        let fired = matcher.fired(event);

        let mut candidates: SmallVec<[Vec<Candidate>; 2]> = SmallVec::new();
        let mut legs: SmallVec<[LegReport; 2]> = SmallVec::new();
        let mut baselines: SmallVec<[MatchOutcome; 2]> = SmallVec::new();
        for (slot, index) in LegIndex::BOTH.into_iter().enumerate().take(shape.leg_count()) {
            let Some(kind) = shape.leg_kind(index) else {
                continue;
            };
            let selected: Vec<Candidate> = reco
                .of(kind)
                .iter()
                .filter(|c| !self.config.offline_cuts || matcher.accepts(index, c))
                .cloned()
                .collect();

            let scan = matcher.scan(event, index);
            let matches: Vec<LegMatch> = selected
                .iter()
                .map(|c| scan.match_candidate(event.trigger_objects(), c, matcher.cone()))
                .collect();
            let baseline = scan.baseline();
            let ladder = &channel.ladders[slot];

            let (summary, by_working_point) = match baseline {
                MatchOutcome::Matches(_) => {
                    let mut counts = vec![0i64; ladder.len()];
                    for (candidate, m) in selected.iter().zip(&matches) {
                        let n = i64::from(m.outcome.count());
                        for count in counts.iter_mut().take(ladder.passed(candidate.id)) {
                            *count += n;
                        }
                    }
                    let total = matches.iter().map(|m| m.outcome.count()).sum();
                    (MatchOutcome::Matches(total), counts)
                }
                other => (other, vec![other.code(); ladder.len()]),
            };

            legs.push(LegReport {
                leg: index,
                object: kind,
                summary,
                matches,
                by_working_point,
            });
            candidates.push(selected);
            baselines.push(baseline);
        }

        let objects = PairObjects::new(event.trigger_objects(), self.config.object_separation);
        let pair = match shape {
            ChannelShape::Cross(..) => {
                let pairs = candidate_pairs(
                    &candidates[0],
                    Some(candidates[1].as_slice()),
                    self.config.pair_separation,
                );
                Some(PairSummary::evaluate(
                    PairRule::Cross,
                    &pairs,
                    (&candidates[0], &candidates[1]),
                    (&legs[0].matches, &legs[1].matches),
                    objects,
                    pair_baseline(baselines[0], baselines[1]),
                    &channel.ladders[1],
                ))
            }
            ChannelShape::Double(_) => {
                let pairs = candidate_pairs(&candidates[0], None, self.config.pair_separation);
                Some(PairSummary::evaluate(
                    PairRule::Double,
                    &pairs,
                    (&candidates[0], &candidates[0]),
                    (&legs[0].matches, &legs[0].matches),
                    objects,
                    pair_baseline(baselines[0], baselines[0]),
                    &channel.ladders[0],
                ))
            }
            ChannelShape::Single(_) | ChannelShape::Empty => None,
        };

        ChannelReport {
            channel: matcher.channel().to_string(),
            shape,
            fired,
            legs,
            pair,
        }
    }

    fn channel(&self, name: &str) -> Result<&Channel> {
        self.channels
            .iter()
            .find(|c| c.matcher.channel() == name)
            .ok_or_else(|| TriggerError::UnknownChannel {
                channel: name.to_string(),
                available: self.channels().into_iter().map(String::from).collect(),
            })
    }
}
