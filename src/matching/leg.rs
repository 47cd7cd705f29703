//! Leg matching.
//!
//! Matching a candidate to a leg of a channel runs in two stages:
//!
//! 1. **Scan** (once per event and leg): if the channel fired, collect the
//!    trigger objects of the leg's kind whose filter bits satisfy the leg
//!    of at least one of the channel's paths. For data, a path outside its
//!    run range contributes nothing.
//! 2. **Cone** (once per candidate): count the scanned objects with
//!    ΔR < cone.
//!
//! Stage 1 is independent of the candidate, so the evaluator runs it once
//! and reuses the [`LegScan`] for every candidate of the event.

use smallvec::SmallVec;

use crate::core::{Candidate, DataKind, EventView, ObjectKind, TriggerObject};
use crate::definitions::{
    ChannelShape, LegIndex, LegSpec, RunRange, TriggerCombination, TriggerPathCatalog,
};
use crate::error::{Result, TriggerError};

use super::outcome::{LegMatch, MatchOutcome};

/// Leg of one path, resolved for matching.
#[derive(Clone, Debug)]
struct PathLeg {
    path: String,
    spec: LegSpec,
    run_range: Option<RunRange>,
}

/// Trigger objects qualifying for one leg in one event.
///
/// Indices refer to the event the scan was taken from. Matching against a
/// different object list ignores indices past its end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LegScan {
    /// The channel did not fire.
    NotFired,
    /// Indices of qualifying trigger objects (possibly none).
    Qualifying(SmallVec<[usize; 8]>),
}

impl LegScan {
    /// Outcome and in-cone objects for one candidate.
    #[must_use]
    pub fn match_candidate(
        &self,
        objects: &[TriggerObject],
        candidate: &Candidate,
        cone: f64,
    ) -> LegMatch {
        match self {
            Self::NotFired => LegMatch::without_objects(MatchOutcome::NotFired),
            Self::Qualifying(indices) if indices.is_empty() => {
                LegMatch::without_objects(MatchOutcome::NoTriggerObject)
            }
            Self::Qualifying(indices) => {
                let in_cone: SmallVec<[usize; 4]> = indices
                    .iter()
                    .copied()
                    .filter(|&i| objects.get(i).is_some_and(|o| o.delta_r(candidate) < cone))
                    .collect();
                LegMatch {
                    outcome: MatchOutcome::Matches(in_cone.len() as u32),
                    objects: in_cone,
                }
            }
        }
    }

    /// The candidate-independent part of the outcome.
    ///
    /// `Matches(0)` when qualifying objects exist.
    #[must_use]
    pub fn baseline(&self) -> MatchOutcome {
        match self {
            Self::NotFired => MatchOutcome::NotFired,
            Self::Qualifying(indices) if indices.is_empty() => MatchOutcome::NoTriggerObject,
            Self::Qualifying(_) => MatchOutcome::Matches(0),
        }
    }
}

/// Matches candidates to the legs of one channel.
#[derive(Clone, Debug)]
pub struct LegMatcher {
    combination: TriggerCombination,
    shape: ChannelShape,
    legs: [Vec<PathLeg>; 2],
    data_kind: DataKind,
    cone: f64,
}

impl LegMatcher {
    /// Resolve the legs of every path in `combination`.
    ///
    /// A path's leg serves a slot only if its kind is the slot's kind in
    /// the channel shape, so a single-muon path in a muon-tau channel adds
    /// to the muon slot and leaves the tau slot alone. Fails if a path is
    /// missing from `paths` or the paths do not fold into one shape.
    pub fn new(
        combination: &TriggerCombination,
        paths: &TriggerPathCatalog,
        data_kind: DataKind,
        cone: f64,
    ) -> Result<Self> {
        assert!(cone > 0.0, "Cone radius must be positive");
        let resolved = combination
            .paths
            .iter()
            .map(|name| {
                paths.get(name).ok_or_else(|| TriggerError::UnknownPath {
                    path: name.clone(),
                    channel: combination.name.clone(),
                    data_kind: data_kind.to_string(),
                    available: paths.names(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let shape = ChannelShape::of(combination, paths)?;

        let mut legs: [Vec<PathLeg>; 2] = [Vec::new(), Vec::new()];
        for path in resolved {
            for (slot, index) in LegIndex::BOTH.into_iter().enumerate() {
                let spec = path.leg(index);
                if shape.leg_kind(index) != Some(spec.object) {
                    continue;
                }
                legs[slot].push(PathLeg {
                    path: path.name.clone(),
                    spec: spec.clone(),
                    run_range: path.run_range,
                });
            }
        }
        Ok(Self {
            combination: combination.clone(),
            shape,
            legs,
            data_kind,
            cone,
        })
    }

    /// Channel name.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.combination.name
    }

    /// Leg structure of the channel.
    #[must_use]
    pub const fn shape(&self) -> ChannelShape {
        self.shape
    }

    /// The combination being matched.
    #[must_use]
    pub const fn combination(&self) -> &TriggerCombination {
        &self.combination
    }

    /// Cone radius.
    #[must_use]
    pub const fn cone(&self) -> f64 {
        self.cone
    }

    /// Object kinds serving a slot, in path order, deduplicated.
    #[must_use]
    pub fn leg_kinds(&self, index: LegIndex) -> SmallVec<[ObjectKind; 2]> {
        let mut kinds: SmallVec<[ObjectKind; 2]> = SmallVec::new();
        for leg in self.slot(index) {
            if !kinds.contains(&leg.spec.object) {
                kinds.push(leg.spec.object);
            }
        }
        kinds
    }

    /// Leg specs serving a slot, one per path.
    pub fn leg_specs(&self, index: LegIndex) -> impl Iterator<Item = (&str, &LegSpec)> {
        self.slot(index).iter().map(|l| (l.path.as_str(), &l.spec))
    }

    /// Does any path's leg accept the candidate's offline pT and |η|?
    #[must_use]
    pub fn accepts(&self, index: LegIndex, candidate: &Candidate) -> bool {
        self.slot(index).iter().any(|l| l.spec.accepts(candidate))
    }

    /// Did the channel fire?
    #[must_use]
    pub fn fired<E: EventView + ?Sized>(&self, event: &E) -> bool {
        self.combination.fired(event)
    }

    /// Collect the trigger objects qualifying for a slot.
    #[must_use]
    pub fn scan<E: EventView + ?Sized>(&self, event: &E, index: LegIndex) -> LegScan {
        if !self.fired(event) {
            return LegScan::NotFired;
        }

        let run = event.run();
        let active: SmallVec<[&LegSpec; 4]> = self
            .slot(index)
            .iter()
            .filter(|l| !self.data_kind.is_data() || l.run_range.is_none_or(|r| r.contains(run)))
            .map(|l| &l.spec)
            .collect();

        let qualifying = event
            .trigger_objects()
            .iter()
            .enumerate()
            .filter(|(_, obj)| {
                let kind = obj.kind();
                active
                    .iter()
                    .any(|spec| kind == Some(spec.object) && spec.has_bits(obj.filter_bits))
            })
            .map(|(i, _)| i)
            .collect();
        LegScan::Qualifying(qualifying)
    }

    /// Match one candidate to a slot.
    #[must_use]
    pub fn match_candidate<E: EventView + ?Sized>(
        &self,
        event: &E,
        candidate: &Candidate,
        index: LegIndex,
    ) -> MatchOutcome {
        self.match_detailed(event, candidate, index).outcome
    }

    /// Match one candidate to a slot, keeping the in-cone trigger objects.
    #[must_use]
    pub fn match_detailed<E: EventView + ?Sized>(
        &self,
        event: &E,
        candidate: &Candidate,
        index: LegIndex,
    ) -> LegMatch {
        self.scan(event, index)
            .match_candidate(event.trigger_objects(), candidate, self.cone)
    }

    fn slot(&self, index: LegIndex) -> &[PathLeg] {
        match index {
            LegIndex::First => &self.legs[0],
            LegIndex::Second => &self.legs[1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Event;
    use crate::definitions::TriggerPath;

    fn catalog() -> TriggerPathCatalog {
        TriggerPathCatalog::new()
            .with_path(TriggerPath::single(
                "HLT_X",
                LegSpec::new(ObjectKind::Tau, 3).with_pt_min(40.0),
            ))
            .with_path(
                TriggerPath::single("HLT_Old", LegSpec::new(ObjectKind::Tau, 4))
                    .with_run_range(100, 200),
            )
            .with_path(TriggerPath::cross(
                "HLT_Mu_Tau",
                LegSpec::new(ObjectKind::Muon, 8),
                LegSpec::new(ObjectKind::Tau, 1),
            ))
            .with_path(TriggerPath::single("HLT_Mu", LegSpec::new(ObjectKind::Muon, 2)))
    }

    fn matcher(paths: &[&str], data_kind: DataKind) -> LegMatcher {
        let comb = TriggerCombination::new("test", paths.iter().map(|p| p.to_string()).collect());
        LegMatcher::new(&comb, &catalog(), data_kind, 0.3).unwrap()
    }

    fn tau() -> Candidate {
        Candidate::new(45.0, 0.12, 0.18)
    }

    #[test]
    fn test_end_to_end_match() {
        let m = matcher(&["HLT_X"], DataKind::Mc);
        let event = Event::new(1)
            .with_path("HLT_X", true)
            .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 3));

        assert_eq!(m.match_candidate(&event, &tau(), LegIndex::First), MatchOutcome::Matches(1));
        let detailed = m.match_detailed(&event, &tau(), LegIndex::First);
        assert_eq!(detailed.objects.as_slice(), &[0]);
    }

    #[test]
    fn test_missing_bit_means_no_trigger_object() {
        let m = matcher(&["HLT_X"], DataKind::Mc);
        let event = Event::new(1)
            .with_path("HLT_X", true)
            .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 1));

        assert_eq!(m.match_candidate(&event, &tau(), LegIndex::First), MatchOutcome::NoTriggerObject);
    }

    #[test]
    fn test_not_fired_ignores_objects() {
        let m = matcher(&["HLT_X"], DataKind::Mc);
        let event = Event::new(1)
            .with_path("HLT_X", false)
            .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 3));

        assert_eq!(m.scan(&event, LegIndex::First), LegScan::NotFired);
        assert_eq!(m.match_candidate(&event, &tau(), LegIndex::First), MatchOutcome::NotFired);
    }

    #[test]
    fn test_out_of_cone_is_zero_matches() {
        let m = matcher(&["HLT_X"], DataKind::Mc);
        let event = Event::new(1)
            .with_path("HLT_X", true)
            .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 1.5, 0.2, 3));

        assert_eq!(m.match_candidate(&event, &tau(), LegIndex::First), MatchOutcome::Matches(0));
    }

    #[test]
    fn test_wrong_kind_does_not_qualify() {
        let m = matcher(&["HLT_X"], DataKind::Mc);
        let event = Event::new(1)
            .with_path("HLT_X", true)
            .with_trigger_object(TriggerObject::new(ObjectKind::Muon, 0.1, 0.2, 3));

        assert_eq!(m.match_candidate(&event, &tau(), LegIndex::First), MatchOutcome::NoTriggerObject);
    }

    #[test]
    fn test_run_range_applies_to_data_only() {
        let event = Event::new(250)
            .with_path("HLT_Old", true)
            .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 4));

        let data = matcher(&["HLT_Old"], DataKind::Data);
        assert_eq!(data.match_candidate(&event, &tau(), LegIndex::First), MatchOutcome::NoTriggerObject);

        let mc = matcher(&["HLT_Old"], DataKind::Mc);
        assert_eq!(mc.match_candidate(&event, &tau(), LegIndex::First), MatchOutcome::Matches(1));

        let in_range = Event { run: 150, ..event };
        assert_eq!(data.match_candidate(&in_range, &tau(), LegIndex::First), MatchOutcome::Matches(1));
    }

    #[test]
    fn test_cross_trigger_slots() {
        let m = matcher(&["HLT_Mu_Tau"], DataKind::Mc);
        assert_eq!(m.leg_kinds(LegIndex::First).as_slice(), &[ObjectKind::Muon]);
        assert_eq!(m.leg_kinds(LegIndex::Second).as_slice(), &[ObjectKind::Tau]);

        let event = Event::new(1)
            .with_path("HLT_Mu_Tau", true)
            .with_trigger_object(TriggerObject::new(ObjectKind::Muon, 0.0, 1.0, 8))
            .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 1));

        let muon = Candidate::new(25.0, 0.05, 1.0);
        assert_eq!(m.match_candidate(&event, &muon, LegIndex::First), MatchOutcome::Matches(1));
        assert_eq!(m.match_candidate(&event, &tau(), LegIndex::Second), MatchOutcome::Matches(1));
        assert_eq!(m.match_candidate(&event, &tau(), LegIndex::First), MatchOutcome::Matches(0));
    }

    #[test]
    fn test_offline_acceptance() {
        let m = matcher(&["HLT_X"], DataKind::Mc);
        assert!(m.accepts(LegIndex::First, &tau()));
        assert!(!m.accepts(LegIndex::First, &Candidate::new(30.0, 0.0, 0.0)));
    }

    #[test]
    fn test_unknown_path() {
        let comb = TriggerCombination::new("test", vec!["HLT_Nope".to_string()]);
        let err = LegMatcher::new(&comb, &catalog(), DataKind::Mc, 0.3).unwrap_err();
        assert!(matches!(err, TriggerError::UnknownPath { .. }));
    }

    #[test]
    fn test_empty_combination_has_no_trigger_objects() {
        let m = matcher(&[], DataKind::Mc);
        let event = Event::new(1)
            .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 3));
        assert!(m.fired(&event));
        assert_eq!(m.match_candidate(&event, &tau(), LegIndex::First), MatchOutcome::NoTriggerObject);
    }

    #[test]
    fn test_single_path_in_cross_channel_serves_its_own_slot() {
        let m = matcher(&["HLT_Mu", "HLT_Mu_Tau"], DataKind::Mc);
        assert_eq!(m.shape(), ChannelShape::Cross(ObjectKind::Muon, ObjectKind::Tau));
        assert_eq!(m.leg_kinds(LegIndex::First).as_slice(), &[ObjectKind::Muon]);
        assert_eq!(m.leg_kinds(LegIndex::Second).as_slice(), &[ObjectKind::Tau]);
        let tau_paths: Vec<&str> = m.leg_specs(LegIndex::Second).map(|(p, _)| p).collect();
        assert_eq!(tau_paths, vec!["HLT_Mu_Tau"]);

        let event = Event::new(1)
            .with_path("HLT_Mu", true)
            .with_path("HLT_Mu_Tau", false)
            .with_trigger_object(TriggerObject::new(ObjectKind::Muon, 0.0, 1.0, 2))
            .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 1));
        let muon = Candidate::new(25.0, 0.05, 1.0);
        assert_eq!(m.match_candidate(&event, &muon, LegIndex::First), MatchOutcome::Matches(1));
        assert_eq!(m.match_candidate(&event, &tau(), LegIndex::Second), MatchOutcome::Matches(1));
    }

    #[test]
    fn test_incompatible_paths_rejected() {
        let comb = TriggerCombination::new("test", vec!["HLT_Mu".to_string(), "HLT_X".to_string()]);
        let err = LegMatcher::new(&comb, &catalog(), DataKind::Mc, 0.3).unwrap_err();
        assert!(matches!(err, TriggerError::Schema(_)));
    }

    #[test]
    fn test_scan_indices_past_object_list_are_ignored() {
        let m = matcher(&["HLT_X"], DataKind::Mc);
        let event = Event::new(1)
            .with_path("HLT_X", true)
            .with_trigger_object(TriggerObject::new(ObjectKind::Muon, 0.1, 0.2, 3))
            .with_trigger_object(TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 3));
        let scan = m.scan(&event, LegIndex::First);
        assert_eq!(scan, LegScan::Qualifying(smallvec::smallvec![1]));

        let shorter = &event.trigger_objects[..1];
        let matched = scan.match_candidate(shorter, &tau(), 0.3);
        assert_eq!(matched.outcome, MatchOutcome::Matches(0));
        assert!(matched.objects.is_empty());
    }
}
