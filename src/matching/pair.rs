//! Pair enumeration and end-to-end pair matching.
//!
//! Two-object channels ask whether some pair of reconstructed candidates
//! is matched as a whole: member 1 to leg 1, member 2 to leg 2, through two
//! different trigger objects. Pairs whose members overlap (ΔR below the
//! pair separation) are dropped before matching.
//!
//! Double-object channels draw both members from one list. They enumerate
//! unordered pairs `i < j` only, so a candidate is never paired with
//! itself and no pair is counted twice.
//!
//! Cross pairs additionally need their two trigger objects to be apart by
//! at least [`PairObjects::min_separation`]; a single HLT object
//! reconstructed as both a muon and a tau does not make a pair.

use crate::core::{Candidate, TriggerObject, WorkingPointLadder};

use super::outcome::{LegMatch, MatchOutcome};

/// Which members of a pair a working point is applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairRule {
    /// Members come from two lists (cross trigger); the working point
    /// applies to member 2.
    Cross,
    /// Members come from one list (double-object trigger); the working
    /// point applies to both.
    Double,
}

/// Trigger objects of the event, as seen by pair matching.
#[derive(Clone, Copy, Debug)]
pub struct PairObjects<'a> {
    /// The collection [`LegMatch::objects`] indices refer to.
    pub objects: &'a [TriggerObject],

    /// Minimum ΔR between the trigger objects of a cross pair.
    pub min_separation: f64,
}

impl<'a> PairObjects<'a> {
    /// Objects with a separation cut.
    #[must_use]
    pub const fn new(objects: &'a [TriggerObject], min_separation: f64) -> Self {
        Self {
            objects,
            min_separation,
        }
    }
}

/// Index pairs of candidates that pass the separation cut.
///
/// With `second == None` the pairs are drawn from `first` alone, `i < j`.
#[must_use]
pub fn candidate_pairs(
    first: &[Candidate],
    second: Option<&[Candidate]>,
    min_separation: f64,
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    match second {
        Some(second) => {
            for (i, a) in first.iter().enumerate() {
                for (j, b) in second.iter().enumerate() {
                    if a.delta_r(b) >= min_separation {
                        pairs.push((i, j));
                    }
                }
            }
        }
        None => {
            for (i, a) in first.iter().enumerate() {
                for (j, b) in first.iter().enumerate().skip(i + 1) {
                    if a.delta_r(b) >= min_separation {
                        pairs.push((i, j));
                    }
                }
            }
        }
    }
    pairs
}

/// Pair-level bookkeeping for one channel in one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairSummary {
    /// Number of pairs passing the separation cut.
    pub selected: u32,

    /// Selected pairs with both members matched (not necessarily through
    /// distinct or separated trigger objects).
    pub both_matched: u32,

    /// `NotFired`, `NoTriggerObject` (either leg), or the number of
    /// end-to-end matched pairs.
    pub outcome: MatchOutcome,

    /// Matched pairs per working point. Non-match codes are repeated for
    /// every point.
    pub by_working_point: Vec<i64>,
}

impl PairSummary {
    /// Summarize the pairs of one event.
    ///
    /// `baseline` combines the candidate-independent outcomes of both legs
    /// (see [`pair_baseline`]). For a pair `(i, j)`, `members.0[i]` and
    /// `matches.0[i]` describe member 1, `members.1[j]` and `matches.1[j]`
    /// member 2.
    #[must_use]
    pub fn evaluate(
        rule: PairRule,
        pairs: &[(usize, usize)],
        members: (&[Candidate], &[Candidate]),
        matches: (&[LegMatch], &[LegMatch]),
        objects: PairObjects<'_>,
        baseline: MatchOutcome,
        ladder: &WorkingPointLadder,
    ) -> Self {
        let selected = pairs.len() as u32;
        if !matches!(baseline, MatchOutcome::Matches(_)) {
            return Self {
                selected,
                both_matched: 0,
                outcome: baseline,
                by_working_point: vec![baseline.code(); ladder.len()],
            };
        }

        let mut both_matched = 0;
        let mut matched = 0;
        let mut by_working_point = vec![0i64; ladder.len()];
        for &(i, j) in pairs {
            let (m1, m2) = (&matches.0[i], &matches.1[j]);
            if !(m1.is_matched() && m2.is_matched()) {
                continue;
            }
            both_matched += 1;
            if !m1.distinct_from(m2) {
                continue;
            }
            if rule == PairRule::Cross
                && !m1.separated_from(m2, objects.objects, objects.min_separation)
            {
                continue;
            }
            matched += 1;

            let passed = match rule {
                PairRule::Cross => ladder.passed(members.1[j].id),
                PairRule::Double => ladder
                    .passed(members.0[i].id)
                    .min(ladder.passed(members.1[j].id)),
            };
            for count in by_working_point.iter_mut().take(passed) {
                *count += 1;
            }
        }

        Self {
            selected,
            both_matched,
            outcome: MatchOutcome::Matches(matched),
            by_working_point,
        }
    }

    /// Is at least one pair matched end to end?
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.outcome.is_matched()
    }
}

/// Combine the candidate-independent outcomes of two legs.
///
/// Not fired wins, then a missing trigger object on either leg.
#[must_use]
pub fn pair_baseline(leg1: MatchOutcome, leg2: MatchOutcome) -> MatchOutcome {
    match (leg1, leg2) {
        (MatchOutcome::NotFired, _) | (_, MatchOutcome::NotFired) => MatchOutcome::NotFired,
        (MatchOutcome::NoTriggerObject, _) | (_, MatchOutcome::NoTriggerObject) => {
            MatchOutcome::NoTriggerObject
        }
        _ => MatchOutcome::Matches(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObjectKind;

    fn matched(objects: &[usize]) -> LegMatch {
        LegMatch {
            outcome: MatchOutcome::Matches(objects.len() as u32),
            objects: objects.iter().copied().collect(),
        }
    }

    #[test]
    fn test_double_pairs_are_unordered_and_distinct() {
        let taus = vec![
            Candidate::new(40.0, 0.0, 0.0),
            Candidate::new(40.0, 0.0, 2.0),
            Candidate::new(40.0, 2.0, 0.0),
        ];
        let pairs = candidate_pairs(&taus, None, 0.5);
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
        assert!(pairs.iter().all(|&(i, j)| i < j));
    }

    #[test]
    fn test_separation_cut() {
        let muons = vec![Candidate::new(25.0, 0.0, 0.0)];
        let taus = vec![Candidate::new(40.0, 0.1, 0.1), Candidate::new(40.0, 1.0, 1.0)];
        assert_eq!(candidate_pairs(&muons, Some(taus.as_slice()), 0.5), vec![(0, 1)]);
    }

    fn tau_objects(positions: &[(f64, f64)]) -> Vec<TriggerObject> {
        positions
            .iter()
            .map(|&(eta, phi)| TriggerObject::new(ObjectKind::Tau, eta, phi, 1))
            .collect()
    }

    #[test]
    fn test_pair_needs_distinct_trigger_objects() {
        let taus = vec![Candidate::new(40.0, 0.0, 0.0), Candidate::new(40.0, 0.0, 2.0)];
        let pairs = candidate_pairs(&taus, None, 0.5);
        let ladder = WorkingPointLadder::new();
        let objects = tau_objects(&[(0.0, 0.0), (0.0, 2.0)]);

        let same = vec![matched(&[0]), matched(&[0])];
        let summary = PairSummary::evaluate(
            PairRule::Double,
            &pairs,
            (&taus, &taus),
            (&same, &same),
            PairObjects::new(&objects, 0.3),
            MatchOutcome::Matches(0),
            &ladder,
        );
        assert_eq!(summary.selected, 1);
        assert_eq!(summary.both_matched, 1);
        assert_eq!(summary.outcome, MatchOutcome::Matches(0));

        let distinct = vec![matched(&[0]), matched(&[1])];
        let summary = PairSummary::evaluate(
            PairRule::Double,
            &pairs,
            (&taus, &taus),
            (&distinct, &distinct),
            PairObjects::new(&objects, 0.3),
            MatchOutcome::Matches(0),
            &ladder,
        );
        assert_eq!(summary.outcome, MatchOutcome::Matches(1));
        assert_eq!(summary.by_working_point, vec![1]);
    }

    #[test]
    fn test_non_match_codes_propagate() {
        let ladder = WorkingPointLadder::new().with_point("medium", 8);
        let summary = PairSummary::evaluate(
            PairRule::Cross,
            &[],
            (&[], &[]),
            (&[], &[]),
            PairObjects::new(&[], 0.3),
            MatchOutcome::NoTriggerObject,
            &ladder,
        );
        assert_eq!(summary.outcome, MatchOutcome::NoTriggerObject);
        assert_eq!(summary.by_working_point, vec![-1, -1]);
    }

    #[test]
    fn test_working_points_on_pairs() {
        let ladder = WorkingPointLadder::new().with_point("medium", 8);
        let muons = vec![Candidate::new(25.0, 0.0, 0.0)];
        let taus = vec![
            Candidate::new(40.0, 0.0, 2.0).with_id(16),
            Candidate::new(40.0, 2.0, 0.0).with_id(2),
        ];
        let pairs = candidate_pairs(&muons, Some(taus.as_slice()), 0.5);
        let mu_matches = vec![matched(&[0])];
        let tau_matches = vec![matched(&[1]), matched(&[2])];
        let objects = tau_objects(&[(0.0, 0.0), (0.0, 2.0), (2.0, 0.0)]);

        let summary = PairSummary::evaluate(
            PairRule::Cross,
            &pairs,
            (&muons, &taus),
            (&mu_matches, &tau_matches),
            PairObjects::new(&objects, 0.3),
            MatchOutcome::Matches(0),
            &ladder,
        );
        assert_eq!(summary.outcome, MatchOutcome::Matches(2));
        assert_eq!(summary.by_working_point, vec![2, 1]);
    }

    #[test]
    fn test_cross_pair_needs_separated_trigger_objects() {
        let ladder = WorkingPointLadder::new();
        let muons = vec![Candidate::new(25.0, 0.0, 0.0)];
        let taus = vec![Candidate::new(40.0, 0.0, 1.0)];
        let pairs = candidate_pairs(&muons, Some(taus.as_slice()), 0.5);
        let mu_matches = vec![matched(&[0])];
        let tau_matches = vec![matched(&[1])];

        // Muon object matched at the muon, tau object next to it.
        let objects = vec![
            TriggerObject::new(ObjectKind::Muon, 0.0, 0.25, 2),
            TriggerObject::new(ObjectKind::Tau, 0.0, 0.45, 1),
        ];
        let evaluate = |min_separation| {
            PairSummary::evaluate(
                PairRule::Cross,
                &pairs,
                (&muons, &taus),
                (&mu_matches, &tau_matches),
                PairObjects::new(&objects, min_separation),
                MatchOutcome::Matches(0),
                &ladder,
            )
        };

        let summary = evaluate(0.3);
        assert_eq!(summary.both_matched, 1);
        assert_eq!(summary.outcome, MatchOutcome::Matches(0));
        assert_eq!(evaluate(0.0).outcome, MatchOutcome::Matches(1));
    }

    #[test]
    fn test_pair_baseline() {
        use MatchOutcome::*;
        assert_eq!(pair_baseline(NotFired, NotFired), NotFired);
        assert_eq!(pair_baseline(Matches(0), NoTriggerObject), NoTriggerObject);
        assert_eq!(pair_baseline(Matches(0), Matches(0)), Matches(0));
    }
}
