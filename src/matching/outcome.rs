//! Match outcomes.
//!
//! The three ways a leg can fail to match are kept apart because they
//! point at different causes of an inefficiency: the trigger did not fire,
//! it fired without a trigger object carrying the leg's bits, or such
//! objects exist but none is close to the candidate.

use smallvec::SmallVec;

use crate::core::{delta_r, TriggerObject};

/// Result of matching one candidate (or one leg) against trigger objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    /// None of the combination's paths fired.
    NotFired,
    /// Paths fired, but no trigger object carries the leg's bits.
    NoTriggerObject,
    /// Number of qualifying trigger objects inside the cone (may be zero).
    Matches(u32),
}

impl MatchOutcome {
    /// Integer code: -2, -1, or the match count.
    ///
    /// ```
    /// use hlt_match::matching::MatchOutcome;
    ///
    /// assert_eq!(MatchOutcome::NotFired.code(), -2);
    /// assert_eq!(MatchOutcome::NoTriggerObject.code(), -1);
    /// assert_eq!(MatchOutcome::Matches(0).code(), 0);
    /// ```
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::NotFired => -2,
            Self::NoTriggerObject => -1,
            Self::Matches(n) => n as i64,
        }
    }

    /// Inverse of [`code`](Self::code).
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -2 => Some(Self::NotFired),
            -1 => Some(Self::NoTriggerObject),
            n => u32::try_from(n).ok().map(Self::Matches),
        }
    }

    /// Histogram bin label.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::NotFired => "HLT not fired".to_string(),
            Self::NoTriggerObject => "No trig. obj.".to_string(),
            Self::Matches(0) => "No match".to_string(),
            Self::Matches(1) => "1 match".to_string(),
            Self::Matches(n) => format!("{n} matches"),
        }
    }

    /// At least one trigger object in the cone.
    #[must_use]
    pub const fn is_matched(self) -> bool {
        matches!(self, Self::Matches(n) if n > 0)
    }

    /// Match count, zero for the two non-match states.
    #[must_use]
    pub const fn count(self) -> u32 {
        match self {
            Self::Matches(n) => n,
            _ => 0,
        }
    }
}

impl std::fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Outcome plus the trigger objects that produced it.
///
/// `objects` holds indices into the event's trigger-object collection; it
/// is empty unless the outcome is a positive match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegMatch {
    pub outcome: MatchOutcome,
    pub objects: SmallVec<[usize; 4]>,
}

impl LegMatch {
    /// An outcome with no matched objects.
    #[must_use]
    pub fn without_objects(outcome: MatchOutcome) -> Self {
        Self {
            outcome,
            objects: SmallVec::new(),
        }
    }

    /// Is the candidate matched?
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.outcome.is_matched()
    }

    /// Can this and `other` be served by two different trigger objects?
    #[must_use]
    pub fn distinct_from(&self, other: &LegMatch) -> bool {
        self.objects
            .iter()
            .any(|a| other.objects.iter().any(|b| a != b))
    }

    /// Can this and `other` be served by two different trigger objects at
    /// least `min_dr` apart?
    ///
    /// `objects` is the collection the indices refer to. Indices past its
    /// end never qualify.
    #[must_use]
    pub fn separated_from(
        &self,
        other: &LegMatch,
        objects: &[TriggerObject],
        min_dr: f64,
    ) -> bool {
        self.objects.iter().any(|&a| {
            other.objects.iter().any(|&b| {
                a != b
                    && matches!(
                        (objects.get(a), objects.get(b)),
                        (Some(x), Some(y)) if delta_r(x.eta, x.phi, y.eta, y.phi) >= min_dr
                    )
            })
        })
    }
}
