//! Trigger paths and their legs.
//!
//! A path is a named trigger decision with one or two legs. Each leg names
//! an object kind, the combined filter-bit requirement a trigger object of
//! that kind must carry, and offline pT/|η| thresholds for the
//! reconstructed candidate.
//!
//! ## Classification
//!
//! - **Single**: one leg.
//! - **Double**: one leg that must be satisfied by two distinct objects
//!   (ditau, double muon, ...). Detected from a `Double` in the path name
//!   unless the document says otherwise.
//! - **Cross**: two legs of different kinds (electron-tau, muon-tau).
//!
//! A path declares each object kind at most once, so the two legs of a
//! cross trigger always differ in kind.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::core::{Candidate, ObjectKind};
use crate::error::{Result, TriggerError};

use super::filter_bits::FilterBitTable;
use super::schema::RawPath;

/// Leg slot of a path or channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LegIndex {
    /// Leg 1 (the lighter object kind of a cross trigger).
    First,
    /// Leg 2.
    Second,
}

impl LegIndex {
    /// Both slots in order.
    pub const BOTH: [LegIndex; 2] = [LegIndex::First, LegIndex::Second];

    /// Map 1 or 2 to a slot.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            _ => None,
        }
    }

    /// 1 or 2.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

impl std::fmt::Display for LegIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "leg{}", self.number())
    }
}

/// Inclusive run interval during which a path existed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunRange {
    pub first: u32,
    pub last: u32,
}

impl RunRange {
    /// Create a range. Panics if `first > last`.
    #[must_use]
    pub fn new(first: u32, last: u32) -> Self {
        assert!(first <= last, "Run range must not be reversed");
        Self { first, last }
    }

    /// Is `run` inside the range (both ends included)?
    #[must_use]
    pub const fn contains(&self, run: u32) -> bool {
        self.first <= run && run <= self.last
    }
}

impl std::fmt::Display for RunRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}

/// One leg of a trigger path.
#[derive(Clone, Debug, PartialEq)]
pub struct LegSpec {
    /// Object kind of this leg.
    pub object: ObjectKind,

    /// Filter shorthands, as written in the document.
    pub filters: Vec<String>,

    /// OR of the filter bits.
    pub bits: u32,

    /// Offline pT threshold (inclusive).
    pub pt_min: f64,

    /// Offline |η| threshold (inclusive).
    pub eta_max: f64,
}

impl LegSpec {
    /// Create a leg with a raw requirement mask and no offline cuts.
    pub fn new(object: ObjectKind, bits: u32) -> Self {
        Self {
            object,
            filters: Vec::new(),
            bits,
            pt_min: 0.0,
            eta_max: f64::INFINITY,
        }
    }

    /// Set the pT threshold (builder pattern).
    #[must_use]
    pub fn with_pt_min(mut self, pt_min: f64) -> Self {
        self.pt_min = pt_min;
        self
    }

    /// Set the |η| threshold (builder pattern).
    #[must_use]
    pub fn with_eta_max(mut self, eta_max: f64) -> Self {
        self.eta_max = eta_max;
        self
    }

    /// Does an observed mask carry every required bit?
    ///
    /// Extra bits are fine: a trigger object usually passes several
    /// unrelated filters at once.
    ///
    /// ```
    /// use hlt_match::core::ObjectKind;
    /// use hlt_match::definitions::LegSpec;
    ///
    /// let leg = LegSpec::new(ObjectKind::Tau, 0b011);
    /// assert!(leg.has_bits(0b111));
    /// assert!(!leg.has_bits(0b101));
    /// ```
    #[must_use]
    pub const fn has_bits(&self, observed: u32) -> bool {
        observed & self.bits == self.bits
    }

    /// Does a reconstructed candidate pass the offline thresholds?
    #[must_use]
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        candidate.pt >= self.pt_min && candidate.eta.abs() <= self.eta_max
    }
}

/// Leg structure of a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// One leg, one object.
    Single,
    /// One leg, two distinct objects.
    Double,
    /// Two legs of different kinds.
    Cross,
}

impl PathKind {
    /// Does this path need two reconstructed objects?
    #[must_use]
    pub const fn is_pair(self) -> bool {
        matches!(self, Self::Double | Self::Cross)
    }
}

/// A trigger path.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerPath {
    /// Path name.
    pub name: String,

    /// Last filter of the path (documentary).
    pub filter: Option<String>,

    /// Runs in which the path existed (data only).
    pub run_range: Option<RunRange>,

    /// Legs ordered electron, muon, tau. Only cross triggers have a second.
    first: LegSpec,
    second: Option<LegSpec>,

    /// Leg structure.
    pub kind: PathKind,
}

impl TriggerPath {
    /// Create a single-object path.
    pub fn single(name: impl Into<String>, leg: LegSpec) -> Self {
        Self {
            name: name.into(),
            filter: None,
            run_range: None,
            first: leg,
            second: None,
            kind: PathKind::Single,
        }
    }

    /// Create a double-object path.
    pub fn double(name: impl Into<String>, leg: LegSpec) -> Self {
        Self {
            kind: PathKind::Double,
            ..Self::single(name, leg)
        }
    }

    /// Create a cross trigger. The legs are put in kind order.
    ///
    /// Panics if both legs have the same kind.
    pub fn cross(name: impl Into<String>, a: LegSpec, b: LegSpec) -> Self {
        assert!(a.object != b.object, "Cross trigger legs must differ in kind");
        let (first, second) = if a.object < b.object { (a, b) } else { (b, a) };
        Self {
            name: name.into(),
            filter: None,
            run_range: None,
            first,
            second: Some(second),
            kind: PathKind::Cross,
        }
    }

    /// Set the run range (builder pattern).
    #[must_use]
    pub fn with_run_range(mut self, first: u32, last: u32) -> Self {
        self.run_range = Some(RunRange::new(first, last));
        self
    }

    /// Set the documentary filter name (builder pattern).
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Build a path from its document entry.
    pub fn from_raw(name: &str, raw: &RawPath, table: &FilterBitTable) -> Result<Self> {
        let mut legs: SmallVec<[LegSpec; 2]> = SmallVec::new();
        for (key, raw_leg) in &raw.legs {
            let object = ObjectKind::from_key(key).ok_or_else(|| {
                TriggerError::schema(format!(
                    "path '{name}' has unknown key '{key}' (expected filter, runrange, double or an object type)"
                ))
            })?;
            if legs.iter().any(|l| l.object == object) {
                return Err(TriggerError::schema(format!(
                    "path '{name}' declares the {object} leg twice"
                )));
            }
            let bits = table.resolve(object, &raw_leg.filterbits, name)?;
            if bits == 0 {
                tracing::warn!(path = name, object = %object, "Leg has no filter bits; any trigger object of this kind qualifies");
            }
            legs.push(LegSpec {
                object,
                filters: raw_leg.filterbits.clone(),
                bits,
                pt_min: raw_leg.ptmin.unwrap_or(0.0),
                eta_max: raw_leg.etamax.unwrap_or(f64::INFINITY),
            });
        }
        legs.sort_by_key(|l| l.object);

        let count = legs.len();
        let mut legs = legs.into_iter();
        let (Some(leg1), leg2, None) = (legs.next(), legs.next(), legs.next()) else {
            return Err(TriggerError::schema(match count {
                0 => format!("path '{name}' has no legs"),
                n => format!("path '{name}' has {n} legs (at most 2 supported)"),
            }));
        };
        let kind = match leg2 {
            Some(_) => PathKind::Cross,
            None if raw.double.unwrap_or_else(|| name.contains("Double")) => PathKind::Double,
            None => PathKind::Single,
        };

        let run_range = match raw.runrange {
            Some([first, last]) if first > last => {
                return Err(TriggerError::schema(format!(
                    "path '{name}' has reversed run range [{first}, {last}]"
                )));
            }
            Some([first, last]) => Some(RunRange { first, last }),
            None => None,
        };

        Ok(Self {
            name: name.to_string(),
            filter: raw.filter.clone(),
            run_range,
            first: leg1,
            second: leg2,
            kind,
        })
    }

    /// The leg serving a slot.
    ///
    /// Single- and double-object paths serve their only leg in both slots.
    #[must_use]
    pub fn leg(&self, index: LegIndex) -> &LegSpec {
        match (index, &self.second) {
            (LegIndex::Second, Some(second)) => second,
            _ => &self.first,
        }
    }

    /// Distinct legs, ordered electron, muon, tau.
    pub fn legs(&self) -> impl Iterator<Item = &LegSpec> {
        std::iter::once(&self.first).chain(self.second.as_ref())
    }

    /// Is the path valid in `run`? Paths without a range always are.
    #[must_use]
    pub fn valid_in_run(&self, run: u32) -> bool {
        self.run_range.is_none_or(|r| r.contains(run))
    }
}

/// All paths of a definition document, by name.
#[derive(Clone, Debug, Default)]
pub struct TriggerPathCatalog {
    paths: BTreeMap<String, TriggerPath>,
}

impl TriggerPathCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from the document's `hltpaths` section.
    pub fn from_raw(raw: &BTreeMap<String, RawPath>, table: &FilterBitTable) -> Result<Self> {
        let mut catalog = Self::new();
        for (name, entry) in raw {
            catalog.register(TriggerPath::from_raw(name, entry, table)?);
        }
        Ok(catalog)
    }

    /// Register a path, replacing any path of the same name.
    pub fn register(&mut self, path: TriggerPath) {
        self.paths.insert(path.name.clone(), path);
    }

    /// Register a path (builder pattern).
    #[must_use]
    pub fn with_path(mut self, path: TriggerPath) -> Self {
        self.register(path);
        self
    }

    /// Look up a path.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TriggerPath> {
        self.paths.get(name)
    }

    /// Does the catalog hold this path?
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.paths.contains_key(name)
    }

    /// Path names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.paths.keys().cloned().collect()
    }

    /// Iterate over paths in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TriggerPath> {
        self.paths.values()
    }

    /// Number of paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Is the catalog empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FilterBitTable {
        FilterBitTable::new()
            .with_bit(ObjectKind::Tau, "A", 1)
            .with_bit(ObjectKind::Tau, "B", 2)
            .with_bit(ObjectKind::Muon, "IsoMu", 8)
            .with_bit(ObjectKind::Electron, "WPTight", 2)
    }

    fn raw(json: &str) -> RawPath {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_leg_index() {
        assert_eq!(LegIndex::from_number(1), Some(LegIndex::First));
        assert_eq!(LegIndex::from_number(3), None);
        assert_eq!(LegIndex::Second.number(), 2);
        assert_eq!(format!("{}", LegIndex::First), "leg1");
    }

    #[test]
    fn test_run_range_inclusive() {
        let range = RunRange::new(100, 200);
        assert!(range.contains(100));
        assert!(range.contains(200));
        assert!(!range.contains(99));
        assert!(!range.contains(201));
    }

    #[test]
    fn test_has_bits_superset() {
        let leg = LegSpec::new(ObjectKind::Tau, 3);
        assert!(leg.has_bits(3));
        assert!(leg.has_bits(3 | 64));
        assert!(!leg.has_bits(1));
        assert!(!leg.has_bits(1 | 64));
    }

    #[test]
    fn test_accepts_thresholds() {
        let leg = LegSpec::new(ObjectKind::Tau, 1).with_pt_min(40.0).with_eta_max(2.1);
        assert!(leg.accepts(&Candidate::new(45.0, -2.0, 0.0)));
        assert!(leg.accepts(&Candidate::new(40.0, 2.1, 0.0)));
        assert!(!leg.accepts(&Candidate::new(39.9, 0.0, 0.0)));
        assert!(!leg.accepts(&Candidate::new(45.0, 2.2, 0.0)));
    }

    #[test]
    fn test_single_leg_defaults() {
        let path = TriggerPath::from_raw(
            "HLT_X",
            &raw(r#"{"Tau": {"filterbits": ["A", "B"]}}"#),
            &table(),
        )
        .unwrap();

        assert_eq!(path.kind, PathKind::Single);
        let leg = path.leg(LegIndex::First);
        assert_eq!(leg.bits, 3);
        assert_eq!(leg.pt_min, 0.0);
        assert_eq!(leg.eta_max, f64::INFINITY);
        assert_eq!(path.leg(LegIndex::Second), leg);
        assert!(path.valid_in_run(1));
    }

    #[test]
    fn test_double_from_name_and_override() {
        let entry = raw(r#"{"Tau": {"ptcut": 35, "filterbits": ["B"]}}"#);
        let by_name = TriggerPath::from_raw("HLT_DoubleTau35", &entry, &table()).unwrap();
        assert_eq!(by_name.kind, PathKind::Double);
        assert_eq!(by_name.leg(LegIndex::First).pt_min, 35.0);

        let entry = raw(r#"{"double": false, "Tau": {"filterbits": ["B"]}}"#);
        let overridden = TriggerPath::from_raw("HLT_DoubleTau35", &entry, &table()).unwrap();
        assert_eq!(overridden.kind, PathKind::Single);

        let entry = raw(r#"{"double": true, "Tau": {"filterbits": ["B"]}}"#);
        let forced = TriggerPath::from_raw("HLT_DiTau35", &entry, &table()).unwrap();
        assert_eq!(forced.kind, PathKind::Double);
    }

    #[test]
    fn test_cross_legs_ordered_by_kind() {
        let entry = raw(
            r#"{"Tau": {"filterbits": ["A"]}, "Muon": {"ptmin": 21, "filterbits": ["IsoMu"]}}"#,
        );
        let path = TriggerPath::from_raw("HLT_IsoMu20_Tau27", &entry, &table()).unwrap();

        assert_eq!(path.kind, PathKind::Cross);
        assert_eq!(path.leg(LegIndex::First).object, ObjectKind::Muon);
        assert_eq!(path.leg(LegIndex::Second).object, ObjectKind::Tau);
        let kinds: Vec<ObjectKind> = path.legs().map(|l| l.object).collect();
        assert_eq!(kinds, vec![ObjectKind::Muon, ObjectKind::Tau]);
    }

    #[test]
    fn test_single_and_double_serve_one_leg() {
        let single = TriggerPath::single("HLT_IsoMu24", LegSpec::new(ObjectKind::Muon, 8));
        assert_eq!(single.legs().count(), 1);
        assert_eq!(single.leg(LegIndex::Second), single.leg(LegIndex::First));

        let double = TriggerPath::double("HLT_DoubleTau35", LegSpec::new(ObjectKind::Tau, 2));
        assert_eq!(double.legs().count(), 1);
        assert_eq!(double.leg(LegIndex::Second).bits, 2);
    }

    #[test]
    fn test_cross_builder_orders_legs() {
        let path = TriggerPath::cross(
            "HLT_Ele24_Tau30",
            LegSpec::new(ObjectKind::Tau, 1),
            LegSpec::new(ObjectKind::Electron, 2),
        );
        assert_eq!(path.leg(LegIndex::First).object, ObjectKind::Electron);
    }

    #[test]
    fn test_rejects_pathless_entries() {
        let err = TriggerPath::from_raw("HLT_Empty", &raw(r#"{"filter": "hltFoo"}"#), &table())
            .unwrap_err();
        assert!(err.to_string().contains("no legs"));
    }

    #[test]
    fn test_rejects_three_legs() {
        let entry = raw(
            r#"{"Tau": {"filterbits": []}, "Muon": {"filterbits": []}, "Electron": {"filterbits": []}}"#,
        );
        let err = TriggerPath::from_raw("HLT_Three", &entry, &table()).unwrap_err();
        assert!(err.to_string().contains("3 legs"));
    }

    #[test]
    fn test_rejects_unknown_leg_key() {
        let entry = raw(r#"{"Jet": {"filterbits": []}}"#);
        let err = TriggerPath::from_raw("HLT_PFJet", &entry, &table()).unwrap_err();
        assert!(matches!(err, TriggerError::Schema(_)));
    }

    #[test]
    fn test_unknown_filter_is_fatal() {
        let entry = raw(r#"{"Tau": {"filterbits": ["A", "Tight"]}}"#);
        let err = TriggerPath::from_raw("HLT_X", &entry, &table()).unwrap_err();
        assert!(matches!(err, TriggerError::UnknownFilter { ref filter, .. } if filter == "Tight"));
    }

    #[test]
    fn test_run_range() {
        let entry = raw(r#"{"runrange": [100, 200], "Tau": {"filterbits": ["A"]}}"#);
        let path = TriggerPath::from_raw("HLT_X", &entry, &table()).unwrap();
        assert_eq!(path.run_range, Some(RunRange::new(100, 200)));
        assert!(path.valid_in_run(150));
        assert!(!path.valid_in_run(250));

        let entry = raw(r#"{"runrange": [200, 100], "Tau": {"filterbits": ["A"]}}"#);
        assert!(TriggerPath::from_raw("HLT_X", &entry, &table()).is_err());
    }

    #[test]
    fn test_catalog() {
        let catalog = TriggerPathCatalog::new()
            .with_path(TriggerPath::single("HLT_B", LegSpec::new(ObjectKind::Muon, 8)))
            .with_path(TriggerPath::single("HLT_A", LegSpec::new(ObjectKind::Muon, 8)));

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("HLT_A"));
        assert!(catalog.get("HLT_C").is_none());
        assert_eq!(catalog.names(), vec!["HLT_A", "HLT_B"]);
    }
}
