//! Filter-bit table.
//!
//! Per object kind, a mapping from filter shorthand to the bit that trigger
//! objects set when they pass that filter. Bits must be positive and
//! distinct within a kind. Powers of two are the convention but are not
//! enforced, since some legacy tables predate it.

use std::collections::BTreeMap;

use crate::core::ObjectKind;
use crate::error::{Result, TriggerError};

/// Filter shorthand → bit, per object kind.
///
/// ## Example
///
/// ```
/// use hlt_match::core::ObjectKind;
/// use hlt_match::definitions::FilterBitTable;
///
/// let table = FilterBitTable::new()
///     .with_bit(ObjectKind::Tau, "LooseChargedIso", 1)
///     .with_bit(ObjectKind::Tau, "OverlapFilterIsoMu", 256);
///
/// assert_eq!(table.bit_of(ObjectKind::Tau, "OverlapFilterIsoMu"), Some(256));
/// assert_eq!(table.bit_of(ObjectKind::Muon, "OverlapFilterIsoMu"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterBitTable {
    bits: BTreeMap<ObjectKind, BTreeMap<String, u32>>,
}

impl FilterBitTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from the document's `filterbits` section.
    pub fn from_raw(raw: &BTreeMap<String, BTreeMap<String, i64>>) -> Result<Self> {
        let mut table = Self::new();
        for (key, filters) in raw {
            let kind = ObjectKind::from_key(key).ok_or_else(|| {
                TriggerError::schema(format!(
                    "unknown object type '{key}' in filterbits (expected Electron, Muon or Tau)"
                ))
            })?;
            if table.bits.contains_key(&kind) {
                return Err(TriggerError::schema(format!(
                    "object type {kind} appears twice in filterbits (as '{key}')"
                )));
            }
            table.bits.insert(kind, BTreeMap::new());

            for (name, &value) in filters {
                let bit = u32::try_from(value).ok().filter(|&b| b > 0).ok_or_else(|| {
                    TriggerError::schema(format!(
                        "filter bit {kind}/{name} = {value} is not a positive 32-bit integer"
                    ))
                })?;
                table.insert(kind, name, bit)?;
            }
        }
        Ok(table)
    }

    /// Register a filter bit.
    ///
    /// Fails if the name is taken or another filter of the same kind
    /// already uses the bit.
    pub fn insert(&mut self, kind: ObjectKind, name: &str, bit: u32) -> Result<()> {
        if bit == 0 {
            return Err(TriggerError::schema(format!(
                "filter bit {kind}/{name} must be positive"
            )));
        }
        let filters = self.bits.entry(kind).or_default();
        if filters.contains_key(name) {
            return Err(TriggerError::schema(format!(
                "filter {kind}/{name} defined twice"
            )));
        }
        if let Some((other, _)) = filters.iter().find(|(_, &b)| b == bit) {
            return Err(TriggerError::schema(format!(
                "filters {kind}/{other} and {kind}/{name} share bit {bit}"
            )));
        }
        filters.insert(name.to_string(), bit);
        Ok(())
    }

    /// Register a filter bit (builder pattern).
    ///
    /// Panics on a duplicate name or bit.
    #[must_use]
    pub fn with_bit(mut self, kind: ObjectKind, name: &str, bit: u32) -> Self {
        if let Err(e) = self.insert(kind, name, bit) {
            panic!("{e}");
        }
        self
    }

    /// Bit of a filter, if registered.
    #[must_use]
    pub fn bit_of(&self, kind: ObjectKind, name: &str) -> Option<u32> {
        self.bits.get(&kind)?.get(name).copied()
    }

    /// Combine named filters into one requirement mask for a leg of `path`.
    ///
    /// Every name must be registered for `kind`; the first unknown one
    /// fails with the sorted list of valid names.
    pub fn resolve(&self, kind: ObjectKind, names: &[String], path: &str) -> Result<u32> {
        let mut mask = 0u32;
        let mut sum = 0u64;
        for name in names {
            let bit = self.bit_of(kind, name).ok_or_else(|| TriggerError::UnknownFilter {
                object: kind.to_string(),
                filter: name.clone(),
                path: path.to_string(),
                available: self.names(kind),
            })?;
            mask |= bit;
            sum += u64::from(bit);
        }
        if sum != u64::from(mask) {
            tracing::warn!(
                path,
                object = %kind,
                mask,
                sum,
                "Leg filter bits overlap; using bitwise OR"
            );
        }
        Ok(mask)
    }

    /// Registered filter names of a kind, sorted.
    #[must_use]
    pub fn names(&self, kind: ObjectKind) -> Vec<String> {
        self.bits
            .get(&kind)
            .map(|filters| filters.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Filters of a kind as `(name, bit)`, ordered by bit.
    #[must_use]
    pub fn filters(&self, kind: ObjectKind) -> Vec<(&str, u32)> {
        let mut filters: Vec<_> = self
            .bits
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|(name, &bit)| (name.as_str(), bit))
            .collect();
        filters.sort_by_key(|&(_, bit)| bit);
        filters
    }

    /// Object kinds with at least one table entry.
    pub fn kinds(&self) -> impl Iterator<Item = ObjectKind> + '_ {
        self.bits.keys().copied()
    }

    /// Total number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.values().map(BTreeMap::len).sum()
    }

    /// Is the table empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entries: &[(&str, &[(&str, i64)])]) -> BTreeMap<String, BTreeMap<String, i64>> {
        entries
            .iter()
            .map(|(kind, filters)| {
                (
                    kind.to_string(),
                    filters.iter().map(|(n, b)| (n.to_string(), *b)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_from_raw() {
        let table = FilterBitTable::from_raw(&raw(&[
            ("Tau", &[("A", 1), ("B", 2)]),
            ("mu", &[("IsoMu", 2)]),
        ]))
        .unwrap();

        assert_eq!(table.bit_of(ObjectKind::Tau, "B"), Some(2));
        assert_eq!(table.bit_of(ObjectKind::Muon, "IsoMu"), Some(2));
        assert_eq!(table.len(), 3);
        assert_eq!(table.kinds().collect::<Vec<_>>(), vec![ObjectKind::Muon, ObjectKind::Tau]);
    }

    #[test]
    fn test_rejects_unknown_object_type() {
        let err = FilterBitTable::from_raw(&raw(&[("Jet", &[("A", 1)])])).unwrap_err();
        assert!(matches!(err, TriggerError::Schema(_)));
        assert!(err.to_string().contains("Jet"));
    }

    #[test]
    fn test_rejects_non_positive_bit() {
        for bad in [0, -4, i64::from(u32::MAX) + 1] {
            let err = FilterBitTable::from_raw(&raw(&[("Tau", &[("A", bad)])])).unwrap_err();
            assert!(matches!(err, TriggerError::Schema(_)), "bit {bad} accepted");
        }
    }

    #[test]
    fn test_rejects_shared_bit() {
        let err = FilterBitTable::from_raw(&raw(&[("Tau", &[("A", 4), ("B", 4)])])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Tau/A"));
        assert!(message.contains("Tau/B"));
    }

    #[test]
    fn test_rejects_aliased_object_type() {
        let err = FilterBitTable::from_raw(&raw(&[("Tau", &[("A", 1)]), ("tau", &[("B", 2)])]))
            .unwrap_err();
        assert!(matches!(err, TriggerError::Schema(_)));
    }

    #[test]
    fn test_same_bit_across_kinds_is_fine() {
        let table = FilterBitTable::new()
            .with_bit(ObjectKind::Electron, "WPTight", 2)
            .with_bit(ObjectKind::Tau, "MediumChargedIso", 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_resolve_ors_bits() {
        let table = FilterBitTable::new()
            .with_bit(ObjectKind::Tau, "A", 1)
            .with_bit(ObjectKind::Tau, "B", 2)
            .with_bit(ObjectKind::Tau, "C", 64);

        let names = vec!["A".to_string(), "C".to_string()];
        assert_eq!(table.resolve(ObjectKind::Tau, &names, "HLT_X").unwrap(), 65);
        assert_eq!(table.resolve(ObjectKind::Tau, &[], "HLT_X").unwrap(), 0);
    }

    #[test]
    fn test_resolve_unknown_filter() {
        let table = FilterBitTable::new()
            .with_bit(ObjectKind::Tau, "B", 2)
            .with_bit(ObjectKind::Tau, "A", 1);

        let err = table
            .resolve(ObjectKind::Tau, &["Tight".to_string()], "HLT_X")
            .unwrap_err();
        match err {
            TriggerError::UnknownFilter { filter, path, available, .. } => {
                assert_eq!(filter, "Tight");
                assert_eq!(path, "HLT_X");
                assert_eq!(available, vec!["A", "B"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_filters_ordered_by_bit() {
        let table = FilterBitTable::new()
            .with_bit(ObjectKind::Tau, "Z", 1)
            .with_bit(ObjectKind::Tau, "A", 8);
        assert_eq!(table.filters(ObjectKind::Tau), vec![("Z", 1), ("A", 8)]);
        assert!(table.filters(ObjectKind::Muon).is_empty());
    }

    #[test]
    #[should_panic(expected = "share bit")]
    fn test_with_bit_panics_on_duplicate() {
        let _ = FilterBitTable::new()
            .with_bit(ObjectKind::Tau, "A", 1)
            .with_bit(ObjectKind::Tau, "B", 1);
    }
}
