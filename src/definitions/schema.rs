//! Raw shape of a trigger definition document.
//!
//! These structs mirror the JSON one to one and carry no validation beyond
//! what serde enforces (types, required keys). The typed tables in the
//! sibling modules are built from them and do the cross-reference checks.
//!
//! ## Document Layout
//!
//! ```json
//! {
//!   "year": 2018,
//!   "filterbits": { "Tau": { "LooseChargedIso": 1, "OverlapFilterIsoMu": 256 } },
//!   "hltpaths": {
//!     "HLT_IsoMu20_..._CrossL1": {
//!       "filter": "hltHpsOverlapFilterIsoMu20...",
//!       "runrange": [317509, 325175],
//!       "Muon": { "ptmin": 21, "etamax": 2.1, "filterbits": ["IsoMu"] },
//!       "Tau":  { "ptmin": 32, "etamax": 2.1, "filterbits": ["LooseChargedIso", "OverlapFilterIsoMu"] }
//!     }
//!   },
//!   "hltcombs": { "data": { "mutau": ["HLT_IsoMu20_..._CrossL1"] }, "mc": { ... } }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionFile {
    /// Data-taking year, informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    /// Object-type key → filter shorthand → bit.
    pub filterbits: BTreeMap<String, BTreeMap<String, i64>>,

    /// Path name → path entry.
    pub hltpaths: BTreeMap<String, RawPath>,

    /// Data-type key → channel name → ordered path names.
    pub hltcombs: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// One `hltpaths` entry.
///
/// Any key other than `filter`, `runrange` and `double` is an object-type
/// key holding a leg.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPath {
    /// Last filter of the path (documentary only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Inclusive `[first, last]` run range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runrange: Option<[u32; 2]>,

    /// Overrides the double-object classification of single-leg paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double: Option<bool>,

    /// Object-type key → leg.
    #[serde(flatten)]
    pub legs: BTreeMap<String, RawLeg>,
}

/// One leg of a path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLeg {
    /// Offline pT threshold; older documents call it `ptcut`.
    #[serde(default, alias = "ptcut", skip_serializing_if = "Option::is_none")]
    pub ptmin: Option<f64>,

    /// Offline |η| threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etamax: Option<f64>,

    /// Filter shorthands that must all be satisfied.
    pub filterbits: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_with_legs() {
        let json = r#"{
            "filter": "hltFoo",
            "runrange": [100, 200],
            "Electron": {"ptcut": 25, "filterbits": ["WPTight"]},
            "Tau": {"ptmin": 30, "etamax": 2.1, "filterbits": ["Loose", "OverlapEle"]}
        }"#;
        let path: RawPath = serde_json::from_str(json).unwrap();

        assert_eq!(path.filter.as_deref(), Some("hltFoo"));
        assert_eq!(path.runrange, Some([100, 200]));
        assert_eq!(path.double, None);
        assert_eq!(path.legs.len(), 2);
        assert_eq!(path.legs["Electron"].ptmin, Some(25.0));
        assert_eq!(path.legs["Tau"].etamax, Some(2.1));
        assert_eq!(path.legs["Tau"].filterbits, vec!["Loose", "OverlapEle"]);
    }

    #[test]
    fn test_missing_required_key_fails() {
        let json = r#"{"filterbits": {}, "hltpaths": {}}"#;
        let result: Result<DefinitionFile, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_integer_bit_fails() {
        let json = r#"{"filterbits": {"Tau": {"A": "one"}}, "hltpaths": {}, "hltcombs": {}}"#;
        let result: Result<DefinitionFile, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
