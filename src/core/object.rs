//! Physics objects: trigger objects and reconstructed candidates.
//!
//! Both kinds of record are owned by the event and are read-only during
//! matching. Only their angular coordinates and integer bitmasks matter to
//! the matcher; everything else about them is the business of the
//! surrounding analysis.
//!
//! ## Angular Separation
//!
//! ```
//! use hlt_match::core::{delta_phi, delta_r};
//! use std::f64::consts::PI;
//!
//! // Δφ wraps into (-π, π]
//! assert!((delta_phi(PI - 0.1, -PI + 0.1) - (-0.2)).abs() < 1e-12);
//! assert!((delta_r(0.0, 0.0, 0.3, 0.4) - 0.5).abs() < 1e-12);
//! ```

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// Object types that can carry trigger legs.
///
/// The discriminant is the PDG-style identifier stored in trigger object
/// records. The declaration order (electron, muon, tau) is the leg order of
/// cross triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i32)]
pub enum ObjectKind {
    /// Electron (id 11).
    Electron = 11,
    /// Muon (id 13).
    Muon = 13,
    /// Hadronically decaying tau (id 15).
    Tau = 15,
}

impl ObjectKind {
    /// All supported kinds in leg order.
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Electron, ObjectKind::Muon, ObjectKind::Tau];

    /// The trigger-object identifier for this kind.
    #[must_use]
    pub const fn pdg_id(self) -> i32 {
        self as i32
    }

    /// Map a trigger-object identifier to a kind.
    ///
    /// Identifiers of other collections (jets, photons, MET, ...) return `None`.
    #[must_use]
    pub fn from_pdg_id(id: i32) -> Option<Self> {
        match id.abs() {
            11 => Some(Self::Electron),
            13 => Some(Self::Muon),
            15 => Some(Self::Tau),
            _ => None,
        }
    }

    /// Parse an object-type key from a definition document.
    ///
    /// Accepts the collection names (`Electron`, `Muon`, `Tau`) in any case,
    /// plus the `ele` and `mu` shorthands.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "electron" | "ele" => Some(Self::Electron),
            "muon" | "mu" => Some(Self::Muon),
            "tau" => Some(Self::Tau),
            _ => None,
        }
    }

    /// Collection name of this kind.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Electron => "Electron",
            Self::Muon => "Muon",
            Self::Tau => "Tau",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

/// Azimuthal difference wrapped into (-π, π].
#[must_use]
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let mut dphi = (phi1 - phi2) % TAU;
    if dphi > PI {
        dphi -= TAU;
    } else if dphi <= -PI {
        dphi += TAU;
    }
    dphi
}

/// Angular separation ΔR = sqrt(Δη² + Δφ²).
#[must_use]
pub fn delta_r(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    let deta = eta1 - eta2;
    let dphi = delta_phi(phi1, phi2);
    (deta * deta + dphi * dphi).sqrt()
}

/// A trigger-level object recorded in the event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerObject {
    /// Object-type identifier (11, 13, 15, or anything else for other collections).
    pub id: i32,

    /// Transverse momentum.
    #[serde(default)]
    pub pt: f64,

    /// Pseudorapidity.
    pub eta: f64,

    /// Azimuthal angle.
    pub phi: f64,

    /// Filter bits satisfied by this object in this event.
    pub filter_bits: u32,
}

impl TriggerObject {
    /// Create a trigger object of a supported kind.
    pub fn new(kind: ObjectKind, eta: f64, phi: f64, filter_bits: u32) -> Self {
        Self {
            id: kind.pdg_id(),
            pt: 0.0,
            eta,
            phi,
            filter_bits,
        }
    }

    /// Set the transverse momentum (builder pattern).
    #[must_use]
    pub fn with_pt(mut self, pt: f64) -> Self {
        self.pt = pt;
        self
    }

    /// The kind of this object, if it is one the matcher knows about.
    #[must_use]
    pub fn kind(&self) -> Option<ObjectKind> {
        ObjectKind::from_pdg_id(self.id)
    }

    /// Angular separation to a reconstructed candidate.
    #[must_use]
    pub fn delta_r(&self, candidate: &Candidate) -> f64 {
        delta_r(self.eta, self.phi, candidate.eta, candidate.phi)
    }
}

/// A reconstructed (offline) object offered for matching.
///
/// `id` holds the object-ID value the analysis selected on; it is compared
/// against working-point thresholds and is otherwise opaque.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Transverse momentum.
    pub pt: f64,

    /// Pseudorapidity.
    pub eta: f64,

    /// Azimuthal angle.
    pub phi: f64,

    /// Object-ID value.
    #[serde(default)]
    pub id: u32,
}

impl Candidate {
    /// Create a candidate.
    pub fn new(pt: f64, eta: f64, phi: f64) -> Self {
        Self { pt, eta, phi, id: 0 }
    }

    /// Set the object-ID value (builder pattern).
    #[must_use]
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Angular separation to another candidate.
    #[must_use]
    pub fn delta_r(&self, other: &Candidate) -> f64 {
        delta_r(self.eta, self.phi, other.eta, other.phi)
    }
}

/// Reconstructed candidates of one event, grouped by kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoObjects {
    #[serde(default)]
    pub electrons: Vec<Candidate>,
    #[serde(default)]
    pub muons: Vec<Candidate>,
    #[serde(default)]
    pub taus: Vec<Candidate>,
}

impl RecoObjects {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate of the given kind (builder pattern).
    #[must_use]
    pub fn with(mut self, kind: ObjectKind, candidate: Candidate) -> Self {
        self.of_mut(kind).push(candidate);
        self
    }

    /// Candidates of one kind.
    #[must_use]
    pub fn of(&self, kind: ObjectKind) -> &[Candidate] {
        match kind {
            ObjectKind::Electron => &self.electrons,
            ObjectKind::Muon => &self.muons,
            ObjectKind::Tau => &self.taus,
        }
    }

    fn of_mut(&mut self, kind: ObjectKind) -> &mut Vec<Candidate> {
        match kind {
            ObjectKind::Electron => &mut self.electrons,
            ObjectKind::Muon => &mut self.muons,
            ObjectKind::Tau => &mut self.taus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_kind_ids() {
        assert_eq!(ObjectKind::Tau.pdg_id(), 15);
        assert_eq!(ObjectKind::from_pdg_id(-13), Some(ObjectKind::Muon));
        assert_eq!(ObjectKind::from_pdg_id(22), None);
        assert_eq!(format!("{}", ObjectKind::Electron), "Electron");
    }

    #[test]
    fn test_object_kind_keys() {
        assert_eq!(ObjectKind::from_key("Tau"), Some(ObjectKind::Tau));
        assert_eq!(ObjectKind::from_key("ele"), Some(ObjectKind::Electron));
        assert_eq!(ObjectKind::from_key("MUON"), Some(ObjectKind::Muon));
        assert_eq!(ObjectKind::from_key("Jet"), None);
    }

    #[test]
    fn test_leg_order() {
        assert!(ObjectKind::Electron < ObjectKind::Muon);
        assert!(ObjectKind::Muon < ObjectKind::Tau);
    }

    #[test]
    fn test_delta_phi_wraps() {
        assert!((delta_phi(0.5, 0.2) - 0.3).abs() < 1e-12);
        assert!((delta_phi(3.0, -3.0) - (6.0 - TAU)).abs() < 1e-12);
        assert!((delta_phi(-3.0, 3.0) - (TAU - 6.0)).abs() < 1e-12);
        // -π maps to +π
        assert!((delta_phi(0.0, PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_delta_r() {
        let trig = TriggerObject::new(ObjectKind::Tau, 0.1, 0.2, 3);
        let reco = Candidate::new(45.0, 0.12, 0.18);
        let dr = trig.delta_r(&reco);
        assert!((dr - (0.02f64 * 0.02 * 2.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_reco_objects_by_kind() {
        let reco = RecoObjects::new()
            .with(ObjectKind::Tau, Candidate::new(40.0, 0.0, 0.0))
            .with(ObjectKind::Tau, Candidate::new(30.0, 1.0, 1.0))
            .with(ObjectKind::Muon, Candidate::new(25.0, 0.0, 2.0));

        assert_eq!(reco.of(ObjectKind::Tau).len(), 2);
        assert_eq!(reco.of(ObjectKind::Muon).len(), 1);
        assert!(reco.of(ObjectKind::Electron).is_empty());
    }

    #[test]
    fn test_trigger_object_serialization() {
        let json = r#"{"id": 15, "eta": 0.1, "phi": 0.2, "filter_bits": 3}"#;
        let obj: TriggerObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.kind(), Some(ObjectKind::Tau));
        assert_eq!(obj.filter_bits, 3);
        assert_eq!(obj.pt, 0.0);
    }
}
