use super::atom::Atom;
use super::element::ElementProperties;
use super::ids::{AtomId, StructureId};
use crate::core::forcefield::potentials::{self, MIN_SEPARATION};
use slotmap::SlotMap;
use std::fmt;

/// Rest lengths are clamped into this range (world units).
pub const BOND_LENGTH_RANGE: (f64, f64) = (0.5, 8.0);
/// Picometers per world unit.
pub const PM_PER_UNIT: f64 = 100.0;
/// Spring constant given to bonds inside a generated lattice.
pub const STIFFENED_SPRING_CONSTANT: f64 = 0.3;

/// Classification of a pairwise connection, fixed at construction from the
/// electronegativity difference of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondType {
    /// 0 <= delta-chi < 0.5
    Covalent,
    /// 0.5 <= delta-chi < 1.7
    PolarCovalent,
    /// delta-chi >= 1.7
    Ionic,
    /// Same-element pair of metals. Normally represented by a metallic cloud.
    Metallic,
    /// Homoatomic bond inside a non-metallic lattice.
    Crystal,
}

impl BondType {
    pub fn classify(a: &ElementProperties, b: &ElementProperties) -> Self {
        if a.number == b.number && a.is_metal() {
            return Self::Metallic;
        }
        let delta = (a.electronegativity - b.electronegativity).abs();
        if delta < 0.5 {
            Self::Covalent
        } else if delta < 1.7 {
            Self::PolarCovalent
        } else {
            Self::Ionic
        }
    }

    pub fn spring_constant(&self) -> f64 {
        match self {
            Self::Covalent => 0.12,
            Self::PolarCovalent => 0.1,
            Self::Ionic => 0.08,
            Self::Metallic => 0.06,
            Self::Crystal => 0.2,
        }
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Covalent => "Covalent",
                Self::PolarCovalent => "Polar Covalent",
                Self::Ionic => "Ionic",
                Self::Metallic => "Metallic",
                Self::Crystal => "Crystal",
            }
        )
    }
}

/// A spring between two atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub atom1_id: AtomId,
    pub atom2_id: AtomId,
    pub bond_type: BondType,
    /// Rest length in world units.
    pub target_dist: f64,
    pub spring_constant: f64,
    pub visible: bool,
}

impl Bond {
    /// Builds a bond between two atoms. Registration on the atoms happens in
    /// [`Bond::attach`] once the bond has an id.
    pub fn new(atom1_id: AtomId, atom1: &Atom, atom2_id: AtomId, atom2: &Atom) -> Self {
        let bond_type = BondType::classify(&atom1.element, &atom2.element);
        Self {
            atom1_id,
            atom2_id,
            bond_type,
            target_dist: rest_length(&atom1.element, &atom2.element),
            spring_constant: bond_type.spring_constant(),
            visible: true,
        }
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atom1_id == atom_id || self.atom2_id == atom_id
    }

    /// The endpoint opposite `atom_id`, or `None` if it is not an endpoint.
    pub fn other(&self, atom_id: AtomId) -> Option<AtomId> {
        if self.atom1_id == atom_id {
            Some(self.atom2_id)
        } else if self.atom2_id == atom_id {
            Some(self.atom1_id)
        } else {
            None
        }
    }

    pub fn connects(&self, a: AtomId, b: AtomId) -> bool {
        (self.atom1_id == a && self.atom2_id == b) || (self.atom1_id == b && self.atom2_id == a)
    }

    pub fn is_valid(&self, atoms: &SlotMap<AtomId, Atom>) -> bool {
        atoms.contains_key(self.atom1_id) && atoms.contains_key(self.atom2_id)
    }

    /// Registers `id` on both endpoints and takes one valence electron from each.
    pub fn attach(&self, id: StructureId, atoms: &mut SlotMap<AtomId, Atom>) {
        for atom_id in [self.atom1_id, self.atom2_id] {
            if let Some(atom) = atoms.get_mut(atom_id) {
                atom.bonds.push(id);
                atom.consume_valence_electrons(1);
            }
        }
    }

    /// Removes `id` from whichever endpoints are still live.
    pub fn detach(&self, id: StructureId, atoms: &mut SlotMap<AtomId, Atom>) {
        for atom_id in [self.atom1_id, self.atom2_id] {
            if let Some(atom) = atoms.get_mut(atom_id) {
                let before = atom.bonds.len();
                atom.bonds.retain(|&b| b != id);
                if atom.bonds.len() < before {
                    atom.release_valence_electrons(1);
                }
            }
        }
    }

    /// Applies the undamped Hookean spring force to both endpoints.
    pub fn update(&self, atoms: &mut SlotMap<AtomId, Atom>, spring_multiplier: f64) {
        let (Some(a), Some(b)) = (atoms.get(self.atom1_id), atoms.get(self.atom2_id)) else {
            return;
        };
        let delta = b.position - a.position;
        let length = delta.norm();
        if length < MIN_SEPARATION {
            return;
        }
        let magnitude =
            potentials::hooke(length, self.target_dist, self.spring_constant) * spring_multiplier;
        let force = delta / length * magnitude;

        if let Some(a) = atoms.get_mut(self.atom1_id) {
            a.apply_force(force);
        }
        if let Some(b) = atoms.get_mut(self.atom2_id) {
            b.apply_force(-force);
        }
    }

    /// Reclassifies a homoatomic covalent bond as a lattice bond.
    pub fn set_crystal_type(&mut self) {
        if self.bond_type == BondType::Covalent {
            self.bond_type = BondType::Crystal;
            self.spring_constant = self.spring_constant.max(BondType::Crystal.spring_constant());
        }
    }

    pub fn stiffen(&mut self) {
        self.spring_constant = self.spring_constant.max(STIFFENED_SPRING_CONSTANT);
    }
}

/// Rest length from the covalent-radius sum, converted to world units.
pub fn rest_length(a: &ElementProperties, b: &ElementProperties) -> f64 {
    let (lo, hi) = BOND_LENGTH_RANGE;
    ((a.covalent_radius_pm() + b.covalent_radius_pm()) / PM_PER_UNIT).clamp(lo, hi)
}
