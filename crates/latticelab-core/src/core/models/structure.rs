use super::atom::Atom;
use super::bond::Bond;
use super::cloud::MetallicCloud;
use super::ids::AtomId;
use slotmap::SlotMap;

/// Anything that binds atoms together and is stepped once per frame.
#[derive(Debug, Clone)]
pub enum Structure {
    Bond(Bond),
    Cloud(MetallicCloud),
}

impl Structure {
    pub fn is_valid(&self, atoms: &SlotMap<AtomId, Atom>) -> bool {
        match self {
            Self::Bond(bond) => bond.is_valid(atoms),
            Self::Cloud(cloud) => cloud.is_valid(atoms),
        }
    }

    pub fn atom_ids(&self) -> Vec<AtomId> {
        match self {
            Self::Bond(bond) => vec![bond.atom1_id, bond.atom2_id],
            Self::Cloud(cloud) => cloud.atoms().to_vec(),
        }
    }

    pub fn as_bond(&self) -> Option<&Bond> {
        match self {
            Self::Bond(bond) => Some(bond),
            Self::Cloud(_) => None,
        }
    }

    pub fn as_bond_mut(&mut self) -> Option<&mut Bond> {
        match self {
            Self::Bond(bond) => Some(bond),
            Self::Cloud(_) => None,
        }
    }

    pub fn as_cloud(&self) -> Option<&MetallicCloud> {
        match self {
            Self::Cloud(cloud) => Some(cloud),
            Self::Bond(_) => None,
        }
    }

    pub fn as_cloud_mut(&mut self) -> Option<&mut MetallicCloud> {
        match self {
            Self::Cloud(cloud) => Some(cloud),
            Self::Bond(_) => None,
        }
    }
}
