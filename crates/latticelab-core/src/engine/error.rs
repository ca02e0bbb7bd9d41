use crate::core::models::ids::{AtomId, StructureId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Unknown element symbol: '{0}'")]
    UnknownElement(String),

    #[error("Atom not found: {0:?}")]
    AtomNotFound(AtomId),

    #[error("Structure not found: {0:?}")]
    StructureNotFound(StructureId),

    #[error("Operation requires at least {required} atoms, got {found}")]
    InsufficientAtoms { required: usize, found: usize },

    #[error("Atom {0:?} has no free valence for another bond")]
    ValenceExhausted(AtomId),

    #[error("Atoms {0:?} and {1:?} are already bonded")]
    AlreadyBonded(AtomId, AtomId),

    #[error("An atom cannot bond to itself: {0:?}")]
    SelfBond(AtomId),

    #[error("Atom {0:?} already belongs to a metallic cloud")]
    AlreadyInCloud(AtomId),

    #[error("Lattice dimensions must all be at least 1, got {0:?}")]
    InvalidLatticeSize([usize; 3]),
}
