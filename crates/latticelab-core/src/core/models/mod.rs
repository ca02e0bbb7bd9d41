//! # Core Models Module
//!
//! Entities of the structural graph. Atoms and structures live in
//! [`slotmap::SlotMap`] arenas owned by the simulation; everything here refers
//! to other entities through [`ids::AtomId`] and [`ids::StructureId`] handles.
//!
//! - [`element`] - per-symbol physical constants
//! - [`atom`] - point mass with bonding state
//! - [`bond`] - pairwise spring and its classification
//! - [`cloud`] - delocalized metallic bonding
//! - [`structure`] - the bond/cloud sum type stepped every frame
//! - [`molecule`] - transient connected components

pub mod atom;
pub mod bond;
pub mod cloud;
pub mod element;
pub mod ids;
pub mod molecule;
pub mod structure;
