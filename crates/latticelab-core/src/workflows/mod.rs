//! # Workflows Module
//!
//! The public entry points of LatticeLab. Everything a caller does to a scene
//! goes through a [`simulation::Simulation`], which owns the atom and structure
//! arenas and the per-frame engines.
//!
//! ## Architecture
//!
//! - **Simulation** ([`simulation`]) - atom and structure lifecycle, structural
//!   commands, the frame loop and statistics.
//! - **Crystal generation** ([`crystal`]) - rock-salt, cubic and hexagonal
//!   lattice builders plus bond strengthening and freezing.
//! - **Fragmentation** ([`fragmentation`]) - connectivity analysis that splits
//!   metallic clouds after atoms leave them.
//! - **Headless runs** ([`run`]) - advances a simulation for a fixed number of
//!   frames while reporting progress.

pub mod crystal;
pub mod fragmentation;
pub mod run;
pub mod simulation;
