//! # Core Module
//!
//! Stateless building blocks of the simulation.
//!
//! - **Entities** ([`models`]) - atoms, bonds, metallic clouds, molecules and the
//!   element properties table they are built from
//! - **Force laws** ([`forcefield`]) - repulsion, Lennard-Jones and spring
//!   magnitudes, plus estimators for missing element data
//! - **Geometry** ([`utils`]) - VSEPR shapes, angles, centroids and bounds

pub mod forcefield;
pub mod models;
pub mod utils;
