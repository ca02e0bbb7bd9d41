//! # LatticeLab Core Library
//!
//! An interactive simulation engine for atoms, bonds, metallic electron seas and
//! crystal lattices. The physics is a simplified, stable approximation meant for
//! teaching visualizations rather than quantitative chemistry.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless data: the element table, the atom,
//!   bond, metallic-cloud and molecule models, force laws and geometry helpers.
//!
//! - **[`engine`]: The Per-Frame Machinery.** The physics integrator, the
//!   Van der Waals sub-engine, the VSEPR bond-angle solver, mode presets, frame
//!   scheduling, configuration and errors.
//!
//! - **[`workflows`]: The Public API.** [`workflows::simulation::Simulation`]
//!   owns every atom and structure and exposes the mutation and query API. The
//!   crystal generator, fragmentation detector and headless frame driver build
//!   on top of it.

pub mod core;
pub mod engine;
pub mod workflows;
