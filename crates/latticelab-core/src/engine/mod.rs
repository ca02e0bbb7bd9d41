//! # Engine Module
//!
//! Stateful machinery advanced once per frame.
//!
//! - **Physics** ([`physics`]) - gravity, floor collision, repulsion and integration
//! - **Van der Waals** ([`vdw`]) - Lennard-Jones attraction with amortized far pairs
//! - **Bond angles** ([`angles`]) - VSEPR geometry corrections
//! - **Modes** ([`mode`]) - pedagogical and realistic presets
//! - **Scheduling** ([`schedule`]) - every-Nth-frame policy for expensive passes
//! - **Configuration** ([`config`]), **Errors** ([`error`]), **Progress** ([`progress`])

pub mod angles;
pub mod config;
pub mod error;
pub mod mode;
pub mod physics;
pub mod progress;
pub mod schedule;
pub mod vdw;
