use super::element::ElementProperties;
use super::ids::StructureId;
use crate::engine::config::{ElectronMode, SimulationConfig, VisualizationMode};
use nalgebra::{Point3, Vector3};
use std::sync::Arc;

/// Smallest and largest nucleus radius drawn, in world units.
pub const NUCLEUS_RADIUS_RANGE: (f64, f64) = (0.3, 1.1);
/// Atomic radii (pm) mapped onto [`NUCLEUS_RADIUS_RANGE`].
pub const ATOMIC_RADIUS_RANGE_PM: (f64, f64) = (25.0, 300.0);

const SHELL_RADIUS_BASE: f64 = 1.0;
const SHELL_RADIUS_STEP: f64 = 0.8;
const FALLBACK_MASS: f64 = 1.0;

/// A point mass with bonding state.
///
/// Bonds and cloud membership are stored as handles into the simulation's
/// structure arena; the atom never owns them.
#[derive(Debug, Clone)]
pub struct Atom {
    pub symbol: String,
    pub element: Arc<ElementProperties>,
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    /// Forces accumulated since the last integration step.
    pub force: Vector3<f64>,
    pub nucleus_radius: f64,
    pub bonds: Vec<StructureId>,
    pub metallic_cloud: Option<StructureId>,
    /// Excluded from integration.
    pub frozen: bool,
    /// Excluded from gravity while held by the user.
    pub is_dragging: bool,
    /// Built by a lattice generator.
    pub is_crystal: bool,
    bonded_electrons: u32,
}

impl Atom {
    pub fn new(symbol: &str, element: Arc<ElementProperties>, position: Point3<f64>) -> Self {
        let nucleus_radius = nucleus_radius_for(element.radius_atomic_pm);
        Self {
            symbol: symbol.to_string(),
            element,
            position,
            velocity: Vector3::zeros(),
            force: Vector3::zeros(),
            nucleus_radius,
            bonds: Vec::new(),
            metallic_cloud: None,
            frozen: false,
            is_dragging: false,
            is_crystal: false,
            bonded_electrons: 0,
        }
    }

    #[inline]
    pub fn apply_force(&mut self, force: Vector3<f64>) {
        self.force += force;
    }

    pub fn mass(&self) -> f64 {
        if self.element.mass > 0.0 {
            self.element.mass
        } else {
            FALLBACK_MASS
        }
    }

    /// Outer electron-shell radius, used for floor and repulsion checks.
    pub fn effective_radius(&self) -> f64 {
        SHELL_RADIUS_BASE + SHELL_RADIUS_STEP * self.element.shell_count() as f64
    }

    pub fn valence(&self) -> usize {
        self.element.valence as usize
    }

    /// Whether another discrete bond fits under the element's valence.
    pub fn has_free_valence(&self) -> bool {
        self.bonds.len() < self.valence()
    }

    /// Marks up to `n` free valence electrons as shared in a bond and returns
    /// how many were actually taken. Never takes more than exist.
    pub fn consume_valence_electrons(&mut self, n: u32) -> u32 {
        let taken = n.min(self.available_valence_electrons());
        self.bonded_electrons += taken;
        taken
    }

    pub fn release_valence_electrons(&mut self, n: u32) {
        self.bonded_electrons = self.bonded_electrons.saturating_sub(n);
    }

    pub fn available_valence_electrons(&self) -> u32 {
        self.element
            .valence_electrons()
            .saturating_sub(self.bonded_electrons)
    }

    pub fn bonded_electrons(&self) -> u32 {
        self.bonded_electrons
    }

    /// Zeroes velocity and the force accumulator.
    pub fn reset_motion(&mut self) {
        self.velocity = Vector3::zeros();
        self.force = Vector3::zeros();
    }

    /// What a renderer should draw around this nucleus under `config`.
    pub fn electron_display(&self, config: &SimulationConfig) -> ElectronDisplay {
        let shells = &self.element.shells;
        let visible_shells: Vec<ShellDisplay> = shells
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                config.electron_mode == ElectronMode::All || *i + 1 == shells.len()
            })
            .map(|(i, &electrons)| {
                let is_valence = i + 1 == shells.len();
                ShellDisplay {
                    radius: SHELL_RADIUS_BASE + SHELL_RADIUS_STEP * (i + 1) as f64,
                    electrons,
                    bonded: if is_valence { self.bonded_electrons } else { 0 },
                }
            })
            .collect();

        ElectronDisplay {
            style: config.visualization_mode,
            shells: visible_shells,
        }
    }
}

/// One drawn electron shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellDisplay {
    pub radius: f64,
    pub electrons: u32,
    /// Electrons in this shell currently shared in bonds.
    pub bonded: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElectronDisplay {
    pub style: VisualizationMode,
    pub shells: Vec<ShellDisplay>,
}

/// Linear map of the real atomic radius into the visual nucleus range.
pub fn nucleus_radius_for(radius_atomic_pm: f64) -> f64 {
    let (lo_pm, hi_pm) = ATOMIC_RADIUS_RANGE_PM;
    let (lo, hi) = NUCLEUS_RADIUS_RANGE;
    let t = ((radius_atomic_pm - lo_pm) / (hi_pm - lo_pm)).clamp(0.0, 1.0);
    lo + t * (hi - lo)
}
