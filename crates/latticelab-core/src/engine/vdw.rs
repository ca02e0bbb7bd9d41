use super::config::PhysicsConfig;
use super::schedule::FrameSchedule;
use crate::core::forcefield::potentials::{self, LJ_MIN_DISTANCE};
use crate::core::models::atom::Atom;
use crate::core::models::bond::PM_PER_UNIT;
use crate::core::models::element::ElementProperties;
use crate::core::models::ids::{AtomId, StructureId};
use crate::core::models::structure::Structure;
use nalgebra::Vector3;
use slotmap::SlotMap;
use std::collections::HashSet;
use tracing::trace;

/// Down-scales the polarizability product into a well depth that does not
/// overpower bond springs.
pub const EPSILON_SCALE: f64 = 0.001;
/// Per-pair force limit. Clips the 12-6 repulsive wall for non-bonded pairs
/// that sit well inside sigma, such as the two hydrogens of a water molecule;
/// the attractive well stays below it.
pub const MAX_PAIR_FORCE: f64 = 0.005;

/// Lennard-Jones combining rule for a pair of elements.
///
/// Returns `(sigma, epsilon)`: sigma is the sum of the Van der Waals radii in
/// world units, epsilon the scaled geometric mean of the polarizabilities.
pub fn lennard_jones_parameters(a: &ElementProperties, b: &ElementProperties) -> (f64, f64) {
    let sigma = (a.vanderwaals_radius_pm() + b.vanderwaals_radius_pm()) / PM_PER_UNIT;
    let epsilon = (a.polarizability() * b.polarizability()).sqrt() * EPSILON_SCALE;
    (sigma, epsilon)
}

/// Pairwise Lennard-Jones attraction between atoms that are not already held
/// together by a bond or a shared metallic cloud.
///
/// Pairs within the cutoff are evaluated every frame. Pairs beyond it are only
/// evaluated when the far-pair [`FrameSchedule`] is due.
#[derive(Debug, Clone)]
pub struct VanDerWaalsEngine {
    far_schedule: FrameSchedule,
    frame: u64,
}

impl VanDerWaalsEngine {
    pub fn new(far_interval: u64) -> Self {
        Self {
            far_schedule: FrameSchedule::new(far_interval),
            frame: 0,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn apply(
        &mut self,
        config: &PhysicsConfig,
        atoms: &mut SlotMap<AtomId, Atom>,
        structures: &SlotMap<StructureId, Structure>,
    ) {
        if !config.vdw_enabled {
            return;
        }
        self.far_schedule.set_interval(config.vdw_far_interval);
        let far_due = self.far_schedule.is_due(self.frame);
        self.frame += 1;

        let bonded = bonded_pairs(structures);
        let ids: Vec<AtomId> = atoms.keys().collect();
        let mut evaluated = 0usize;

        for (i, &id1) in ids.iter().enumerate() {
            for &id2 in &ids[i + 1..] {
                let (a, b) = (&atoms[id1], &atoms[id2]);
                if a.frozen && b.frozen {
                    continue;
                }
                if bonded.contains(&ordered(id1, id2)) {
                    continue;
                }
                if a.metallic_cloud.is_some() && a.metallic_cloud == b.metallic_cloud {
                    continue;
                }

                let delta = b.position - a.position;
                let dist = delta.norm();
                if dist < LJ_MIN_DISTANCE {
                    continue;
                }
                if dist > config.vdw_cutoff && !far_due {
                    continue;
                }

                let (sigma, epsilon) = lennard_jones_parameters(&a.element, &b.element);
                let magnitude = (potentials::lennard_jones_force(dist, sigma, epsilon)
                    * config.vdw_strength)
                    .clamp(-MAX_PAIR_FORCE, MAX_PAIR_FORCE);
                // Positive magnitude pushes the pair apart.
                let force: Vector3<f64> = delta / dist * magnitude;
                evaluated += 1;

                if !atoms[id1].frozen {
                    atoms[id1].apply_force(-force);
                }
                if !atoms[id2].frozen {
                    atoms[id2].apply_force(force);
                }
            }
        }
        trace!(frame = self.frame, evaluated, far_due, "Van der Waals pass");
    }
}

impl Default for VanDerWaalsEngine {
    fn default() -> Self {
        Self::new(FrameSchedule::default().interval())
    }
}

fn ordered(a: AtomId, b: AtomId) -> (AtomId, AtomId) {
    if a < b { (a, b) } else { (b, a) }
}

fn bonded_pairs(structures: &SlotMap<StructureId, Structure>) -> HashSet<(AtomId, AtomId)> {
    structures
        .values()
        .filter_map(Structure::as_bond)
        .map(|b| ordered(b.atom1_id, b.atom2_id))
        .collect()
}
