use super::atom::Atom;
use super::bond::PM_PER_UNIT;
use super::ids::{AtomId, StructureId};
use crate::core::forcefield::potentials::{self, MIN_SEPARATION};
use crate::core::utils::geometry::padded_bounds;
use crate::engine::error::EngineError;
use crate::engine::schedule::FrameSchedule;
use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use rand::Rng;
use slotmap::SlotMap;

pub const LATTICE_SPACING_RANGE: (f64, f64) = (2.0, 8.0);
pub const LATTICE_SPACING_FACTOR: f64 = 1.1;
pub const CLOUD_SPRING_CONSTANT: f64 = 0.04;
pub const MAX_FREE_ELECTRONS: usize = 200;
pub const ELECTRONS_PER_VALENCE: usize = 3;
/// Atom pairs closer than this get a reference line.
pub const STRUCTURE_LINE_CUTOFF: f64 = 5.5;
/// Atom pairs closer than this feel the lattice spring.
pub const LATTICE_SPRING_RANGE: f64 = 6.0;
pub const ELECTRON_SPEED_RANGE: (f64, f64) = (0.02, 0.2);

const BOUNDS_PADDING: f64 = 1.5;
const INITIAL_ELECTRON_SPEED: f64 = 0.08;
const THERMAL_JITTER: f64 = 0.01;

/// A visual-only electron drifting inside the cloud's bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeElectron {
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
}

/// A faint reference line between two nearby cloud atoms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureLine {
    pub atom1_id: AtomId,
    pub atom2_id: AtomId,
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

/// Delocalized bonding for a set of metal atoms.
///
/// Instead of discrete bonds, every pair of members within
/// [`LATTICE_SPRING_RANGE`] is held near the lattice spacing by a soft spring.
/// The spring pass and the reference-line refresh run on a [`FrameSchedule`];
/// the free electrons move every frame.
#[derive(Debug, Clone)]
pub struct MetallicCloud {
    atoms: Vec<AtomId>,
    pub lattice_spacing: f64,
    pub spring_constant: f64,
    pub total_valence_electrons: u32,
    electrons: Vec<FreeElectron>,
    structure_lines: Vec<StructureLine>,
    schedule: FrameSchedule,
    frame: u64,
}

impl MetallicCloud {
    pub fn new(
        atom_ids: Vec<AtomId>,
        atoms: &SlotMap<AtomId, Atom>,
        schedule: FrameSchedule,
        rng: &mut impl Rng,
    ) -> Result<Self, EngineError> {
        let members: Vec<AtomId> = atom_ids
            .into_iter()
            .unique()
            .filter(|id| atoms.contains_key(*id))
            .collect();
        if members.len() < 2 {
            return Err(EngineError::InsufficientAtoms {
                required: 2,
                found: members.len(),
            });
        }

        let first = &atoms[members[0]];
        let (lo, hi) = LATTICE_SPACING_RANGE;
        let lattice_spacing = (first.element.covalent_radius_pm() * 2.0 * LATTICE_SPACING_FACTOR
            / PM_PER_UNIT)
            .clamp(lo, hi);
        let total_valence_electrons: u32 = members
            .iter()
            .map(|id| atoms[*id].element.valence_electrons())
            .sum();

        let mut cloud = Self {
            atoms: members,
            lattice_spacing,
            spring_constant: CLOUD_SPRING_CONSTANT,
            total_valence_electrons,
            electrons: Vec::new(),
            structure_lines: Vec::new(),
            schedule,
            frame: 0,
        };
        cloud.spawn_electrons(atoms, rng);
        cloud.rebuild_structure_lines(atoms);
        Ok(cloud)
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atoms.contains(&atom_id)
    }

    pub fn electrons(&self) -> &[FreeElectron] {
        &self.electrons
    }

    pub fn structure_lines(&self) -> &[StructureLine] {
        &self.structure_lines
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Points every member's back-reference at `id`.
    pub fn attach(&self, id: StructureId, atoms: &mut SlotMap<AtomId, Atom>) {
        for &atom_id in &self.atoms {
            if let Some(atom) = atoms.get_mut(atom_id) {
                atom.metallic_cloud = Some(id);
            }
        }
    }

    /// Clears the back-references that still point at `id`.
    pub fn release(&self, id: StructureId, atoms: &mut SlotMap<AtomId, Atom>) {
        for &atom_id in &self.atoms {
            if let Some(atom) = atoms.get_mut(atom_id) {
                if atom.metallic_cloud == Some(id) {
                    atom.metallic_cloud = None;
                }
            }
        }
    }

    /// Drops a member from the cloud; its back-reference is the caller's to clear.
    pub fn remove_atom(&mut self, atom_id: AtomId) -> bool {
        let before = self.atoms.len();
        self.atoms.retain(|&id| id != atom_id);
        self.structure_lines
            .retain(|l| l.atom1_id != atom_id && l.atom2_id != atom_id);
        self.atoms.len() < before
    }

    pub fn is_valid(&self, atoms: &SlotMap<AtomId, Atom>) -> bool {
        self.atoms.iter().any(|id| atoms.contains_key(*id))
    }

    /// Discards the electron pool and reference lines.
    pub fn remove(&mut self) {
        self.electrons.clear();
        self.structure_lines.clear();
    }

    pub fn bounding_box(&self, atoms: &SlotMap<AtomId, Atom>) -> Option<(Point3<f64>, Point3<f64>)> {
        padded_bounds(
            self.atoms
                .iter()
                .filter_map(|id| atoms.get(*id))
                .map(|a| a.position),
            BOUNDS_PADDING,
        )
    }

    pub fn update(&mut self, atoms: &mut SlotMap<AtomId, Atom>, rng: &mut impl Rng) {
        let frame = self.frame;
        self.frame += 1;

        self.animate_electrons(atoms, rng);

        if self.schedule.is_due(frame) {
            self.rebuild_structure_lines(atoms);
            self.apply_lattice_springs(atoms);
        }
    }

    fn spawn_electrons(&mut self, atoms: &SlotMap<AtomId, Atom>, rng: &mut impl Rng) {
        let Some((min, max)) = self.bounding_box(atoms) else {
            return;
        };
        let count = (ELECTRONS_PER_VALENCE * self.total_valence_electrons as usize)
            .min(MAX_FREE_ELECTRONS);
        self.electrons = (0..count)
            .map(|_| FreeElectron {
                position: Point3::new(
                    rng.gen_range(min.x..=max.x),
                    rng.gen_range(min.y..=max.y),
                    rng.gen_range(min.z..=max.z),
                ),
                velocity: random_unit(rng) * INITIAL_ELECTRON_SPEED,
            })
            .collect();
    }

    fn animate_electrons(&mut self, atoms: &SlotMap<AtomId, Atom>, rng: &mut impl Rng) {
        let Some((min, max)) = self.bounding_box(atoms) else {
            return;
        };
        let (min_speed, max_speed) = ELECTRON_SPEED_RANGE;

        for electron in &mut self.electrons {
            electron.position += electron.velocity;

            for axis in 0..3 {
                if electron.position[axis] < min[axis] {
                    electron.position[axis] = min[axis];
                    electron.velocity[axis] = electron.velocity[axis].abs();
                } else if electron.position[axis] > max[axis] {
                    electron.position[axis] = max[axis];
                    electron.velocity[axis] = -electron.velocity[axis].abs();
                }
            }

            electron.velocity += Vector3::new(
                rng.gen_range(-THERMAL_JITTER..=THERMAL_JITTER),
                rng.gen_range(-THERMAL_JITTER..=THERMAL_JITTER),
                rng.gen_range(-THERMAL_JITTER..=THERMAL_JITTER),
            );

            let speed = electron.velocity.norm();
            if speed < 1e-12 {
                electron.velocity = random_unit(rng) * min_speed;
            } else if speed < min_speed {
                electron.velocity *= min_speed / speed;
            } else if speed > max_speed {
                electron.velocity *= max_speed / speed;
            }
        }
    }

    fn rebuild_structure_lines(&mut self, atoms: &SlotMap<AtomId, Atom>) {
        self.structure_lines = self
            .atoms
            .iter()
            .filter_map(|id| atoms.get(*id).map(|a| (*id, a.position)))
            .tuple_combinations()
            .filter(|((_, p1), (_, p2))| (p2 - p1).norm() < STRUCTURE_LINE_CUTOFF)
            .map(|((id1, p1), (id2, p2))| StructureLine {
                atom1_id: id1,
                atom2_id: id2,
                start: p1,
                end: p2,
            })
            .collect();
    }

    fn apply_lattice_springs(&self, atoms: &mut SlotMap<AtomId, Atom>) {
        let live: Vec<AtomId> = self
            .atoms
            .iter()
            .copied()
            .filter(|id| atoms.contains_key(*id))
            .collect();

        for (id1, id2) in live.into_iter().tuple_combinations() {
            let (a, b) = (&atoms[id1], &atoms[id2]);
            if a.frozen && b.frozen {
                continue;
            }
            let delta = b.position - a.position;
            let dist = delta.norm();
            if dist < MIN_SEPARATION || dist > LATTICE_SPRING_RANGE {
                continue;
            }
            let magnitude = potentials::hooke(dist, self.lattice_spacing, self.spring_constant);
            let force = delta / dist * magnitude;

            if !atoms[id1].frozen {
                atoms[id1].apply_force(force);
            }
            if !atoms[id2].frozen {
                atoms[id2].apply_force(-force);
            }
        }
    }
}

fn random_unit(rng: &mut impl Rng) -> Vector3<f64> {
    loop {
        let v = Vector3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let n = v.norm();
        if n > 1e-3 && n <= 1.0 {
            return v / n;
        }
    }
}
