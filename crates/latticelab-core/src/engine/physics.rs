use super::angles::BondAngleSolver;
use super::config::PhysicsConfig;
use super::mode::{ModeManager, ModePreset, PhysicsMode};
use super::vdw::VanDerWaalsEngine;
use crate::core::forcefield::potentials;
use crate::core::models::atom::Atom;
use crate::core::models::ids::{AtomId, StructureId};
use crate::core::models::structure::Structure;
use nalgebra::Vector3;
use slotmap::SlotMap;
use tracing::{debug, info};

/// Horizontal velocity kept after touching the floor.
pub const FLOOR_HORIZONTAL_DAMPING: f64 = 0.85;
/// Vertical speeds below this after a bounce are zeroed.
pub const REST_VELOCITY: f64 = 0.01;

/// Per-frame force application and integration.
///
/// The engine applies pairwise repulsion, Van der Waals attraction and
/// bond-angle corrections into each atom's force accumulator, then
/// [`PhysicsEngine::update_atom`] integrates with a fixed unit step.
#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    config: PhysicsConfig,
    modes: ModeManager,
    vdw: VanDerWaalsEngine,
}

impl PhysicsEngine {
    pub fn new(config: PhysicsConfig) -> Self {
        let modes = ModeManager::new(config.mode);
        let vdw = VanDerWaalsEngine::new(config.vdw_far_interval);
        Self { config, modes, vdw }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Direct access for interactive tuning. Mode changes should go through
    /// [`PhysicsEngine::set_mode`] so the preset is applied.
    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    pub fn mode(&self) -> PhysicsMode {
        self.modes.mode()
    }

    /// Simulation-wide factor every bond spring is scaled by.
    pub fn spring_multiplier(&self) -> f64 {
        self.modes.spring_multiplier()
    }

    pub fn set_mode(&mut self, mode: PhysicsMode) {
        let preset = self.modes.set_mode(mode);
        self.apply_preset(mode, preset);
    }

    pub fn toggle_mode(&mut self) -> PhysicsMode {
        let preset = self.modes.toggle();
        let mode = self.modes.mode();
        self.apply_preset(mode, preset);
        mode
    }

    fn apply_preset(&mut self, mode: PhysicsMode, preset: ModePreset) {
        self.config.mode = mode;
        self.config.friction = preset.friction;
        self.config.vdw_enabled = preset.vdw_enabled;
        self.config.bond_angle_strength = preset.bond_angle_strength;
        info!(
            %mode,
            spring_multiplier = preset.spring_multiplier,
            friction = preset.friction,
            vdw = preset.vdw_enabled,
            "Physics mode changed"
        );
    }

    /// Downward acceleration magnitude shared by every atom.
    pub fn gravity_acceleration(&self) -> f64 {
        self.config.gravity_strength * self.config.gravity_constant
    }

    /// Integrates one atom by one frame. Frozen atoms only drop their
    /// accumulated force.
    pub fn update_atom(&self, atom: &mut Atom) {
        if atom.frozen {
            atom.force = Vector3::zeros();
            return;
        }
        let c = &self.config;
        let mass = atom.mass();

        if c.gravity_enabled && !atom.is_dragging {
            atom.force.y -= mass * self.gravity_acceleration();
        }

        let acceleration = atom.force / mass;
        atom.velocity += acceleration;
        atom.velocity *= c.friction;

        let speed = atom.velocity.norm();
        if speed > c.terminal_velocity {
            atom.velocity *= c.terminal_velocity / speed;
        }

        atom.position += atom.velocity;

        if c.floor_enabled {
            let radius = atom.effective_radius();
            if atom.position.y - radius < c.floor_y {
                atom.position.y = c.floor_y + radius;
                atom.velocity.y *= -c.restitution;
                atom.velocity.x *= FLOOR_HORIZONTAL_DAMPING;
                atom.velocity.z *= FLOOR_HORIZONTAL_DAMPING;
                if atom.velocity.y.abs() < REST_VELOCITY {
                    atom.velocity.y = 0.0;
                }
            }
        }

        atom.force = Vector3::zeros();
    }

    /// Quadratic short-range repulsion over every unordered pair.
    ///
    /// Pairs closer than `(r1 + r2) * repulsion_factor` are pushed apart by
    /// `(min_dist - d)^2 * repulsion_strength`; frozen atoms receive nothing.
    pub fn apply_atomic_repulsion(&self, atoms: &mut SlotMap<AtomId, Atom>) {
        let c = &self.config;
        if !c.repulsion_enabled {
            return;
        }
        let ids: Vec<AtomId> = atoms.keys().collect();
        let mut pushes: Vec<(AtomId, AtomId, Vector3<f64>)> = Vec::new();

        for (i, &id1) in ids.iter().enumerate() {
            for &id2 in &ids[i + 1..] {
                let (a, b) = (&atoms[id1], &atoms[id2]);
                if a.frozen && b.frozen {
                    continue;
                }
                let delta = b.position - a.position;
                let dist = delta.norm();
                let min_dist = (a.effective_radius() + b.effective_radius()) * c.repulsion_factor;
                let magnitude = potentials::quadratic_repulsion(dist, min_dist, c.repulsion_strength);
                if magnitude > 0.0 {
                    pushes.push((id1, id2, delta / dist * magnitude));
                }
            }
        }

        for (id1, id2, force) in pushes {
            if let Some(a) = atoms.get_mut(id1).filter(|a| !a.frozen) {
                a.apply_force(-force);
            }
            if let Some(b) = atoms.get_mut(id2).filter(|b| !b.frozen) {
                b.apply_force(force);
            }
        }
    }

    pub fn apply_van_der_waals(
        &mut self,
        atoms: &mut SlotMap<AtomId, Atom>,
        structures: &SlotMap<StructureId, Structure>,
    ) {
        self.vdw.apply(&self.config, atoms, structures);
    }

    pub fn should_apply_bond_angles(&self, atom: &Atom) -> bool {
        self.config.bond_angles_enabled && BondAngleSolver::is_eligible(atom)
    }

    pub fn apply_bond_angles(
        &self,
        center: AtomId,
        atoms: &mut SlotMap<AtomId, Atom>,
        structures: &SlotMap<StructureId, Structure>,
    ) {
        if !self.config.bond_angles_enabled {
            return;
        }
        BondAngleSolver::new(self.config.bond_angle_strength).apply(center, atoms, structures);
    }

    /// Zeroes motion on a set of atoms, e.g. after a structural split.
    pub fn settle(&self, ids: &[AtomId], atoms: &mut SlotMap<AtomId, Atom>) {
        for &id in ids {
            if let Some(atom) = atoms.get_mut(id) {
                atom.reset_motion();
            }
        }
        debug!(count = ids.len(), "Settled atoms");
    }
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::ElementTable;
    use crate::engine::config::PhysicsConfigBuilder;
    use nalgebra::Point3;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn atom(symbol: &str, position: Point3<f64>) -> Atom {
        let table = ElementTable::builtin();
        Atom::new(symbol, table.get(symbol).unwrap().clone(), position)
    }

    fn weightless() -> PhysicsEngine {
        PhysicsEngine::new(
            PhysicsConfigBuilder::new()
                .gravity(false, 0.0)
                .floor(false, 0.0)
                .build()
                .unwrap(),
        )
    }

    mod integration {
        use super::*;

        #[test]
        fn gravity_accelerates_independently_of_mass() {
            let engine = PhysicsEngine::new(
                PhysicsConfigBuilder::new().floor(false, 0.0).build().unwrap(),
            );
            let mut light = atom("H", Point3::new(0.0, 10.0, 0.0));
            let mut heavy = atom("Au", Point3::new(0.0, 10.0, 0.0));
            engine.update_atom(&mut light);
            engine.update_atom(&mut heavy);

            let expected = -5.0 * 0.001 * 0.98;
            assert!(f64_approx_equal(light.velocity.y, expected));
            assert!(f64_approx_equal(heavy.velocity.y, expected));
            assert_eq!(light.force, Vector3::zeros());
        }

        #[test]
        fn dragged_atoms_ignore_gravity_and_frozen_atoms_do_not_move() {
            let engine = PhysicsEngine::default();
            let mut dragged = atom("C", Point3::new(0.0, 10.0, 0.0));
            dragged.is_dragging = true;
            engine.update_atom(&mut dragged);
            assert_eq!(dragged.velocity, Vector3::zeros());

            let mut frozen = atom("C", Point3::new(0.0, 10.0, 0.0));
            frozen.frozen = true;
            frozen.apply_force(Vector3::new(5.0, 0.0, 0.0));
            engine.update_atom(&mut frozen);
            assert_eq!(frozen.position, Point3::new(0.0, 10.0, 0.0));
            assert_eq!(frozen.force, Vector3::zeros());
        }

        #[test]
        fn terminal_velocity_caps_speed() {
            let engine = weightless();
            let mut a = atom("H", Point3::origin());
            a.apply_force(Vector3::new(100.0, 0.0, 0.0));
            engine.update_atom(&mut a);
            assert!(f64_approx_equal(a.velocity.norm(), 2.0));
            assert!(f64_approx_equal(a.position.x, 2.0));
        }

        #[test]
        fn floor_collision_snaps_and_reflects() {
            let engine = PhysicsEngine::default();
            let mut a = atom("C", Point3::new(0.0, 2.7, 0.0));
            a.velocity = Vector3::new(0.2, -0.5, 0.0);
            engine.update_atom(&mut a);

            let radius = a.effective_radius();
            assert!(f64_approx_equal(a.position.y, radius));
            assert!(a.velocity.y > 0.0);
            assert!(a.velocity.x < 0.2 * 0.98);
        }

        #[test]
        fn atoms_settle_on_the_floor() {
            let engine = PhysicsEngine::default();
            let mut atoms = vec![
                atom("H", Point3::new(0.0, 8.0, 0.0)),
                atom("Fe", Point3::new(5.0, 3.0, 0.0)),
                atom("Cl", Point3::new(-5.0, 20.0, 0.0)),
            ];
            for _ in 0..3000 {
                for a in atoms.iter_mut() {
                    engine.update_atom(a);
                }
            }
            for a in &atoms {
                assert!((a.position.y - a.effective_radius()).abs() < 1e-6);
                assert!(a.velocity.y.abs() < 1e-6);
            }
        }
    }

    mod repulsion {
        use super::*;

        fn pair_at(dist: f64) -> (SlotMap<AtomId, Atom>, AtomId, AtomId) {
            let mut atoms = SlotMap::with_key();
            let a = atoms.insert(atom("C", Point3::origin()));
            let b = atoms.insert(atom("C", Point3::new(dist, 0.0, 0.0)));
            (atoms, a, b)
        }

        #[test]
        fn zero_force_at_min_distance() {
            let r = atom("C", Point3::origin()).effective_radius();
            let min_dist = (r + r) * 0.3;
            let (mut atoms, a, b) = pair_at(min_dist);
            PhysicsEngine::default().apply_atomic_repulsion(&mut atoms);
            assert_eq!(atoms[a].force, Vector3::zeros());
            assert_eq!(atoms[b].force, Vector3::zeros());
        }

        #[test]
        fn force_grows_as_pair_is_squeezed() {
            let r = atom("C", Point3::origin()).effective_radius();
            let min_dist = (r + r) * 0.3;
            let engine = PhysicsEngine::default();
            let mut previous = 0.0;
            for step in 1..10 {
                let (mut atoms, a, b) = pair_at(min_dist - step as f64 * 0.1);
                engine.apply_atomic_repulsion(&mut atoms);
                let push = atoms[b].force.x;
                assert!(push > previous);
                assert!(f64_approx_equal(atoms[a].force.x, -push));
                previous = push;
            }
        }

        #[test]
        fn frozen_partner_is_not_pushed() {
            let (mut atoms, a, b) = pair_at(1.0);
            atoms[a].frozen = true;
            PhysicsEngine::default().apply_atomic_repulsion(&mut atoms);
            assert_eq!(atoms[a].force, Vector3::zeros());
            assert!(atoms[b].force.x > 0.0);
        }
    }

    mod modes {
        use super::*;

        #[test]
        fn toggle_applies_realistic_preset() {
            let mut engine = PhysicsEngine::default();
            assert_eq!(engine.spring_multiplier(), 1.0);
            assert_eq!(engine.toggle_mode(), PhysicsMode::Realistic);
            assert_eq!(engine.spring_multiplier(), 0.3);
            assert_eq!(engine.config().friction, 0.995);
            assert!(engine.config().vdw_enabled);
            assert_eq!(engine.config().bond_angle_strength, 0.02);
            assert_eq!(engine.config().mode, PhysicsMode::Realistic);

            engine.set_mode(PhysicsMode::Pedagogical);
            assert!(!engine.config().vdw_enabled);
            assert_eq!(engine.config().friction, 0.98);
        }

        #[test]
        fn bond_angle_gate_respects_config() {
            let mut engine = PhysicsEngine::default();
            let mut center = atom("O", Point3::origin());
            let mut structures: SlotMap<StructureId, ()> = SlotMap::with_key();
            center.bonds = vec![structures.insert(()), structures.insert(())];
            assert!(engine.should_apply_bond_angles(&center));
            engine.config_mut().bond_angles_enabled = false;
            assert!(!engine.should_apply_bond_angles(&center));
        }
    }
}
