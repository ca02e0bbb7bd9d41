use crate::core::models::atom::Atom;
use crate::core::models::bond::{Bond, BondType};
use crate::core::models::cloud::MetallicCloud;
use crate::core::models::element::ElementTable;
use crate::core::models::ids::{AtomId, StructureId};
use crate::core::models::molecule::{Molecule, bonded_neighbors, connected_components};
use crate::core::models::structure::Structure;
use crate::engine::config::{
    ElectronMode, InteractionMode, PhysicsConfig, SimulationConfig, VisualizationMode,
};
use crate::engine::error::EngineError;
use crate::engine::mode::PhysicsMode;
use crate::engine::physics::PhysicsEngine;
use crate::engine::schedule::FrameSchedule;
use crate::workflows::fragmentation::{FragmentationDetector, FragmentationReport};
use nalgebra::{Point3, Vector3};
use rand::SeedableRng;
use rand::rngs::StdRng;
use slotmap::SlotMap;
use tracing::{debug, info, trace, warn};

/// Atoms closer than this to a newly added atom are bonded automatically.
pub const AUTO_BOND_DISTANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub atom_count: usize,
    pub bond_count: usize,
    /// Connected components over the bond graph; isolated atoms count as one each.
    pub molecule_count: usize,
    pub cloud_count: usize,
}

/// Owner of every atom and structure, and the mutation API for them.
///
/// Commands are applied between frames; [`Simulation::update`] advances one
/// frame synchronously.
#[derive(Debug, Clone)]
pub struct Simulation {
    elements: ElementTable,
    atoms: SlotMap<AtomId, Atom>,
    structures: SlotMap<StructureId, Structure>,
    physics: PhysicsEngine,
    config: SimulationConfig,
    rng: StdRng,
    frame: u64,
    skipped_structures: usize,
}

impl Simulation {
    pub fn new(elements: ElementTable, physics: PhysicsConfig, config: SimulationConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            elements,
            atoms: SlotMap::with_key(),
            structures: SlotMap::with_key(),
            physics: PhysicsEngine::new(physics),
            config,
            rng,
            frame: 0,
            skipped_structures: 0,
        }
    }

    pub fn elements(&self) -> &ElementTable {
        &self.elements
    }

    pub fn atoms(&self) -> &SlotMap<AtomId, Atom> {
        &self.atoms
    }

    pub(crate) fn atoms_mut(&mut self) -> &mut SlotMap<AtomId, Atom> {
        &mut self.atoms
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn structures(&self) -> &SlotMap<StructureId, Structure> {
        &self.structures
    }

    /// Zeroes velocity and force on the given atoms.
    pub(crate) fn settle_atoms(&mut self, ids: &[AtomId]) {
        self.physics.settle(ids, &mut self.atoms);
    }

    pub(crate) fn structures_mut(&mut self) -> &mut SlotMap<StructureId, Structure> {
        &mut self.structures
    }

    pub fn bonds(&self) -> impl Iterator<Item = (StructureId, &Bond)> {
        self.structures
            .iter()
            .filter_map(|(id, s)| s.as_bond().map(|b| (id, b)))
    }

    pub fn clouds(&self) -> impl Iterator<Item = (StructureId, &MetallicCloud)> {
        self.structures
            .iter()
            .filter_map(|(id, s)| s.as_cloud().map(|c| (id, c)))
    }

    pub fn physics(&self) -> &PhysicsEngine {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsEngine {
        &mut self.physics
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Invalid structures skipped during the last frame.
    pub fn skipped_structures(&self) -> usize {
        self.skipped_structures
    }

    /// Places a new atom and bonds it to every atom within
    /// [`AUTO_BOND_DISTANCE`] while both sides have free valence.
    ///
    /// Two lattice atoms are never auto-bonded to each other, and homoatomic
    /// metal pairs are left for a metallic cloud.
    pub fn add_atom(&mut self, position: Point3<f64>, symbol: &str) -> Result<AtomId, EngineError> {
        self.place_atom(position, symbol, false)
    }

    pub(crate) fn add_crystal_atom(
        &mut self,
        position: Point3<f64>,
        symbol: &str,
    ) -> Result<AtomId, EngineError> {
        self.place_atom(position, symbol, true)
    }

    fn place_atom(
        &mut self,
        position: Point3<f64>,
        symbol: &str,
        is_crystal: bool,
    ) -> Result<AtomId, EngineError> {
        let element = self
            .elements
            .get(symbol)
            .cloned()
            .ok_or_else(|| EngineError::UnknownElement(symbol.to_string()))?;
        let mut atom = Atom::new(symbol, element, position);
        atom.is_crystal = is_crystal;
        let id = self.atoms.insert(atom);

        let candidates: Vec<AtomId> = self
            .atoms
            .iter()
            .filter(|(other, a)| {
                *other != id && (a.position - position).norm() < AUTO_BOND_DISTANCE
            })
            .map(|(other, _)| other)
            .collect();

        let mut formed = 0;
        for other in candidates {
            if !self.atoms[id].has_free_valence() {
                break;
            }
            let (new_atom, neighbor) = (&self.atoms[id], &self.atoms[other]);
            if !neighbor.has_free_valence() || (new_atom.is_crystal && neighbor.is_crystal) {
                continue;
            }
            if BondType::classify(&new_atom.element, &neighbor.element) == BondType::Metallic {
                continue;
            }
            self.insert_bond(id, other);
            formed += 1;
        }
        trace!(symbol, auto_bonds = formed, "Atom added");
        Ok(id)
    }

    /// Drops an atom from the arena without touching its bonds or cloud.
    /// Structures that referenced it become invalid and are skipped each frame
    /// until removed; see [`Simulation::delete_atom`] for the full command.
    pub fn remove_atom(&mut self, id: AtomId) -> Result<Atom, EngineError> {
        self.atoms.remove(id).ok_or(EngineError::AtomNotFound(id))
    }

    /// Detaches every bond, leaves the cloud, drops the atom and repairs any
    /// structure the removal fragmented.
    pub fn delete_atom(&mut self, id: AtomId) -> Result<FragmentationReport, EngineError> {
        self.detach_atom(id)?;
        self.atoms.remove(id);
        Ok(FragmentationDetector::default().check_all_fragmentation(self))
    }

    /// Deletes the whole molecule containing `id`; returns how many atoms went.
    pub fn delete_molecule(&mut self, id: AtomId) -> Result<usize, EngineError> {
        let molecule = self.find_molecule_containing(id)?;
        for &member in &molecule.atoms {
            self.detach_atom(member)?;
            self.atoms.remove(member);
        }
        FragmentationDetector::default().check_all_fragmentation(self);
        info!(atoms = molecule.len(), "Molecule deleted");
        Ok(molecule.len())
    }

    fn detach_atom(&mut self, id: AtomId) -> Result<(), EngineError> {
        let atom = self.atoms.get(id).ok_or(EngineError::AtomNotFound(id))?;
        let bonds = atom.bonds.clone();
        let cloud = atom.metallic_cloud;

        for bond_id in bonds {
            self.remove_structure(bond_id).ok();
        }
        if let Some(cloud_id) = cloud {
            if let Some(Structure::Cloud(c)) = self.structures.get_mut(cloud_id) {
                c.remove_atom(id);
            }
            self.atoms[id].metallic_cloud = None;
        }
        Ok(())
    }

    /// Explicit bond between two atoms.
    pub fn create_bond(&mut self, a: AtomId, b: AtomId) -> Result<StructureId, EngineError> {
        if a == b {
            return Err(EngineError::SelfBond(a));
        }
        let atom_a = self.atoms.get(a).ok_or(EngineError::AtomNotFound(a))?;
        let atom_b = self.atoms.get(b).ok_or(EngineError::AtomNotFound(b))?;
        if bonded_neighbors(a, &self.atoms, &self.structures).contains(&b) {
            return Err(EngineError::AlreadyBonded(a, b));
        }
        if !atom_a.has_free_valence() {
            return Err(EngineError::ValenceExhausted(a));
        }
        if !atom_b.has_free_valence() {
            return Err(EngineError::ValenceExhausted(b));
        }
        Ok(self.insert_bond(a, b))
    }

    fn insert_bond(&mut self, a: AtomId, b: AtomId) -> StructureId {
        let bond = Bond::new(a, &self.atoms[a], b, &self.atoms[b]);
        trace!(bond_type = %bond.bond_type, target = bond.target_dist, "Bond formed");
        let id = self.structures.insert(Structure::Bond(bond.clone()));
        bond.attach(id, &mut self.atoms);
        id
    }

    pub fn remove_bond(&mut self, id: StructureId) -> Result<Bond, EngineError> {
        match self.structures.get(id) {
            Some(Structure::Bond(_)) => match self.remove_structure(id)? {
                Structure::Bond(bond) => Ok(bond),
                Structure::Cloud(_) => Err(EngineError::StructureNotFound(id)),
            },
            _ => Err(EngineError::StructureNotFound(id)),
        }
    }

    /// Groups metal atoms into a new electron sea.
    pub fn create_metallic_cloud(&mut self, ids: &[AtomId]) -> Result<StructureId, EngineError> {
        for &id in ids {
            let atom = self.atoms.get(id).ok_or(EngineError::AtomNotFound(id))?;
            if atom.metallic_cloud.is_some() {
                return Err(EngineError::AlreadyInCloud(id));
            }
        }
        let schedule = FrameSchedule::new(self.physics.config().cloud_lattice_interval);
        let cloud = MetallicCloud::new(ids.to_vec(), &self.atoms, schedule, &mut self.rng)?;
        let electrons = cloud.electrons().len();
        let members = cloud.len();
        let id = self.structures.insert(Structure::Cloud(cloud));
        if let Some(Structure::Cloud(cloud)) = self.structures.get(id) {
            cloud.attach(id, &mut self.atoms);
        }
        debug!(members, electrons, "Metallic cloud created");
        Ok(id)
    }

    /// Removes a bond or cloud and clears the back-references it owned.
    pub fn remove_structure(&mut self, id: StructureId) -> Result<Structure, EngineError> {
        let mut structure = self
            .structures
            .remove(id)
            .ok_or(EngineError::StructureNotFound(id))?;
        match &mut structure {
            Structure::Bond(bond) => bond.detach(id, &mut self.atoms),
            Structure::Cloud(cloud) => {
                cloud.release(id, &mut self.atoms);
                cloud.remove();
            }
        }
        Ok(structure)
    }

    pub fn find_molecule_containing(&self, id: AtomId) -> Result<Molecule, EngineError> {
        Molecule::discover(id, &self.atoms, &self.structures).ok_or(EngineError::AtomNotFound(id))
    }

    /// Every connected component of the bond graph.
    pub fn molecules(&self) -> Vec<Molecule> {
        let ids: Vec<AtomId> = self.atoms.keys().collect();
        connected_components(&ids, |id| bonded_neighbors(id, &self.atoms, &self.structures))
            .into_iter()
            .filter_map(|component| component.first().copied())
            .filter_map(|seed| Molecule::discover(seed, &self.atoms, &self.structures))
            .collect()
    }

    pub fn move_atom(&mut self, id: AtomId, position: Point3<f64>) -> Result<(), EngineError> {
        let atom = self.atom_mut(id)?;
        atom.position = position;
        atom.velocity = Vector3::zeros();
        Ok(())
    }

    pub fn set_dragging(&mut self, id: AtomId, dragging: bool) -> Result<(), EngineError> {
        self.atom_mut(id)?.is_dragging = dragging;
        Ok(())
    }

    pub fn set_frozen(&mut self, id: AtomId, frozen: bool) -> Result<(), EngineError> {
        let atom = self.atom_mut(id)?;
        atom.frozen = frozen;
        if frozen {
            atom.reset_motion();
        }
        Ok(())
    }

    /// Freezes or thaws every atom of the molecule containing `id`.
    pub fn freeze_molecule(&mut self, id: AtomId, frozen: bool) -> Result<usize, EngineError> {
        let molecule = self.find_molecule_containing(id)?;
        for &member in &molecule.atoms {
            self.set_frozen(member, frozen)?;
        }
        Ok(molecule.len())
    }

    /// Rigidly shifts the molecule containing `id`, as a group drag does.
    pub fn translate_molecule(&mut self, id: AtomId, delta: Vector3<f64>) -> Result<(), EngineError> {
        let molecule = self.find_molecule_containing(id)?;
        for &member in &molecule.atoms {
            let atom = self.atom_mut(member)?;
            atom.position += delta;
            atom.velocity = Vector3::zeros();
        }
        Ok(())
    }

    fn atom_mut(&mut self, id: AtomId) -> Result<&mut Atom, EngineError> {
        self.atoms.get_mut(id).ok_or(EngineError::AtomNotFound(id))
    }

    pub fn clear_all(&mut self) {
        let (atoms, structures) = (self.atoms.len(), self.structures.len());
        self.atoms.clear();
        self.structures.clear();
        self.frame = 0;
        self.skipped_structures = 0;
        info!(atoms, structures, "Simulation cleared");
    }

    pub fn set_visualization_mode(&mut self, mode: VisualizationMode) {
        self.config.visualization_mode = mode;
    }

    pub fn set_electron_mode(&mut self, mode: ElectronMode) {
        self.config.electron_mode = mode;
    }

    pub fn set_interaction_mode(&mut self, mode: InteractionMode) {
        self.config.interaction_mode = mode;
    }

    pub fn set_physics_mode(&mut self, mode: PhysicsMode) {
        self.physics.set_mode(mode);
    }

    pub fn toggle_physics_mode(&mut self) -> PhysicsMode {
        self.physics.toggle_mode()
    }

    /// Advances one frame: repulsion, Van der Waals, bond angles, integration,
    /// then every valid bond and cloud.
    pub fn update(&mut self) {
        self.physics.apply_atomic_repulsion(&mut self.atoms);
        self.physics
            .apply_van_der_waals(&mut self.atoms, &self.structures);

        let centers: Vec<AtomId> = self
            .atoms
            .iter()
            .filter(|(_, a)| self.physics.should_apply_bond_angles(a))
            .map(|(id, _)| id)
            .collect();
        for center in centers {
            self.physics
                .apply_bond_angles(center, &mut self.atoms, &self.structures);
        }

        for atom in self.atoms.values_mut() {
            self.physics.update_atom(atom);
        }

        let multiplier = self.physics.spring_multiplier();
        let mut skipped = 0usize;
        for structure in self.structures.values_mut() {
            if !structure.is_valid(&self.atoms) {
                skipped += 1;
                continue;
            }
            match structure {
                Structure::Bond(bond) => bond.update(&mut self.atoms, multiplier),
                Structure::Cloud(cloud) => cloud.update(&mut self.atoms, &mut self.rng),
            }
        }
        if skipped != self.skipped_structures {
            if skipped > 0 {
                warn!(frame = self.frame, skipped, "Skipping invalid structures");
            } else {
                debug!(frame = self.frame, "No invalid structures left");
            }
            self.skipped_structures = skipped;
        }
        self.frame += 1;
    }

    pub fn stats(&self) -> Stats {
        let ids: Vec<AtomId> = self.atoms.keys().collect();
        let molecule_count =
            connected_components(&ids, |id| bonded_neighbors(id, &self.atoms, &self.structures))
                .len();
        Stats {
            atom_count: self.atoms.len(),
            bond_count: self.bonds().count(),
            molecule_count,
            cloud_count: self.clouds().count(),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(
            ElementTable::builtin(),
            PhysicsConfig::default(),
            SimulationConfig::default(),
        )
    }
}
