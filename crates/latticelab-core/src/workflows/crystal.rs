use crate::core::models::atom::Atom;
use crate::core::models::bond::{BondType, PM_PER_UNIT};
use crate::core::models::element::{ElementProperties, ElementTable};
use crate::core::models::ids::{AtomId, StructureId};
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use crate::workflows::simulation::Simulation;
use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub const ROCK_SALT_SPACING_FACTOR: f64 = 1.05;
pub const CUBIC_SPACING_FACTOR: f64 = 1.1;
pub const HEXAGONAL_SPACING_FACTOR: f64 = 1.15;
/// Pairs within this multiple of the lattice spacing are force-connected.
pub const CONNECT_TOLERANCE: f64 = 1.09;
/// Interlayer separation of the hexagonal builder, in in-plane bond lengths.
pub const HEXAGONAL_LAYER_RATIO: f64 = 2.36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatticeKind {
    /// Alternating two-element simple cubic.
    RockSalt,
    BodyCenteredCubic,
    FaceCenteredCubic,
    /// Stacked honeycomb sheets.
    HexagonalLayered,
}

impl LatticeKind {
    pub fn element_count(&self) -> usize {
        match self {
            Self::RockSalt => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown lattice kind '{0}'")]
pub struct ParseLatticeKindError(pub String);

impl FromStr for LatticeKind {
    type Err = ParseLatticeKindError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "rock-salt" | "rocksalt" | "nacl" => Ok(Self::RockSalt),
            "bcc" | "body-centered-cubic" => Ok(Self::BodyCenteredCubic),
            "fcc" | "face-centered-cubic" => Ok(Self::FaceCenteredCubic),
            "hexagonal" | "hexagonal-layered" | "graphite" => Ok(Self::HexagonalLayered),
            _ => Err(ParseLatticeKindError(s.to_string())),
        }
    }
}

impl fmt::Display for LatticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::RockSalt => "rock-salt",
                Self::BodyCenteredCubic => "bcc",
                Self::FaceCenteredCubic => "fcc",
                Self::HexagonalLayered => "hexagonal",
            }
        )
    }
}

/// How [`CrystalGenerator::strengthen_crystal_bonds`] wired a lattice.
#[derive(Debug, Clone, PartialEq)]
pub enum CrystalBonding {
    /// Every atom was a metal; the lattice became one electron sea.
    Metallic {
        cloud: StructureId,
        removed_bonds: usize,
    },
    Bonded {
        created: usize,
        stiffened: usize,
    },
}

/// Builds lattices through [`Simulation::add_atom`]-style placement and
/// rewires them afterwards.
///
/// Spacing is always the nearest-neighbor distance in world units; the cubic
/// builders derive their lattice constant from it.
pub struct CrystalGenerator;

impl CrystalGenerator {
    /// Nearest-neighbor distance for `kind` built from `symbols`.
    pub fn expected_spacing(
        elements: &ElementTable,
        kind: LatticeKind,
        symbols: &[&str],
    ) -> Result<f64, EngineError> {
        let props = resolve(elements, kind, symbols)?;
        Ok(spacing_for(kind, &props))
    }

    #[instrument(skip_all, fields(%kind))]
    pub fn generate(
        sim: &mut Simulation,
        kind: LatticeKind,
        origin: Point3<f64>,
        size: [usize; 3],
        symbols: &[&str],
    ) -> Result<Vec<AtomId>, EngineError> {
        if size.contains(&0) {
            return Err(EngineError::InvalidLatticeSize(size));
        }
        let props = resolve(sim.elements(), kind, symbols)?;
        let spacing = spacing_for(kind, &props);

        let sites: Vec<(Vector3<f64>, usize)> = match kind {
            LatticeKind::RockSalt => rock_salt_sites(size, spacing),
            LatticeKind::BodyCenteredCubic => body_centered_sites(size, spacing),
            LatticeKind::FaceCenteredCubic => face_centered_sites(size, spacing),
            LatticeKind::HexagonalLayered => hexagonal_sites(size, spacing),
        };

        let mut ids = Vec::with_capacity(sites.len());
        for (offset, species) in sites {
            ids.push(sim.add_crystal_atom(origin + offset, symbols[species])?);
        }
        info!(
            atoms = ids.len(),
            spacing,
            symbols = %symbols.join("/"),
            "Generated lattice"
        );
        Ok(ids)
    }

    pub fn rock_salt(
        sim: &mut Simulation,
        origin: Point3<f64>,
        size: [usize; 3],
        cation: &str,
        anion: &str,
    ) -> Result<Vec<AtomId>, EngineError> {
        Self::generate(sim, LatticeKind::RockSalt, origin, size, &[cation, anion])
    }

    pub fn body_centered_cubic(
        sim: &mut Simulation,
        origin: Point3<f64>,
        cells: [usize; 3],
        symbol: &str,
    ) -> Result<Vec<AtomId>, EngineError> {
        Self::generate(sim, LatticeKind::BodyCenteredCubic, origin, cells, &[symbol])
    }

    pub fn face_centered_cubic(
        sim: &mut Simulation,
        origin: Point3<f64>,
        cells: [usize; 3],
        symbol: &str,
    ) -> Result<Vec<AtomId>, EngineError> {
        Self::generate(sim, LatticeKind::FaceCenteredCubic, origin, cells, &[symbol])
    }

    /// `size` is `[columns, layers, rows]`: honeycomb cells along x and z,
    /// sheets stacked along y.
    pub fn hexagonal_layered(
        sim: &mut Simulation,
        origin: Point3<f64>,
        size: [usize; 3],
        symbol: &str,
    ) -> Result<Vec<AtomId>, EngineError> {
        Self::generate(sim, LatticeKind::HexagonalLayered, origin, size, &[symbol])
    }

    /// Turns a freshly generated lattice into a bonded solid.
    ///
    /// An all-metal lattice loses any bonds among its atoms and becomes a
    /// single metallic cloud. Anything else is force-connected at the spacing
    /// `kind` is built with, homoatomic bonds become crystal bonds, and bonds
    /// between lattice atoms are stiffened.
    #[instrument(skip_all, fields(atoms = ids.len(), %kind))]
    pub fn strengthen_crystal_bonds(
        sim: &mut Simulation,
        ids: &[AtomId],
        kind: LatticeKind,
    ) -> Result<CrystalBonding, EngineError> {
        let members: Vec<&Atom> = ids
            .iter()
            .map(|id| sim.atom(*id).ok_or(EngineError::AtomNotFound(*id)))
            .collect::<Result<_, _>>()?;
        if members.len() < 2 {
            return Err(EngineError::InsufficientAtoms {
                required: 2,
                found: members.len(),
            });
        }

        if members.iter().all(|a| a.element.is_metal()) {
            if let Some(&id) = ids.iter().find(|id| sim.atoms()[**id].metallic_cloud.is_some()) {
                return Err(EngineError::AlreadyInCloud(id));
            }
            let internal = internal_bonds(sim, ids);
            for bond_id in &internal {
                sim.remove_structure(*bond_id)?;
            }
            let cloud = sim.create_metallic_cloud(ids)?;
            info!(removed_bonds = internal.len(), "Lattice converted to metallic cloud");
            return Ok(CrystalBonding::Metallic {
                cloud,
                removed_bonds: internal.len(),
            });
        }

        let spacing = spacing_for(kind, &lattice_elements(kind, &members));
        let created = Self::force_connect_crystal(sim, ids, spacing)?;

        let mut stiffened = 0;
        for bond_id in internal_bonds(sim, ids) {
            let atoms = sim.atoms();
            let Some(Structure::Bond(bond)) = sim.structures().get(bond_id) else {
                continue;
            };
            let both_crystal = atoms[bond.atom1_id].is_crystal && atoms[bond.atom2_id].is_crystal;
            let homoatomic = atoms[bond.atom1_id].element.number == atoms[bond.atom2_id].element.number;

            if let Some(Structure::Bond(bond)) = sim.structures_mut().get_mut(bond_id) {
                if homoatomic {
                    bond.set_crystal_type();
                }
                if both_crystal {
                    bond.stiffen();
                    stiffened += 1;
                }
            }
        }
        info!(created, stiffened, spacing, "Crystal bonds strengthened");
        Ok(CrystalBonding::Bonded { created, stiffened })
    }

    /// Bonds every pair within [`CONNECT_TOLERANCE`] times `spacing` that is
    /// not bonded yet and still has valence on both sides. Returns the number
    /// of bonds created.
    pub fn force_connect_crystal(
        sim: &mut Simulation,
        ids: &[AtomId],
        spacing: f64,
    ) -> Result<usize, EngineError> {
        let reach = spacing * CONNECT_TOLERANCE;
        let mut pairs: Vec<(f64, AtomId, AtomId)> = Vec::new();
        for (&a, &b) in ids.iter().tuple_combinations() {
            let pa = sim.atom(a).ok_or(EngineError::AtomNotFound(a))?.position;
            let pb = sim.atom(b).ok_or(EngineError::AtomNotFound(b))?.position;
            let dist = (pb - pa).norm();
            if dist <= reach {
                pairs.push((dist, a, b));
            }
        }
        pairs.sort_by(|x, y| x.0.total_cmp(&y.0));

        let mut created = 0;
        let mut saturated = 0;
        for (_, a, b) in pairs {
            match sim.create_bond(a, b) {
                Ok(_) => created += 1,
                Err(EngineError::AlreadyBonded(..)) => {}
                Err(EngineError::ValenceExhausted(_)) => saturated += 1,
                Err(e) => return Err(e),
            }
        }
        debug!(created, saturated, reach, "Force-connected lattice");
        Ok(created)
    }

    /// Sets `frozen` on every atom; freezing also brings them to rest.
    pub fn freeze_crystal(
        sim: &mut Simulation,
        ids: &[AtomId],
        frozen: bool,
    ) -> Result<(), EngineError> {
        for &id in ids {
            sim.set_frozen(id, frozen)?;
        }
        debug!(atoms = ids.len(), frozen, "Crystal freeze toggled");
        Ok(())
    }
}

fn resolve(
    elements: &ElementTable,
    kind: LatticeKind,
    symbols: &[&str],
) -> Result<Vec<Arc<ElementProperties>>, EngineError> {
    if symbols.len() < kind.element_count() {
        return Err(EngineError::InsufficientAtoms {
            required: kind.element_count(),
            found: symbols.len(),
        });
    }
    symbols[..kind.element_count()]
        .iter()
        .map(|s| {
            elements
                .get(s)
                .cloned()
                .ok_or_else(|| EngineError::UnknownElement(s.to_string()))
        })
        .collect()
}

fn spacing_for(kind: LatticeKind, props: &[Arc<ElementProperties>]) -> f64 {
    match kind {
        LatticeKind::RockSalt => {
            (props[0].covalent_radius_pm() + props[1].covalent_radius_pm())
                * ROCK_SALT_SPACING_FACTOR
                / PM_PER_UNIT
        }
        LatticeKind::BodyCenteredCubic | LatticeKind::FaceCenteredCubic => {
            props[0].covalent_radius_pm() * 2.0 * CUBIC_SPACING_FACTOR / PM_PER_UNIT
        }
        LatticeKind::HexagonalLayered => {
            props[0].covalent_radius_pm() * 2.0 * HEXAGONAL_SPACING_FACTOR / PM_PER_UNIT
        }
    }
}

/// Distinct elements of an existing atom set in first-seen order, padded
/// with the first one when `kind` needs more species than are present.
fn lattice_elements(kind: LatticeKind, members: &[&Atom]) -> Vec<Arc<ElementProperties>> {
    let mut distinct: Vec<Arc<ElementProperties>> = Vec::new();
    for atom in members {
        if !distinct.iter().any(|e| e.number == atom.element.number) {
            distinct.push(Arc::clone(&atom.element));
        }
    }
    while distinct.len() < kind.element_count() {
        distinct.push(Arc::clone(&distinct[0]));
    }
    distinct
}

fn internal_bonds(sim: &Simulation, ids: &[AtomId]) -> Vec<StructureId> {
    let set: BTreeSet<AtomId> = ids.iter().copied().collect();
    sim.bonds()
        .filter(|(_, b)| set.contains(&b.atom1_id) && set.contains(&b.atom2_id))
        .map(|(id, _)| id)
        .collect()
}

fn rock_salt_sites(size: [usize; 3], spacing: f64) -> Vec<(Vector3<f64>, usize)> {
    let [nx, ny, nz] = size;
    (0..nx)
        .cartesian_product(0..ny)
        .cartesian_product(0..nz)
        .map(|((x, y), z)| {
            let offset = Vector3::new(x as f64, y as f64, z as f64) * spacing;
            (offset, (x + y + z) % 2)
        })
        .collect()
}

/// Sites on the half-cell grid `[0, 2n]` selected by `keep`.
fn half_grid_sites(
    cells: [usize; 3],
    lattice_constant: f64,
    keep: impl Fn(usize, usize, usize) -> bool,
) -> Vec<(Vector3<f64>, usize)> {
    let [nx, ny, nz] = cells;
    let half = lattice_constant / 2.0;
    (0..=2 * nx)
        .cartesian_product(0..=2 * ny)
        .cartesian_product(0..=2 * nz)
        .filter(|&((i, j), k)| keep(i, j, k))
        .map(|((i, j), k)| (Vector3::new(i as f64, j as f64, k as f64) * half, 0))
        .collect()
}

fn body_centered_sites(cells: [usize; 3], spacing: f64) -> Vec<(Vector3<f64>, usize)> {
    let a = spacing * 2.0 / 3f64.sqrt();
    half_grid_sites(cells, a, |i, j, k| {
        let all_even = i % 2 == 0 && j % 2 == 0 && k % 2 == 0;
        let all_odd = i % 2 == 1 && j % 2 == 1 && k % 2 == 1;
        all_even || all_odd
    })
}

fn face_centered_sites(cells: [usize; 3], spacing: f64) -> Vec<(Vector3<f64>, usize)> {
    let a = spacing * 2f64.sqrt();
    half_grid_sites(cells, a, |i, j, k| (i + j + k) % 2 == 0)
}

fn hexagonal_sites(size: [usize; 3], bond: f64) -> Vec<(Vector3<f64>, usize)> {
    let [columns, layers, rows] = size;
    let sqrt3 = 3f64.sqrt();
    let a1 = Vector3::new(sqrt3 * bond, 0.0, 0.0);
    let a2 = Vector3::new(sqrt3 / 2.0 * bond, 0.0, 1.5 * bond);
    let basis = [Vector3::zeros(), Vector3::new(0.0, 0.0, bond)];
    let layer_step = HEXAGONAL_LAYER_RATIO * bond;

    let mut sites = Vec::with_capacity(columns * rows * layers * 2);
    for layer in 0..layers {
        // AB stacking: odd sheets sit over the B sublattice.
        let shift = if layer % 2 == 1 { basis[1] } else { Vector3::zeros() };
        let lift = Vector3::new(0.0, layer as f64 * layer_step, 0.0);
        for (c, r) in (0..columns).cartesian_product(0..rows) {
            let cell = a1 * c as f64 + a2 * r as f64;
            for b in &basis {
                sites.push((cell + b + shift + lift, 0));
            }
        }
    }
    sites
}
