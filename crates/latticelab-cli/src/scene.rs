use crate::error::{CliError, Result};
use latticelab::core::models::ids::AtomId;
use latticelab::engine::error::EngineError;
use latticelab::workflows::crystal::{
    CrystalBonding, CrystalGenerator, LatticeKind, ParseLatticeKindError,
};
use latticelab::workflows::simulation::Simulation;
use nalgebra::Point3;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SceneAtom {
    pub element: String,
    pub position: [f64; 3],
    #[serde(default)]
    pub frozen: bool,
}

/// Explicit bond between two entries of `atoms`, by index.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SceneBond {
    pub between: [usize; 2],
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SceneCloud {
    pub atoms: Vec<usize>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SceneCrystal {
    pub lattice: String,
    pub elements: Vec<String>,
    #[serde(default)]
    pub origin: [f64; 3],
    pub size: [usize; 3],
    #[serde(default = "default_true")]
    pub strengthen: bool,
    #[serde(default)]
    pub frozen: bool,
}

fn default_true() -> bool {
    true
}

/// A scene file: loose atoms, then explicit bonds and clouds over them, then
/// generated crystals.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SceneFile {
    #[serde(default)]
    pub atoms: Vec<SceneAtom>,
    #[serde(default)]
    pub bonds: Vec<SceneBond>,
    #[serde(default)]
    pub clouds: Vec<SceneCloud>,
    #[serde(default)]
    pub crystals: Vec<SceneCrystal>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SceneSummary {
    pub atoms: usize,
    pub explicit_bonds: usize,
    pub clouds: usize,
    pub crystals: usize,
}

impl SceneFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading scene from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Adds everything in the scene to `sim`, in file order.
    pub fn populate(&self, sim: &mut Simulation) -> Result<SceneSummary> {
        let mut summary = SceneSummary::default();

        let mut ids = Vec::with_capacity(self.atoms.len());
        for atom in &self.atoms {
            let id = sim.add_atom(Point3::from(atom.position), &atom.element)?;
            if atom.frozen {
                sim.set_frozen(id, true)?;
            }
            ids.push(id);
        }
        summary.atoms = ids.len();

        for bond in &self.bonds {
            let [a, b] = bond.between;
            match sim.create_bond(lookup(&ids, a)?, lookup(&ids, b)?) {
                Ok(_) => summary.explicit_bonds += 1,
                Err(EngineError::AlreadyBonded(..)) => {
                    debug!(a, b, "Scene bond already formed by auto-bonding")
                }
                Err(e) => return Err(e.into()),
            }
        }

        for cloud in &self.clouds {
            let members = cloud
                .atoms
                .iter()
                .map(|&i| lookup(&ids, i))
                .collect::<Result<Vec<_>>>()?;
            sim.create_metallic_cloud(&members)?;
            summary.clouds += 1;
        }

        for crystal in &self.crystals {
            let kind: LatticeKind = crystal
                .lattice
                .parse()
                .map_err(|e: ParseLatticeKindError| CliError::Scene(e.to_string()))?;
            let symbols: Vec<&str> = crystal.elements.iter().map(String::as_str).collect();
            let members = CrystalGenerator::generate(
                sim,
                kind,
                Point3::from(crystal.origin),
                crystal.size,
                &symbols,
            )?;
            if crystal.strengthen {
                match CrystalGenerator::strengthen_crystal_bonds(sim, &members, kind)? {
                    CrystalBonding::Metallic { .. } => summary.clouds += 1,
                    CrystalBonding::Bonded { created, .. } => {
                        debug!(created, "Crystal bonds formed")
                    }
                }
            }
            if crystal.frozen {
                CrystalGenerator::freeze_crystal(sim, &members, true)?;
            }
            summary.atoms += members.len();
            summary.crystals += 1;
        }

        info!(
            atoms = summary.atoms,
            crystals = summary.crystals,
            clouds = summary.clouds,
            "Scene populated"
        );
        Ok(summary)
    }
}

fn lookup(ids: &[AtomId], index: usize) -> Result<AtomId> {
    ids.get(index).copied().ok_or_else(|| {
        CliError::Scene(format!(
            "atom index {} is out of range ({} atoms declared)",
            index,
            ids.len()
        ))
    })
}
