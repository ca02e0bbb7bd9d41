use crate::core::models::atom::Atom;
use crate::core::models::cloud::MetallicCloud;
use crate::core::models::ids::{AtomId, StructureId};
use crate::core::models::molecule::{bonded_neighbors, connected_components};
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use crate::workflows::simulation::Simulation;
use slotmap::SlotMap;
use tracing::{info, instrument, warn};

/// Cloud atoms farther apart than this are not considered touching.
pub const FRAGMENT_CUTOFF: f64 = 6.0;

/// What became of one fragment after a split.
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentOutcome {
    Standalone(AtomId),
    Bond(StructureId),
    /// A two-atom remnant that could not be bonded.
    Unbonded([AtomId; 2]),
    Cloud(StructureId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentationReport {
    /// Bonds dropped because an endpoint is gone.
    pub removed_bonds: usize,
    /// Clouds left with fewer than two live atoms.
    pub dissolved_clouds: usize,
    pub split_clouds: usize,
    pub outcomes: Vec<FragmentOutcome>,
}

impl FragmentationReport {
    pub fn is_empty(&self) -> bool {
        self.removed_bonds == 0 && self.dissolved_clouds == 0 && self.split_clouds == 0
    }
}

/// Finds disconnected pieces of bonded sets and metallic clouds and splits
/// them into independent structures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentationDetector {
    pub cutoff: f64,
}

impl Default for FragmentationDetector {
    fn default() -> Self {
        Self {
            cutoff: FRAGMENT_CUTOFF,
        }
    }
}

impl FragmentationDetector {
    pub fn new(cutoff: f64) -> Self {
        Self { cutoff }
    }

    /// Connected components of `ids`, following bonds or, with `use_spatial`,
    /// proximity under the cutoff. Dead ids are dropped; every live id lands
    /// in exactly one fragment.
    pub fn find_disconnected_fragments(
        &self,
        ids: &[AtomId],
        atoms: &SlotMap<AtomId, Atom>,
        structures: &SlotMap<StructureId, Structure>,
        use_spatial: bool,
    ) -> Vec<Vec<AtomId>> {
        let live: Vec<AtomId> = ids
            .iter()
            .copied()
            .filter(|id| atoms.contains_key(*id))
            .collect();

        if use_spatial {
            connected_components(&live, |id| {
                let origin = atoms[id].position;
                live.iter()
                    .copied()
                    .filter(|other| {
                        *other != id && (atoms[*other].position - origin).norm() <= self.cutoff
                    })
                    .collect()
            })
        } else {
            connected_components(&live, |id| {
                bonded_neighbors(id, atoms, structures)
                    .into_iter()
                    .filter(|n| live.contains(n))
                    .collect()
            })
        }
    }

    /// `None` while the cloud's live atoms form one spatial cluster.
    pub fn check_metallic_cloud_fragmentation(
        &self,
        cloud: &MetallicCloud,
        atoms: &SlotMap<AtomId, Atom>,
        structures: &SlotMap<StructureId, Structure>,
    ) -> Option<Vec<Vec<AtomId>>> {
        let fragments = self.find_disconnected_fragments(cloud.atoms(), atoms, structures, true);
        if fragments.len() <= 1 {
            None
        } else {
            Some(fragments)
        }
    }

    /// Replaces a cloud with one structure per fragment: lone atoms stay
    /// standalone, pairs get a bond, larger groups a new cloud. Every fragment
    /// atom is brought to rest.
    pub fn split_metallic_cloud(
        &self,
        sim: &mut Simulation,
        cloud_id: StructureId,
        fragments: Vec<Vec<AtomId>>,
    ) -> Result<Vec<FragmentOutcome>, EngineError> {
        match sim.structures().get(cloud_id) {
            Some(Structure::Cloud(_)) => {}
            _ => return Err(EngineError::StructureNotFound(cloud_id)),
        }
        sim.remove_structure(cloud_id)?;

        let mut outcomes = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let outcome = match fragment.as_slice() {
                [] => continue,
                [single] => FragmentOutcome::Standalone(*single),
                [a, b] => match sim.create_bond(*a, *b) {
                    Ok(id) => FragmentOutcome::Bond(id),
                    Err(e) => {
                        warn!(error = %e, "Could not bond two-atom cloud remnant");
                        FragmentOutcome::Unbonded([*a, *b])
                    }
                },
                _ => FragmentOutcome::Cloud(sim.create_metallic_cloud(&fragment)?),
            };
            sim.settle_atoms(&fragment);
            outcomes.push(outcome);
        }
        info!(fragments = outcomes.len(), "Metallic cloud split");
        Ok(outcomes)
    }

    /// Sweeps every structure after atoms were removed: drops bonds with a
    /// dead endpoint, dissolves clouds that fell below two atoms and splits
    /// fragmented ones.
    #[instrument(skip_all, name = "fragmentation_check")]
    pub fn check_all_fragmentation(&self, sim: &mut Simulation) -> FragmentationReport {
        let mut report = FragmentationReport::default();
        let ids: Vec<StructureId> = sim.structures().keys().collect();

        for id in ids {
            let Some(structure) = sim.structures().get(id) else {
                continue;
            };
            match structure {
                Structure::Bond(bond) => {
                    if !bond.is_valid(sim.atoms()) && sim.remove_structure(id).is_ok() {
                        report.removed_bonds += 1;
                    }
                }
                Structure::Cloud(_) => {
                    let dead = prune_dead_members(sim, id);
                    let Some(Structure::Cloud(cloud)) = sim.structures().get(id) else {
                        continue;
                    };
                    if cloud.len() < 2 {
                        if sim.remove_structure(id).is_ok() {
                            report.dissolved_clouds += 1;
                        }
                        continue;
                    }
                    let fragments =
                        self.check_metallic_cloud_fragmentation(cloud, sim.atoms(), sim.structures());
                    if let Some(fragments) = fragments {
                        match self.split_metallic_cloud(sim, id, fragments) {
                            Ok(outcomes) => {
                                report.split_clouds += 1;
                                report.outcomes.extend(outcomes);
                            }
                            Err(e) => warn!(error = %e, "Failed to split metallic cloud"),
                        }
                    } else if dead > 0 {
                        info!(removed = dead, "Metallic cloud shrank");
                    }
                }
            }
        }

        if !report.is_empty() {
            info!(
                removed_bonds = report.removed_bonds,
                dissolved_clouds = report.dissolved_clouds,
                split_clouds = report.split_clouds,
                "Structural repair complete"
            );
        }
        report
    }
}

fn prune_dead_members(sim: &mut Simulation, cloud_id: StructureId) -> usize {
    let dead: Vec<AtomId> = match sim.structures().get(cloud_id) {
        Some(Structure::Cloud(cloud)) => cloud
            .atoms()
            .iter()
            .copied()
            .filter(|id| !sim.atoms().contains_key(*id))
            .collect(),
        _ => return 0,
    };
    if let Some(Structure::Cloud(cloud)) = sim.structures_mut().get_mut(cloud_id) {
        for id in &dead {
            cloud.remove_atom(*id);
        }
    }
    dead.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn cloud_of(sim: &mut Simulation, positions: &[Point3<f64>]) -> (StructureId, Vec<AtomId>) {
        let ids: Vec<AtomId> = positions
            .iter()
            .map(|p| sim.add_atom(*p, "Cu").unwrap())
            .collect();
        (sim.create_metallic_cloud(&ids).unwrap(), ids)
    }

    fn cluster(x: f64, n: usize) -> Vec<Point3<f64>> {
        (0..n)
            .map(|i| Point3::new(x + i as f64 * 2.5, 10.0, 0.0))
            .collect()
    }

    #[test]
    fn two_separated_clusters_yield_two_fragments() {
        let mut sim = Simulation::default();
        let mut positions = cluster(0.0, 3);
        positions.extend(cluster(30.0, 3));
        let (cloud_id, ids) = cloud_of(&mut sim, &positions);

        let detector = FragmentationDetector::default();
        let cloud = sim.structures()[cloud_id].as_cloud().unwrap();
        let fragments = detector
            .check_metallic_cloud_fragmentation(cloud, sim.atoms(), sim.structures())
            .unwrap();
        assert_eq!(fragments.len(), 2);

        let mut union: Vec<AtomId> = fragments.into_iter().flatten().collect();
        let mut expected = ids.clone();
        union.sort();
        expected.sort();
        assert_eq!(union, expected);
    }

    #[test]
    fn intact_cloud_reports_none() {
        let mut sim = Simulation::default();
        let (cloud_id, _) = cloud_of(&mut sim, &cluster(0.0, 4));
        let cloud = sim.structures()[cloud_id].as_cloud().unwrap();
        assert!(
            FragmentationDetector::default()
                .check_metallic_cloud_fragmentation(cloud, sim.atoms(), sim.structures())
                .is_none()
        );
    }

    #[test]
    fn bond_mode_follows_explicit_edges() {
        let mut sim = Simulation::default();
        let c1 = sim.add_atom(Point3::new(0.0, 5.0, 0.0), "C").unwrap();
        let c2 = sim.add_atom(Point3::new(1.5, 5.0, 0.0), "C").unwrap();
        let c3 = sim.add_atom(Point3::new(3.0, 30.0, 0.0), "C").unwrap();
        let fragments = FragmentationDetector::default().find_disconnected_fragments(
            &[c1, c2, c3],
            sim.atoms(),
            sim.structures(),
            false,
        );
        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().any(|f| f.len() == 2));
    }

    #[test]
    fn split_creates_standalone_bond_and_cloud() {
        let mut sim = Simulation::default();
        let mut positions = cluster(0.0, 1);
        positions.extend(cluster(30.0, 2));
        positions.extend(cluster(60.0, 3));
        let (cloud_id, ids) = cloud_of(&mut sim, &positions);
        for id in &ids {
            sim.atoms_mut()[*id].velocity = Vector3::new(0.5, 0.0, 0.0);
        }

        let detector = FragmentationDetector::default();
        let cloud = sim.structures()[cloud_id].as_cloud().unwrap();
        let fragments = detector
            .check_metallic_cloud_fragmentation(cloud, sim.atoms(), sim.structures())
            .unwrap();
        let outcomes = detector
            .split_metallic_cloud(&mut sim, cloud_id, fragments)
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.contains(&FragmentOutcome::Standalone(ids[0])));
        assert!(outcomes.iter().any(|o| matches!(o, FragmentOutcome::Bond(_))));
        assert!(outcomes.iter().any(|o| matches!(o, FragmentOutcome::Cloud(_))));
        assert!(sim.structures().get(cloud_id).is_none());

        let stats = sim.stats();
        assert_eq!(stats.cloud_count, 1);
        assert_eq!(stats.bond_count, 1);
        assert!(ids.iter().all(|id| sim.atoms()[*id].velocity == Vector3::zeros()));
        assert!(sim.atoms()[ids[0]].metallic_cloud.is_none());
        assert!(sim.atoms()[ids[5]].metallic_cloud.is_some());
    }

    #[test]
    fn deleting_a_bridge_atom_splits_the_cloud() {
        let mut sim = Simulation::default();
        let positions: Vec<Point3<f64>> = (0..7)
            .map(|i| Point3::new(i as f64 * 5.0, 10.0, 0.0))
            .collect();
        let (_, ids) = cloud_of(&mut sim, &positions);

        let report = sim.delete_atom(ids[3]).unwrap();
        assert_eq!(report.split_clouds, 1);
        assert_eq!(sim.stats().cloud_count, 2);
        assert_eq!(sim.stats().atom_count, 6);
    }

    #[test]
    fn check_all_drops_invalid_bonds_and_dissolves_small_clouds() {
        let mut sim = Simulation::default();
        let o = sim.add_atom(Point3::new(0.0, 5.0, 0.0), "O").unwrap();
        let h = sim.add_atom(Point3::new(1.0, 5.0, 0.0), "H").unwrap();
        let (_, metal) = cloud_of(&mut sim, &cluster(40.0, 2));

        sim.remove_atom(h).unwrap();
        sim.remove_atom(metal[0]).unwrap();

        let report = FragmentationDetector::default().check_all_fragmentation(&mut sim);
        assert_eq!(report.removed_bonds, 1);
        assert_eq!(report.dissolved_clouds, 1);
        assert!(sim.atoms()[o].bonds.is_empty());
        assert!(sim.atoms()[metal[1]].metallic_cloud.is_none());
        assert_eq!(sim.stats().bond_count, 0);
        assert_eq!(sim.stats().cloud_count, 0);
    }
}
