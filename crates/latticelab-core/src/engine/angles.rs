//! VSEPR bond-angle constraints.
//!
//! Every correction is a force, never a positional snap: each frame nudges the
//! neighbors of a central atom toward the ideal inter-bond angle, and the
//! central atom takes the reaction so the group's net force stays zero.

use crate::core::models::atom::Atom;
use crate::core::models::ids::{AtomId, StructureId};
use crate::core::models::molecule::bonded_neighbors;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{MolecularGeometry, angle_between};
use itertools::Itertools;
use nalgebra::Vector3;
use slotmap::SlotMap;

/// Atoms with more bonds than this are treated as lattice members.
pub const MAX_MOLECULAR_BONDS: usize = 6;
/// Octahedral neighbor pairs with a cosine below this are trans pairs.
pub const OCTAHEDRAL_TRANS_COSINE: f64 = -0.7;

const DEGENERATE_NORM: f64 = 1e-9;
const NEGLIGIBLE_ERROR: f64 = 1e-6;

/// The correction strategy picked for one central atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleStrategy {
    Linear,
    /// Every neighbor pair toward one angle (radians).
    AllPairs { ideal: f64 },
    /// Every neighbor pair toward 90 degrees, trans pairs left alone.
    Octahedral,
    /// Fallback when the declared shape does not fit the neighbor count.
    Generic { ideal: f64 },
}

/// Chooses the strategy for a central atom with `bond_count` neighbors.
///
/// The declared geometry wins when its expected neighbor count matches;
/// otherwise the shape implied by the bond count is used through the generic
/// all-pairs solver.
pub fn select_strategy(
    declared: Option<MolecularGeometry>,
    element_angle: Option<f64>,
    bond_count: usize,
) -> Option<AngleStrategy> {
    let inferred = MolecularGeometry::from_bond_count(bond_count)?;
    let geometry = declared.unwrap_or(inferred);

    let fits = match geometry {
        MolecularGeometry::Octahedral => matches!(bond_count, 5 | 6),
        other => other.expected_bond_count() == Some(bond_count),
    };
    if !fits {
        let ideal = inferred.ideal_angle_deg(None).to_radians();
        return Some(AngleStrategy::Generic { ideal });
    }

    Some(match geometry {
        MolecularGeometry::Linear => AngleStrategy::Linear,
        MolecularGeometry::Octahedral => AngleStrategy::Octahedral,
        shape => AngleStrategy::AllPairs {
            ideal: shape.ideal_angle_deg(element_angle).to_radians(),
        },
    })
}

/// Applies bond-angle corrections to the neighbors of a central atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondAngleSolver {
    pub strength: f64,
}

impl BondAngleSolver {
    pub fn new(strength: f64) -> Self {
        Self { strength }
    }

    /// Molecule-scale atoms only: outside any cloud, not frozen, 2 to 6 bonds.
    pub fn is_eligible(atom: &Atom) -> bool {
        atom.metallic_cloud.is_none()
            && !atom.frozen
            && (2..=MAX_MOLECULAR_BONDS).contains(&atom.bonds.len())
    }

    pub fn apply(
        &self,
        center: AtomId,
        atoms: &mut SlotMap<AtomId, Atom>,
        structures: &SlotMap<StructureId, Structure>,
    ) {
        let Some(atom) = atoms.get(center) else {
            return;
        };
        if !Self::is_eligible(atom) {
            return;
        }
        let origin = atom.position;
        let declared = atom.element.geometry();
        let element_angle = atom.element.ideal_bond_angle;

        let neighbors: Vec<(AtomId, Vector3<f64>)> = bonded_neighbors(center, atoms, structures)
            .into_iter()
            .filter_map(|id| {
                let direction = (atoms[id].position - origin).try_normalize(DEGENERATE_NORM)?;
                Some((id, direction))
            })
            .collect();

        let Some(strategy) = select_strategy(declared, element_angle, neighbors.len()) else {
            return;
        };

        let mut forces: Vec<(AtomId, Vector3<f64>)> = Vec::new();
        for ((id_i, u_i), (id_j, u_j)) in neighbors.iter().tuple_combinations() {
            let ideal = match strategy {
                AngleStrategy::Linear => std::f64::consts::PI,
                AngleStrategy::AllPairs { ideal } | AngleStrategy::Generic { ideal } => ideal,
                AngleStrategy::Octahedral => {
                    if u_i.dot(u_j) < OCTAHEDRAL_TRANS_COSINE {
                        continue;
                    }
                    std::f64::consts::FRAC_PI_2
                }
            };
            if let Some((f_i, f_j)) = self.pair_correction(u_i, u_j, ideal) {
                forces.push((*id_i, f_i));
                forces.push((*id_j, f_j));
            }
        }

        let mut reaction = Vector3::zeros();
        for (id, force) in forces {
            if let Some(neighbor) = atoms.get_mut(id) {
                if !neighbor.frozen {
                    neighbor.apply_force(force);
                    reaction -= force;
                }
            }
        }
        if let Some(center_atom) = atoms.get_mut(center) {
            center_atom.apply_force(reaction);
        }
    }

    /// Tangential forces that open (or close) the angle between two bond
    /// directions toward `ideal`, scaled by the angular error.
    fn pair_correction(
        &self,
        u_i: &Vector3<f64>,
        u_j: &Vector3<f64>,
        ideal: f64,
    ) -> Option<(Vector3<f64>, Vector3<f64>)> {
        let current = angle_between(u_i, u_j)?;
        let error = ideal - current;
        if error.abs() < NEGLIGIBLE_ERROR {
            return None;
        }

        let normal = u_i
            .cross(u_j)
            .try_normalize(DEGENERATE_NORM)
            .unwrap_or_else(|| any_perpendicular(u_i));

        // Directions that increase the angle, each perpendicular to its bond.
        let away_i = u_i.cross(&normal).try_normalize(DEGENERATE_NORM)?;
        let away_j = normal.cross(u_j).try_normalize(DEGENERATE_NORM)?;

        let magnitude = error * self.strength;
        Some((away_i * magnitude, away_j * magnitude))
    }
}

fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&helper).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bond::Bond;
    use crate::core::models::element::ElementTable;
    use nalgebra::Point3;

    fn f64_approx_equal(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    struct Scene {
        atoms: SlotMap<AtomId, Atom>,
        structures: SlotMap<StructureId, Structure>,
        center: AtomId,
        ligands: Vec<AtomId>,
    }

    impl Scene {
        fn star(center: &str, ligand: &str, directions: &[Vector3<f64>]) -> Self {
            let table = ElementTable::builtin();
            let mut atoms = SlotMap::with_key();
            let mut structures = SlotMap::with_key();
            let c = atoms.insert(Atom::new(
                center,
                table.get(center).unwrap().clone(),
                Point3::origin(),
            ));
            let mut ligands = Vec::new();
            for dir in directions {
                let id = atoms.insert(Atom::new(
                    ligand,
                    table.get(ligand).unwrap().clone(),
                    Point3::from(dir.normalize()),
                ));
                let bond = Bond::new(c, &atoms[c], id, &atoms[id]);
                let sid = structures.insert(Structure::Bond(bond.clone()));
                bond.attach(sid, &mut atoms);
                ligands.push(id);
            }
            Self {
                atoms,
                structures,
                center: c,
                ligands,
            }
        }

        /// Angle forces, bond springs and a damped integration step.
        fn relax(&mut self, solver: &BondAngleSolver, frames: usize) {
            for _ in 0..frames {
                solver.apply(self.center, &mut self.atoms, &self.structures);
                for s in self.structures.values() {
                    if let Structure::Bond(bond) = s {
                        bond.update(&mut self.atoms, 1.0);
                    }
                }
                for atom in self.atoms.values_mut() {
                    let accel = atom.force / atom.mass();
                    atom.velocity = (atom.velocity + accel) * 0.98;
                    atom.position += atom.velocity;
                    atom.force = Vector3::zeros();
                }
            }
        }

        fn angle_deg(&self, i: usize, j: usize) -> f64 {
            let origin = self.atoms[self.center].position;
            let a = self.atoms[self.ligands[i]].position - origin;
            let b = self.atoms[self.ligands[j]].position - origin;
            angle_between(&a, &b).unwrap().to_degrees()
        }
    }

    fn in_plane(deg: f64) -> Vector3<f64> {
        let r = deg.to_radians();
        Vector3::new(r.cos(), r.sin(), 0.0)
    }

    mod strategy {
        use super::*;

        #[test]
        fn declared_geometry_is_used_when_count_matches() {
            assert_eq!(
                select_strategy(Some(MolecularGeometry::Bent), Some(104.5), 2),
                Some(AngleStrategy::AllPairs {
                    ideal: 104.5f64.to_radians()
                })
            );
            assert_eq!(
                select_strategy(Some(MolecularGeometry::Octahedral), None, 6),
                Some(AngleStrategy::Octahedral)
            );
        }

        #[test]
        fn bond_count_decides_when_nothing_is_declared() {
            assert_eq!(select_strategy(None, None, 2), Some(AngleStrategy::Linear));
            assert_eq!(
                select_strategy(None, None, 3),
                Some(AngleStrategy::AllPairs {
                    ideal: 120f64.to_radians()
                })
            );
            assert_eq!(select_strategy(None, None, 1), None);
            assert_eq!(select_strategy(None, None, 7), None);
        }

        #[test]
        fn mismatched_count_falls_back_to_generic_solver() {
            let strategy = select_strategy(Some(MolecularGeometry::Tetrahedral), None, 2);
            assert_eq!(
                strategy,
                Some(AngleStrategy::Generic {
                    ideal: std::f64::consts::PI
                })
            );
            let strategy = select_strategy(Some(MolecularGeometry::Tetrahedral), None, 5);
            assert_eq!(
                strategy,
                Some(AngleStrategy::Generic {
                    ideal: std::f64::consts::FRAC_PI_2
                })
            );
        }
    }

    mod forces {
        use super::*;

        #[test]
        fn corrections_are_momentum_neutral() {
            let mut scene = Scene::star("O", "H", &[in_plane(0.0), in_plane(80.0)]);
            BondAngleSolver::new(0.05).apply(scene.center, &mut scene.atoms, &scene.structures);
            let total: Vector3<f64> = scene.atoms.values().map(|a| a.force).sum();
            assert!(total.norm() < 1e-12);
            assert!(scene.atoms[scene.ligands[0]].force.norm() > 0.0);
        }

        #[test]
        fn closed_angle_is_pushed_open() {
            let mut scene = Scene::star("O", "H", &[in_plane(0.0), in_plane(80.0)]);
            BondAngleSolver::new(0.05).apply(scene.center, &mut scene.atoms, &scene.structures);
            // The first hydrogen sits on +x, the second above it; opening means -y.
            assert!(scene.atoms[scene.ligands[0]].force.y < 0.0);
        }

        #[test]
        fn ineligible_centers_are_skipped() {
            let mut scene = Scene::star("O", "H", &[in_plane(0.0), in_plane(80.0)]);
            scene.atoms[scene.center].frozen = true;
            BondAngleSolver::new(0.05).apply(scene.center, &mut scene.atoms, &scene.structures);
            assert!(scene.atoms.values().all(|a| a.force == Vector3::zeros()));

            let single = Scene::star("O", "H", &[in_plane(0.0)]);
            assert!(!BondAngleSolver::is_eligible(&single.atoms[single.center]));
        }

        #[test]
        fn octahedral_trans_pairs_are_left_alone() {
            let mut scene = Scene::star(
                "Cr",
                "F",
                &[
                    Vector3::x(),
                    -Vector3::x(),
                    Vector3::y(),
                    -Vector3::y(),
                    Vector3::z(),
                    -Vector3::z(),
                ],
            );
            BondAngleSolver::new(0.05).apply(scene.center, &mut scene.atoms, &scene.structures);
            assert!(scene.atoms.values().all(|a| a.force.norm() < 1e-9));
        }
    }

    mod convergence {
        use super::*;

        #[test]
        fn water_relaxes_to_its_bent_angle() {
            let mut scene = Scene::star("O", "H", &[in_plane(0.0), in_plane(90.0)]);
            scene.relax(&BondAngleSolver::new(0.05), 3000);
            assert!(f64_approx_equal(scene.angle_deg(0, 1), 104.5, 2.0));
        }

        #[test]
        fn two_bonded_carbon_straightens_despite_tetrahedral_preference() {
            let mut scene = Scene::star("C", "O", &[in_plane(0.0), in_plane(150.0)]);
            scene.relax(&BondAngleSolver::new(0.05), 3000);
            assert!(scene.angle_deg(0, 1) > 175.0);
        }

        #[test]
        fn boron_trifluoride_spreads_to_trigonal_planar() {
            let mut scene =
                Scene::star("B", "F", &[in_plane(0.0), in_plane(100.0), in_plane(220.0)]);
            scene.relax(&BondAngleSolver::new(0.05), 4000);
            for (i, j) in [(0, 1), (1, 2), (0, 2)] {
                assert!(f64_approx_equal(scene.angle_deg(i, j), 120.0, 2.0));
            }
        }

        #[test]
        fn methane_relaxes_to_tetrahedral() {
            let mut scene = Scene::star(
                "C",
                "H",
                &[
                    Vector3::new(1.0, 1.0, 1.2),
                    Vector3::new(-1.0, -0.8, 1.0),
                    Vector3::new(-1.1, 1.0, -1.0),
                    Vector3::new(1.0, -1.0, -0.9),
                ],
            );
            scene.relax(&BondAngleSolver::new(0.05), 4000);
            for (i, j) in (0..4).tuple_combinations() {
                assert!(f64_approx_equal(scene.angle_deg(i, j), 109.47, 2.5));
            }
        }
    }
}
