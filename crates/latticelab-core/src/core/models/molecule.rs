use super::atom::Atom;
use super::ids::{AtomId, StructureId};
use super::structure::Structure;
use crate::core::utils::geometry;
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashSet};

/// The connected component of atoms reachable from a seed through bonds.
///
/// A molecule is a throwaway view: it is rebuilt each time a group operation
/// needs it and goes stale as soon as bonds change.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub atoms: Vec<AtomId>,
    /// Bonds whose endpoints both lie in `atoms`.
    pub bonds: Vec<StructureId>,
}

impl Molecule {
    /// Walks the bond graph from `seed`; `None` if the seed is not live.
    pub fn discover(
        seed: AtomId,
        atoms: &SlotMap<AtomId, Atom>,
        structures: &SlotMap<StructureId, Structure>,
    ) -> Option<Self> {
        if !atoms.contains_key(seed) {
            return None;
        }
        let members = depth_first_component(seed, |id| bonded_neighbors(id, atoms, structures));
        let member_set: HashSet<AtomId> = members.iter().copied().collect();

        let mut bonds: Vec<StructureId> = members
            .iter()
            .flat_map(|id| atoms[*id].bonds.iter().copied())
            .filter(|sid| {
                structures
                    .get(*sid)
                    .and_then(Structure::as_bond)
                    .is_some_and(|b| {
                        member_set.contains(&b.atom1_id) && member_set.contains(&b.atom2_id)
                    })
            })
            .collect();
        bonds.sort_unstable();
        bonds.dedup();

        Some(Self {
            atoms: members,
            bonds,
        })
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atoms.contains(&atom_id)
    }

    pub fn centroid(&self, atoms: &SlotMap<AtomId, Atom>) -> Option<Point3<f64>> {
        let positions: Vec<Point3<f64>> = self
            .atoms
            .iter()
            .filter_map(|id| atoms.get(*id))
            .map(|a| a.position)
            .collect();
        geometry::centroid(&positions)
    }

    /// Hill-order formula: carbon, then hydrogen, then the rest alphabetically.
    /// Without carbon every symbol is alphabetical.
    pub fn formula(&self, atoms: &SlotMap<AtomId, Atom>) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for atom in self.atoms.iter().filter_map(|id| atoms.get(*id)) {
            *counts.entry(atom.symbol.as_str()).or_default() += 1;
        }

        let mut ordered: Vec<(&str, usize)> = Vec::with_capacity(counts.len());
        if let Some(c) = counts.remove("C") {
            ordered.push(("C", c));
            if let Some(h) = counts.remove("H") {
                ordered.push(("H", h));
            }
        }
        ordered.extend(counts);

        ordered
            .into_iter()
            .map(|(symbol, n)| {
                if n == 1 {
                    symbol.to_string()
                } else {
                    format!("{symbol}{n}")
                }
            })
            .collect()
    }
}

/// Atoms directly bonded to `atom_id` through live discrete bonds.
pub fn bonded_neighbors(
    atom_id: AtomId,
    atoms: &SlotMap<AtomId, Atom>,
    structures: &SlotMap<StructureId, Structure>,
) -> Vec<AtomId> {
    let Some(atom) = atoms.get(atom_id) else {
        return Vec::new();
    };
    atom.bonds
        .iter()
        .filter_map(|sid| structures.get(*sid).and_then(Structure::as_bond))
        .filter_map(|b| b.other(atom_id))
        .filter(|other| atoms.contains_key(*other))
        .collect()
}

/// Iterative depth-first traversal; returns the seed's component in visit order.
pub fn depth_first_component<F>(seed: AtomId, mut neighbors: F) -> Vec<AtomId>
where
    F: FnMut(AtomId) -> Vec<AtomId>,
{
    let mut visited = HashSet::from([seed]);
    let mut stack = vec![seed];
    let mut component = Vec::new();

    while let Some(current) = stack.pop() {
        component.push(current);
        for next in neighbors(current) {
            if visited.insert(next) {
                stack.push(next);
            }
        }
    }
    component
}

/// Partitions `ids` into connected components; each id lands in exactly one.
pub fn connected_components<F>(ids: &[AtomId], mut neighbors: F) -> Vec<Vec<AtomId>>
where
    F: FnMut(AtomId) -> Vec<AtomId>,
{
    let mut assigned: HashSet<AtomId> = HashSet::with_capacity(ids.len());
    let mut components = Vec::new();

    for &id in ids {
        if assigned.contains(&id) {
            continue;
        }
        let component = depth_first_component(id, &mut neighbors);
        assigned.extend(component.iter().copied());
        components.push(component);
    }
    components
}
