//! Kekulization assigns alternating single and double bonds to aromatic ring systems.
//!
//! Bonds of order [`BondOrder::Aromatic`] are replaced by `Single` or
//! `Double` such that every aromatic atom that still has room for a
//! π bond receives exactly one. Implemented via augmenting-path maximum
//! matching over the aromatic subgraph. The `is_aromatic` flags on atoms
//! and bonds are left as they were.
//!
//! If no valid assignment exists (e.g., an odd-membered ring with the
//! wrong electron count), [`kekulize`] returns a [`KekulizeError`].

use std::collections::{HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

use crate::bond::BondOrder;
use crate::element::Element;
use crate::mol::Molecule;

/// Error returned when no valid Kekulé structure exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KekulizeError {
    /// The given atoms could not be assigned a double bond.
    #[error("cannot kekulize aromatic system: unmatched atoms [{}]", format_atoms(.0))]
    Unkekulizable(Vec<NodeIndex>),
}

fn format_atoms(atoms: &[NodeIndex]) -> String {
    atoms
        .iter()
        .map(|idx| idx.index().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Return a copy of `mol` with every aromatic bond order resolved to
/// single or double. Molecules without aromatic bonds come back unchanged.
pub fn kekulize(mol: &Molecule) -> Result<Molecule, KekulizeError> {
    let n = mol.atom_count();

    let mut aromatic_adj: Vec<Vec<(NodeIndex, EdgeIndex)>> = vec![vec![]; n];
    for e in mol.bonds() {
        if mol.bond(e).order != BondOrder::Aromatic {
            continue;
        }
        if let Some((a, b)) = mol.bond_endpoints(e) {
            aromatic_adj[a.index()].push((b, e));
            aromatic_adj[b.index()].push((a, e));
        }
    }

    let components = aromatic_components(mol, &aromatic_adj);
    if components.is_empty() {
        return Ok(mol.clone());
    }

    let needs_double: Vec<bool> = mol
        .atoms()
        .map(|node| !aromatic_adj[node.index()].is_empty() && needs_double_bond(mol, node))
        .collect();

    let mut matched_edge: Vec<Option<EdgeIndex>> = vec![None; n];

    for comp in &components {
        let candidates: Vec<NodeIndex> = comp
            .iter()
            .copied()
            .filter(|&v| needs_double[v.index()])
            .collect();

        for &start in &candidates {
            if matched_edge[start.index()].is_some() {
                continue;
            }
            augment(mol, &aromatic_adj, &needs_double, &mut matched_edge, start);
        }

        let unmatched: Vec<NodeIndex> = candidates
            .iter()
            .copied()
            .filter(|&v| matched_edge[v.index()].is_none())
            .collect();

        if !unmatched.is_empty() {
            return Err(KekulizeError::Unkekulizable(unmatched));
        }
    }

    let doubles: HashSet<EdgeIndex> = matched_edge.iter().filter_map(|e| *e).collect();

    let mut result = mol.clone();
    for edge in mol.bonds() {
        let bond = result.bond_mut(edge);
        if bond.order == BondOrder::Aromatic {
            bond.order = if doubles.contains(&edge) {
                BondOrder::Double
            } else {
                BondOrder::Single
            };
        }
    }
    Ok(result)
}

fn aromatic_components(
    mol: &Molecule,
    aromatic_adj: &[Vec<(NodeIndex, EdgeIndex)>],
) -> Vec<Vec<NodeIndex>> {
    let mut seen = vec![false; mol.atom_count()];
    let mut components = Vec::new();
    for node in mol.atoms() {
        if aromatic_adj[node.index()].is_empty() || seen[node.index()] {
            continue;
        }
        let mut stack = vec![node];
        let mut comp = Vec::new();
        while let Some(v) = stack.pop() {
            if seen[v.index()] {
                continue;
            }
            seen[v.index()] = true;
            comp.push(v);
            for &(w, _) in &aromatic_adj[v.index()] {
                if !seen[w.index()] {
                    stack.push(w);
                }
            }
        }
        components.push(comp);
    }
    components
}

/// An aromatic atom needs a double bond when its lowest charge-adjusted
/// valence leaves exactly one unit free, or two for a bare charged atom.
fn needs_double_bond(mol: &Molecule, node: NodeIndex) -> bool {
    let atom = mol.atom(node);
    let Some(elem) = Element::from_atomic_num(atom.atomic_num) else {
        return false;
    };

    let bond_order_sum: u8 = mol
        .bonds_of(node)
        .map(|e| mol.bond(e).order.valence())
        .fold(0u8, u8::saturating_add);
    let total_used = bond_order_sum.saturating_add(atom.hydrogen_count);

    match target_valence(elem, total_used, atom.formal_charge) {
        Some(tv) => {
            let gap = tv - total_used;
            gap == 1 || (gap == 2 && atom.hydrogen_count == 0 && atom.formal_charge != 0)
        }
        None => false,
    }
}

fn target_valence(elem: Element, current_used: u8, formal_charge: i8) -> Option<u8> {
    let charge = formal_charge as i16;
    elem.default_valences()
        .iter()
        .filter_map(|&v| u8::try_from(v as i16 + charge).ok().filter(|&a| a > 0))
        .find(|&v| v >= current_used)
}

fn augment(
    mol: &Molecule,
    aromatic_adj: &[Vec<(NodeIndex, EdgeIndex)>],
    needs_double: &[bool],
    matched_edge: &mut [Option<EdgeIndex>],
    start: NodeIndex,
) -> bool {
    let n = mol.atom_count();
    let mut prev: Vec<Option<(NodeIndex, EdgeIndex)>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();

    visited[start.index()] = true;
    queue.push_back(start);

    while let Some(u) = queue.pop_front() {
        for &(v, e) in &aromatic_adj[u.index()] {
            if !needs_double[v.index()] || visited[v.index()] {
                continue;
            }
            if Some(e) == matched_edge[u.index()] {
                continue;
            }
            visited[v.index()] = true;
            prev[v.index()] = Some((u, e));

            let Some(matched_e) = matched_edge[v.index()] else {
                flip_path(matched_edge, &prev, start, v);
                return true;
            };

            let Some((ea, eb)) = mol.bond_endpoints(matched_e) else {
                continue;
            };
            let w = if ea == v { eb } else { ea };

            if !visited[w.index()] {
                visited[w.index()] = true;
                prev[w.index()] = Some((v, matched_e));
                queue.push_back(w);
            }
        }
    }
    false
}

fn flip_path(
    matched_edge: &mut [Option<EdgeIndex>],
    prev: &[Option<(NodeIndex, EdgeIndex)>],
    start: NodeIndex,
    end: NodeIndex,
) {
    let mut cur = end;
    let mut is_new_match = true;
    while cur != start {
        let Some((p, e)) = prev[cur.index()] else {
            break;
        };
        if is_new_match {
            matched_edge[cur.index()] = Some(e);
            matched_edge[p.index()] = Some(e);
        }
        is_new_match = !is_new_match;
        cur = p;
    }
}
