use bondcrab::prune::unsupported_bonds;
use bondcrab::{
    normalize, prune_spurious_bonds, renumber_atoms, transfer_bond_attributes, Atom, Bond,
    BondOrder, Correspondence, Element, GraphMatcher, MatchMode, Molecule, NodeIndex, Reconciler,
    Stage, Vf2Matcher,
};
use proptest::prelude::*;
use proptest::sample::Index;

const ELEMENTS: [u8; 6] = [6, 6, 6, 7, 8, 17];
const ORDERS: [BondOrder; 4] = [
    BondOrder::Single,
    BondOrder::Double,
    BondOrder::Triple,
    BondOrder::Aromatic,
];

type Parts = (Vec<u8>, Vec<i8>, Vec<Index>, Vec<(Index, Index)>, Vec<Index>);

fn build((elements, charges, parents, extra, orders): Parts) -> Molecule {
    let mut mol = Molecule::new();
    for (i, &z) in elements.iter().enumerate() {
        mol.add_atom(Atom {
            atomic_num: z,
            formal_charge: charges[i],
            hydrogen_count: (i % 3) as u8,
            ..Default::default()
        });
    }
    let n = elements.len();
    let mut pairs: Vec<(usize, usize)> = parents
        .iter()
        .enumerate()
        .map(|(i, p)| (p.index(i + 1), i + 1))
        .collect();
    pairs.extend(extra.iter().map(|(a, b)| (a.index(n), b.index(n))));

    for (k, (a, b)) in pairs.into_iter().enumerate() {
        let (a, b) = (NodeIndex::new(a), NodeIndex::new(b));
        if a == b || mol.bond_between(a, b).is_some() {
            continue;
        }
        let order = ORDERS[orders[k].index(ORDERS.len())];
        mol.add_bond(a, b, Bond::with_order(order));
    }
    mol
}

fn sorted_pairs(mol: &Molecule) -> Vec<(NodeIndex, NodeIndex)> {
    let mut pairs = mol.bond_pairs();
    pairs.sort();
    pairs
}

/// Connected molecules of 2 to 9 atoms with arbitrary orders and charges.
fn molecule() -> impl Strategy<Value = Molecule> {
    (2usize..10)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(prop::sample::select(ELEMENTS.to_vec()), n),
                prop::collection::vec(-1i8..=1, n),
                prop::collection::vec(any::<Index>(), n - 1),
                prop::collection::vec(any::<(Index, Index)>(), 0..3),
                prop::collection::vec(any::<Index>(), n + 2),
            )
        })
        .prop_map(build)
}

/// A molecule together with a shuffled copy and the correspondence from
/// the original onto the copy.
fn shuffled() -> impl Strategy<Value = (Molecule, Molecule, Correspondence)> {
    molecule()
        .prop_flat_map(|mol| {
            let order: Vec<usize> = (0..mol.atom_count()).collect();
            (Just(mol), Just(order).prop_shuffle())
        })
        .prop_map(|(mol, order)| {
            let order: Vec<NodeIndex> = order.into_iter().map(NodeIndex::new).collect();
            let copy = renumber_atoms(&mol, &order).unwrap();
            let mut forward = vec![NodeIndex::new(0); order.len()];
            for (new, old) in order.iter().enumerate() {
                forward[old.index()] = NodeIndex::new(new);
            }
            (mol, copy, Correspondence::new(forward))
        })
}

proptest! {
    #[test]
    fn normalize_is_idempotent(mol in molecule()) {
        let once = normalize(&mol);
        prop_assert_eq!(normalize(&once), once.clone());
        prop_assert_eq!(once.bond_pairs(), mol.bond_pairs());
        prop_assert!(once.bonds().all(|e| once.bond(e).order == BondOrder::Single));
    }

    #[test]
    fn matcher_returns_ordered_embeddings((mol, copy, _) in shuffled()) {
        let pattern = normalize(&mol);
        let mut target = normalize(&copy);
        let pendant = target.add_atom(Atom::new(Element::C));
        target.add_bond(NodeIndex::new(0), pendant, Bond::single());

        let found = Vf2Matcher::new()
            .find_matches(&pattern, &target, MatchMode::All, Some(8))
            .unwrap();
        prop_assert!(!found.is_empty());
        for c in &found {
            prop_assert!(c.is_embedding(&pattern, &target), "not an embedding: {:?}", c);
        }
        for pair in found.windows(2) {
            prop_assert!(pair[0].as_slice() < pair[1].as_slice());
        }
    }

    #[test]
    fn transferred_bonds_equal_reference((mol, copy, corr) in shuffled()) {
        let target = normalize(&copy);
        let out = transfer_bond_attributes(&mol, &target, &corr).unwrap();
        for (a, b) in mol.bond_pairs() {
            let want = mol.bond(mol.bond_between(a, b).unwrap());
            let (ta, tb) = (corr.target_of(a).unwrap(), corr.target_of(b).unwrap());
            let got = out.bond(out.bond_between(ta, tb).unwrap());
            prop_assert_eq!(got.order, want.order);
            prop_assert_eq!(got.is_aromatic, want.is_aromatic);
        }
    }

    #[test]
    fn pruning_removes_only_unsupported_bonds(
        (mol, copy, corr) in shuffled(),
        extra in prop::collection::vec(any::<(Index, Index)>(), 1..4),
    ) {
        let n = copy.atom_count();
        let mut target = normalize(&copy);
        for (a, b) in &extra {
            let (a, b) = (NodeIndex::new(a.index(n)), NodeIndex::new(b.index(n)));
            if a != b && target.bond_between(a, b).is_none() {
                target.add_bond(a, b, Bond::single());
            }
        }

        let (pruned, removed) = prune_spurious_bonds(&mol, &target, &corr);
        prop_assert_eq!(pruned.bond_count(), mol.bond_count());
        prop_assert_eq!(removed.len(), target.bond_count() - mol.bond_count());
        for (u, v) in removed {
            let (a, b) = (corr.reference_of(u).unwrap(), corr.reference_of(v).unwrap());
            prop_assert!(mol.bond_between(a, b).is_none());
        }
        prop_assert!(unsupported_bonds(&mol, &pruned, &corr).is_empty());
    }

    #[test]
    fn output_atom_i_is_reference_atom_i((mol, copy, _) in shuffled()) {
        let target = normalize(&copy);
        let result = Reconciler::default().reconcile(&mol, &target).unwrap();

        prop_assert_eq!(result.molecule.atom_count(), mol.atom_count());
        prop_assert_eq!(sorted_pairs(&result.molecule), sorted_pairs(&mol));
        for r in mol.atoms() {
            let (out, want) = (result.molecule.atom(r), mol.atom(r));
            prop_assert_eq!(out.atomic_num, want.atomic_num);
            if result.stage != Stage::Direct {
                prop_assert_eq!(out.formal_charge, want.formal_charge);
                prop_assert_eq!(out.hydrogen_count, want.hydrogen_count);
            }
        }
        if result.stage != Stage::Direct {
            for (a, b) in mol.bond_pairs() {
                let got = result.molecule.bond(result.molecule.bond_between(a, b).unwrap());
                prop_assert_eq!(got.order, mol.bond(mol.bond_between(a, b).unwrap()).order);
            }
        }
    }
}
