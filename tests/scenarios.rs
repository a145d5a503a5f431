use std::cell::RefCell;
use std::collections::VecDeque;

use bondcrab::reconcile::MappingError;
use bondcrab::*;

fn n(i: usize) -> NodeIndex {
    NodeIndex::new(i)
}

fn reference(smiles: &str) -> Molecule {
    reference_from_smiles(smiles).unwrap_or_else(|e| panic!("bad reference {smiles}: {e}"))
}

/// A target as a coordinate reader would produce it: every bond single,
/// no charges, no aromatic flags.
fn guessed(smiles: &str) -> Molecule {
    normalize(&parse_smiles(smiles).unwrap_or_else(|e| panic!("bad target {smiles}: {e}")))
}

fn assert_bond(mol: &Molecule, a: usize, b: usize, order: BondOrder) {
    let e = mol
        .bond_between(n(a), n(b))
        .unwrap_or_else(|| panic!("no bond {a}-{b}"));
    assert_eq!(mol.bond(e).order, order, "bond {a}-{b}");
}

// ---------------------------------------------------------------------------
// Escalation scenarios
// ---------------------------------------------------------------------------

#[test]
fn direct_match_keeps_target_bonds() {
    let reference = reference("CCO");
    let target = parse_smiles("CCO").unwrap();
    let result = Reconciler::default().reconcile(&reference, &target).unwrap();

    assert_eq!(result.stage, Stage::Direct);
    assert_eq!(result.molecule, target);
    assert!(result.pruned_bonds.is_empty());
    assert_bond(&result.molecule, 0, 1, BondOrder::Single);
    assert_bond(&result.molecule, 1, 2, BondOrder::Single);
}

#[test]
fn normalized_match_restores_aromaticity() {
    let reference = reference("c1ccccc1");
    let target = guessed("C1CCCCC1");
    let result = Reconciler::default().reconcile(&reference, &target).unwrap();

    assert_eq!(result.stage, Stage::Normalized);
    assert_eq!(result.molecule.bond_count(), 6);
    for e in result.molecule.bonds() {
        let bond = result.molecule.bond(e);
        assert_eq!(bond.order, BondOrder::Aromatic);
        assert!(bond.is_aromatic);
    }
    for a in result.molecule.atoms() {
        let atom = result.molecule.atom(a);
        assert!(atom.is_aromatic, "atom {} not aromatic", a.index());
        assert_eq!(atom.hydrogen_count, 1);
        assert_eq!(atom.hybridization, Hybridization::SP2);
    }
}

#[test]
fn halogen_fallback_restores_reference_element() {
    // chlorobenzene reference, the coordinate file calls the halogen Br
    let reference = reference("Clc1ccccc1");
    let target = guessed("Brc1ccccc1");
    let result = Reconciler::default().reconcile(&reference, &target).unwrap();

    assert_eq!(result.stage, Stage::HalogenGeneralized);
    assert_eq!(result.molecule.atom(n(0)).atomic_num, 17);
    assert_bond(&result.molecule, 0, 1, BondOrder::Single);
    assert_bond(&result.molecule, 1, 2, BondOrder::Aromatic);
    assert!(result
        .molecule
        .atoms()
        .all(|a| result.molecule.atom(a).atomic_num != 6 || result.molecule.atom(a).is_aromatic));
}

#[test]
fn halogen_fallback_can_keep_target_element() {
    let reference = reference("Clc1ccccc1");
    let target = guessed("Brc1ccccc1");
    let reconciler = Reconciler::from_options(ReconcileOptions {
        restore_halogens: false,
        ..Default::default()
    });
    let result = reconciler.reconcile(&reference, &target).unwrap();

    assert_eq!(result.stage, Stage::HalogenGeneralized);
    assert_eq!(result.molecule.atom(n(0)).atomic_num, 35);
}

#[test]
fn halogen_fallback_can_be_disabled() {
    let reference = reference("Clc1ccccc1");
    let target = guessed("Brc1ccccc1");
    let reconciler = Reconciler::from_options(ReconcileOptions {
        halogen_fallback: false,
        ..Default::default()
    });
    let err = reconciler.reconcile(&reference, &target).unwrap_err();
    assert_eq!(
        err,
        ReconcileError::NoStructuralCorrespondence {
            attempted: vec![Stage::Direct, Stage::Normalized],
        }
    );
}

#[test]
fn spurious_contact_is_pruned() {
    // benzyl alcohol whose hydroxyl O sits close enough to the ring to be
    // given a bond to atom 0
    let reference = reference("c1ccccc1CO");
    let mut target = guessed("C1CCCCC1CO");
    target.add_bond(n(7), n(0), Bond::single());
    assert_eq!(target.bond_count(), reference.bond_count() + 1);

    let result = Reconciler::default().reconcile(&reference, &target).unwrap();

    assert_eq!(result.stage, Stage::Normalized);
    assert_eq!(result.pruned_bonds, vec![(n(0), n(7))]);
    assert_eq!(result.molecule.bond_count(), reference.bond_count());
    assert!(result.molecule.bond_between(n(0), n(7)).is_none());
    assert_bond(&result.molecule, 5, 6, BondOrder::Single);
    assert_bond(&result.molecule, 6, 7, BondOrder::Single);
}

#[test]
fn unrelated_structures_fail() {
    let reference = reference("c1ccncc1");
    let target = guessed("OO");
    let err = Reconciler::default().reconcile(&reference, &target).unwrap_err();
    assert_eq!(
        err,
        ReconcileError::NoStructuralCorrespondence {
            attempted: vec![Stage::Direct, Stage::Normalized, Stage::HalogenGeneralized],
        }
    );
}

#[test]
fn output_follows_reference_order() {
    // acetate, target atoms listed oxygen first
    let reference = reference("CC(=O)[O-]");
    let target = guessed("OC(O)C");
    let result = Reconciler::default().reconcile(&reference, &target).unwrap();

    assert_eq!(result.stage, Stage::Normalized);
    for (i, r) in reference.atoms().enumerate() {
        let out = result.molecule.atom(n(i));
        let want = reference.atom(r);
        assert_eq!(out.atomic_num, want.atomic_num, "atom {i}");
        assert_eq!(out.formal_charge, want.formal_charge, "atom {i}");
        assert_eq!(out.hydrogen_count, want.hydrogen_count, "atom {i}");
    }
    assert_bond(&result.molecule, 1, 2, BondOrder::Double);
    assert_bond(&result.molecule, 1, 3, BondOrder::Single);
}

#[test]
fn positions_travel_with_atoms() {
    let reference = reference("OC=C");
    let mut target = guessed("CCO");
    for (i, a) in target.atoms().collect::<Vec<_>>().into_iter().enumerate() {
        target.atom_mut(a).position = Some([i as f64, 0.0, 0.0]);
    }
    let result = Reconciler::default().reconcile(&reference, &target).unwrap();

    assert_eq!(result.correspondence.as_slice(), &[n(2), n(1), n(0)]);
    assert_eq!(result.molecule.atom(n(0)).position, Some([2.0, 0.0, 0.0]));
    assert_eq!(result.molecule.atom(n(2)).position, Some([0.0, 0.0, 0.0]));
}

// ---------------------------------------------------------------------------
// Scripted matcher
// ---------------------------------------------------------------------------

type Answer = Result<Vec<Correspondence>, MatchError>;

/// Hands out canned answers in call order and records the mode of each
/// query.
#[derive(Default)]
struct Scripted {
    answers: RefCell<VecDeque<Answer>>,
    modes: RefCell<Vec<MatchMode>>,
}

impl Scripted {
    fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            modes: RefCell::default(),
        }
    }

    fn modes(&self) -> Vec<MatchMode> {
        self.modes.borrow().clone()
    }
}

impl GraphMatcher for Scripted {
    fn find_matches(
        &self,
        _pattern: &Molecule,
        _target: &Molecule,
        mode: MatchMode,
        limit: Option<usize>,
    ) -> Result<Vec<Correspondence>, MatchError> {
        self.modes.borrow_mut().push(mode);
        let mut answer = self
            .answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))?;
        if let Some(limit) = limit {
            answer.truncate(limit);
        }
        Ok(answer)
    }
}

fn corr(targets: &[usize]) -> Correspondence {
    Correspondence::new(targets.iter().copied().map(n).collect())
}

#[test]
fn stages_query_in_order_with_their_modes() {
    let matcher = Scripted::default();
    let reconciler = Reconciler::new(&matcher);
    let err = reconciler
        .reconcile(&reference("CCO"), &guessed("CCO"))
        .unwrap_err();

    assert!(matches!(err, ReconcileError::NoStructuralCorrespondence { .. }));
    assert_eq!(
        matcher.modes(),
        vec![MatchMode::Unique, MatchMode::All, MatchMode::All]
    );
}

#[test]
fn first_scripted_correspondence_wins() {
    let matcher = Scripted::new([Ok(Vec::new()), Ok(vec![corr(&[2, 1, 0]), corr(&[0, 1, 2])])]);
    let result = Reconciler::new(&matcher)
        .reconcile(&reference("OC=C"), &guessed("CCO"))
        .unwrap();

    assert_eq!(result.stage, Stage::Normalized);
    assert_eq!(result.correspondence, corr(&[2, 1, 0]));
    assert_eq!(result.molecule.atom(n(0)).atomic_num, 8);
    assert_bond(&result.molecule, 1, 2, BondOrder::Double);
}

#[test]
fn non_embedding_is_inconsistent_mapping() {
    // 0->0, 1->2, 2->1 sends reference bond 0-1 onto a non-bond
    let matcher = Scripted::new([Ok(Vec::new()), Ok(vec![corr(&[0, 2, 1])])]);
    let err = Reconciler::new(&matcher)
        .reconcile(&reference("CC=O"), &guessed("CCO"))
        .unwrap_err();

    match err {
        ReconcileError::InconsistentMapping {
            stage: Stage::Normalized,
            source: MappingError::Transfer(TransferError::MissingBond { .. }),
        } => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn short_correspondence_is_inconsistent_mapping() {
    let matcher = Scripted::new([Ok(Vec::new()), Ok(vec![corr(&[0, 1])])]);
    let err = Reconciler::new(&matcher)
        .reconcile(&reference("CC=O"), &guessed("CCO"))
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::InconsistentMapping {
            source: MappingError::Transfer(TransferError::WrongLength {
                covered: 2,
                expected: 3
            }),
            ..
        }
    ));
}

#[test]
fn budget_exhaustion_stops_escalation() {
    let matcher = Scripted::new([
        Ok(Vec::new()),
        Err(MatchError::BudgetExhausted { visits: 10 }),
        Ok(vec![corr(&[0, 1, 2])]),
    ]);
    let err = Reconciler::new(&matcher)
        .reconcile(&reference("CC=O"), &guessed("CCO"))
        .unwrap_err();

    assert_eq!(
        err,
        ReconcileError::MatchTimeout {
            stage: Stage::Normalized,
            source: MatchError::BudgetExhausted { visits: 10 },
        }
    );
    assert_eq!(matcher.modes().len(), 2);
}

#[test]
fn failed_rematch_leaves_bonds_in_place() {
    let reference = reference("CC=O");
    let mut target = guessed("CCO");
    target.add_bond(n(0), n(2), Bond::single());
    // direct miss, normalized hit, then the pruning re-match finds nothing
    let matcher = Scripted::new([Ok(Vec::new()), Ok(vec![corr(&[0, 1, 2])]), Ok(Vec::new())]);
    let result = Reconciler::new(&matcher)
        .reconcile(&reference, &target)
        .unwrap();

    assert_eq!(matcher.modes(), vec![MatchMode::Unique, MatchMode::All, MatchMode::Unique]);
    assert!(result.pruned_bonds.is_empty());
    assert_eq!(result.molecule.bond_count(), 3);
    assert_bond(&result.molecule, 1, 2, BondOrder::Double);
}

#[test]
fn direct_hit_never_rematches() {
    let reference = reference("CCO");
    let mut target = parse_smiles("CCO").unwrap();
    target.add_bond(n(0), n(2), Bond::single());
    let matcher = Scripted::new([Ok(vec![corr(&[0, 1, 2])])]);
    let result = Reconciler::new(&matcher)
        .reconcile(&reference, &target)
        .unwrap();

    assert_eq!(result.stage, Stage::Direct);
    assert_eq!(matcher.modes(), vec![MatchMode::Unique]);
    assert_eq!(result.molecule.bond_count(), 3);
}
