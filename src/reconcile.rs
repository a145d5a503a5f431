//! Reconciling a target structure against a reference.
//!
//! A [`Reconciler`] walks an ordered list of [`Strategy`] values, each of
//! which transforms both graphs, asks the matcher for a correspondence and,
//! on a hit, annotates the target with the reference's chemistry. The first
//! hit wins. The annotated target is then pruned of unsupported bonds and
//! renumbered into reference atom order.
//!
//! ```
//! use bondcrab::{parse_smiles, reference_from_smiles, NodeIndex, Reconciler, Stage};
//!
//! let reference = reference_from_smiles("c1ccccc1O").unwrap();
//! let target = parse_smiles("C1CCCCC1O").unwrap();
//!
//! let result = Reconciler::default().reconcile(&reference, &target).unwrap();
//! assert_eq!(result.stage, Stage::Normalized);
//! assert!(result.molecule.atom(NodeIndex::new(0)).is_aromatic);
//! ```

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::graph_ops::{leading_order, renumber_atoms, RenumberError};
use crate::mol::Molecule;
use crate::prune::{prune_spurious_bonds, unsupported_bonds};
use crate::strip::{generalize_halogens, normalize};
use crate::substruct::{Correspondence, GraphMatcher, MatchError, MatchMode, Vf2Matcher};
use crate::transfer::{transfer_atom_attributes, transfer_bond_attributes, TransferError};

/// Candidate pairs a default [`Reconciler`] may examine per match query.
pub const DEFAULT_MAX_MATCH_VISITS: u64 = 5_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Graphs compared as loaded.
    Direct,
    /// Bond orders and charges discarded on both sides.
    Normalized,
    /// As `Normalized`, with halogens relabelled as carbon.
    HalogenGeneralized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Direct => "direct",
            Stage::Normalized => "normalized",
            Stage::HalogenGeneralized => "halogen-generalized",
        })
    }
}

/// Graph rewrite applied before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    Normalize,
    NormalizeAndGeneralizeHalogens,
}

impl Transform {
    pub fn apply(self, mol: &Molecule) -> Molecule {
        match self {
            Transform::Identity => mol.clone(),
            Transform::Normalize => normalize(mol),
            Transform::NormalizeAndGeneralizeHalogens => generalize_halogens(&normalize(mol)),
        }
    }
}

/// What a hit does to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Keep the target as loaded.
    None,
    /// Copy bond and atom attributes of the original reference onto the
    /// normalized target.
    Attributes { restore_element: bool },
}

/// One escalation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub stage: Stage,
    pub reference: Transform,
    pub target: Transform,
    pub mode: MatchMode,
    pub transfer: Transfer,
}

/// Outcome of a successful [`Strategy::attempt`].
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// Target in its original atom order, annotated if the strategy
    /// transfers.
    pub molecule: Molecule,
    pub correspondence: Correspondence,
}

impl Strategy {
    pub fn direct() -> Self {
        Self {
            stage: Stage::Direct,
            reference: Transform::Identity,
            target: Transform::Identity,
            mode: MatchMode::Unique,
            transfer: Transfer::None,
        }
    }

    pub fn normalized() -> Self {
        Self {
            stage: Stage::Normalized,
            reference: Transform::Normalize,
            target: Transform::Normalize,
            mode: MatchMode::All,
            transfer: Transfer::Attributes {
                restore_element: false,
            },
        }
    }

    pub fn halogen_generalized(restore_element: bool) -> Self {
        Self {
            stage: Stage::HalogenGeneralized,
            reference: Transform::NormalizeAndGeneralizeHalogens,
            target: Transform::NormalizeAndGeneralizeHalogens,
            mode: MatchMode::All,
            transfer: Transfer::Attributes { restore_element },
        }
    }

    pub fn transfers(&self) -> bool {
        matches!(self.transfer, Transfer::Attributes { .. })
    }

    /// Match `reference` against `target` under this strategy. `Ok(None)`
    /// is a miss; the caller decides whether to escalate.
    pub fn attempt<M: GraphMatcher + ?Sized>(
        &self,
        matcher: &M,
        reference: &Molecule,
        target: &Molecule,
    ) -> Result<Option<Attempt>, ReconcileError> {
        let pattern = self.reference.apply(reference);
        let subject = self.target.apply(target);
        let Some(correspondence) = matcher
            .find_first(&pattern, &subject, self.mode)
            .map_err(|source| ReconcileError::MatchTimeout {
                stage: self.stage,
                source,
            })?
        else {
            return Ok(None);
        };

        let molecule = match self.transfer {
            Transfer::None => target.clone(),
            Transfer::Attributes { restore_element } => {
                let inconsistent = |source: TransferError| ReconcileError::InconsistentMapping {
                    stage: self.stage,
                    source: source.into(),
                };
                let bonds = transfer_bond_attributes(reference, &normalize(target), &correspondence)
                    .map_err(inconsistent)?;
                transfer_atom_attributes(reference, &bonds, &correspondence, restore_element)
                    .map_err(inconsistent)?
            }
        };

        Ok(Some(Attempt {
            molecule,
            correspondence,
        }))
    }
}

/// When an annotated target has its unsupported bonds removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrunePolicy {
    /// Only when the target has more bonds than the reference.
    #[default]
    BondCountExceeds,
    /// Whenever some target bond has no reference counterpart.
    AnyUnsupportedBond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Per-query matcher budget. `None` searches without a limit.
    pub max_match_visits: Option<u64>,
    /// Try the halogen-generalized stage when the normalized one misses.
    pub halogen_fallback: bool,
    /// On a halogen-generalized hit, give target atoms the reference
    /// element.
    pub restore_halogens: bool,
    pub prune_policy: PrunePolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            max_match_visits: Some(DEFAULT_MAX_MATCH_VISITS),
            halogen_fallback: true,
            restore_halogens: true,
            prune_policy: PrunePolicy::default(),
        }
    }
}

impl ReconcileOptions {
    /// Strategies in the order they are tried.
    pub fn strategies(&self) -> Vec<Strategy> {
        let mut chain = vec![Strategy::direct(), Strategy::normalized()];
        if self.halogen_fallback {
            chain.push(Strategy::halogen_generalized(self.restore_halogens));
        }
        chain
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Renumber(#[from] RenumberError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("no structural correspondence between reference and target (tried {})", stage_list(.attempted))]
    NoStructuralCorrespondence { attempted: Vec<Stage> },
    #[error("matcher returned an inconsistent mapping at the {stage} stage")]
    InconsistentMapping {
        stage: Stage,
        #[source]
        source: MappingError,
    },
    #[error("matcher search budget exhausted at the {stage} stage")]
    MatchTimeout {
        stage: Stage,
        #[source]
        source: MatchError,
    },
}

fn stage_list(stages: &[Stage]) -> String {
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A target annotated with the reference's chemistry.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Output atom `i` is reference atom `i`; target atoms the reference
    /// does not cover follow in their original order.
    pub molecule: Molecule,
    pub stage: Stage,
    /// Reference index to original target index.
    pub correspondence: Correspondence,
    /// Bonds removed from the target, as original target indices.
    pub pruned_bonds: Vec<(NodeIndex, NodeIndex)>,
}

/// Escalating reconciliation engine over an injected matcher.
#[derive(Debug, Clone)]
pub struct Reconciler<M = Vf2Matcher> {
    matcher: M,
    options: ReconcileOptions,
    strategies: Vec<Strategy>,
}

impl Reconciler<Vf2Matcher> {
    /// Engine backed by [`Vf2Matcher`] with the budget from `options`.
    pub fn from_options(options: ReconcileOptions) -> Self {
        let matcher = Vf2Matcher {
            max_visits: options.max_match_visits,
        };
        Self::with_options(matcher, options)
    }
}

impl Default for Reconciler<Vf2Matcher> {
    fn default() -> Self {
        Self::from_options(ReconcileOptions::default())
    }
}

impl<M: GraphMatcher> Reconciler<M> {
    pub fn new(matcher: M) -> Self {
        Self::with_options(matcher, ReconcileOptions::default())
    }

    /// `options.max_match_visits` is ignored here; the budget belongs to
    /// the matcher.
    pub fn with_options(matcher: M, options: ReconcileOptions) -> Self {
        Self {
            matcher,
            strategies: options.strategies(),
            options,
        }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Annotate `target` with the chemistry of `reference`.
    ///
    /// Both graphs are expected without explicit hydrogen nodes. The
    /// reference should be sanitized; its attributes are copied verbatim.
    #[instrument(skip_all, fields(reference_atoms = reference.atom_count(), target_atoms = target.atom_count()))]
    pub fn reconcile(
        &self,
        reference: &Molecule,
        target: &Molecule,
    ) -> Result<Reconciliation, ReconcileError> {
        let mut attempted = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            attempted.push(strategy.stage);
            match strategy.attempt(&self.matcher, reference, target)? {
                Some(hit) => {
                    info!(stage = %strategy.stage, "reference matched");
                    return self.finish(strategy, reference, hit);
                }
                None => debug!(stage = %strategy.stage, "no correspondence, escalating"),
            }
        }
        Err(ReconcileError::NoStructuralCorrespondence { attempted })
    }

    fn finish(
        &self,
        strategy: &Strategy,
        reference: &Molecule,
        hit: Attempt,
    ) -> Result<Reconciliation, ReconcileError> {
        let Attempt {
            mut molecule,
            mut correspondence,
        } = hit;
        let mut pruned_bonds = Vec::new();

        if strategy.transfers() && self.should_prune(reference, &molecule, &correspondence) {
            let rematch = self
                .matcher
                .find_first(reference, &molecule, MatchMode::Unique)
                .map_err(|source| ReconcileError::MatchTimeout {
                    stage: strategy.stage,
                    source,
                })?;
            match rematch {
                Some(rematch) => {
                    let (pruned, removed) = prune_spurious_bonds(reference, &molecule, &rematch);
                    debug!(removed = removed.len(), "pruned unsupported bonds");
                    molecule = pruned;
                    pruned_bonds = removed;
                    correspondence = rematch;
                }
                None => warn!(
                    stage = %strategy.stage,
                    "annotated target no longer matches the reference, bonds left unpruned"
                ),
            }
        }

        let order = leading_order(correspondence.as_slice(), molecule.atom_count());
        let molecule =
            renumber_atoms(&molecule, &order).map_err(|source| ReconcileError::InconsistentMapping {
                stage: strategy.stage,
                source: source.into(),
            })?;

        Ok(Reconciliation {
            molecule,
            stage: strategy.stage,
            correspondence,
            pruned_bonds,
        })
    }

    fn should_prune(
        &self,
        reference: &Molecule,
        annotated: &Molecule,
        correspondence: &Correspondence,
    ) -> bool {
        match self.options.prune_policy {
            PrunePolicy::BondCountExceeds => annotated.bond_count() > reference.bond_count(),
            PrunePolicy::AnyUnsupportedBond => {
                !unsupported_bonds(reference, annotated, correspondence).is_empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondOrder;
    use crate::smiles::{parse_smiles, reference_from_smiles};

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn default_chain() {
        let stages: Vec<_> = ReconcileOptions::default()
            .strategies()
            .iter()
            .map(|s| s.stage)
            .collect();
        assert_eq!(
            stages,
            vec![Stage::Direct, Stage::Normalized, Stage::HalogenGeneralized]
        );
        let without = ReconcileOptions {
            halogen_fallback: false,
            ..Default::default()
        };
        assert_eq!(without.strategies().len(), 2);
    }

    #[test]
    fn direct_strategy_leaves_target_alone() {
        let reference = parse_smiles("CCO").unwrap();
        let target = parse_smiles("OCC").unwrap();
        let hit = Strategy::direct()
            .attempt(&Vf2Matcher::new(), &reference, &target)
            .unwrap()
            .unwrap();
        assert_eq!(hit.molecule, target);
        assert_eq!(hit.correspondence.as_slice(), &[n(2), n(1), n(0)]);
    }

    #[test]
    fn direct_strategy_misses_on_bond_orders() {
        let reference = reference_from_smiles("c1ccccc1").unwrap();
        let target = parse_smiles("C1CCCCC1").unwrap();
        let hit = Strategy::direct()
            .attempt(&Vf2Matcher::new(), &reference, &target)
            .unwrap();
        assert!(hit.is_none());
    }

    #[test]
    fn normalized_strategy_transfers_from_original_reference() {
        let reference = reference_from_smiles("CC(=O)[O-]").unwrap();
        let target = parse_smiles("CC(O)O").unwrap();
        let hit = Strategy::normalized()
            .attempt(&Vf2Matcher::new(), &reference, &target)
            .unwrap()
            .unwrap();
        let carbonyl = hit.molecule.bond_between(n(1), n(2)).unwrap();
        assert_eq!(hit.molecule.bond(carbonyl).order, BondOrder::Double);
        assert_eq!(hit.molecule.atom(n(3)).formal_charge, -1);
        assert_eq!(hit.molecule.atom(n(2)).hydrogen_count, 0);
    }

    #[test]
    fn halogen_strategy_respects_restore_flag() {
        let reference = reference_from_smiles("ClC").unwrap();
        let target = parse_smiles("BrC").unwrap();
        let restored = Strategy::halogen_generalized(true)
            .attempt(&Vf2Matcher::new(), &reference, &target)
            .unwrap()
            .unwrap();
        assert_eq!(restored.molecule.atom(n(0)).atomic_num, 17);
        let kept = Strategy::halogen_generalized(false)
            .attempt(&Vf2Matcher::new(), &reference, &target)
            .unwrap()
            .unwrap();
        assert_eq!(kept.molecule.atom(n(0)).atomic_num, 35);
    }

    #[test]
    fn renumbers_into_reference_order() {
        let reference = reference_from_smiles("OCC=C").unwrap();
        let target = parse_smiles("CCCO").unwrap();
        let result = Reconciler::default().reconcile(&reference, &target).unwrap();
        assert_eq!(result.stage, Stage::Normalized);
        assert_eq!(result.correspondence.as_slice(), &[n(3), n(2), n(1), n(0)]);
        assert_eq!(result.molecule.atom(n(0)).atomic_num, 8);
        let double = result.molecule.bond_between(n(2), n(3)).unwrap();
        assert_eq!(result.molecule.bond(double).order, BondOrder::Double);
    }

    #[test]
    fn unmapped_target_atoms_follow() {
        let reference = reference_from_smiles("CO").unwrap();
        let target = parse_smiles("CCO").unwrap();
        let result = Reconciler::default().reconcile(&reference, &target).unwrap();
        assert_eq!(result.stage, Stage::Direct);
        assert_eq!(result.correspondence.as_slice(), &[n(1), n(2)]);
        assert_eq!(result.molecule.atom_count(), 3);
        assert_eq!(result.molecule.atom(n(1)).atomic_num, 8);
        assert!(result.molecule.bond_between(n(0), n(2)).is_some());
    }

    #[test]
    fn timeout_is_not_a_miss() {
        let reference = reference_from_smiles("C1CCCCCCCCCC1").unwrap();
        let target = parse_smiles("C1CCCCCCCCCC1").unwrap();
        let reconciler = Reconciler::new(Vf2Matcher::with_budget(3));
        let err = reconciler.reconcile(&reference, &target).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::MatchTimeout {
                stage: Stage::Direct,
                ..
            }
        ));
    }

    #[test]
    fn failure_names_every_stage() {
        let reference = reference_from_smiles("CCN").unwrap();
        let target = parse_smiles("OO").unwrap();
        let err = Reconciler::default().reconcile(&reference, &target).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::NoStructuralCorrespondence {
                attempted: vec![Stage::Direct, Stage::Normalized, Stage::HalogenGeneralized],
            }
        );
        assert_eq!(
            err.to_string(),
            "no structural correspondence between reference and target \
             (tried direct, normalized, halogen-generalized)"
        );
    }

    #[test]
    fn surplus_from_unmapped_atoms_prunes_nothing() {
        // methyl ester target, the O-CH3 bond touches an atom outside the
        // correspondence
        let reference = reference_from_smiles("CC(=O)O").unwrap();
        let target = parse_smiles("CC(O)OC").unwrap();
        for policy in [PrunePolicy::BondCountExceeds, PrunePolicy::AnyUnsupportedBond] {
            let result = Reconciler::from_options(ReconcileOptions {
                prune_policy: policy,
                ..Default::default()
            })
            .reconcile(&reference, &target)
            .unwrap();
            assert_eq!(result.stage, Stage::Normalized);
            assert!(result.pruned_bonds.is_empty());
            assert_eq!(result.molecule.bond_count(), 4);
            assert_eq!(result.correspondence.as_slice(), &[n(0), n(1), n(2), n(3)]);
        }
    }

    #[test]
    fn both_policies_prune_a_false_contact() {
        let reference = reference_from_smiles("c1ccccc1CC").unwrap();
        let mut target = normalize(&reference);
        target.add_bond(n(7), n(0), Default::default());
        for policy in [PrunePolicy::BondCountExceeds, PrunePolicy::AnyUnsupportedBond] {
            let result = Reconciler::from_options(ReconcileOptions {
                prune_policy: policy,
                ..Default::default()
            })
            .reconcile(&reference, &target)
            .unwrap();
            assert_eq!(result.pruned_bonds, vec![(n(0), n(7))]);
            assert_eq!(result.molecule.bond_count(), reference.bond_count());
        }
    }

    #[test]
    fn options_from_json() {
        let options: ReconcileOptions =
            serde_json::from_str(r#"{"halogen_fallback": false, "prune_policy": "any_unsupported_bond"}"#)
                .unwrap();
        assert!(!options.halogen_fallback);
        assert!(options.restore_halogens);
        assert_eq!(options.prune_policy, PrunePolicy::AnyUnsupportedBond);
        assert_eq!(options.max_match_visits, Some(DEFAULT_MAX_MATCH_VISITS));
    }

    #[test]
    fn reconciler_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reconciler>();
    }
}
