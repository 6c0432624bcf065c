//! Cut engines (SPEC_FULL.md §4.6, §4.7).

pub mod reconv;
pub mod kfeasible;

use crate::literal::Var;

/// A leaf set dominating some root, optionally carrying a truth table (for
/// K-feasible cuts; reconvergence-driven cuts don't compute one).
#[derive(Clone, Debug)]
pub struct Cut {
    pub leaves: Vec<Var>,
    pub truth: Option<Vec<u32>>,
}

impl Cut {
    pub fn trivial(root: Var) -> Cut { Cut { leaves: vec![root], truth: None } }

    pub fn size(&self) -> usize { self.leaves.len() }

    /// `self` dominates `other` if every leaf of `self` is also a leaf of
    /// `other` (so `other` is redundant once `self` exists).
    pub fn dominates(&self, other: &Cut) -> bool {
        self.leaves.iter().all(|l| other.leaves.contains(l))
    }
}
