//! K-feasible cut enumeration with truth-table propagation, K <= 6
//! (SPEC_FULL.md §4.7).

use fxhash::FxBuildHasher;
use hashbrown::HashMap;
use itertools::iproduct;

use crate::cut::Cut;
use crate::literal::Var;
use crate::store::AigStore;
use crate::truth::{self, words_for};

pub struct KFeasibleOptions {
    pub k: usize,
    pub keep_max: usize,
}

impl Default for KFeasibleOptions {
    fn default() -> Self { KFeasibleOptions { k: 4, keep_max: 8 } }
}

/// Per-node cut sets for the whole AIG, computed bottom-up in id order
/// (valid because AND fanin ids are always smaller than their user, §3
/// invariant 8).
pub struct CutSets {
    by_node: HashMap<Var, Vec<Cut>, FxBuildHasher>,
}

impl CutSets {
    pub fn cuts_of(&self, v: Var) -> &[Cut] {
        self.by_node.get(&v).map(|c| c.as_slice()).unwrap_or(&[])
    }
}

pub fn enumerate(store: &AigStore, opts: &KFeasibleOptions) -> CutSets {
    let mut by_node: HashMap<Var, Vec<Cut>, FxBuildHasher> = HashMap::default();

    for id in 0..=store.max_id() {
        let v = Var(id);
        let n = store.node(v);
        if n.kind.eq(&crate::node::NodeKind::Void) { continue; }
        let mut cuts = vec![Cut::trivial(v)];

        if n.is_and() {
            let f0 = store.fanin0(v);
            let f1 = store.fanin1(v);
            let empty = Vec::new();
            let cuts0 = by_node.get(&f0.var()).unwrap_or(&empty);
            let cuts1 = by_node.get(&f1.var()).unwrap_or(&empty);
            let trivial0 = Cut::trivial(f0.var());
            let trivial1 = Cut::trivial(f1.var());
            let list0: Vec<&Cut> = if cuts0.is_empty() { vec![&trivial0] } else { cuts0.iter().collect() };
            let list1: Vec<&Cut> = if cuts1.is_empty() { vec![&trivial1] } else { cuts1.iter().collect() };

            let mut candidates: Vec<Cut> = Vec::new();
            for (c0, c1) in iproduct!(&list0, &list1) {
                let mut leaves: Vec<Var> = c0.leaves.iter().chain(c1.leaves.iter()).copied().collect();
                leaves.sort_unstable();
                leaves.dedup();
                if leaves.len() > opts.k { continue; }
                let truth = compose_truth(store, opts.k, f0.is_compl(), f1.is_compl(), c0, c1, &leaves);
                candidates.push(Cut { leaves, truth: Some(truth) });
            }
            // dominance filter: drop any candidate dominated by a smaller-or-equal one already kept.
            candidates.sort_by_key(|c| c.size());
            let mut kept: Vec<Cut> = Vec::new();
            'outer: for cand in candidates {
                for k in &kept {
                    if k.dominates(&cand) { continue 'outer; }
                }
                kept.push(cand);
                if kept.len() >= opts.keep_max { break; }
            }
            cuts.extend(kept);
        }
        by_node.insert(v, cuts);
    }

    CutSets { by_node }
}

/// Compose the truth tables of the two fanin cuts (after re-expressing each
/// over the union leaf set) under AND, applying each fanin's complement.
fn compose_truth(store: &AigStore, k: usize, c0_compl: bool, c1_compl: bool, c0: &Cut, c1: &Cut, leaves: &[Var]) -> Vec<u32> {
    let t0 = expand_truth(store, k, c0, leaves);
    let t1 = expand_truth(store, k, c1, leaves);
    let t0 = if c0_compl { truth::not(&t0) } else { t0 };
    let t1 = if c1_compl { truth::not(&t1) } else { t1 };
    truth::and(&t0, &t1)
}

/// Re-express a cut's truth table (defined over its own leaves) over a
/// superset `leaves`, by building it from elementary patterns when the cut
/// is trivial, or permuting/duplicating columns otherwise.
fn expand_truth(store: &AigStore, k: usize, cut: &Cut, leaves: &[Var]) -> Vec<u32> {
    match &cut.truth {
        Some(t) if cut.leaves == leaves => t.clone(),
        Some(t) => remap(k, t, &cut.leaves, leaves),
        None => {
            // trivial cut: {v} -> its own elementary variable in the union.
            debug_assert_eq!(cut.leaves.len(), 1);
            let v = cut.leaves[0];
            if v == crate::literal::Var::CONST {
                return truth::const_table(k, store.phase(crate::literal::Lit::new(v, false)));
            }
            let i = leaves.iter().position(|&l| l == v).unwrap();
            truth::elementary(k, i)
        }
    }
}

/// Remap a truth table defined over `from` variables onto the superset
/// `to`, by table lookup over every assignment of `to`.
fn remap(k: usize, t: &[u32], from: &[Var], to: &[Var]) -> Vec<u32> {
    let words = words_for(k);
    let mut out = vec![0u32; words];
    let n = to.len();
    let total_bits = 1usize << n;
    for assignment in 0..total_bits {
        // map bit positions of `to` onto bit positions of `from`.
        let mut from_bits = 0usize;
        for (bit, &var) in to.iter().enumerate() {
            if (assignment >> bit) & 1 == 1 {
                if let Some(fbit) = from.iter().position(|&f| f == var) {
                    from_bits |= 1 << fbit;
                }
            }
        }
        if bit_of(t, from_bits) {
            set_bit(&mut out, assignment);
        }
    }
    out
}

fn bit_of(t: &[u32], bit: usize) -> bool {
    let word = bit / 32;
    let off = bit % 32;
    (t[word.min(t.len() - 1)] >> off) & 1 == 1
}

fn set_bit(t: &mut [u32], bit: usize) {
    let word = bit / 32;
    let off = bit % 32;
    t[word.min(t.len() - 1)] |= 1 << off;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AigStore;

    #[test]
    fn xor_tree_has_four_leaf_cut() {
        let mut s = AigStore::new(16);
        let a = s.create_pi().unwrap();
        let b = s.create_pi().unwrap();
        let c = s.create_pi().unwrap();
        let d = s.create_pi().unwrap();
        let ab = s.and(a, b.not()).unwrap();
        let ba = s.and(a.not(), b).unwrap();
        let xor_ab = s.and(ab.not(), ba.not()).unwrap().not();
        let cd = s.and(c, d.not()).unwrap();
        let dc = s.and(c.not(), d).unwrap();
        let xor_cd = s.and(cd.not(), dc.not()).unwrap().not();
        let root = s.and(xor_ab.not(), xor_cd.not()).unwrap().not();
        s.create_po(root).unwrap();

        let cuts = enumerate(&s, &KFeasibleOptions::default());
        let root_cuts = cuts.cuts_of(root.var());
        assert!(root_cuts.iter().any(|c| c.size() <= 4));
    }
}
