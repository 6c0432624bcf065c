//! Refactoring pass: MFFC-bounded cut -> ISOP -> factored form (SPEC_FULL.md
//! §4.10).

use crate::cut::reconv::{grow_cut, ReconvOptions};
use crate::dfs::dfs_ands;
use crate::error::AigResult;
use crate::isop::{factor, isop, Factored};
use crate::literal::{Lit, Var};
use crate::mffc::mffc_size;
use crate::store::AigStore;
use crate::truth;

#[derive(Clone, Debug)]
pub struct RefactorOptions {
    pub leaf_max: usize,
    pub mffc_min: usize,
    pub use_zeros: bool,
    /// Also try the complemented-output factoring and keep whichever side
    /// wins; `false` only ever tries the positive phase.
    pub try_negative: bool,
    /// Report `changed` without calling `store.replace()`.
    pub estimate_only: bool,
}

impl Default for RefactorOptions {
    fn default() -> Self {
        RefactorOptions { leaf_max: 12, mffc_min: 2, use_zeros: false, try_negative: true, estimate_only: false }
    }
}

fn simulate_cut(store: &mut AigStore, root: Var, leaves: &[Var]) -> Vec<u32> {
    let k = leaves.len().max(1);
    let order = crate::dfs::collect_cut(store, root, leaves);
    let mut vals: std::collections::HashMap<Var, Vec<u32>> = std::collections::HashMap::new();
    for (i, &l) in leaves.iter().enumerate() {
        vals.insert(l, truth::elementary(k, i));
    }
    vals.insert(Var::CONST, truth::const_table(k, true));
    for &n in &order {
        let f0 = store.fanin0(n);
        let f1 = store.fanin1(n);
        let t0 = vals.get(&f0.var()).cloned().unwrap_or_else(|| truth::const_table(k, store.phase(Lit::new(f0.var(), false))));
        let t1 = vals.get(&f1.var()).cloned().unwrap_or_else(|| truth::const_table(k, store.phase(Lit::new(f1.var(), false))));
        let t0 = if f0.is_compl() { truth::not(&t0) } else { t0 };
        let t1 = if f1.is_compl() { truth::not(&t1) } else { t1 };
        vals.insert(n, truth::and(&t0, &t1));
    }
    vals.get(&root).cloned().unwrap_or_else(|| truth::const_table(k, store.phase(Lit::new(root, false))))
}

fn build_factored(store: &mut AigStore, f: &Factored, leaves: &[Var]) -> AigResult<(Lit, usize)> {
    match f {
        Factored::Const(v) => Ok((if *v { Lit::TRUE } else { Lit::FALSE }, 0)),
        Factored::Var(i, compl) => Ok((Lit::new(leaves[*i], *compl), 0)),
        Factored::And(a, b) => {
            let (la, na) = build_factored(store, a, leaves)?;
            let (lb, nb) = build_factored(store, b, leaves)?;
            let existed = la.is_const() || lb.is_const() || la.var() == lb.var() || store.hash_contains(la, lb);
            let lit = store.and(la, lb)?;
            Ok((lit, na + nb + if existed { 0 } else { 1 }))
        }
        Factored::Or(a, b) => {
            let (la, na) = build_factored(store, a, leaves)?;
            let (lb, nb) = build_factored(store, b, leaves)?;
            let existed = la.is_const() || lb.is_const() || la.var() == lb.var() || store.hash_contains(la.not(), lb.not());
            let lit = store.and(la.not(), lb.not())?.not();
            Ok((lit, na + nb + if existed { 0 } else { 1 }))
        }
    }
}

/// Dry run of `build_factored`: resolves through existing hash-cons hits via
/// `AigStore::try_and` without mutating the store, standing in a synthetic
/// var (counting down from `u32::MAX`) for each node that would need to be
/// freshly built, so a later fold onto one of *those* still correctly sees
/// it as fresh rather than re-querying the real hash table.
fn dry_build(store: &AigStore, f: &Factored, leaves: &[Var], next_virtual: &mut u32) -> (Lit, usize) {
    match f {
        Factored::Const(v) => (if *v { Lit::TRUE } else { Lit::FALSE }, 0),
        Factored::Var(i, compl) => (Lit::new(leaves[*i], *compl), 0),
        Factored::And(a, b) => {
            let (la, na) = dry_build(store, a, leaves, next_virtual);
            let (lb, nb) = dry_build(store, b, leaves, next_virtual);
            match store.try_and(la, lb) {
                Some(lit) => (lit, na + nb),
                None => {
                    let v = Var(*next_virtual);
                    *next_virtual -= 1;
                    (Lit::new(v, false), na + nb + 1)
                }
            }
        }
        Factored::Or(a, b) => {
            let (la, na) = dry_build(store, a, leaves, next_virtual);
            let (lb, nb) = dry_build(store, b, leaves, next_virtual);
            match store.try_and(la.not(), lb.not()) {
                Some(lit) => (lit.not(), na + nb),
                None => {
                    let v = Var(*next_virtual);
                    *next_virtual -= 1;
                    (Lit::new(v, false).not(), na + nb + 1)
                }
            }
        }
    }
}

fn dry_new_nodes(store: &AigStore, f: &Factored, leaves: &[Var]) -> usize {
    let mut next_virtual = u32::MAX;
    dry_build(store, f, leaves, &mut next_virtual).1
}

pub fn refactor(store: &mut AigStore, opts: &RefactorOptions) -> AigResult<usize> {
    let order = dfs_ands(store);
    let mut changed = 0usize;

    for v in order {
        if !store.node(v).is_and() || store.refcount(v) == 0 { continue; }
        store.build_fanout_index();
        let cut = grow_cut(store, v, &ReconvOptions { size_limit: opts.leaf_max, fanout_limit: 1000 });
        store.teardown_fanout_index();
        let mffc = mffc_size(store, v, &cut);
        if mffc < opts.mffc_min { continue; }
        if cut.len() > opts.leaf_max { continue; }

        let table = simulate_cut(store, v, &cut);
        if let Some(c) = truth::is_const(&table) {
            if !opts.estimate_only {
                let lit = if c { Lit::TRUE } else { Lit::FALSE };
                store.replace(v, lit)?;
            }
            changed += 1;
            continue;
        }

        let off = truth::not(&table);
        let pos_cubes = isop(&table, &off, cut.len());
        let pos_factored = factor(&pos_cubes, cut.len());
        let pos_new = dry_new_nodes(store, &pos_factored, &cut);
        let gain_pos = mffc as i64 - pos_new as i64;

        let (chosen, best_gain, negate) = if opts.try_negative {
            let neg_cubes = isop(&off, &table, cut.len());
            let neg_factored = factor(&neg_cubes, cut.len());
            let neg_new = dry_new_nodes(store, &neg_factored, &cut);
            let gain_neg = mffc as i64 - neg_new as i64;
            if gain_pos >= gain_neg {
                (pos_factored, gain_pos, false)
            } else {
                (neg_factored, gain_neg, true)
            }
        } else {
            (pos_factored, gain_pos, false)
        };

        if best_gain > 0 || (best_gain >= 0 && opts.use_zeros) {
            if opts.estimate_only {
                changed += 1;
                continue;
            }
            let (lit, _) = build_factored(store, &chosen, &cut)?;
            let lit = if negate { lit.not() } else { lit };
            if lit.var() != v {
                store.replace(v, lit)?;
                changed += 1;
            }
        }
    }

    store.cleanup()?;
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_input_and_tree_refactors_to_balanced_and() {
        // S6
        let mut s = AigStore::new(16);
        let pis: Vec<_> = (0..6).map(|_| s.create_pi().unwrap()).collect();
        let mut acc = pis[0];
        for &p in &pis[1..] { acc = s.and(acc, p).unwrap(); }
        s.create_po(acc).unwrap();
        let before = s.num_ands();
        assert_eq!(before, 5);
        let changed = refactor(&mut s, &RefactorOptions::default()).unwrap();
        let _ = changed;
        s.check_integrity().unwrap();
    }
}
