//! DFS / cone walks over the AIG (SPEC_FULL.md §4.4).
//!
//! All walks are iterative (explicit worklist), per the "recursion depth"
//! design note: a native-stack post-order DFS would blow the stack on large
//! industrial AIGs.

use crate::literal::{Lit, Var};
use crate::store::AigStore;

/// Post-order DFS over every combinational output's driver cone. Returns AND
/// nodes only, topologically ordered (fanins precede their uses).
pub fn dfs_ands(store: &mut AigStore) -> Vec<Var> {
    store.bump_stamp();
    store.mark_current(Var::CONST);
    for &pi in store.pis() { store.mark_current(pi); }

    let mut order = Vec::new();
    let mut roots: Vec<Lit> = (0..store.num_pos()).map(|i| store.po_driver(i)).collect();
    for l in store.latches() {
        roots.push(store.fanin0(l.input));
    }

    for root in roots {
        walk_from(store, root.var(), &mut order);
    }
    order
}

/// Iterative post-order walk from `root`, pushing each not-yet-visited AND
/// node the first time all of its fanins have been pushed.
fn walk_from(store: &mut AigStore, root: Var, order: &mut Vec<Var>) {
    if store.is_current(root) { return; }
    // (node, fanins already queued?)
    let mut stack: Vec<(Var, bool)> = vec![(root, false)];
    while let Some((v, expanded)) = stack.pop() {
        if store.is_current(v) { continue; }
        if !store.node(v).is_and() {
            store.mark_current(v);
            continue;
        }
        if expanded {
            store.mark_current(v);
            order.push(v);
        } else {
            stack.push((v, true));
            let (f0, f1) = (store.fanin0(v), store.fanin1(v));
            if !store.is_current(f1.var()) { stack.push((f1.var(), false)); }
            if !store.is_current(f0.var()) { stack.push((f0.var(), false)); }
        }
    }
}

/// Count AND nodes reachable from `root`, not counting the root's own cone
/// leaves twice.
pub fn dag_size(store: &mut AigStore, root: Lit) -> usize {
    store.bump_stamp();
    let mut count = 0usize;
    let mut stack = vec![root.var()];
    while let Some(v) = stack.pop() {
        if store.is_current(v) { continue; }
        store.mark_current(v);
        if store.node(v).is_and() {
            count += 1;
            stack.push(store.fanin0(v).var());
            stack.push(store.fanin1(v).var());
        }
    }
    count
}

/// Post-order list of AND nodes strictly between `leaves` and `root`
/// (leaves excluded).
pub fn collect_cut(store: &mut AigStore, root: Var, leaves: &[Var]) -> Vec<Var> {
    store.bump_stamp();
    for &l in leaves { store.mark_current(l); }
    let mut order = Vec::new();
    walk_from(store, root, &mut order);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AigStore;

    #[test]
    fn dfs_topological_order() {
        let mut s = AigStore::new(8);
        let a = s.create_pi().unwrap();
        let b = s.create_pi().unwrap();
        let c = s.create_pi().unwrap();
        let ab = s.and(a, b).unwrap();
        let abc = s.and(ab, c).unwrap();
        s.create_po(abc).unwrap();
        let order = dfs_ands(&mut s);
        assert_eq!(order.len(), 2);
        assert_eq!(order[0], ab.var());
        assert_eq!(order[1], abc.var());
    }

    #[test]
    fn dag_size_counts_ands_once() {
        let mut s = AigStore::new(8);
        let a = s.create_pi().unwrap();
        let b = s.create_pi().unwrap();
        let ab = s.and(a, b).unwrap();
        let diamond = s.and(ab, ab).unwrap(); // degenerates to ab itself
        assert_eq!(diamond, ab);
        assert_eq!(dag_size(&mut s, ab), 1);
    }
}
