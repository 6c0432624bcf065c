//! Maximum fanout-free cone labelling (SPEC_FULL.md §4.5).
//!
//! Implemented iteratively with an explicit stack rather than the source's
//! native recursion (see the "recursion depth" design note).

use crate::literal::Var;
use crate::store::AigStore;

/// Transiently increments the refcount of every leaf in `cut`, derefs `root`
/// to count (and optionally collect) its MFFC, then refs back to restore the
/// refcounts exactly. Panics (via debug_assert) if deref/ref disagree, since
/// that would indicate a refcount bookkeeping bug in the store itself.
pub fn mffc_size(store: &mut AigStore, root: Var, cut: &[Var]) -> usize {
    let mut internal = Vec::new();
    mffc_label(store, root, cut, &mut internal)
}

/// As `mffc_size`, but also returns the internal (dereffed) node set.
pub fn mffc_label(store: &mut AigStore, root: Var, cut: &[Var], internal: &mut Vec<Var>) -> usize {
    for &l in cut { store.incref(l); }
    let down_count = deref_node(store, root, internal);
    let mut up_internal = Vec::new();
    let up_count = ref_node(store, root, &mut up_internal);
    debug_assert_eq!(down_count, up_count, "mffc deref/ref count mismatch at {:?}", root);
    for &l in cut { store.decref(l); }
    down_count
}

fn deref_node(store: &mut AigStore, root: Var, internal: &mut Vec<Var>) -> usize {
    let mut count = 1usize; // root is always part of its own MFFC
    let mut stack = vec![root];
    while let Some(v) = stack.pop() {
        if !store.node(v).is_and() { continue; }
        let (f0, f1) = (store.fanin0(v), store.fanin1(v));
        for fanin in [f0, f1] {
            store.decref(fanin.var());
            if store.refcount(fanin.var()) == 0 && store.node(fanin.var()).is_and() {
                count += 1;
                internal.push(fanin.var());
                stack.push(fanin.var());
            }
        }
    }
    count
}

fn ref_node(store: &mut AigStore, root: Var, internal: &mut Vec<Var>) -> usize {
    let mut count = 1usize; // matches deref_node's count of `root` itself
    let mut stack = vec![root];
    while let Some(v) = stack.pop() {
        if !store.node(v).is_and() { continue; }
        let (f0, f1) = (store.fanin0(v), store.fanin1(v));
        for fanin in [f0, f1] {
            let was_zero = store.refcount(fanin.var()) == 0;
            store.incref(fanin.var());
            if was_zero && store.node(fanin.var()).is_and() {
                count += 1;
                internal.push(fanin.var());
                stack.push(fanin.var());
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AigStore;

    #[test]
    fn mffc_of_chain_is_whole_chain() {
        let mut s = AigStore::new(8);
        let a = s.create_pi().unwrap();
        let b = s.create_pi().unwrap();
        let c = s.create_pi().unwrap();
        let ab = s.and(a, b).unwrap();
        let abc = s.and(ab, c).unwrap();
        s.create_po(abc).unwrap();
        // abc's MFFC relative to leaves {a,b,c} includes ab and abc: 2 nodes.
        let size = mffc_size(&mut s, abc.var(), &[a.var(), b.var(), c.var()]);
        assert_eq!(size, 2);
        s.check_integrity().unwrap();
    }

    #[test]
    fn shared_fanin_excluded_from_mffc() {
        let mut s = AigStore::new(8);
        let a = s.create_pi().unwrap();
        let b = s.create_pi().unwrap();
        let c = s.create_pi().unwrap();
        let ab = s.and(a, b).unwrap();
        let abc = s.and(ab, c).unwrap();
        s.create_po(abc).unwrap();
        s.create_po(ab).unwrap(); // extra fanout on `ab` keeps it out of abc's MFFC
        let size = mffc_size(&mut s, abc.var(), &[a.var(), b.var(), c.var()]);
        assert_eq!(size, 1); // only abc itself is uniquely owned
        s.check_integrity().unwrap();
    }
}
