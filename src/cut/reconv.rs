//! Reconvergence-driven cut growth (SPEC_FULL.md §4.6).

use crate::literal::Var;
use crate::store::AigStore;

pub struct ReconvOptions {
    /// Maximum frontier (leaf-set) size before growth stops.
    pub size_limit: usize,
    /// Fanout-count cap used by the cost function; a frontier node whose
    /// fanout exceeds this is infinitely expensive to absorb.
    pub fanout_limit: usize,
}

impl Default for ReconvOptions {
    fn default() -> Self { ReconvOptions { size_limit: 12, fanout_limit: 1000 } }
}

/// Grow a reconvergent leaf set around `root`. Mutates no durable state:
/// both mark bits are cleared before returning (mirroring the store-wide
/// "marks must be zero between passes" invariant).
pub fn grow_cut(store: &mut AigStore, root: Var, opts: &ReconvOptions) -> Vec<Var> {
    if !store.node(root).is_and() {
        return vec![root];
    }
    let f0 = store.fanin0(root).var();
    let f1 = store.fanin1(root).var();

    let mut frontier: Vec<Var> = vec![f0, f1];
    let mut visited: Vec<Var> = vec![root, f0, f1];
    mark_b(store, root);
    mark_b(store, f0);
    mark_b(store, f1);

    loop {
        if frontier.len() >= opts.size_limit { break; }
        let pick = frontier.iter().enumerate()
            .map(|(i, &n)| (i, cost(store, n, opts)))
            .min_by(|a, b| {
                (a.1.0).partial_cmp(&b.1.0).unwrap()
                    .then_with(|| store.level(crate::literal::Lit::new(b.1.1, false))
                        .cmp(&store.level(crate::literal::Lit::new(a.1.1, false))))
            });
        // `cost` returns (numeric_cost, node); ties are broken by preferring
        // the higher-level (deeper) node, which tends to shrink the cut faster.
        let Some((idx, (c, _))) = pick else { break };
        if c >= 3.0 && frontier.len() + 2 > opts.size_limit { break; }
        let n = frontier.remove(idx);
        if !store.node(n).is_and() { continue; }
        let (nf0, nf1) = (store.fanin0(n).var(), store.fanin1(n).var());
        for fanin in [nf0, nf1] {
            if !store.node(fanin).marks.b {
                mark_b(store, fanin);
                frontier.push(fanin);
                visited.push(fanin);
            }
        }
    }

    for &v in &visited { unmark_b(store, v); }
    frontier
}

/// Returns `(cost, node)` so the caller can break cost ties by level without
/// borrowing the store twice.
fn cost(store: &AigStore, n: Var, opts: &ReconvOptions) -> (f64, Var) {
    if store.node(n).is_ci() { return (f64::INFINITY, n); }
    if store.has_fanout_index() && store.fanout_of(n).len() > opts.fanout_limit {
        return (f64::INFINITY, n);
    }
    if !store.node(n).is_and() { return (0.0, n); }
    let (f0, f1) = (store.fanin0(n).var(), store.fanin1(n).var());
    let c = (!store.node(f0).marks.b as u8 + !store.node(f1).marks.b as u8) as f64;
    (c, n)
}

fn mark_b(store: &mut AigStore, v: Var) { store.set_mark_b(v, true); }
fn unmark_b(store: &mut AigStore, v: Var) { store.set_mark_b(v, false); }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AigStore;

    #[test]
    fn chain_cut_contains_all_pis() {
        let mut s = AigStore::new(8);
        let a = s.create_pi().unwrap();
        let b = s.create_pi().unwrap();
        let c = s.create_pi().unwrap();
        let ab = s.and(a, b).unwrap();
        let abc = s.and(ab, c).unwrap();
        s.create_po(abc).unwrap();
        let cut = grow_cut(&mut s, abc.var(), &ReconvOptions::default());
        assert!(cut.contains(&a.var()));
        assert!(cut.contains(&b.var()));
        assert!(cut.contains(&c.var()));
    }
}
