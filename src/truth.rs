//! Truth-table packing and simulation (SPEC_FULL.md §9 Design Notes,
//! "Truth-table representation").
//!
//! Up to 16 variables a table is packed into `2^(K-5)` 32-bit words; for
//! K <= 5 a single word carries a replicated pattern. We preserve that
//! contract exactly: `words_for(k) == max(1, 1 << (k as i32 - 5))`.

pub const MAX_VARS: usize = 16;

#[inline]
pub fn words_for(k: usize) -> usize {
    if k <= 5 { 1 } else { 1usize << (k - 5) }
}

/// The elementary input pattern for variable `i` (0-indexed) among `k`
/// total variables, replicated to fill `words_for(k)` words.
pub fn elementary(k: usize, i: usize) -> Vec<u32> {
    debug_assert!(i < k && k <= MAX_VARS);
    let words = words_for(k);
    let mut out = vec![0u32; words];
    if k <= 5 {
        // Within a single 32-bit word, bit position `b` is the assignment
        // where variable `i`'s value is bit `i` of `b`.
        let mut word = 0u32;
        for b in 0..32u32 {
            if (b >> i) & 1 == 1 { word |= 1 << b; }
        }
        out[0] = word;
    } else {
        // For k > 5, each 32-bit word covers one assignment of the top
        // (k-5) variables; within a word the low 5 variables vary bit by
        // bit exactly as in the k<=5 case.
        for (w, slot) in out.iter_mut().enumerate() {
            if i < 5 {
                let mut word = 0u32;
                for b in 0..32u32 {
                    if (b >> i) & 1 == 1 { word |= 1 << b; }
                }
                *slot = word;
            } else {
                let bit = (w >> (i - 5)) & 1;
                *slot = if bit == 1 { u32::MAX } else { 0 };
            }
        }
    }
    out
}

pub fn const_table(k: usize, value: bool) -> Vec<u32> {
    vec![if value { u32::MAX } else { 0 }; words_for(k)]
}

pub fn not(t: &[u32]) -> Vec<u32> { t.iter().map(|w| !w).collect() }

pub fn and(a: &[u32], b: &[u32]) -> Vec<u32> {
    a.iter().zip(b.iter()).map(|(x, y)| x & y).collect()
}

pub fn or(a: &[u32], b: &[u32]) -> Vec<u32> {
    a.iter().zip(b.iter()).map(|(x, y)| x | y).collect()
}

pub fn xor(a: &[u32], b: &[u32]) -> Vec<u32> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

pub fn is_const(t: &[u32]) -> Option<bool> {
    if t.iter().all(|&w| w == 0) { return Some(false); }
    if t.iter().all(|&w| w == u32::MAX) { return Some(true); }
    None
}

/// A 16-bit truth table for a 4-input cut, the unit the rewriter (§4.9)
/// operates on: exactly one `u32` word (`words_for(4) == 1`), and only the
/// low 16 bits are meaningful.
pub fn truth16(t: &[u32]) -> u16 { (t[0] & 0xFFFF) as u16 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_for_contract() {
        assert_eq!(words_for(1), 1);
        assert_eq!(words_for(5), 1);
        assert_eq!(words_for(6), 2);
        assert_eq!(words_for(16), 1 << 11);
    }

    #[test]
    fn and_of_elementaries_matches_expected_pattern() {
        let x0 = elementary(2, 0);
        let x1 = elementary(2, 1);
        let t = and(&x0, &x1);
        // only assignment (1,1) -> bit 3 -- is set among the low 4 bits.
        assert_eq!(truth16(&t) & 0xF, 0b1000);
    }

    #[test]
    fn xor_self_is_constant_zero() {
        let x0 = elementary(3, 0);
        let t = xor(&x0, &x0);
        assert_eq!(is_const(&t), Some(false));
    }
}
