//! Shared flag parsing for the `aiglet`/`aiglet-shell` binaries (SPEC_FULL.md
//! §6): per-command flags like `balance [-ds]`, `refactor [-N n] [-C n] [-zd]`.
//! Jammed boolean flags (`-ds`) and separate numeric flags (`-K 6`) share one
//! parser so both binaries' tokenizers can reuse it.

use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, Default)]
pub struct ParsedFlags {
    pub bools: HashSet<char>,
    pub nums: HashMap<char, i64>,
}

impl ParsedFlags {
    pub fn has(&self, c: char) -> bool { self.bools.contains(&c) }
    pub fn num(&self, c: char, default: i64) -> i64 { self.nums.get(&c).copied().unwrap_or(default) }
}

/// Consume leading flag tokens from `args`, stopping at the first token that
/// doesn't start with `-` (a command's positional argument, or the next
/// command word in a pipeline). Returns the parsed flags and the index in
/// `args` where consumption stopped. `numeric` lists which letters take a
/// separate numeric argument (e.g. `K` for `-K 6`); every other letter in a
/// `-xyz`-shaped token is treated as a jammed boolean.
pub fn parse_flags(args: &[&str], numeric: &[char]) -> (ParsedFlags, usize) {
    let mut flags = ParsedFlags::default();
    let mut i = 0;
    while i < args.len() {
        let tok = args[i];
        let Some(body) = tok.strip_prefix('-') else { break; };
        if body.is_empty() { break; }
        let chars: Vec<char> = body.chars().collect();
        if chars.len() == 1 && numeric.contains(&chars[0]) {
            let c = chars[0];
            if let Some(val) = args.get(i + 1).and_then(|v| v.parse::<i64>().ok()) {
                flags.nums.insert(c, val);
                i += 2;
                continue;
            }
        }
        for c in chars {
            flags.bools.insert(c);
        }
        i += 1;
    }
    (flags, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jammed_booleans_parse() {
        let (flags, consumed) = parse_flags(&["-ds", "foo"], &[]);
        assert!(flags.has('d'));
        assert!(flags.has('s'));
        assert_eq!(consumed, 1);
    }

    #[test]
    fn separate_numeric_flag_parses() {
        let (flags, consumed) = parse_flags(&["-K", "6", "-z", "foo"], &['K']);
        assert_eq!(flags.num('K', 12), 6);
        assert!(flags.has('z'));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn missing_numeric_value_falls_back_to_boolean() {
        let (flags, consumed) = parse_flags(&["-K", "foo"], &['K']);
        assert!(flags.has('K'));
        assert_eq!(consumed, 1);
    }

    #[test]
    fn stops_at_first_positional_token() {
        let (flags, consumed) = parse_flags(&["-z", "rewrite", "-x"], &[]);
        assert!(flags.has('z'));
        assert_eq!(consumed, 1);
    }
}
