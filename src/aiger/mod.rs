//! AIGER binary/ASCII codec (SPEC_FULL.md §6). Grounded in the wire-format
//! semantics of the format (delta-encoded AND body, symbol table) rather
//! than any one library's API shape, since this is "outside the core" per
//! the original scope note but still needs a real implementation here.

use std::io::{BufRead, BufReader, Read, Write};

use crate::error::{AigError, AigResult};
use crate::literal::{Lit, Var};
use crate::store::{AigStore, Reset};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AigerMode { Ascii, Binary }

struct Header { m: u32, i: u32, l: u32, o: u32, a: u32 }

fn parse_header(line: &str) -> AigResult<(AigerMode, Header)> {
    let mut parts = line.trim().split_ascii_whitespace();
    let magic = parts.next().ok_or_else(|| AigError::MalformedAiger("empty header".into()))?;
    let mode = match magic {
        "aig" => AigerMode::Binary,
        "aag" => AigerMode::Ascii,
        other => return Err(AigError::MalformedAiger(format!("unknown magic {other:?}"))),
    };
    let nums: Vec<u32> = parts.map(|p| p.parse::<u32>()
        .map_err(|_| AigError::MalformedAiger(format!("bad header field {p:?}"))))
        .collect::<AigResult<_>>()?;
    if nums.len() < 5 {
        return Err(AigError::MalformedAiger("header needs at least 5 fields".into()));
    }
    let (m, i, l, o, a) = (nums[0], nums[1], nums[2], nums[3], nums[4]);
    if m < i + l + a {
        return Err(AigError::MalformedAiger(format!("M({m}) < I+L+A({})", i + l + a)));
    }
    if nums.len() > 6 && nums[6] != 0 {
        return Err(AigError::MalformedAiger("justice properties unsupported".into()));
    }
    if nums.len() > 7 && nums[7] != 0 {
        return Err(AigError::MalformedAiger("fairness properties unsupported".into()));
    }
    Ok((mode, Header { m, i, l, o, a }))
}

fn parse_reset(field: Option<&str>, self_lit: u32) -> AigResult<Reset> {
    match field {
        None | Some("0") => Ok(Reset::Zero),
        Some("1") => Ok(Reset::One),
        Some(s) => {
            let v: u32 = s.parse().map_err(|_| AigError::MalformedAiger(format!("bad reset {s:?}")))?;
            if v == self_lit { Ok(Reset::DontCare) }
            else { Err(AigError::MalformedAiger(format!("reset {v} not in {{0,1,self-lit}}"))) }
        }
    }
}

/// Translation table from AIGER var index to the store `Lit` it currently
/// resolves to. AIGER assigns exactly one var per latch (vars `I+1..I+L` are
/// latch outputs); our store allocates two ids per latch (output, then
/// input), and an AND's structural-hash fold can make its "new" var collapse
/// onto an already-existing literal instead of allocating one. Both of those
/// mean AIGER var indices cannot be read directly as store ids: every raw
/// literal must be resolved through this table (SPEC_FULL.md §6).
struct VarTable(Vec<Lit>);

impl VarTable {
    fn with_capacity(n: usize) -> VarTable {
        let mut v = Vec::with_capacity(n + 1);
        v.push(Lit::FALSE); // aiger var 0 is the constant
        VarTable(v)
    }

    fn push(&mut self, positive_lit: Lit) { self.0.push(positive_lit); }

    /// Resolve a raw AIGER literal (`(var << 1) | compl`) to a store `Lit`.
    fn translate(&self, raw: u32) -> AigResult<Lit> {
        let var = (raw >> 1) as usize;
        let base = *self.0.get(var).ok_or_else(|| AigError::MalformedAiger(format!("literal {raw} refers to undefined var {var}")))?;
        Ok(base.not_if(raw & 1 == 1))
    }
}

pub fn read<R: Read>(r: R) -> AigResult<AigStore> {
    let mut reader = BufReader::new(r);
    let mut header_line = String::new();
    reader.read_line(&mut header_line)?;
    let (mode, hdr) = parse_header(&header_line)?;

    let mut store = AigStore::new((hdr.m as usize) + 1);
    let mut table = VarTable::with_capacity(hdr.m as usize);

    // vars 1..=I are PIs.
    for _ in 0..hdr.i {
        let lit = store.create_pi()?;
        table.push(lit);
    }

    // vars I+1..=I+L are latch outputs (one var per latch, not two).
    let mut latch_pairs = Vec::with_capacity(hdr.l as usize);
    for _ in 0..hdr.l {
        let (input, output) = store.create_latch()?;
        table.push(Lit::new(output, false));
        latch_pairs.push((input, output));
    }

    match mode {
        AigerMode::Ascii => read_ascii_body(&mut reader, &mut store, &hdr, &latch_pairs, &mut table)?,
        AigerMode::Binary => read_binary_body(&mut reader, &mut store, &hdr, &latch_pairs, &mut table)?,
    }

    read_symbol_table(&mut reader, &mut store, &hdr)?;
    store.check_integrity()?;
    Ok(store)
}

fn read_ascii_body<R: BufRead>(r: &mut R, store: &mut AigStore, hdr: &Header, latches: &[(crate::literal::Var, crate::literal::Var)], table: &mut VarTable) -> AigResult<()> {
    for (k, &(input, _output)) in latches.iter().enumerate() {
        let mut line = String::new();
        r.read_line(&mut line)?;
        let self_lit = (hdr.i + 1 + k as u32) << 1; // don't-care reset is written as the latch's own (uncomplemented) var literal
        let mut parts = line.trim().split_ascii_whitespace();
        let next: u32 = parts.next().ok_or_else(|| AigError::MalformedAiger("missing latch next".into()))?
            .parse().map_err(|_| AigError::MalformedAiger("bad latch next".into()))?;
        let reset = parse_reset(parts.next(), self_lit)?;
        let next_lit = table.translate(next)?;
        store.set_latch_next(input, next_lit, reset);
    }
    let mut po_raws = Vec::with_capacity(hdr.o as usize);
    for _ in 0..hdr.o {
        let mut line = String::new();
        r.read_line(&mut line)?;
        let lit: u32 = line.trim().parse().map_err(|_| AigError::MalformedAiger("bad PO literal".into()))?;
        po_raws.push(lit);
    }
    for _ in 0..hdr.a {
        let mut line = String::new();
        r.read_line(&mut line)?;
        let nums: Vec<u32> = line.trim().split_ascii_whitespace()
            .map(|p| p.parse().map_err(|_| AigError::MalformedAiger("bad AND line".into())))
            .collect::<AigResult<_>>()?;
        if nums.len() != 3 { return Err(AigError::MalformedAiger("AND line needs 3 literals".into())); }
        let a = table.translate(nums[1])?;
        let b = table.translate(nums[2])?;
        let lit = store.and(a, b)?;
        table.push(lit);
    }
    for raw in po_raws { store.create_po(table.translate(raw)?)?; }
    Ok(())
}

fn read_binary_body<R: BufRead>(r: &mut R, store: &mut AigStore, hdr: &Header, latches: &[(crate::literal::Var, crate::literal::Var)], table: &mut VarTable) -> AigResult<()> {
    for (k, &(input, _output)) in latches.iter().enumerate() {
        let mut line = String::new();
        r.read_line(&mut line)?;
        let self_lit = (hdr.i + 1 + k as u32) << 1;
        let mut parts = line.trim().split_ascii_whitespace();
        let next: u32 = parts.next().ok_or_else(|| AigError::MalformedAiger("missing latch next".into()))?
            .parse().map_err(|_| AigError::MalformedAiger("bad latch next".into()))?;
        let reset = parse_reset(parts.next(), self_lit)?;
        let next_lit = table.translate(next)?;
        store.set_latch_next(input, next_lit, reset);
    }
    let mut po_raws = Vec::with_capacity(hdr.o as usize);
    for _ in 0..hdr.o {
        let mut line = String::new();
        r.read_line(&mut line)?;
        let lit: u32 = line.trim().parse().map_err(|_| AigError::MalformedAiger("bad PO literal".into()))?;
        po_raws.push(lit);
    }

    let first_and_lhs = 2 * (hdr.i + hdr.l + 1);
    let mut lhs = first_and_lhs;
    for _ in 0..hdr.a {
        let delta0 = read_base128(r)?;
        let delta1 = read_base128(r)?;
        let rhs0 = lhs.checked_sub(delta0).ok_or_else(|| AigError::MalformedAiger("bad delta0".into()))?;
        let rhs1 = rhs0.checked_sub(delta1).ok_or_else(|| AigError::MalformedAiger("bad delta1".into()))?;
        let a = table.translate(rhs0)?;
        let b = table.translate(rhs1)?;
        let lit = store.and(a, b)?;
        table.push(lit);
        lhs += 2;
    }
    for raw in po_raws { store.create_po(table.translate(raw)?)?; }
    Ok(())
}

fn read_base128<R: BufRead>(r: &mut R) -> AigResult<u32> {
    let mut x: u32 = 0;
    let mut shift = 0u32;
    loop {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;
        let b = byte[0];
        x |= ((b & 0x7f) as u32) << shift;
        if b & 0x80 == 0 { break; }
        shift += 7;
    }
    Ok(x)
}

fn write_base128<W: Write>(w: &mut W, mut x: u32) -> AigResult<()> {
    loop {
        let byte = (x & 0x7f) as u8;
        x >>= 7;
        if x != 0 {
            w.write_all(&[byte | 0x80])?;
        } else {
            w.write_all(&[byte])?;
            break;
        }
    }
    Ok(())
}

fn read_symbol_table<R: BufRead>(r: &mut R, store: &mut AigStore, hdr: &Header) -> AigResult<()> {
    let mut line = String::new();
    while r.read_line(&mut line)? > 0 {
        let trimmed = line.trim();
        if trimmed == "c" || trimmed.is_empty() { break; }
        let (prefix, rest) = trimmed.split_at(1);
        let mut parts = rest.splitn(2, ' ');
        let idx: usize = parts.next().unwrap_or("").parse().unwrap_or(usize::MAX);
        let name = parts.next().unwrap_or("").to_string();
        match prefix {
            "i" if idx < hdr.i as usize => { let v = store.pis()[idx]; store.set_name(v, name); }
            "l" if idx < hdr.l as usize => { let v = store.latches()[idx].output; store.set_name(v, name); }
            "o" if idx < hdr.o as usize => { let v = store.pos()[(hdr.l as usize) + idx]; store.set_name(v, name); }
            _ => {}
        }
        line.clear();
    }
    Ok(())
}

/// Reverse of `VarTable`: maps a store `Var` to the AIGER raw var index it
/// should be written as. Built fresh for each `write()` call, in AIGER's own
/// numbering order (PIs, then latch outputs, then ANDs in DFS order), since
/// the store's own id allocation order need not match it once latches are
/// involved (§6).
struct ReverseVarTable(std::collections::HashMap<u32, u32>);

impl ReverseVarTable {
    fn raw_of(&self, lit: Lit) -> u32 {
        let var = *self.0.get(&lit.var().id()).expect("every written literal must have been registered");
        (var << 1) | (lit.is_compl() as u32)
    }
}

/// Writes `store` in the given AIGER mode. Takes `&mut AigStore` because
/// emitting a deterministic AND order requires the traversal stamp
/// (`dfs_ands`); writing itself makes no structural changes. `strip_symbols`
/// omits the `i<idx> name` symbol-table lines (`write_aiger -s`).
pub fn write<W: Write>(store: &mut AigStore, w: &mut W, mode: AigerMode, strip_symbols: bool) -> AigResult<()> {
    let i = store.pis().len() - store.latches().len();
    let l = store.latches().len();
    let o = store.num_pos();
    let a = store.num_ands();
    let m = i as u32 + l as u32 + a as u32;

    let mut rev = std::collections::HashMap::with_capacity(m as usize + 1);
    rev.insert(Var::CONST.id(), 0u32);
    let mut next_var = 1u32;
    let latch_outputs: std::collections::HashSet<u32> = store.latches().iter().map(|l| l.output.id()).collect();
    for &pi in store.pis() {
        if !latch_outputs.contains(&pi.id()) {
            rev.insert(pi.id(), next_var);
            next_var += 1;
        }
    }
    for latch in store.latches() {
        rev.insert(latch.output.id(), next_var);
        next_var += 1;
    }
    let order = crate::dfs::dfs_ands(store);
    for &v in &order {
        rev.insert(v.id(), next_var);
        next_var += 1;
    }
    let rev = ReverseVarTable(rev);

    match mode {
        AigerMode::Ascii => writeln!(w, "aag {m} {i} {l} {o} {a}")?,
        AigerMode::Binary => writeln!(w, "aig {m} {i} {l} {o} {a}")?,
    }

    for latch in store.latches().to_vec() {
        let next = store.fanin0(latch.input);
        let self_raw = rev.raw_of(Lit::new(latch.output, false));
        let reset_field = match latch.reset {
            Reset::Zero => "0".to_string(),
            Reset::One => "1".to_string(),
            Reset::DontCare => self_raw.to_string(),
        };
        writeln!(w, "{} {}", rev.raw_of(next), reset_field)?;
    }
    for idx in 0..store.num_pos() {
        writeln!(w, "{}", rev.raw_of(store.po_driver(idx)))?;
    }

    if mode == AigerMode::Ascii {
        for v in &order {
            let v_raw = rev.raw_of(Lit::new(*v, false));
            writeln!(w, "{} {} {}", v_raw, rev.raw_of(store.fanin0(*v)), rev.raw_of(store.fanin1(*v)))?;
        }
    } else {
        let mut lhs = 2 * (i as u32 + l as u32 + 1);
        for v in &order {
            let r0 = rev.raw_of(store.fanin0(*v));
            let r1 = rev.raw_of(store.fanin1(*v));
            let (rhs0, rhs1) = if r0 >= r1 { (r0, r1) } else { (r1, r0) };
            write_base128(w, lhs - rhs0)?;
            write_base128(w, rhs0 - rhs1)?;
            lhs += 2;
        }
    }

    if !strip_symbols {
        let mut idx = 0usize;
        for &pi in store.pis() {
            if latch_outputs.contains(&pi.id()) { continue; }
            if let Some(name) = store.name_of(pi) {
                writeln!(w, "i{idx} {name}")?;
            }
            idx += 1;
        }
    }
    writeln!(w, "c")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_roundtrip_simple_and() {
        let input = "aag 3 2 0 1 1\n1\n3\n5\n5 1 3\n";
        let store = read(input.as_bytes()).unwrap();
        assert_eq!(store.num_ands(), 1);
        assert_eq!(store.pos().len(), 1);
        let mut buf = Vec::new();
        let mut store = store;
        write(&mut store, &mut buf, AigerMode::Ascii, false).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("aag 3 2 0 1 1"));
    }

    #[test]
    fn sequential_roundtrip_latch_numbering() {
        // 1 PI, 1 latch, PO = AND(pi, latch_output), AND itself =
        // AND(var1, var2). Exercises the case review comment #1 called out:
        // with one AIGER var per latch, the PO must resolve to the AND gate,
        // not to the latch's own next-state-input node.
        let input = "aag 3 1 1 1 1\n2 0\n6\n6 2 4\n";
        let mut store = read(input.as_bytes()).unwrap();
        assert_eq!(store.num_ands(), 1);
        let po = store.po_driver(0);
        assert!(store.node(po.var()).is_and());

        let mut buf = Vec::new();
        write(&mut store, &mut buf, AigerMode::Ascii, false).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let reread = read(out.as_bytes()).unwrap();
        assert_eq!(reread.num_ands(), 1);
        assert!(reread.node(reread.po_driver(0).var()).is_and());
    }
}
