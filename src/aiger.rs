// SPDX-License-Identifier: Apache-2.0

//! Binary AIGER ("aig") emission, plus a strict loader used for round
//! trips.
//!
//! The emitter expects an AND-only graph, the output of
//! [`GateGraph::dup`] with `only_and` set. Node indices then double as
//! AIGER variables: the header is `aig M I 0 O A` with `M = I + A`,
//! outputs follow as ASCII literal lines, and each AND contributes two
//! delta varints (`lhs - fan1`, then `fan1 - fan0`), little-endian 7-bit
//! groups with a continuation bit. Fanin canonicalization guarantees the
//! `fan0 < fan1 < lhs` ordering the deltas rely on.
//!
//! The loader is intentionally strict: any structural inconsistency is an
//! error, so downstream consumers can rely on the graph invariants.

use std::fs;
use std::path::Path;

use crate::error::{Result, SynthError};
use crate::gate::{GateGraph, Lit};
use crate::truth::{word_count, TruthStore, MAX_VARS};

fn push_varint(mut x: u32, out: &mut Vec<u8>) {
    while x & !0x7F != 0 {
        out.push(((x & 0x7F) as u8) | 0x80);
        x >>= 7;
    }
    out.push((x & 0x7F) as u8);
}

fn read_varint(src: &[u8], cursor: &mut usize) -> Result<u32> {
    let mut shift = 0u32;
    let mut acc = 0u32;
    loop {
        let byte = *src.get(*cursor).ok_or_else(|| {
            SynthError::AigerMalformed("unexpected end of input inside a varint".into())
        })?;
        *cursor += 1;
        acc |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(acc);
        }
        shift += 7;
        if shift >= 32 {
            return Err(SynthError::AigerMalformed("varint overflow".into()));
        }
    }
}

fn read_line(src: &[u8], cursor: &mut usize) -> Result<String> {
    let rest = &src[*cursor..];
    let end = rest.iter().position(|&b| b == b'\n').ok_or_else(|| {
        SynthError::AigerMalformed("unterminated ASCII line".into())
    })?;
    let line = std::str::from_utf8(&rest[..end])
        .map_err(|e| SynthError::AigerMalformed(format!("invalid UTF-8 in line: {}", e)))?;
    *cursor += end + 1;
    Ok(line.to_string())
}

/// Serializes an AND-only graph into binary AIGER bytes.
pub fn emit_bytes(gg: &GateGraph) -> Vec<u8> {
    let num_ands = gg.num_nodes();
    let header = format!(
        "aig {} {} 0 {} {}\n",
        gg.num_inputs + num_ands,
        gg.num_inputs,
        gg.tops.len(),
        num_ands
    );
    let mut bytes = Vec::with_capacity(header.len() + 4 * num_ands);
    bytes.extend_from_slice(header.as_bytes());
    for &top in &gg.tops {
        bytes.extend_from_slice(format!("{}\n", top.index()).as_bytes());
    }
    for node in 1 + gg.num_inputs..gg.size {
        debug_assert!(!gg.is_xor(node), "AIGER emission requires an AND-only graph");
        let lhs = 2 * node as u32;
        let fan0 = gg.fanin(node, 0).index() as u32;
        let fan1 = gg.fanin(node, 1).index() as u32;
        debug_assert!(fan0 < fan1 && fan1 < lhs);
        push_varint(lhs - fan1, &mut bytes);
        push_varint(fan1 - fan0, &mut bytes);
    }
    bytes.extend_from_slice(b"c\n");
    bytes.extend_from_slice(b"generated by ttsynth\n");
    bytes
}

/// Expands XOR nodes into AND-only form and writes the result as binary
/// AIGER at `path`.
pub fn write_file(path: &Path, gg: &mut GateGraph) -> Result<()> {
    let and_only = gg.dup(true);
    fs::write(path, emit_bytes(&and_only))?;
    log::info!(
        "wrote graph with {} inputs, {} outputs, and {} and-nodes to {}",
        and_only.num_inputs,
        and_only.tops.len(),
        and_only.num_nodes(),
        path.display()
    );
    Ok(())
}

/// Parses binary AIGER, rebuilding the graph through the folding
/// constructors so the result carries truth tables like any other graph.
pub fn load_bytes(src: &[u8]) -> Result<GateGraph> {
    let mut cursor = 0usize;
    let header = read_line(src, &mut cursor)?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    if fields.len() != 6 || fields[0] != "aig" {
        return Err(SynthError::AigerMalformed(format!(
            "expected header \"aig M I L O A\", got {:?}",
            header
        )));
    }
    let parse = |s: &str, name: &str| -> Result<usize> {
        s.parse()
            .map_err(|_| SynthError::AigerMalformed(format!("bad {} field {:?}", name, s)))
    };
    let max_var = parse(fields[1], "M")?;
    let num_inputs = parse(fields[2], "I")?;
    let num_latches = parse(fields[3], "L")?;
    let num_outputs = parse(fields[4], "O")?;
    let num_ands = parse(fields[5], "A")?;
    if num_latches != 0 {
        return Err(SynthError::AigerMalformed(
            "latches are not supported".into(),
        ));
    }
    if max_var != num_inputs + num_ands {
        return Err(SynthError::AigerMalformed(format!(
            "header M={} does not equal I+A={}",
            max_var,
            num_inputs + num_ands
        )));
    }
    if num_inputs == 0 || num_inputs > MAX_VARS {
        return Err(SynthError::CapacityExceeded(num_inputs));
    }

    let mut out_lits = Vec::with_capacity(num_outputs);
    for _ in 0..num_outputs {
        let line = read_line(src, &mut cursor)?;
        out_lits.push(parse(line.trim(), "output literal")?);
    }

    let empty = TruthStore::new(word_count(num_inputs));
    let mut gg = GateGraph::new(num_inputs, &empty);
    // File variable v maps to lits[v]; folding may renumber the rest.
    let mut lits: Vec<Lit> = (0..=num_inputs).map(|v| Lit::node(v, false)).collect();
    let translate = |lits: &[Lit], lit: usize| -> Result<Lit> {
        let base = lits.get(lit >> 1).ok_or_else(|| {
            SynthError::AigerMalformed(format!("literal {} references an undefined variable", lit))
        })?;
        Ok(if lit & 1 != 0 { base.negate() } else { *base })
    };
    for and_idx in 0..num_ands {
        let lhs = 2 * (num_inputs + 1 + and_idx);
        let delta0 = read_varint(src, &mut cursor)? as usize;
        let delta1 = read_varint(src, &mut cursor)? as usize;
        let fan1 = lhs.checked_sub(delta0).ok_or_else(|| {
            SynthError::AigerMalformed(format!("delta {} exceeds lhs literal {}", delta0, lhs))
        })?;
        let fan0 = fan1.checked_sub(delta1).ok_or_else(|| {
            SynthError::AigerMalformed(format!("delta {} exceeds fanin literal {}", delta1, fan1))
        })?;
        let a = translate(&lits, fan0)?;
        let b = translate(&lits, fan1)?;
        let lit = gg.and(a, b);
        lits.push(lit);
    }
    for out in out_lits {
        let top = translate(&lits, out)?;
        gg.tops.push(top);
    }
    Ok(gg)
}

/// Reads a binary AIGER file from disk.
pub fn load_file(path: &Path) -> Result<GateGraph> {
    let bytes = fs::read(path)?;
    load_bytes(&bytes)
}
