// SPDX-License-Identifier: Apache-2.0

//! The gate graph: an arena of two-input AND/XOR nodes with a truth table
//! cached for every literal.
//!
//! Node 0 is the constant 0 and nodes `1..=num_inputs` are the primary
//! inputs; everything after that is an internal gate holding two fanin
//! literals. The fanin order is the only gate-type marker: an AND stores
//! `fan0 < fan1`, an XOR stores `fan0 > fan1`. Every constructor folds
//! constants, consults the structural table and then the functional table,
//! and only appends a node when both lookups miss, so equal functions share
//! one literal no matter how they were decomposed.

use std::fmt::Write as _;

use crate::truth::{word_count, TruthStore, MAX_VARS};

/// A literal: a node index paired with an inversion bit, packed as
/// `2 * node + negated`. Literal 0 is constant false, literal 1 constant
/// true; literals `2..=2n + 1` are the inputs and their complements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(u32);

impl Lit {
    pub const FALSE: Lit = Lit(0);
    pub const TRUE: Lit = Lit(1);
    /// Placeholder stored in the fanin slots of the constant and the inputs.
    pub const NONE: Lit = Lit(u32::MAX);

    pub fn node(node: usize, negated: bool) -> Lit {
        Lit(((node as u32) << 1) | negated as u32)
    }

    pub fn from_index(index: usize) -> Lit {
        Lit(index as u32)
    }

    /// The raw `2v + c` encoding, which doubles as the truth table id of
    /// this literal within the graph's store.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn var(self) -> usize {
        (self.0 >> 1) as usize
    }

    pub fn is_negated(self) -> bool {
        self.0 & 1 != 0
    }

    #[must_use]
    pub fn negate(self) -> Lit {
        Lit(self.0 ^ 1)
    }

    #[must_use]
    pub fn regular(self) -> Lit {
        Lit(self.0 & !1)
    }

    pub fn is_const(self) -> bool {
        self.0 < 2
    }
}

/// Arena graph of AND/XOR gates over a fixed set of primary inputs.
pub struct GateGraph {
    /// Number of primary inputs; nodes `1..=num_inputs` are the inputs.
    pub num_inputs: usize,
    /// Allocated node count, including the constant and the inputs.
    pub size: usize,
    /// Current traversal generation; per-node marks live in `tids`.
    tid: u32,
    tids: Vec<u32>,
    /// Two fanin literals per node; [`Lit::NONE`] for the constant and the
    /// inputs.
    fans: Vec<Lit>,
    /// One literal per primary output, pushed as each output is realized.
    pub tops: Vec<Lit>,
    /// Per-literal truth tables: table `l` belongs to literal `l`.
    pub tts: TruthStore,
    /// Scratch tables for in-progress cofactoring.
    pub funcs: TruthStore,
    /// The output tables this graph is meant to implement.
    pub outs: TruthStore,
}

impl GateGraph {
    pub fn new(num_inputs: usize, outs: &TruthStore) -> GateGraph {
        assert!(
            num_inputs >= 1 && num_inputs <= MAX_VARS,
            "unsupported input count {}",
            num_inputs
        );
        let size = 1 + num_inputs;
        GateGraph {
            num_inputs,
            size,
            tid: 1,
            tids: vec![0; size],
            fans: vec![Lit::NONE; 2 * size],
            tops: Vec::new(),
            tts: TruthStore::with_elementary(num_inputs),
            funcs: TruthStore::new(word_count(num_inputs)),
            outs: outs.clone(),
        }
    }

    pub fn fanin(&self, node: usize, which: usize) -> Lit {
        debug_assert!(which < 2);
        self.fans[2 * node + which]
    }

    /// XOR nodes store their larger fanin first.
    pub fn is_xor(&self, node: usize) -> bool {
        self.fanin(node, 0).index() > self.fanin(node, 1).index()
    }

    pub fn is_node(&self, node: usize) -> bool {
        node > self.num_inputs
    }

    pub fn is_input(&self, node: usize) -> bool {
        node >= 1 && node <= self.num_inputs
    }

    /// Number of internal gates allocated (reachable or not).
    pub fn num_nodes(&self) -> usize {
        self.size - 1 - self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.outs.len()
    }

    fn tid_bump(&mut self) {
        assert!(self.tid < 0x7FFF_FFFF, "traversal id overflow");
        self.tid += 1;
    }

    fn tid_is_cur(&self, node: usize) -> bool {
        self.tids[node] == self.tid
    }

    /// Marks `node` with the current generation; false if already marked.
    fn tid_mark(&mut self, node: usize) -> bool {
        if self.tids[node] == self.tid {
            false
        } else {
            self.tids[node] = self.tid;
            true
        }
    }

    /// Looks for an existing literal equivalent to a prospective node:
    /// first structurally by the exact fanin pair, then functionally by
    /// comparing `tt` against every literal's table.
    fn hash_node(&self, fan0: Lit, fan1: Lit, tt: usize) -> Option<Lit> {
        for node in 1 + self.num_inputs..self.size {
            if self.fanin(node, 0) == fan0 && self.fanin(node, 1) == fan1 {
                return Some(Lit::node(node, false));
            }
        }
        (0..2 * self.size)
            .find(|&l| self.tts.eq(tt, l))
            .map(Lit::from_index)
    }

    /// Appends a node whose positive-polarity table is already the last
    /// entry of `tts`, then appends the complement so both polarity slots
    /// are filled in literal order.
    fn append_node(&mut self, fan0: Lit, fan1: Lit, tt: usize) -> Lit {
        self.size += 1;
        self.fans.push(fan0);
        self.fans.push(fan1);
        self.tids.push(0);
        self.tts.not(tt);
        debug_assert_eq!(self.tts.len(), 2 * self.size, "one table per literal");
        Lit::node(self.size - 1, false)
    }

    /// Finds a literal whose table equals scratch table `tt` in `funcs`.
    /// This is the lookup that makes previously built subfunctions
    /// reusable.
    pub fn lookup_function(&self, tt: usize) -> Option<Lit> {
        (0..2 * self.size)
            .find(|&l| self.tts.eq_across(l, &self.funcs, tt))
            .map(Lit::from_index)
    }

    pub fn and(&mut self, a: Lit, b: Lit) -> Lit {
        if a == Lit::FALSE || b == Lit::FALSE {
            return Lit::FALSE;
        }
        if a == Lit::TRUE {
            return b;
        }
        if b == Lit::TRUE {
            return a;
        }
        if a == b {
            return a;
        }
        if a == b.negate() {
            return Lit::FALSE;
        }
        let (a, b) = if a.index() < b.index() { (a, b) } else { (b, a) };
        let tt = self.tts.and(a.index(), b.index());
        match self.hash_node(a, b, tt) {
            Some(hit) => {
                self.tts.truncate(tt);
                hit
            }
            None => self.append_node(a, b, tt),
        }
    }

    pub fn xor(&mut self, a: Lit, b: Lit) -> Lit {
        if a == Lit::TRUE {
            return b.negate();
        }
        if b == Lit::TRUE {
            return a.negate();
        }
        if a == Lit::FALSE {
            return b;
        }
        if b == Lit::FALSE {
            return a;
        }
        if a == b {
            return Lit::FALSE;
        }
        if a == b.negate() {
            return Lit::TRUE;
        }
        // Larger fanin first, the mark that distinguishes XOR from AND.
        let (a, b) = if a.index() > b.index() { (a, b) } else { (b, a) };
        let tt = self.tts.xor(a.index(), b.index());
        match self.hash_node(a, b, tt) {
            Some(hit) => {
                self.tts.truncate(tt);
                hit
            }
            None => self.append_node(a, b, tt),
        }
    }

    pub fn or(&mut self, a: Lit, b: Lit) -> Lit {
        self.and(a.negate(), b.negate()).negate()
    }

    pub fn mux(&mut self, sel: Lit, on_true: Lit, on_false: Lit) -> Lit {
        let t = self.and(sel, on_true);
        let e = self.and(sel.negate(), on_false);
        self.or(t, e)
    }

    pub fn and_xor(&mut self, sel: Lit, on_true: Lit, other: Lit) -> Lit {
        let t = self.and(sel, on_true);
        self.xor(t, other)
    }

    fn count_rec(&mut self, lit: Lit) -> usize {
        let node = lit.var();
        if node <= self.num_inputs || !self.tid_mark(node) {
            return 0;
        }
        let f0 = self.fans[lit.index()];
        let f1 = self.fans[lit.negate().index()];
        1 + self.count_rec(f0) + self.count_rec(f1)
    }

    /// Number of distinct internal nodes reachable from the outputs. Leaves
    /// the reachability marks at the current generation.
    pub fn node_count(&mut self) -> usize {
        self.tid_bump();
        let mut count = 0;
        for i in 0..self.tops.len() {
            let top = self.tops[i];
            count += self.count_rec(top);
        }
        count
    }

    /// Number of distinct internal nodes reachable from either literal.
    pub fn node_count_pair(&mut self, a: Lit, b: Lit) -> usize {
        self.tid_bump();
        self.count_rec(a) + self.count_rec(b)
    }

    fn level_rec(&mut self, levels: &mut [usize], lit: Lit) -> usize {
        let node = lit.var();
        if node <= self.num_inputs || !self.tid_mark(node) {
            return levels[node];
        }
        let f0 = self.fans[lit.index()];
        let f1 = self.fans[lit.negate().index()];
        let l0 = self.level_rec(levels, f0);
        let l1 = self.level_rec(levels, f1);
        levels[node] = 1 + l0.max(l1);
        levels[node]
    }

    /// Depth of the deepest output cone.
    pub fn level(&mut self) -> usize {
        let mut levels = vec![0usize; self.size];
        self.tid_bump();
        let mut deepest = 0;
        for i in 0..self.tops.len() {
            let top = self.tops[i];
            deepest = deepest.max(self.level_rec(&mut levels, top));
        }
        deepest
    }

    /// Rebuilds the graph keeping only nodes reachable from the outputs.
    ///
    /// With `only_and` set, every XOR node is expanded into its three-AND
    /// MUX form, the shape the AIGER emitter requires.
    pub fn dup(&mut self, only_and: bool) -> GateGraph {
        self.node_count();
        let mut translated = vec![Lit::FALSE; 2 * self.size];
        for l in 0..2 * (1 + self.num_inputs) {
            translated[l] = Lit::from_index(l);
        }
        let mut copy = GateGraph::new(self.num_inputs, &self.outs);
        for node in 1 + self.num_inputs..self.size {
            if !self.tid_is_cur(node) {
                continue;
            }
            let f0 = translated[self.fanin(node, 0).index()];
            let f1 = translated[self.fanin(node, 1).index()];
            let lit = if !self.is_xor(node) {
                copy.and(f0, f1)
            } else if only_and {
                copy.mux(f0, f1.negate(), f1)
            } else {
                copy.xor(f0, f1)
            };
            translated[Lit::node(node, false).index()] = lit;
            translated[Lit::node(node, true).index()] = lit.negate();
        }
        for i in 0..self.tops.len() {
            let top = self.tops[i];
            copy.tops.push(translated[top.index()]);
        }
        copy
    }

    /// Compares each output literal's table against the requested output
    /// tables, logging and counting every mismatch. A nonzero return is a
    /// synthesis bug; callers report it without aborting.
    pub fn verify(&self) -> usize {
        assert_eq!(self.tops.len(), self.outs.len());
        let mut failed = 0;
        for (i, &top) in self.tops.iter().enumerate() {
            if !self.outs.eq_across(i, &self.tts, top.index()) {
                log::warn!("output {} does not match its specification", i);
                failed += 1;
            }
        }
        failed
    }

    fn lit_text(&self, lit: Lit) -> String {
        if lit.is_const() {
            format!("{}", lit.index())
        } else if lit.var() <= self.num_inputs {
            format!(
                "{}{}",
                if lit.is_negated() { "~" } else { "" },
                (b'a' + (lit.var() - 1) as u8) as char
            )
        } else {
            format!(
                "{}{:02}",
                if lit.is_negated() { "~n" } else { "n" },
                lit.var()
            )
        }
    }

    /// Renders the graph: a one-line summary, or with `verbose` the full
    /// node listing with per-literal truth tables for small input counts.
    pub fn render(&mut self, verbose: bool) -> String {
        let mut out = String::new();
        if !verbose {
            let nodes = self.node_count();
            let levels = self.level();
            writeln!(
                out,
                "The graph contains {} nodes and spans {} levels.",
                nodes, levels
            )
            .unwrap();
            return out;
        }
        // The level pass also marks the reachable nodes.
        let levels = self.level();
        let show_tts = self.num_inputs <= 8;
        if show_tts {
            write!(out, "{} ", self.tts.fmt_hex(0)).unwrap();
        }
        writeln!(out, "n00 = 0").unwrap();
        for input in 1..=self.num_inputs {
            if show_tts {
                write!(out, "{} ", self.tts.fmt_hex(2 * input)).unwrap();
            }
            writeln!(out, "n{:02} = {}", input, (b'a' + (input - 1) as u8) as char).unwrap();
        }
        let mut printed = 1;
        let mut gate_counts = [0usize; 2];
        for node in 1 + self.num_inputs..self.size {
            if !self.tid_is_cur(node) {
                continue;
            }
            write!(out, "{} ", printed).unwrap();
            printed += 1;
            if show_tts {
                write!(out, "{} ", self.tts.fmt_hex(2 * node)).unwrap();
            }
            writeln!(
                out,
                "n{:02} = {} {} {}",
                node,
                self.lit_text(self.fanin(node, 0)),
                if self.is_xor(node) { '^' } else { '&' },
                self.lit_text(self.fanin(node, 1)),
            )
            .unwrap();
            gate_counts[self.is_xor(node) as usize] += 1;
        }
        for (i, &top) in self.tops.iter().enumerate() {
            if show_tts {
                write!(out, "{} ", self.tts.fmt_hex(top.index())).unwrap();
            }
            writeln!(out, "po{} = {}", i, self.lit_text(top)).unwrap();
        }
        writeln!(
            out,
            "The graph contains {} nodes ({} ands and {} xors) and spans {} levels.",
            gate_counts[0] + gate_counts[1],
            gate_counts[0],
            gate_counts[1],
            levels
        )
        .unwrap();
        out
    }
}
