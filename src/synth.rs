// SPDX-License-Identifier: Apache-2.0

//! Recursive decomposition of output truth tables into the gate graph, and
//! the exhaustive variable-ordering search.
//!
//! Each output is decomposed top variable first. At every level the target
//! is first looked up among the truth tables of the literals already built;
//! only on a miss are the cofactors taken and recursed on. The AND-only
//! variant always reconstructs with a Shannon MUX; the AND/XOR variant also
//! builds the cofactor XOR and picks the cheapest of Shannon, positive
//! Davio, and negative Davio by counting the nodes each pair of operand
//! cones already pays for.

use crate::gate::{GateGraph, Lit};
use crate::truth::TruthStore;

/// Realizes scratch table `tt` over variables `0..=var` using only AND
/// gates, returning the graph literal implementing it.
fn synth_and(gg: &mut GateGraph, tt: usize, var: i32) -> Lit {
    if let Some(lit) = gg.lookup_function(tt) {
        return lit;
    }
    // Constants always hash, so a miss still depends on some variable.
    debug_assert!(var >= 0);
    let v = var as usize;
    if !gg.funcs.has_var(tt, v) {
        return synth_and(gg, tt, var - 1);
    }
    let f0 = gg.funcs.cof0(tt, v);
    let f1 = gg.funcs.cof1(tt, v);
    let lit0 = synth_and(gg, f0, var - 1);
    let lit1 = synth_and(gg, f1, var - 1);
    gg.funcs.shrink(2);
    gg.mux(Lit::node(1 + v, false), lit1, lit0)
}

/// Like [`synth_and`], but may also reconstruct through XOR: whichever of
/// Shannon, positive Davio, and negative Davio reuses the most existing
/// nodes wins; ties resolve in that order.
fn synth_and_xor(gg: &mut GateGraph, tt: usize, var: i32) -> Lit {
    if let Some(lit) = gg.lookup_function(tt) {
        return lit;
    }
    debug_assert!(var >= 0);
    let v = var as usize;
    if !gg.funcs.has_var(tt, v) {
        return synth_and_xor(gg, tt, var - 1);
    }
    let f0 = gg.funcs.cof0(tt, v);
    let f1 = gg.funcs.cof1(tt, v);
    let f2 = gg.funcs.xor(f0, f1);
    let lit0 = synth_and_xor(gg, f0, var - 1);
    let lit1 = synth_and_xor(gg, f1, var - 1);
    let lit2 = synth_and_xor(gg, f2, var - 1);
    gg.funcs.shrink(3);
    // Estimated gate cost of each reconstruction; the non-trivial-cofactor
    // surcharge is two gates for the MUX and one for the Davio forms.
    let nontrivial = (lit0.index() >= 2 && lit1.index() >= 2) as usize;
    let n01 = gg.node_count_pair(lit0, lit1) + 1 + 2 * nontrivial;
    let n02 = gg.node_count_pair(lit0, lit2) + 1 + nontrivial;
    let n12 = gg.node_count_pair(lit1, lit2) + 1 + nontrivial;
    let best = n01.min(n02).min(n12);
    if best == n01 {
        gg.mux(Lit::node(1 + v, false), lit1, lit0)
    } else if best == n02 {
        gg.and_xor(Lit::node(1 + v, false), lit2, lit0)
    } else {
        gg.and_xor(Lit::node(1 + v, true), lit2, lit1)
    }
}

/// Builds a graph implementing every table of `outs` over `num_vars`
/// variables, one output at a time, sharing nodes across outputs.
pub fn synthesize_once(num_vars: usize, outs: &TruthStore, and_only: bool) -> GateGraph {
    let mut gg = GateGraph::new(num_vars, outs);
    for i in 0..gg.outs.len() {
        gg.funcs.truncate(0);
        gg.funcs.copy_from(&gg.outs, i);
        let top = if and_only {
            synth_and(&mut gg, 0, num_vars as i32 - 1)
        } else {
            synth_and_xor(&mut gg, 0, num_vars as i32 - 1)
        };
        gg.tops.push(top);
    }
    gg
}

pub fn factorial(n: usize) -> usize {
    (1..=n).product()
}

/// Advances `perm` to its lexicographic successor, mirroring every
/// elementary transposition onto all tables of `tables` so they stay
/// expressed in the permuted variable order. The final (descending)
/// permutation is left unchanged.
pub fn advance_permutation(perm: &mut [usize], mut tables: Option<&mut TruthStore>) {
    let n = perm.len();
    let mut i = n - 1;
    while i > 0 && perm[i - 1] >= perm[i] {
        i -= 1;
    }
    if i == 0 {
        return;
    }
    let mut j = n;
    while j > i && perm[j - 1] <= perm[i - 1] {
        j -= 1;
    }
    perm.swap(i - 1, j - 1);
    if let Some(tables) = tables.as_deref_mut() {
        swap_all(tables, i - 1, j - 1);
    }
    i += 1;
    j = n;
    while i < j {
        perm.swap(i - 1, j - 1);
        if let Some(tables) = tables.as_deref_mut() {
            swap_all(tables, i - 1, j - 1);
        }
        i += 1;
        j -= 1;
    }
}

fn swap_all(tables: &mut TruthStore, a: usize, b: usize) {
    for t in 0..tables.len() {
        tables.swap_vars(t, a, b);
    }
}

/// Tries every variable ordering and rewrites `outs` into the one whose
/// synthesis needs the fewest gates (the first minimum wins). Returns that
/// best gate count; the caller then synthesizes once more on the rewritten
/// tables.
pub fn search_permutations(num_vars: usize, outs: &mut TruthStore, and_only: bool) -> usize {
    let mut perm: Vec<usize> = (0..num_vars).collect();
    let mut best = outs.clone();
    let mut best_cost = usize::MAX;
    for round in 0..factorial(num_vars) {
        let mut gg = synthesize_once(num_vars, outs, and_only);
        let cost = gg.node_count();
        if cost < best_cost {
            best_cost = cost;
            best = outs.clone();
        }
        log::debug!("ordering {} {:?}: cost {}", round, perm, cost);
        advance_permutation(&mut perm, Some(&mut *outs));
    }
    *outs = best;
    best_cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Lit;
    use crate::reader::{read_hex_string, read_table_rows};
    use crate::truth::{stretch, word_count};
    use pretty_assertions::assert_eq;
    use rand::Rng;
    use rand_pcg::Pcg64Mcg;
    use test_case::test_case;

    fn synth_hex(hex: &str, and_only: bool) -> GateGraph {
        let (num_vars, outs) = read_hex_string(hex).unwrap();
        let gg = synthesize_once(num_vars, &outs, and_only);
        assert_eq!(gg.verify(), 0, "synthesis of {:?} is functionally wrong", hex);
        gg
    }

    #[test_case("8", true, 1; "two input and, and only")]
    #[test_case("8", false, 1; "two input and")]
    #[test_case("6", false, 1; "two input xor")]
    #[test_case("6", true, 3; "two input xor, and only")]
    #[test_case("E8", false, 4; "majority")]
    #[test_case("E8", true, 6; "majority, and only")]
    #[test_case("6996", false, 3; "four input parity")]
    #[test_case("00", false, 0; "constant zero")]
    #[test_case("FF", false, 0; "constant one")]
    #[test_case("F0", false, 0; "single variable")]
    fn known_functions_get_known_costs(hex: &str, and_only: bool, want_nodes: usize) {
        let mut gg = synth_hex(hex, and_only);
        assert_eq!(gg.node_count(), want_nodes);
    }

    #[test]
    fn constant_outputs_map_to_constant_literals() {
        let gg = synth_hex("00", false);
        assert_eq!(gg.tops, vec![Lit::FALSE]);
        let gg = synth_hex("FF", true);
        assert_eq!(gg.tops, vec![Lit::TRUE]);
    }

    #[test]
    fn bare_input_needs_no_gates() {
        // f = x2 over three variables hashes straight to the input literal.
        let gg = synth_hex("F0", false);
        assert_eq!(gg.tops, vec![Lit::node(3, false)]);

        let (num_vars, outs) = read_table_rows("10").unwrap();
        assert_eq!(num_vars, 1);
        let mut gg = synthesize_once(num_vars, &outs, true);
        assert_eq!(gg.tops, vec![Lit::node(1, false)]);
        assert_eq!(gg.node_count(), 0);
        assert_eq!(gg.verify(), 0);
    }

    #[test]
    fn parity_synthesizes_as_an_xor_chain() {
        let mut gg = synth_hex("6996", false);
        assert_eq!(gg.node_count(), 3);
        for node in 1 + gg.num_inputs..gg.size {
            assert!(gg.is_xor(node));
        }
    }

    #[test]
    fn outputs_share_nodes_through_functional_hashing() {
        // Second output is the complement of the first; it resolves to the
        // negated literal of the AND already built.
        let (num_vars, outs) = read_table_rows("1000\n0111\n").unwrap();
        let mut gg = synthesize_once(num_vars, &outs, true);
        assert_eq!(gg.verify(), 0);
        assert_eq!(gg.node_count(), 1);
        assert_eq!(gg.tops[1], gg.tops[0].negate());

        // Disjoint outputs cost one gate each.
        let (num_vars, outs) = read_table_rows("1000\n0001\n").unwrap();
        let mut gg = synthesize_once(num_vars, &outs, true);
        assert_eq!(gg.verify(), 0);
        assert_eq!(gg.node_count(), 2);
    }

    #[test]
    fn random_functions_verify_in_both_modes() {
        let mut rng = Pcg64Mcg::new(0xabcd_1234);
        for _ in 0..8 {
            let mut outs = TruthStore::new(word_count(4));
            outs.append(&[stretch(rng.gen::<u64>() & 0xFFFF, 4)]);
            for and_only in [false, true] {
                let gg = synthesize_once(4, &outs, and_only);
                assert_eq!(gg.verify(), 0);
            }
        }
        // Wide tables exercise the word-granular cofactor paths.
        let mut outs = TruthStore::new(word_count(7));
        outs.append(&[rng.gen(), rng.gen()]);
        outs.append(&[rng.gen(), rng.gen()]);
        for and_only in [false, true] {
            let gg = synthesize_once(7, &outs, and_only);
            assert_eq!(gg.verify(), 0);
        }
    }

    #[test]
    fn permutations_enumerate_in_lexicographic_order() {
        let mut perm: Vec<usize> = (0..4).collect();
        let mut seen = vec![perm.clone()];
        loop {
            let before = perm.clone();
            advance_permutation(&mut perm, None);
            if perm == before {
                break;
            }
            seen.push(perm.clone());
        }
        assert_eq!(seen.len(), factorial(4));
        assert_eq!(seen.last().unwrap(), &vec![3, 2, 1, 0]);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), factorial(4));
    }

    #[test]
    fn tables_track_the_permutation() {
        let mut rng = Pcg64Mcg::new(77);
        let orig = stretch(rng.gen::<u64>() & 0xFF, 3);
        let mut outs = TruthStore::new(1);
        outs.append(&[orig]);
        let mut perm: Vec<usize> = (0..3).collect();
        for _ in 0..factorial(3) {
            // Bit k of the current minterm is bit perm[k] of the original.
            let cur = outs.read(0)[0];
            for m in 0..8usize {
                let mut source = 0usize;
                for (k, &p) in perm.iter().enumerate() {
                    source |= ((m >> k) & 1) << p;
                }
                assert_eq!((cur >> m) & 1, (orig >> source) & 1, "minterm {m}");
            }
            advance_permutation(&mut perm, Some(&mut outs));
        }
        assert_eq!(perm, vec![2, 1, 0]);
    }

    #[test]
    fn ordering_search_keeps_the_cheapest_tables() {
        let (num_vars, mut outs) = read_hex_string("F0").unwrap();
        let best = search_permutations(num_vars, &mut outs, false);
        assert_eq!(best, 0);
        let mut gg = synthesize_once(num_vars, &outs, false);
        assert_eq!(gg.node_count(), 0);
        assert_eq!(gg.verify(), 0);

        let mut rng = Pcg64Mcg::new(0xfeed);
        let mut outs = TruthStore::new(word_count(4));
        outs.append(&[stretch(rng.gen::<u64>() & 0xFFFF, 4)]);
        let mut gg = synthesize_once(4, &outs, false);
        let unpermuted = gg.node_count();
        let best = search_permutations(4, &mut outs, false);
        assert!(best <= unpermuted);
        let mut gg = synthesize_once(4, &outs, false);
        assert_eq!(gg.node_count(), best);
        assert_eq!(gg.verify(), 0);
    }
}
