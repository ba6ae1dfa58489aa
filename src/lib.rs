// SPDX-License-Identifier: Apache-2.0

//! Synthesis of small combinational circuits from truth tables.
//!
//! The pipeline: [`reader`] turns a hex string or a truth-table file into
//! packed output tables, [`synth`] decomposes each output recursively
//! (Shannon only, or Shannon/Davio) into a shared [`gate::GateGraph`] with
//! structural and functional node reuse, and [`aiger`] expands XOR nodes
//! and writes the binary AIGER result. [`synth::search_permutations`]
//! optionally reorders the input variables first, keeping the cheapest of
//! all orderings.

pub mod aiger;
pub mod error;
pub mod gate;
pub mod reader;
pub mod synth;
pub mod truth;
