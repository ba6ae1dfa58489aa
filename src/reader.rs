// SPDX-License-Identifier: Apache-2.0

//! Turns user input into the output truth tables handed to synthesis.
//!
//! Two forms are accepted: a single truth table as a hex string, and a text
//! file with one row of `0`/`1` characters per output, most significant
//! minterm first. Every table of fewer than six variables is stretched by
//! self-replication at read time so the low word is fully populated and all
//! downstream word operations stay uniform.

use std::fs;
use std::path::Path;

use crate::error::{Result, SynthError};
use crate::truth::{stretch, word_count, TruthStore, MAX_VARS};

fn ceil_log2(n: usize) -> usize {
    if n < 2 {
        return n;
    }
    let mut bits = 0;
    let mut rest = n - 1;
    while rest > 0 {
        rest >>= 1;
        bits += 1;
    }
    bits
}

fn hex_digit(c: char) -> Result<u64> {
    c.to_digit(16).map(u64::from).ok_or(SynthError::BadDigit(c))
}

/// Maps a bit length onto a variable count, rejecting lengths that are not
/// a power of two and variable counts beyond the fixed bound. The length
/// check comes first, so an oversized garbage length is still malformed.
fn width_to_vars(bits: usize) -> Result<usize> {
    let num_vars = ceil_log2(bits);
    if (1usize << num_vars) != bits {
        return Err(SynthError::ReaderMalformed {
            got: bits,
            vars: num_vars,
            want: 1 << num_vars,
        });
    }
    if num_vars > MAX_VARS {
        return Err(SynthError::CapacityExceeded(num_vars));
    }
    Ok(num_vars)
}

/// Parses a single truth table given as a hex string, leftmost character in
/// the highest nibble.
pub fn read_hex_string(input: &str) -> Result<(usize, TruthStore)> {
    let num_chars = input.chars().count();
    let num_vars = width_to_vars(4 * num_chars)?;
    let mut words = vec![0u64; word_count(num_vars)];
    for (pos, c) in input.chars().enumerate() {
        let nibble = num_chars - 1 - pos;
        words[nibble >> 4] |= hex_digit(c)? << ((nibble & 0xF) * 4);
    }
    if num_vars < 6 {
        words[0] = stretch(words[0], num_vars);
    }
    let mut outs = TruthStore::new(word_count(num_vars));
    outs.append(&words);
    Ok((num_vars, outs))
}

fn parse_bit_row(bits: &[char], expect_vars: Option<usize>) -> Result<(usize, Vec<u64>)> {
    let num_vars = width_to_vars(bits.len())?;
    if let Some(expected) = expect_vars {
        if expected != num_vars {
            return Err(SynthError::ReaderMalformed {
                got: bits.len(),
                vars: expected,
                want: 1 << expected,
            });
        }
    }
    let mut words = vec![0u64; word_count(num_vars)];
    for (pos, &c) in bits.iter().enumerate() {
        let bit = bits.len() - 1 - pos;
        match c {
            '1' => words[bit >> 6] |= 1u64 << (bit & 63),
            '0' => {}
            other => return Err(SynthError::BadDigit(other)),
        }
    }
    if num_vars < 6 {
        words[0] = stretch(words[0], num_vars);
    }
    Ok((num_vars, words))
}

/// Parses a multi-output function given as one row of `0`/`1` characters
/// per line. Blank lines are skipped; spaces, tabs and carriage returns are
/// ignored; all rows must describe the same variable count.
pub fn read_table_rows(contents: &str) -> Result<(usize, TruthStore)> {
    let mut num_vars: Option<usize> = None;
    let mut rows: Vec<Vec<u64>> = Vec::new();
    for line in contents.lines() {
        let bits: Vec<char> = line
            .chars()
            .filter(|c| !matches!(c, ' ' | '\t' | '\r'))
            .collect();
        if bits.is_empty() {
            continue;
        }
        let (vars, words) = parse_bit_row(&bits, num_vars)?;
        num_vars = Some(vars);
        rows.push(words);
    }
    let num_vars = num_vars.ok_or(SynthError::ReaderMalformed {
        got: 0,
        vars: 0,
        want: 1,
    })?;
    let mut outs = TruthStore::new(word_count(num_vars));
    for row in &rows {
        outs.append(row);
    }
    Ok((num_vars, outs))
}

/// Reads a truth-table file (one output per row).
pub fn read_table_file(path: &Path) -> Result<(usize, TruthStore)> {
    let contents = fs::read_to_string(path)?;
    read_table_rows(&contents)
}

/// Reads the problem input: a path when the string names a file (contains
/// a dot), a hex truth table otherwise.
pub fn read_input(input: &str) -> Result<(usize, TruthStore)> {
    if input.contains('.') {
        read_table_file(Path::new(input))
    } else {
        read_hex_string(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truth::VAR_MASKS;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;
    use test_case::test_case;

    #[test_case("8", 2, 0x8888_8888_8888_8888; "two input and")]
    #[test_case("6", 2, 0x6666_6666_6666_6666; "two input xor")]
    #[test_case("E8", 3, 0xE8E8_E8E8_E8E8_E8E8; "majority")]
    #[test_case("6996", 4, 0x6996_6996_6996_6996; "parity")]
    #[test_case("aAaAaAaAaAaAaAaA", 6, 0xAAAA_AAAA_AAAA_AAAA; "mixed case full word")]
    fn hex_strings_parse_into_stretched_tables(hex: &str, want_vars: usize, want: u64) {
        let (num_vars, outs) = read_hex_string(hex).unwrap();
        assert_eq!(num_vars, want_vars);
        assert_eq!(outs.len(), 1);
        assert_eq!(outs.read(0), &[want]);
    }

    #[test]
    fn wide_hex_strings_fill_high_words_first() {
        // 32 hex chars = 128 bits = 7 variables; the leftmost 16 characters
        // land in word 1.
        let (num_vars, outs) = read_hex_string("FFFFFFFFFFFFFFFF0000000000000000").unwrap();
        assert_eq!(num_vars, 7);
        assert_eq!(outs.read(0), &[0, !0]);
    }

    #[test]
    fn bad_hex_lengths_are_rejected() {
        match read_hex_string("123") {
            Err(SynthError::ReaderMalformed { got: 12, .. }) => {}
            other => panic!("expected ReaderMalformed, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            read_hex_string(""),
            Err(SynthError::ReaderMalformed { .. })
        ));
        assert!(matches!(
            read_hex_string("G"),
            Err(SynthError::BadDigit('G'))
        ));
    }

    #[test]
    fn seventeen_variables_exceed_capacity() {
        let huge = "0".repeat((1usize << 17) / 4);
        assert!(matches!(
            read_hex_string(&huge),
            Err(SynthError::CapacityExceeded(17))
        ));
        // An oversized garbage length is a length problem, not a capacity
        // problem.
        let garbage = "0".repeat(20000);
        assert!(matches!(
            read_hex_string(&garbage),
            Err(SynthError::ReaderMalformed { got: 80000, .. })
        ));
    }

    #[test]
    fn bit_rows_parse_most_significant_minterm_first() {
        let (num_vars, outs) = read_table_rows("10").unwrap();
        assert_eq!(num_vars, 1);
        assert_eq!(outs.read(0), &[VAR_MASKS[0]]);

        let (num_vars, outs) = read_table_rows("1000\n0111\n\n").unwrap();
        assert_eq!(num_vars, 2);
        assert_eq!(outs.len(), 2);
        assert_eq!(outs.read(0), &[0x8888_8888_8888_8888]);
        assert_eq!(outs.read(1), &[0x7777_7777_7777_7777]);
    }

    #[test]
    fn rows_of_mixed_width_are_rejected() {
        assert!(matches!(
            read_table_rows("10\n1000\n"),
            Err(SynthError::ReaderMalformed { got: 4, vars: 1, .. })
        ));
        assert!(matches!(
            read_table_rows("12\n"),
            Err(SynthError::BadDigit('2'))
        ));
        assert!(matches!(
            read_table_rows("  \n"),
            Err(SynthError::ReaderMalformed { got: 0, .. })
        ));
    }

    #[test]
    fn file_inputs_are_detected_by_their_dot() {
        let mut file = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(file, "1000").unwrap();
        writeln!(file, "0110").unwrap();
        let (num_vars, outs) = read_input(&file.path().display().to_string()).unwrap();
        assert_eq!(num_vars, 2);
        assert_eq!(outs.len(), 2);

        let (num_vars, outs) = read_input("E8").unwrap();
        assert_eq!(num_vars, 3);
        assert_eq!(outs.len(), 1);

        assert!(matches!(
            read_input("no/such/file.txt"),
            Err(SynthError::Io(_))
        ));
    }
}
