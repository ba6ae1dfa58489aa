// SPDX-License-Identifier: Apache-2.0

//! Bit-packed truth tables over up to 16 variables.
//!
//! A table over `n` variables occupies `max(1, 2^(n-6))` 64-bit words; bit
//! `m` of the table is the function value on minterm `m` (variable `i` is
//! bit `i` of the minterm index). Tables live in a [`TruthStore`], an
//! append-only arena in which every table has the same width, so a table is
//! identified by a plain index. Boolean operators append their result and
//! return the new id; shrinking is explicit. The only in-place mutation is
//! [`TruthStore::swap_vars`], which the variable-ordering search uses to
//! re-express all tables in a permuted order without reallocating.

/// The largest supported number of input variables.
pub const MAX_VARS: usize = 16;

/// Elementary truth tables of the first six variables within a single
/// 64-bit word: bit `m` of `VAR_MASKS[i]` is bit `i` of `m`.
pub const VAR_MASKS: [u64; 6] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

/// Mask triples for swapping two sub-word variables `i < j <= 5` in one
/// pass: `(t & m[0]) | ((t & m[1]) << s) | ((t & m[2]) >> s)` with
/// `s = 2^j - 2^i`. Entries with `j <= i` are unused.
const SWAP_MASKS: [[[u64; 3]; 6]; 5] = [
    [
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x9999_9999_9999_9999, 0x2222_2222_2222_2222, 0x4444_4444_4444_4444],
        [0xA5A5_A5A5_A5A5_A5A5, 0x0A0A_0A0A_0A0A_0A0A, 0x5050_5050_5050_5050],
        [0xAA55_AA55_AA55_AA55, 0x00AA_00AA_00AA_00AA, 0x5500_5500_5500_5500],
        [0xAAAA_5555_AAAA_5555, 0x0000_AAAA_0000_AAAA, 0x5555_0000_5555_0000],
        [0xAAAA_AAAA_5555_5555, 0x0000_0000_AAAA_AAAA, 0x5555_5555_0000_0000],
    ],
    [
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0xC3C3_C3C3_C3C3_C3C3, 0x0C0C_0C0C_0C0C_0C0C, 0x3030_3030_3030_3030],
        [0xCC33_CC33_CC33_CC33, 0x00CC_00CC_00CC_00CC, 0x3300_3300_3300_3300],
        [0xCCCC_3333_CCCC_3333, 0x0000_CCCC_0000_CCCC, 0x3333_0000_3333_0000],
        [0xCCCC_CCCC_3333_3333, 0x0000_0000_CCCC_CCCC, 0x3333_3333_0000_0000],
    ],
    [
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0xF00F_F00F_F00F_F00F, 0x00F0_00F0_00F0_00F0, 0x0F00_0F00_0F00_0F00],
        [0xF0F0_0F0F_F0F0_0F0F, 0x0000_F0F0_0000_F0F0, 0x0F0F_0000_0F0F_0000],
        [0xF0F0_F0F0_0F0F_0F0F, 0x0000_0000_F0F0_F0F0, 0x0F0F_0F0F_0000_0000],
    ],
    [
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0xFF00_00FF_FF00_00FF, 0x0000_FF00_0000_FF00, 0x00FF_0000_00FF_0000],
        [0xFF00_FF00_00FF_00FF, 0x0000_0000_FF00_FF00, 0x00FF_00FF_0000_0000],
    ],
    [
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0x0000_0000_0000_0000, 0x0000_0000_0000_0000, 0x0000_0000_0000_0000],
        [0xFFFF_0000_0000_FFFF, 0x0000_0000_FFFF_0000, 0x0000_FFFF_0000_0000],
    ],
];

/// Number of 64-bit words in a table over `num_vars` variables.
pub const fn word_count(num_vars: usize) -> usize {
    if num_vars <= 6 {
        1
    } else {
        1 << (num_vars - 6)
    }
}

/// Replicates a table of fewer than six variables until it fills a word, so
/// the unused high variables become don't-affect positions.
pub fn stretch(mut table: u64, num_vars: usize) -> u64 {
    debug_assert!(num_vars < 6);
    let mut n = num_vars;
    while n < 6 {
        let bits = 1u32 << n;
        let mask = (1u64 << bits) - 1;
        table = (table & mask) | ((table & mask) << bits);
        n += 1;
    }
    table
}

/// Append-only arena of equally sized truth tables.
#[derive(Debug, Clone)]
pub struct TruthStore {
    words: usize,
    data: Vec<u64>,
}

impl TruthStore {
    /// An empty store whose tables will be `words` words wide.
    pub fn new(words: usize) -> Self {
        assert!(words >= 1, "tables must span at least one word");
        Self {
            words,
            data: Vec::new(),
        }
    }

    /// A store prefilled with the constant and elementary input tables in
    /// literal order: ids `2v` and `2v + 1` hold the positive and negative
    /// tables of graph node `v`, node 0 being the constant.
    pub fn with_elementary(num_vars: usize) -> Self {
        assert!(num_vars <= MAX_VARS);
        let words = word_count(num_vars);
        let mut data = Vec::with_capacity(2 * (num_vars + 1) * words);
        data.extend(std::iter::repeat(0u64).take(words));
        data.extend(std::iter::repeat(!0u64).take(words));
        for i in 0..2 * num_vars {
            let var = i / 2;
            for k in 0..words {
                let mut word = if var < 6 {
                    VAR_MASKS[var]
                } else if k & (1 << (var - 6)) != 0 {
                    !0
                } else {
                    0
                };
                if i & 1 != 0 {
                    word = !word;
                }
                data.push(word);
            }
        }
        Self { words, data }
    }

    pub fn words(&self) -> usize {
        self.words
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.words
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read(&self, id: usize) -> &[u64] {
        assert!(id < self.len(), "truth table id {} out of bounds", id);
        &self.data[id * self.words..(id + 1) * self.words]
    }

    /// Appends a copy of `table`, returning its id.
    pub fn append(&mut self, table: &[u64]) -> usize {
        assert_eq!(table.len(), self.words);
        self.data.extend_from_slice(table);
        self.len() - 1
    }

    /// Appends a copy of table `id` from another store of the same width.
    pub fn copy_from(&mut self, other: &TruthStore, id: usize) -> usize {
        assert_eq!(self.words, other.words);
        let start = self.data.len();
        self.data.extend_from_slice(other.read(id));
        start / self.words
    }

    /// Shrinks the store to `len` tables. Growth happens only via appends.
    pub fn truncate(&mut self, len: usize) {
        assert!(len <= self.len());
        self.data.truncate(len * self.words);
    }

    /// Drops the last `count` tables.
    pub fn shrink(&mut self, count: usize) {
        let len = self.len();
        assert!(count <= len);
        self.truncate(len - count);
    }

    pub fn and(&mut self, a: usize, b: usize) -> usize {
        let (w, id) = (self.words, self.len());
        self.data.reserve(w);
        for k in 0..w {
            let word = self.data[a * w + k] & self.data[b * w + k];
            self.data.push(word);
        }
        id
    }

    pub fn xor(&mut self, a: usize, b: usize) -> usize {
        let (w, id) = (self.words, self.len());
        self.data.reserve(w);
        for k in 0..w {
            let word = self.data[a * w + k] ^ self.data[b * w + k];
            self.data.push(word);
        }
        id
    }

    pub fn not(&mut self, a: usize) -> usize {
        let (w, id) = (self.words, self.len());
        self.data.reserve(w);
        for k in 0..w {
            let word = !self.data[a * w + k];
            self.data.push(word);
        }
        id
    }

    pub fn eq(&self, a: usize, b: usize) -> bool {
        self.read(a) == self.read(b)
    }

    pub fn eq_across(&self, a: usize, other: &TruthStore, b: usize) -> bool {
        assert_eq!(self.words, other.words);
        self.read(a) == other.read(b)
    }

    pub fn is_const0(&self, a: usize) -> bool {
        self.read(a).iter().all(|&w| w == 0)
    }

    pub fn is_const1(&self, a: usize) -> bool {
        self.read(a).iter().all(|&w| w == !0)
    }

    /// Whether table `id` depends on `var`, tested by comparing the two
    /// cofactor halves in place.
    pub fn has_var(&self, id: usize, var: usize) -> bool {
        let table = self.read(id);
        if var < 6 {
            let shift = 1 << var;
            let low = !VAR_MASKS[var];
            table
                .iter()
                .any(|&w| ((w >> shift) & low) != (w & low))
        } else {
            let step = 1 << (var - 6);
            table.chunks(2 * step).any(|pair| {
                let (lo, hi) = pair.split_at(step);
                lo != hi
            })
        }
    }

    /// Appends the cofactor of table `id` with `var` substituted by 0: the
    /// low half along the `var` axis broadcast into both halves.
    pub fn cof0(&mut self, id: usize, var: usize) -> usize {
        let (w, new_id) = (self.words, self.len());
        let base = id * w;
        self.data.reserve(w);
        if var < 6 {
            let shift = 1 << var;
            let low = !VAR_MASKS[var];
            for k in 0..w {
                let word = self.data[base + k] & low;
                self.data.push((word << shift) | word);
            }
        } else {
            let step = 1 << (var - 6);
            let mut k = 0;
            while k < w {
                for i in 0..step {
                    self.data.push(self.data[base + k + i]);
                }
                for i in 0..step {
                    self.data.push(self.data[base + k + i]);
                }
                k += 2 * step;
            }
        }
        new_id
    }

    /// Appends the cofactor of table `id` with `var` substituted by 1.
    pub fn cof1(&mut self, id: usize, var: usize) -> usize {
        let (w, new_id) = (self.words, self.len());
        let base = id * w;
        self.data.reserve(w);
        if var < 6 {
            let shift = 1 << var;
            let high = VAR_MASKS[var];
            for k in 0..w {
                let word = self.data[base + k] & high;
                self.data.push(word | (word >> shift));
            }
        } else {
            let step = 1 << (var - 6);
            let mut k = 0;
            while k < w {
                for i in 0..step {
                    self.data.push(self.data[base + k + step + i]);
                }
                for i in 0..step {
                    self.data.push(self.data[base + k + step + i]);
                }
                k += 2 * step;
            }
        }
        new_id
    }

    /// Exchanges two variables of table `id` in place. Three regimes: both
    /// variables inside one word, one on each side of the word boundary,
    /// and both at word granularity.
    pub fn swap_vars(&mut self, id: usize, var_a: usize, var_b: usize) {
        if var_a == var_b {
            return;
        }
        let (i, j) = if var_a < var_b {
            (var_a, var_b)
        } else {
            (var_b, var_a)
        };
        let w = self.words;
        debug_assert!(word_count(j + 1) <= w);
        let base = id * w;
        let table = &mut self.data[base..base + w];
        if j <= 5 {
            let masks = &SWAP_MASKS[i][j];
            let shift = (1 << j) - (1 << i);
            for word in table.iter_mut() {
                *word = (*word & masks[0])
                    | ((*word & masks[1]) << shift)
                    | ((*word & masks[2]) >> shift);
            }
        } else if i <= 5 {
            let j_step = 1 << (j - 6);
            let shift = 1 << i;
            let mut k = 0;
            while k < w {
                for off in 0..j_step {
                    let lo = table[k + off];
                    let hi = table[k + off + j_step];
                    let low_to_high = (lo & VAR_MASKS[i]) >> shift;
                    let high_to_low = (hi << shift) & VAR_MASKS[i];
                    table[k + off] = (lo & !VAR_MASKS[i]) | high_to_low;
                    table[k + off + j_step] = (hi & VAR_MASKS[i]) | low_to_high;
                }
                k += 2 * j_step;
            }
        } else {
            let i_step = 1 << (i - 6);
            let j_step = 1 << (j - 6);
            let mut k = 0;
            while k < w {
                let mut a = 0;
                while a < j_step {
                    for b in 0..i_step {
                        table.swap(k + i_step + a + b, k + j_step + a + b);
                    }
                    a += 2 * i_step;
                }
                k += 2 * j_step;
            }
        }
    }

    /// Table `id` as uppercase hex, most significant nibble first.
    pub fn fmt_hex(&self, id: usize) -> String {
        let table = self.read(id);
        let digits = self.words * 16;
        let mut out = String::with_capacity(digits);
        for k in (0..digits).rev() {
            let digit = (table[k / 16] >> ((k % 16) * 4)) & 0xF;
            out.push(
                char::from_digit(digit as u32, 16)
                    .unwrap()
                    .to_ascii_uppercase(),
            );
        }
        out
    }

    /// Table `id` as binary, most significant minterm first.
    pub fn fmt_bits(&self, id: usize) -> String {
        let table = self.read(id);
        let bits = self.words * 64;
        let mut out = String::with_capacity(bits);
        for k in (0..bits).rev() {
            let bit = (table[k / 64] >> (k % 64)) & 1;
            out.push(if bit != 0 { '1' } else { '0' });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::Rng;
    use rand_pcg::Pcg64Mcg;
    use test_case::test_case;

    fn table_bit(table: &[u64], minterm: usize) -> bool {
        (table[minterm >> 6] >> (minterm & 63)) & 1 != 0
    }

    fn random_table(rng: &mut Pcg64Mcg, num_vars: usize) -> Vec<u64> {
        if num_vars < 6 {
            let bits = 1u64 << num_vars;
            vec![stretch(rng.gen::<u64>() & ((1u64 << bits) - 1), num_vars)]
        } else {
            (0..word_count(num_vars)).map(|_| rng.gen()).collect()
        }
    }

    #[test]
    fn elementary_tables_follow_literal_order() {
        let store = TruthStore::with_elementary(7);
        assert_eq!(store.len(), 16);
        assert!(store.is_const0(0));
        assert!(store.is_const1(1));
        // Variable v sits at ids 2 + 2v (positive) and 3 + 2v (negative).
        assert_eq!(store.read(2), &[VAR_MASKS[0], VAR_MASKS[0]]);
        assert_eq!(store.read(3), &[!VAR_MASKS[0], !VAR_MASKS[0]]);
        assert_eq!(store.read(14), &[0, !0]);
        assert_eq!(store.read(15), &[!0, 0]);
    }

    #[test_case(0b10, 1, 0xAAAA_AAAA_AAAA_AAAA; "single variable")]
    #[test_case(0x8, 2, 0x8888_8888_8888_8888; "two variable and")]
    #[test_case(0xE8, 3, 0xE8E8_E8E8_E8E8_E8E8; "three variable majority")]
    #[test_case(0x1, 0, 0xFFFF_FFFF_FFFF_FFFF; "zero variable constant")]
    fn stretch_replicates_low_bits(table: u64, num_vars: usize, want: u64) {
        assert_eq!(stretch(table, num_vars), want);
    }

    #[test]
    fn boolean_ops_append() {
        let mut store = TruthStore::with_elementary(2);
        let a = 2;
        let b = 4;
        let and = store.and(a, b);
        assert_eq!(store.read(and), &[0x8888_8888_8888_8888]);
        let xor = store.xor(a, b);
        assert_eq!(store.read(xor), &[0x6666_6666_6666_6666]);
        let not = store.not(and);
        assert_eq!(store.read(not), &[0x7777_7777_7777_7777]);
        assert_eq!(store.len(), 9);
        store.shrink(3);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn cofactors_substitute_the_variable() {
        let mut rng = Pcg64Mcg::new(0xcafe_f00d);
        let mut store = TruthStore::new(word_count(7));
        let table = random_table(&mut rng, 7);
        let id = store.append(&table);
        for var in [1usize, 3, 6] {
            let c0 = store.cof0(id, var);
            let c1 = store.cof1(id, var);
            for m in 0..128usize {
                let want0 = table_bit(&table, m & !(1 << var));
                let want1 = table_bit(&table, m | (1 << var));
                assert_eq!(table_bit(store.read(c0), m), want0, "cof0 var {var} minterm {m}");
                assert_eq!(table_bit(store.read(c1), m), want1, "cof1 var {var} minterm {m}");
            }
            store.shrink(2);
        }
    }

    #[test]
    fn has_var_reports_the_support() {
        let mut store = TruthStore::with_elementary(7);
        // x2 & x6 depends on exactly those two variables.
        let t = store.and(2 + 2 * 2, 2 + 2 * 6);
        for var in 0..7 {
            assert_eq!(store.has_var(t, var), var == 2 || var == 6);
        }
        assert!(!store.has_var(0, 3));
        assert!(!store.has_var(1, 3));
    }

    #[test_case(0, 1; "both sub word low")]
    #[test_case(2, 5; "both sub word high")]
    #[test_case(1, 6; "across the word boundary")]
    #[test_case(4, 7; "across with stride")]
    #[test_case(6, 7; "both word granular")]
    fn swap_vars_matches_bit_permutation(i: usize, j: usize) {
        let mut rng = Pcg64Mcg::new(0x5eed);
        let mut store = TruthStore::new(word_count(8));
        let orig = random_table(&mut rng, 8);
        let id = store.append(&orig);
        store.swap_vars(id, i, j);
        for m in 0..256usize {
            let bit_i = (m >> i) & 1;
            let bit_j = (m >> j) & 1;
            let source = (m & !(1 << i) & !(1 << j)) | (bit_j << i) | (bit_i << j);
            assert_eq!(
                table_bit(store.read(id), m),
                table_bit(&orig, source),
                "minterm {m}"
            );
        }
        // A second swap restores the original table.
        store.swap_vars(id, j, i);
        assert_eq!(store.read(id), &orig[..]);
        store.swap_vars(id, i, i);
        assert_eq!(store.read(id), &orig[..]);
    }

    #[test]
    fn formatting_round_trips_the_digits() {
        let mut store = TruthStore::new(1);
        let id = store.append(&[0x8888_8888_8888_8888]);
        assert_eq!(store.fmt_hex(id), "8888888888888888");
        assert_eq!(store.fmt_bits(id).len(), 64);
        assert!(store.fmt_bits(id).starts_with("10001000"));
    }

    #[test]
    fn cross_store_equality_requires_equal_words() {
        let mut a = TruthStore::new(1);
        let mut b = TruthStore::new(1);
        let ia = a.append(&[42]);
        let ib = b.append(&[42]);
        assert!(a.eq_across(ia, &b, ib));
        let ic = b.append(&[43]);
        assert!(!a.eq_across(ia, &b, ic));
    }
}
