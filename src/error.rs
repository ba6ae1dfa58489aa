// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::truth::MAX_VARS;

/// The result of a synthesis-pipeline operation.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Error surfaced by the reader, the AIGER serdes, or the driver.
#[derive(Debug, Error)]
pub enum SynthError {
    /// The input does not have the bit length of any truth table, or rows of
    /// a multi-output file disagree on the variable count.
    #[error("input of {got} bits does not form a {vars}-variable truth table ({want} bits)")]
    ReaderMalformed { got: usize, vars: usize, want: usize },

    /// More input variables than the fixed bound.
    #[error("{0} input variables exceed the supported maximum of {}", MAX_VARS)]
    CapacityExceeded(usize),

    /// A character that is neither a binary nor a hex digit, depending on the
    /// input form.
    #[error("invalid digit {0:?} in truth table input")]
    BadDigit(char),

    /// Structurally invalid AIGER data.
    #[error("malformed AIGER input: {0}")]
    AigerMalformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
