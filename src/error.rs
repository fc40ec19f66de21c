//! Error taxonomy for symbol classification and parsing.
//!
//! All failures here are immediate and local — callers either pre-validate
//! or skip the offending input. The automaton itself has no error paths:
//! a sequence with no grammatical parse is an empty result, not an error.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A Mehegan string doesn't match `[b#]?(I..VII)[Mmxoøs]?`.
    #[error("invalid Mehegan symbol syntax: '{0}'")]
    InvalidSymbolSyntax(String),

    /// A chord's interval content doesn't map to any known quality.
    #[error("chord '{0}' does not match any known chord quality")]
    UnclassifiableChord(String),

    /// No nameable interval exists between two pitches, even after
    /// enharmonic respelling.
    #[error("no nameable interval from {0} to {1}")]
    NoSuchInterval(String, String),

    /// A quality character outside the closed set {M, m, x, o, ø, s}.
    #[error("invalid chord quality '{0}' (expected one of M, m, x, o, ø, s)")]
    InvalidQuality(char),

    /// A serialized automaton dump references states or symbols that
    /// don't exist.
    #[error("invalid automaton dump: {0}")]
    InvalidDump(String),
}
