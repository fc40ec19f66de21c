//! jazzlib — jazz harmony analysis and generation library for SoloBand Ultra.
//!
//! Models tonal jazz harmony as a probabilistic finite-state automaton over
//! Mehegan roman-numeral symbols. A built-in grammar ([`default_grammar`])
//! describes which chord progressions are admissible; training on chord
//! charts weights its transitions; the weighted automaton then analyzes,
//! validates, and generates progressions.
//!
//! # Example
//! ```no_run
//! use jazzlib::{corpus, default_grammar, Chart};
//!
//! let mut automaton = default_grammar();
//! let chart = Chart::parse("C", &["Dm7", "G7", "Cmaj7"]).unwrap();
//! corpus::train_on_charts(&mut automaton, &[chart]);
//!
//! let symbols = Chart::parse("F", &["Gm7", "C7", "Fmaj7"])
//!     .unwrap()
//!     .symbols()
//!     .unwrap();
//! assert!(automaton.validate(&symbols));
//! ```

pub mod automaton;
pub mod chord;
pub mod corpus;
pub mod error;
pub mod grammar;
pub mod symbol;

pub use automaton::{
    Automaton, AutomatonDump, FailurePoint, GeneratedSequence, State, StateId, Transition,
    TransitionId,
};
pub use chord::{Chord, ChordKind, IntervalClass, Pitch};
pub use corpus::Chart;
pub use error::Error;
pub use symbol::{Quality, Symbol};

/// The built-in harmonic grammar, untrained.
pub fn default_grammar() -> Automaton {
    grammar::build_default()
}

/// Parse a Mehegan symbol string ("ii", "Vx", "bIIIM").
pub fn symbol_from_mehegan(s: &str) -> Result<Symbol, Error> {
    Symbol::from_mehegan(s)
}

/// Classify a chord relative to a key.
pub fn symbol_from_chord(key: &Pitch, chord: &Chord) -> Result<Symbol, Error> {
    Symbol::from_chord(key, chord)
}
