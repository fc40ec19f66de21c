//! Corpus glue: lead-sheet chord charts and bulk training.
//!
//! A chart is just a key and a chord list; converting it to symbols and
//! feeding the automaton is the whole training pipeline. Charts whose
//! chords fall outside the symbol vocabulary are logged and skipped
//! rather than aborting a corpus run.

use crate::automaton::Automaton;
use crate::chord::{Chord, Pitch};
use crate::error::Error;
use crate::symbol::Symbol;

/// One tune: a tonic key and its chord sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub key: Pitch,
    pub chords: Vec<Chord>,
}

impl Chart {
    pub fn new(key: Pitch, chords: Vec<Chord>) -> Self {
        Chart { key, chords }
    }

    /// Parse a chart from string form: a key name and chord symbols
    /// ("Bb", ["Cm7", "F7", "Bbmaj7"]).
    pub fn parse(key: &str, chords: &[&str]) -> Result<Chart, Error> {
        Ok(Chart {
            key: key.parse()?,
            chords: chords
                .iter()
                .map(|c| c.parse())
                .collect::<Result<Vec<Chord>, Error>>()?,
        })
    }

    /// Classify every chord against the chart's key. Strict: one
    /// unclassifiable chord fails the whole chart.
    pub fn symbols(&self) -> Result<Vec<Symbol>, Error> {
        self.chords
            .iter()
            .map(|c| Symbol::from_chord(&self.key, c))
            .collect()
    }
}

/// Train the automaton on every chart that classifies cleanly. Charts
/// with unclassifiable chords are skipped with a warning. Returns the
/// number of charts trained on.
pub fn train_on_charts(automaton: &mut Automaton, charts: &[Chart]) -> usize {
    let mut trained = 0;
    for chart in charts {
        match chart.symbols() {
            Ok(symbols) => {
                automaton.train_sequence(&symbols);
                trained += 1;
            }
            Err(e) => {
                log::warn!("skipping chart in {}: {e}", chart.key);
            }
        }
    }
    log::debug!("trained on {trained} of {} charts", charts.len());
    trained
}
