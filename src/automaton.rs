//! The jazz automaton: a probabilistic finite-state machine over Mehegan
//! symbols.
//!
//! States and transitions live in arena vectors and reference each other by
//! index, which keeps the graph cycle-friendly and makes the serialized
//! form (state-index references) fall out naturally. Insertion order is
//! creation order and is never disturbed, so dumps are deterministic.
//!
//! Analysis (`pathways`, `analyze`, `validate`, `find_failure_point`) takes
//! `&self` and is safe to run from many readers at once; training and
//! grammar construction take `&mut self`, so the borrow checker enforces
//! the single-writer discipline.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chord::{Chord, Pitch};
use crate::error::Error;
use crate::symbol::{Quality, Symbol};

pub type StateId = usize;
pub type TransitionId = usize;

// ─── States & transitions ────────────────────────────────────────────

/// A node in the automaton graph. Names are labels, not identifiers —
/// several states may share one.
#[derive(Debug, Clone)]
pub struct State {
    pub name: String,
    /// Whether a pathway may begin here.
    pub is_start: bool,
    /// Whether a pathway may end here.
    pub is_end: bool,
    /// Outgoing transitions, in creation order.
    pub transitions: Vec<TransitionId>,
}

/// A directed edge consumed by one symbol of an input sequence.
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub symbol: Symbol,
    /// Training occurrence weight. Fractional: ambiguous parses spread
    /// one unit of credit across all surviving transitions of a timestep.
    pub count: f64,
}

/// Diagnostic for a sequence the automaton cannot parse.
#[derive(Debug, Clone, PartialEq)]
pub struct FailurePoint {
    /// Index of the first symbol with no usable transition.
    pub index: usize,
    /// The failing symbol.
    pub symbol: Symbol,
    /// States that were reachable just before the failure.
    pub previous_states: Vec<StateId>,
    /// True when every symbol matched but no surviving state was an end
    /// state.
    pub invalid_end_state: bool,
}

/// A sequence produced by probabilistic random walk. Holds transition
/// indices; the views resolve against the automaton that produced it.
#[derive(Debug, Clone)]
pub struct GeneratedSequence {
    pub transitions: Vec<TransitionId>,
}

impl GeneratedSequence {
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn symbols(&self, automaton: &Automaton) -> Vec<Symbol> {
        self.transitions
            .iter()
            .map(|&t| automaton.transitions[t].symbol)
            .collect()
    }

    /// The visited states: the first transition's source, then every
    /// target in order.
    pub fn state_ids(&self, automaton: &Automaton) -> Vec<StateId> {
        let mut states = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(&first) = self.transitions.first() {
            states.push(automaton.transitions[first].from);
        }
        states.extend(
            self.transitions
                .iter()
                .map(|&t| automaton.transitions[t].to),
        );
        states
    }

    pub fn state_names(&self, automaton: &Automaton) -> Vec<String> {
        self.state_ids(automaton)
            .into_iter()
            .map(|s| automaton.states[s].name.clone())
            .collect()
    }

    /// Symbols with consecutive duplicates removed (an unpacked ii-V that
    /// re-states the same chord collapses to one entry).
    pub fn collapsed_symbols(&self, automaton: &Automaton) -> Vec<Symbol> {
        let mut out: Vec<Symbol> = Vec::new();
        for symbol in self.symbols(automaton) {
            if out.last() != Some(&symbol) {
                out.push(symbol);
            }
        }
        out
    }

    /// Realize the collapsed symbols as chords in a key.
    pub fn chords(&self, automaton: &Automaton, key: &Pitch) -> Result<Vec<Chord>, Error> {
        self.collapsed_symbols(automaton)
            .iter()
            .map(|s| s.to_chord(key))
            .collect()
    }
}

// ─── Serialized form ─────────────────────────────────────────────────

/// Flat serialized automaton: states by value, transitions by state index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomatonDump {
    pub states: Vec<StateDump>,
    pub transitions: Vec<TransitionDump>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDump {
    pub name: String,
    pub is_start: bool,
    pub is_end: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDump {
    pub from: usize,
    pub to: usize,
    pub symbol: SymbolDump,
    pub count: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDump {
    pub numeral: String,
    pub quality: Quality,
}

// ─── Automaton ───────────────────────────────────────────────────────

/// The automaton graph container.
#[derive(Debug, Clone, Default)]
pub struct Automaton {
    states: Vec<State>,
    transitions: Vec<Transition>,
}

impl Automaton {
    pub fn new() -> Self {
        Automaton::default()
    }

    // ── Construction ─────────────────────────────────────────────────

    pub fn add_state(&mut self, name: &str, is_start: bool, is_end: bool) -> StateId {
        self.states.push(State {
            name: name.to_string(),
            is_start,
            is_end,
            transitions: Vec::new(),
        });
        self.states.len() - 1
    }

    /// Add a transition, deduplicating on (symbol, target): if `from`
    /// already transitions to `to` on an equal symbol, the existing
    /// transition is returned unchanged.
    pub fn add_transition(
        &mut self,
        symbol: Symbol,
        from: StateId,
        to: StateId,
        count: f64,
    ) -> TransitionId {
        if let Some(existing) = self.find_transition(from, &symbol, to) {
            return existing;
        }
        let id = self.transitions.len();
        self.transitions.push(Transition {
            from,
            to,
            symbol,
            count,
        });
        self.states[from].transitions.push(id);
        id
    }

    pub fn has_transition(&self, from: StateId, symbol: &Symbol, to: StateId) -> bool {
        self.find_transition(from, symbol, to).is_some()
    }

    fn find_transition(
        &self,
        from: StateId,
        symbol: &Symbol,
        to: StateId,
    ) -> Option<TransitionId> {
        self.states[from]
            .transitions
            .iter()
            .copied()
            .find(|&t| self.transitions[t].to == to && self.transitions[t].symbol == *symbol)
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id]
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn states_by_name(&self, name: &str) -> Vec<StateId> {
        (0..self.states.len())
            .filter(|&s| self.states[s].name == name)
            .collect()
    }

    /// First state with the given name, in creation order.
    pub fn state_by_name(&self, name: &str) -> Option<StateId> {
        (0..self.states.len()).find(|&s| self.states[s].name == name)
    }

    /// Find a state with this name that already transitions to `target`,
    /// or create one. Reuse enables the requested start/end flags on the
    /// existing state but never clears them. This is how grammar passes
    /// share elaboration states (every dominant resolving to the same
    /// tonic goes through one "Unpacked Vx" state).
    pub fn state_with_name_and_transition(
        &mut self,
        name: &str,
        target: StateId,
        is_start: bool,
        is_end: bool,
    ) -> StateId {
        let found = (0..self.states.len()).find(|&s| {
            self.states[s].name == name
                && self.states[s]
                    .transitions
                    .iter()
                    .any(|&t| self.transitions[t].to == target)
        });
        match found {
            Some(s) => {
                self.states[s].is_start |= is_start;
                self.states[s].is_end |= is_end;
                s
            }
            None => self.add_state(name, is_start, is_end),
        }
    }

    /// Outgoing transitions of `from` matching the symbol.
    pub fn transitions_by_symbol(&self, from: StateId, symbol: &Symbol) -> Vec<TransitionId> {
        self.states[from]
            .transitions
            .iter()
            .copied()
            .filter(|&t| self.transitions[t].symbol == *symbol)
            .collect()
    }

    pub fn next_states_by_symbol(&self, from: StateId, symbol: &Symbol) -> Vec<StateId> {
        let mut out = Vec::new();
        for t in self.transitions_by_symbol(from, symbol) {
            let to = self.transitions[t].to;
            if !out.contains(&to) {
                out.push(to);
            }
        }
        out
    }

    /// Probability of a transition among its siblings: count over the
    /// summed counts of all transitions leaving the same state. All-zero
    /// siblings give probability 0 (nothing has occurred yet).
    pub fn probability(&self, id: TransitionId) -> f64 {
        let from = self.transitions[id].from;
        let total: f64 = self.states[from]
            .transitions
            .iter()
            .map(|&t| self.transitions[t].count)
            .sum();
        if total > 0.0 {
            self.transitions[id].count / total
        } else {
            0.0
        }
    }

    // ── Analysis ─────────────────────────────────────────────────────

    /// Start states reachable by the first symbol of a sequence: targets
    /// of any matching transition, filtered to `is_start`, deduplicated.
    /// A sequence starting mid-phrase simply yields no candidates.
    pub fn initial_states(&self, symbol: &Symbol) -> Vec<StateId> {
        let mut out = Vec::new();
        for t in &self.transitions {
            if t.symbol == *symbol && self.states[t.to].is_start && !out.contains(&t.to) {
                out.push(t.to);
            }
        }
        out
    }

    /// The central search primitive: for N input symbols, the N-1 lists of
    /// transitions usable at each step (one list per symbol after the
    /// first) across all surviving pathways.
    ///
    /// Forward pass: seed a frontier from `initial_states`, then per
    /// symbol collect matching transitions out of the frontier and advance
    /// to their targets. The final list keeps only transitions into end
    /// states; a backward pass then prunes dead ends (transitions whose
    /// target continues nowhere in the next timestep).
    ///
    /// Keeping per-step transition lists instead of materialized paths
    /// bounds the cost at O(N * maxTransitionsPerState^2) even when the
    /// pathway count is combinatorial.
    pub fn pathways(&self, symbols: &[Symbol]) -> Vec<Vec<TransitionId>> {
        if symbols.len() < 2 {
            return Vec::new();
        }

        let mut frontier = self.initial_states(&symbols[0]);
        let mut steps: Vec<Vec<TransitionId>> = Vec::with_capacity(symbols.len() - 1);

        for symbol in &symbols[1..] {
            let mut step: Vec<TransitionId> = Vec::new();
            for &state in &frontier {
                for &t in &self.states[state].transitions {
                    if self.transitions[t].symbol == *symbol && !step.contains(&t) {
                        step.push(t);
                    }
                }
            }
            frontier.clear();
            for &t in &step {
                let to = self.transitions[t].to;
                if !frontier.contains(&to) {
                    frontier.push(to);
                }
            }
            steps.push(step);
        }

        if let Some(last) = steps.last_mut() {
            last.retain(|&t| self.states[self.transitions[t].to].is_end);
        }

        // Backward dead-end pruning: a transition survives only if its
        // target is the source of some survivor in the following step.
        for i in (0..steps.len().saturating_sub(1)).rev() {
            let froms: Vec<StateId> = steps[i + 1]
                .iter()
                .map(|&t| self.transitions[t].from)
                .collect();
            steps[i].retain(|&t| froms.contains(&self.transitions[t].to));
        }

        steps
    }

    /// Reconstruct every explicit state pathway consistent with the
    /// sequence. Empty when the sequence has no parse. Pathways always
    /// begin in a start state and end in an end state.
    pub fn analyze(&self, symbols: &[Symbol]) -> Vec<Vec<StateId>> {
        let steps = self.pathways(symbols);
        if steps.is_empty() || steps.iter().any(|s| s.is_empty()) {
            return Vec::new();
        }

        // One seed pathway per distinct source of the first step.
        let mut paths: Vec<Vec<StateId>> = Vec::new();
        for &t in &steps[0] {
            let from = self.transitions[t].from;
            if !paths.iter().any(|p| p[0] == from) {
                paths.push(vec![from]);
            }
        }

        for step in &steps {
            let mut extended: Vec<Vec<StateId>> = Vec::new();
            for path in &paths {
                let Some(&tail) = path.last() else { continue };
                for &t in step {
                    if self.transitions[t].from == tail {
                        let mut longer = path.clone();
                        longer.push(self.transitions[t].to);
                        extended.push(longer);
                    }
                }
            }
            paths = extended;
        }
        paths
    }

    pub fn validate(&self, symbols: &[Symbol]) -> bool {
        !self.analyze(symbols).is_empty()
    }

    /// Best-effort diagnostic: replay the sequence with a single
    /// reachable-state set (no pathway tracking) and report the first
    /// symbol with nowhere to go, or flag a sequence that matches fully
    /// but strands outside every end state. None when the sequence
    /// validates. With several pathways alive the reported index can be
    /// coarser than any one pathway's true divergence point.
    pub fn find_failure_point(&self, symbols: &[Symbol]) -> Option<FailurePoint> {
        if symbols.is_empty() {
            return None;
        }

        let mut reachable = self.initial_states(&symbols[0]);
        if reachable.is_empty() {
            return Some(FailurePoint {
                index: 0,
                symbol: symbols[0],
                previous_states: Vec::new(),
                invalid_end_state: false,
            });
        }

        for (i, symbol) in symbols.iter().enumerate().skip(1) {
            let mut next: Vec<StateId> = Vec::new();
            for &state in &reachable {
                for &t in &self.states[state].transitions {
                    if self.transitions[t].symbol == *symbol {
                        let to = self.transitions[t].to;
                        if !next.contains(&to) {
                            next.push(to);
                        }
                    }
                }
            }
            if next.is_empty() {
                return Some(FailurePoint {
                    index: i,
                    symbol: *symbol,
                    previous_states: reachable,
                    invalid_end_state: false,
                });
            }
            reachable = next;
        }

        if reachable.iter().any(|&s| self.states[s].is_end) {
            None
        } else {
            Some(FailurePoint {
                index: symbols.len() - 1,
                symbol: symbols[symbols.len() - 1],
                previous_states: reachable,
                invalid_end_state: true,
            })
        }
    }

    // ── Training ─────────────────────────────────────────────────────

    /// Accumulate transition counts from one analyzed sequence. Every
    /// surviving transition of a timestep receives 1/|timestep| — a
    /// sequence consistent with several pathways spreads its weight over
    /// all of them. Sequences with no surviving parse contribute nothing.
    pub fn train_sequence(&mut self, symbols: &[Symbol]) {
        let steps = self.pathways(symbols);
        if steps.is_empty() || steps.iter().any(|s| s.is_empty()) {
            log::trace!("training skipped unparseable sequence of {} symbols", symbols.len());
            return;
        }
        for step in &steps {
            let share = 1.0 / step.len() as f64;
            for &t in step {
                self.transitions[t].count += share;
            }
        }
    }

    /// Train on a corpus. Sequences are independent; counts accumulate
    /// across calls.
    pub fn train(&mut self, sequences: &[Vec<Symbol>]) {
        for sequence in sequences {
            self.train_sequence(sequence);
        }
        log::debug!("trained on {} sequences", sequences.len());
    }

    // ── Generation ───────────────────────────────────────────────────

    /// Random walk of exactly `length` symbols beginning on `first`.
    /// None when no start state accepts `first`, when `length` is zero,
    /// or when the walk dead-ends early.
    pub fn generate_from_start_and_length(
        &self,
        first: &Symbol,
        length: usize,
    ) -> Option<GeneratedSequence> {
        self.generate_from_start_and_length_with(first, length, &mut rand::rng())
    }

    pub fn generate_from_start_and_length_with<R: Rng + ?Sized>(
        &self,
        first: &Symbol,
        length: usize,
        rng: &mut R,
    ) -> Option<GeneratedSequence> {
        if length == 0 {
            return None;
        }
        self.generate_with(first, rng, |seq, _| seq.len() >= length)
    }

    /// Random walk beginning on `first` and ending the first time `last`
    /// is emitted into an end state.
    pub fn generate_from_start_and_end(
        &self,
        first: &Symbol,
        last: &Symbol,
    ) -> Option<GeneratedSequence> {
        self.generate_from_start_and_end_with(first, last, &mut rand::rng())
    }

    pub fn generate_from_start_and_end_with<R: Rng + ?Sized>(
        &self,
        first: &Symbol,
        last: &Symbol,
        rng: &mut R,
    ) -> Option<GeneratedSequence> {
        self.generate_with(first, rng, |seq, automaton: &Automaton| {
            match seq.transitions.last() {
                Some(&tail) => {
                    automaton.transitions[tail].symbol == *last
                        && automaton.states[automaton.transitions[tail].to].is_end
                }
                None => false,
            }
        })
    }

    fn generate_with<R: Rng + ?Sized>(
        &self,
        first: &Symbol,
        rng: &mut R,
        done: impl Fn(&GeneratedSequence, &Automaton) -> bool,
    ) -> Option<GeneratedSequence> {
        let candidates: Vec<TransitionId> = (0..self.transitions.len())
            .filter(|&t| {
                self.transitions[t].symbol == *first && self.states[self.transitions[t].to].is_start
            })
            .collect();
        let initial = self.weighted_choice(&candidates, rng)?;

        let mut sequence = GeneratedSequence {
            transitions: vec![initial],
        };
        while !done(&sequence, self) {
            let here = self.transitions[*sequence.transitions.last()?].to;
            let next = self.weighted_choice(&self.states[here].transitions, rng)?;
            sequence.transitions.push(next);
        }
        Some(sequence)
    }

    /// Cumulative-distribution sampling over normalized transition
    /// probabilities. When no transition has occurred yet (all-zero mass)
    /// the pick is uniform, so an untrained automaton still generates.
    fn weighted_choice<R: Rng + ?Sized>(
        &self,
        candidates: &[TransitionId],
        rng: &mut R,
    ) -> Option<TransitionId> {
        if candidates.is_empty() {
            return None;
        }
        let total: f64 = candidates.iter().map(|&t| self.probability(t)).sum();
        if total <= 0.0 {
            return Some(candidates[rng.random_range(0..candidates.len())]);
        }
        let draw: f64 = rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        for &t in candidates {
            cumulative += self.probability(t);
            if cumulative > draw {
                return Some(t);
            }
        }
        candidates.last().copied() // float round-off fallback
    }

    // ── Serialization ────────────────────────────────────────────────

    /// Reduce to the flat dump form: states as {name, isStart, isEnd},
    /// transitions referencing states by array position.
    pub fn to_dump(&self) -> AutomatonDump {
        AutomatonDump {
            states: self
                .states
                .iter()
                .map(|s| StateDump {
                    name: s.name.clone(),
                    is_start: s.is_start,
                    is_end: s.is_end,
                })
                .collect(),
            transitions: self
                .transitions
                .iter()
                .map(|t| TransitionDump {
                    from: t.from,
                    to: t.to,
                    symbol: SymbolDump {
                        numeral: t.symbol.numeral(),
                        quality: t.symbol.quality(),
                    },
                    count: t.count,
                })
                .collect(),
        }
    }

    pub fn from_dump(dump: &AutomatonDump) -> Result<Automaton, Error> {
        let mut automaton = Automaton::new();
        for state in &dump.states {
            automaton.add_state(&state.name, state.is_start, state.is_end);
        }
        for t in &dump.transitions {
            if t.from >= dump.states.len() || t.to >= dump.states.len() {
                return Err(Error::InvalidDump(format!(
                    "transition references state {} of {}",
                    t.from.max(t.to),
                    dump.states.len()
                )));
            }
            let symbol = Symbol::new(&t.symbol.numeral, t.symbol.quality)?;
            automaton.add_transition(symbol, t.from, t.to, t.count);
        }
        Ok(automaton)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(&self.to_dump())
            .map_err(|e| Error::InvalidDump(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Automaton, Error> {
        let dump: AutomatonDump =
            serde_json::from_str(json).map_err(|e| Error::InvalidDump(e.to_string()))?;
        Automaton::from_dump(&dump)
    }
}
