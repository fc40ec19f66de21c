//! Construction of the default harmonic grammar.
//!
//! The grammar is built in ten passes. Pass 1 lays down twelve primitive
//! function states (tonic, subdominant, dominant families) and wires the
//! allowed function-to-function movements. Every later pass elaborates
//! transitions that already exist: tonicization, applied dominants,
//! diminished approaches, tritone substitution, ii-V unpacking,
//! suspensions, chromatic approaches, neighbor figures, and diatonic
//! passing motion. Each pass iterates over a snapshot of the transition
//! list taken at its start, so its own insertions are not re-elaborated
//! within the pass.
//!
//! All transitions start with count 0; the grammar describes what is
//! admissible, training supplies the weights.

use crate::automaton::{Automaton, StateId};
use crate::symbol::{Quality, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Tonic,
    Subdominant,
    Dominant,
}

impl Function {
    fn label(self) -> &'static str {
        match self {
            Function::Tonic => "Tonic",
            Function::Subdominant => "Subdominant",
            Function::Dominant => "Dominant",
        }
    }
}

struct Primitive {
    function: Function,
    name: &'static str,
    interval: u8,
    qualities: &'static [Quality],
}

use Quality::{Dominant as X, HalfDiminished as H, Major as M, Minor as N};

/// The twelve primitive states: each scale-degree slot a function can
/// occupy, with the chord qualities heard there.
const PRIMITIVES: [Primitive; 12] = [
    Primitive { function: Function::Tonic, name: "Tonic 1", interval: 0, qualities: &[M, N] },
    Primitive { function: Function::Tonic, name: "Tonic b3", interval: 3, qualities: &[M, X] },
    Primitive { function: Function::Tonic, name: "Tonic 3", interval: 4, qualities: &[N] },
    Primitive { function: Function::Tonic, name: "Tonic 6", interval: 9, qualities: &[N, X] },
    Primitive { function: Function::Subdominant, name: "Subdominant 2", interval: 2, qualities: &[N, H, X] },
    Primitive { function: Function::Subdominant, name: "Subdominant 4", interval: 5, qualities: &[M, N] },
    Primitive { function: Function::Subdominant, name: "Subdominant b6", interval: 8, qualities: &[M, X] },
    Primitive { function: Function::Subdominant, name: "Subdominant 6", interval: 9, qualities: &[N] },
    Primitive { function: Function::Dominant, name: "Dominant 3", interval: 4, qualities: &[N, X] },
    Primitive { function: Function::Dominant, name: "Dominant 4", interval: 5, qualities: &[M, X] },
    Primitive { function: Function::Dominant, name: "Dominant 5", interval: 7, qualities: &[X] },
    Primitive { function: Function::Dominant, name: "Dominant b7", interval: 10, qualities: &[X] },
];

/// Allowed function movements. Tonic may prolong or move toward
/// subdominant, subdominant toward dominant, dominant resolves to tonic.
const MOVEMENTS: [(Function, Function); 6] = [
    (Function::Tonic, Function::Tonic),
    (Function::Tonic, Function::Subdominant),
    (Function::Subdominant, Function::Subdominant),
    (Function::Subdominant, Function::Dominant),
    (Function::Dominant, Function::Dominant),
    (Function::Dominant, Function::Tonic),
];

/// Primitive states that already have a tritone twin among the
/// primitives (b3/6, 2/b6, 3/b7 within one function). Substituting onto
/// these would duplicate edges the primitive wiring provides.
const TRITONE_TWINNED: [&str; 6] = [
    "Tonic b3",
    "Tonic 6",
    "Subdominant 2",
    "Subdominant b6",
    "Dominant 3",
    "Dominant b7",
];

/// Diatonic stepwise runs, as (interval, quality) steps, and the function
/// each lands on. Each triple is also applied in reverse, landing on the
/// paired retrograde function.
const PASSING_RUNS: [([(u8, Quality); 3], Function, Function); 6] = [
    // I II III
    ([(0, M), (2, N), (4, N)], Function::Tonic, Function::Tonic),
    // II III IV
    ([(2, N), (4, N), (5, M)], Function::Subdominant, Function::Subdominant),
    // III IV V
    ([(4, N), (5, M), (7, X)], Function::Dominant, Function::Tonic),
    // IV V VI
    ([(5, M), (7, X), (9, N)], Function::Tonic, Function::Subdominant),
    ([(5, M), (7, X), (9, N)], Function::Subdominant, Function::Subdominant),
    // VI VII I
    ([(9, N), (11, H), (0, M)], Function::Tonic, Function::Tonic),
];

/// Build the default grammar automaton.
pub fn build_default() -> Automaton {
    let mut automaton = Automaton::new();

    build_primitives(&mut automaton);
    tonicization(&mut automaton);
    applied_dominants(&mut automaton);
    diminished_approaches(&mut automaton);
    tritone_substitutions(&mut automaton);
    unpack_progressions(&mut automaton);
    suspensions(&mut automaton);
    chromatic_approaches(&mut automaton);
    neighbor_figures(&mut automaton);
    diatonic_passing(&mut automaton);

    log::debug!(
        "default grammar built: {} states, {} transitions",
        automaton.states().len(),
        automaton.transitions().len()
    );
    automaton
}

/// Pass 1: primitive function states and their movements. Every primitive
/// may open or close a progression.
fn build_primitives(automaton: &mut Automaton) {
    let ids: Vec<StateId> = PRIMITIVES
        .iter()
        .map(|p| automaton.add_state(p.name, true, true))
        .collect();

    for &(from_fn, to_fn) in &MOVEMENTS {
        for (i, source) in PRIMITIVES.iter().enumerate() {
            if source.function != from_fn {
                continue;
            }
            for (j, target) in PRIMITIVES.iter().enumerate() {
                if target.function != to_fn {
                    continue;
                }
                for &quality in target.qualities {
                    let symbol = Symbol::from_interval(target.interval, quality);
                    automaton.add_transition(symbol, ids[i], ids[j], 0.0);
                }
            }
        }
    }
}

/// Snapshot of the existing transitions as (from, to, symbol) triples so
/// a pass can insert freely while it walks them.
fn snapshot(automaton: &Automaton) -> Vec<(StateId, StateId, Symbol)> {
    automaton
        .transitions()
        .iter()
        .map(|t| (t.from, t.to, t.symbol))
        .collect()
}

/// Pass 2: tonicization. Any non-tonic M/m/ø arrival can be prepared by
/// its own ii-V; the ii is a valid opening.
fn tonicization(automaton: &mut Automaton) {
    for (from, to, sym) in snapshot(automaton) {
        if sym.interval() == 0 {
            continue;
        }
        if !matches!(sym.quality(), Quality::Major | Quality::Minor | Quality::HalfDiminished) {
            continue;
        }
        let five = automaton.state_with_name_and_transition(&format!("V of {sym}"), to, false, false);
        automaton.add_transition(sym, five, to, 0.0);

        let two = automaton.state_with_name_and_transition(&format!("ii of {sym}"), five, true, false);
        automaton.add_transition(sym.transposed(7).with_quality(Quality::Dominant), two, five, 0.0);
        for q in [Quality::Minor, Quality::HalfDiminished, Quality::Dominant] {
            automaton.add_transition(sym.transposed(2).with_quality(q), from, two, 0.0);
        }
    }
}

/// Pass 3: applied dominants. Any M/m arrival can be approached directly
/// by its own V, which is also a valid opening.
fn applied_dominants(automaton: &mut Automaton) {
    for (from, to, sym) in snapshot(automaton) {
        if !matches!(sym.quality(), Quality::Major | Quality::Minor) {
            continue;
        }
        let five = automaton.state_with_name_and_transition(&format!("V of {sym}"), to, true, false);
        automaton.add_transition(sym, five, to, 0.0);
        automaton.add_transition(sym.transposed(7).with_quality(Quality::Dominant), from, five, 0.0);
    }
}

/// Pass 4: diminished chords. A dominant may be replaced by the
/// diminished seventh on its third (vii°7 of its target); a minor arrival
/// may be approached chromatically from the diminished chord a half step
/// below.
fn diminished_approaches(automaton: &mut Automaton) {
    for (from, to, sym) in snapshot(automaton) {
        match sym.quality() {
            Quality::Dominant => {
                automaton.add_transition(
                    sym.transposed(4).with_quality(Quality::Diminished),
                    from,
                    to,
                    0.0,
                );
            }
            Quality::Minor => {
                let dim = automaton.state_with_name_and_transition(
                    &format!("Diminished approach to {sym}"),
                    to,
                    true,
                    false,
                );
                automaton.add_transition(sym, dim, to, 0.0);
                automaton.add_transition(
                    sym.transposed(1).with_quality(Quality::Diminished),
                    from,
                    dim,
                    0.0,
                );
            }
            _ => {}
        }
    }
}

/// Pass 5: tritone substitution. Every dominant transition gains a twin a
/// tritone away, except onto primitives whose tritone twin is itself a
/// primitive.
fn tritone_substitutions(automaton: &mut Automaton) {
    for (from, to, sym) in snapshot(automaton) {
        if sym.quality() != Quality::Dominant {
            continue;
        }
        if TRITONE_TWINNED.contains(&automaton.state(to).name.as_str()) {
            continue;
        }
        automaton.add_transition(sym.transposed(6), from, to, 0.0);
    }
}

/// Pass 6: ii-V unpacking. A dominant may be preceded by its own ii; a
/// minor chord may be followed by its own V before moving on. Arrivals
/// already inside a tonicization (ii-of / V-of states) are left alone.
fn unpack_progressions(automaton: &mut Automaton) {
    for (from, to, sym) in snapshot(automaton) {
        match sym.quality() {
            Quality::Dominant => {
                if automaton.state(to).name.starts_with("V of ") {
                    continue;
                }
                let unpacked = automaton.state_with_name_and_transition(
                    &format!("Unpacked {sym}"),
                    to,
                    true,
                    false,
                );
                automaton.add_transition(sym, unpacked, to, 0.0);
                automaton.add_transition(
                    sym.transposed(7).with_quality(Quality::Minor),
                    from,
                    unpacked,
                    0.0,
                );
            }
            Quality::Minor => {
                if automaton.state(from).name.starts_with("V of ")
                    || automaton.state(to).name.starts_with("ii of ")
                {
                    continue;
                }
                let unpacked = automaton.state_with_name_and_transition(
                    &format!("Unpacked {sym}"),
                    to,
                    true,
                    false,
                );
                automaton.add_transition(
                    sym.transposed(5).with_quality(Quality::Dominant),
                    unpacked,
                    to,
                    0.0,
                );
                automaton.add_transition(sym, from, unpacked, 0.0);
            }
            _ => {}
        }
    }
}

/// Pass 7: suspensions. Every dominant transition gains a suspended twin
/// on the same root.
fn suspensions(automaton: &mut Automaton) {
    for (from, to, sym) in snapshot(automaton) {
        if sym.quality() == Quality::Dominant {
            automaton.add_transition(sym.with_quality(Quality::Suspended), from, to, 0.0);
        }
    }
}

/// Pass 8: chromatic approach. Any M/m arrival can be approached by the
/// dominant a half step below. Not a valid opening; the approach only
/// makes sense mid-phrase.
fn chromatic_approaches(automaton: &mut Automaton) {
    for (from, to, sym) in snapshot(automaton) {
        if !matches!(sym.quality(), Quality::Major | Quality::Minor) {
            continue;
        }
        let approach = automaton.state_with_name_and_transition(
            &format!("Chromatic approach to {sym}"),
            to,
            false,
            false,
        );
        automaton.add_transition(sym, approach, to, 0.0);
        automaton.add_transition(
            sym.transposed(11).with_quality(Quality::Dominant),
            from,
            approach,
            0.0,
        );
    }
}

/// Pass 9: neighbor figures. A chord heard on a primitive state may be
/// restated after a half-step excursion of any quality: chord, neighbor,
/// chord again.
fn neighbor_figures(automaton: &mut Automaton) {
    for (from, to, sym) in snapshot(automaton) {
        if !matches!(sym.quality(), Quality::Major | Quality::Minor | Quality::Dominant) {
            continue;
        }
        let name = &automaton.state(to).name;
        if !(name.starts_with("Tonic")
            || name.starts_with("Subdominant")
            || name.starts_with("Dominant"))
        {
            continue;
        }
        let neighbor = automaton.state_with_name_and_transition(
            &format!("Neighbor of {sym}"),
            to,
            false,
            false,
        );
        automaton.add_transition(sym, neighbor, to, 0.0);

        let pre = automaton.state_with_name_and_transition(
            &format!("Pre-neighbor of {sym}"),
            neighbor,
            true,
            false,
        );
        automaton.add_transition(sym, from, pre, 0.0);
        for step in [1, 11] {
            for q in [
                Quality::Major,
                Quality::Minor,
                Quality::Dominant,
                Quality::HalfDiminished,
                Quality::Diminished,
            ] {
                automaton.add_transition(sym.transposed(step).with_quality(q), pre, neighbor, 0.0);
            }
        }
    }
}

/// Pass 10: diatonic passing motion. Stepwise diatonic runs (and their
/// retrogrades) may carry a progression into a primitive arrival.
fn diatonic_passing(automaton: &mut Automaton) {
    let mut runs: Vec<(Symbol, Symbol, Symbol, Function)> = Vec::new();
    for &(steps, forward, backward) in &PASSING_RUNS {
        let [a, b, c] = steps.map(|(interval, q)| Symbol::from_interval(interval, q));
        runs.push((a, b, c, forward));
        runs.push((c, b, a, backward));
    }

    let existing = snapshot(automaton);
    for (first, second, third, function) in runs {
        for &(from, to, sym) in &existing {
            if sym != third || !automaton.state(to).name.starts_with(function.label()) {
                continue;
            }
            let passing = automaton.state_with_name_and_transition(
                &format!("Passing to {third}"),
                to,
                false,
                false,
            );
            automaton.add_transition(third, passing, to, 0.0);

            let pre = automaton.state_with_name_and_transition(
                &format!("Pre-passing to {third}"),
                passing,
                true,
                false,
            );
            automaton.add_transition(second, pre, passing, 0.0);
            automaton.add_transition(first, from, pre, 0.0);
        }
    }
}
