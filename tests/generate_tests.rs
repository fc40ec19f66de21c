//! Generation tests — random walks with seeded RNGs, sampling
//! distribution against trained weights, and the sequence views.

use jazzlib::{Automaton, Pitch, Symbol};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sym(s: &str) -> Symbol {
    Symbol::from_mehegan(s).expect(s)
}

fn syms(list: &[&str]) -> Vec<Symbol> {
    list.iter().map(|s| sym(s)).collect()
}

/// Same machine as in the automaton tests: two entry branches, one of
/// which carries 80% of the trained weight.
fn trained_toy() -> Automaton {
    let mut a = Automaton::new();
    let start1 = a.add_state("start1", true, false);
    let start2 = a.add_state("start2", true, false);
    let middle1 = a.add_state("middle1", false, false);
    let middle2 = a.add_state("middle2", false, false);
    let end1 = a.add_state("end1", false, true);
    let end2 = a.add_state("end2", false, true);

    a.add_transition(sym("I"), end1, start1, 0.0);
    a.add_transition(sym("I"), end2, start2, 0.0);
    a.add_transition(sym("IV"), start1, middle1, 0.0);
    a.add_transition(sym("V"), start1, middle2, 0.0);
    a.add_transition(sym("V"), start2, middle2, 0.0);
    a.add_transition(sym("V"), middle1, end1, 0.0);
    a.add_transition(sym("I"), middle1, end2, 0.0);
    a.add_transition(sym("I"), middle2, end1, 0.0);

    a.train(&[
        syms(&["I", "IV", "V"]),
        syms(&["I", "IV", "I"]),
        syms(&["I", "V", "I"]),
    ]);
    a
}

#[test]
fn generates_fixed_length_sequences() {
    let a = trained_toy();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let seq = a
            .generate_from_start_and_length_with(&sym("I"), 3, &mut rng)
            .expect("toy always has a 3-step walk");
        assert_eq!(seq.len(), 3);
        let symbols = seq.symbols(&a);
        assert_eq!(symbols[0], sym("I"));
        // The opening transition must land on a start state
        let states = seq.state_ids(&a);
        assert_eq!(states.len(), 4);
        assert!(a.state(states[1]).is_start);
    }
}

#[test]
fn generates_until_ending_symbol_on_end_state() {
    let a = trained_toy();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let seq = a
            .generate_from_start_and_end_with(&sym("I"), &sym("I"), &mut rng)
            .expect("toy can always close on I");
        let symbols = seq.symbols(&a);
        assert_eq!(*symbols.last().unwrap(), sym("I"));
        let states = seq.state_ids(&a);
        assert!(a.state(*states.last().unwrap()).is_end);
        // No earlier step may already satisfy the stop condition
        for i in 0..symbols.len() - 1 {
            let to = a.transition(seq.transitions[i]).to;
            assert!(!(symbols[i] == sym("I") && a.state(to).is_end));
        }
    }
}

#[test]
fn no_start_state_for_symbol_yields_none() {
    let a = trained_toy();
    let mut rng = StdRng::seed_from_u64(1);
    assert!(a
        .generate_from_start_and_length_with(&sym("IV"), 2, &mut rng)
        .is_none());
    assert!(a
        .generate_from_start_and_length_with(&sym("I"), 0, &mut rng)
        .is_none());
}

#[test]
fn dead_end_walks_yield_none() {
    let mut a = Automaton::new();
    let entry = a.add_state("entry", false, true);
    let only = a.add_state("only", true, false);
    a.add_transition(sym("I"), entry, only, 0.0);

    let mut rng = StdRng::seed_from_u64(3);
    assert!(a
        .generate_from_start_and_length_with(&sym("I"), 1, &mut rng)
        .is_some());
    assert!(a
        .generate_from_start_and_length_with(&sym("I"), 3, &mut rng)
        .is_none());
}

#[test]
fn untrained_automaton_generates_via_uniform_fallback() {
    let mut a = Automaton::new();
    let entry = a.add_state("entry", false, true);
    let start = a.add_state("start", true, false);
    let end = a.add_state("end", false, true);
    a.add_transition(sym("I"), entry, start, 0.0);
    a.add_transition(sym("V"), start, end, 0.0);

    let mut rng = StdRng::seed_from_u64(9);
    let seq = a
        .generate_from_start_and_length_with(&sym("I"), 2, &mut rng)
        .expect("untrained machine must still walk");
    assert_eq!(seq.symbols(&a), syms(&["I", "V"]));
}

#[test]
fn sampling_follows_trained_weights() {
    let a = trained_toy();
    let start1 = a.state_by_name("start1").unwrap();
    let mut rng = StdRng::seed_from_u64(20260826);

    let mut from_start1 = 0u32;
    let mut took_iv = 0u32;
    for _ in 0..4000 {
        let seq = a
            .generate_from_start_and_length_with(&sym("I"), 2, &mut rng)
            .expect("walk");
        let states = seq.state_ids(&a);
        if states[1] == start1 {
            from_start1 += 1;
            if seq.symbols(&a)[1] == sym("IV") {
                took_iv += 1;
            }
        }
    }
    // Initial pick is uniform (entry edges are unweighted), so roughly
    // half the walks pass through start1
    assert!(from_start1 > 1500, "start1 picked {from_start1} of 4000");
    // From start1, the IV branch carries probability 0.8
    let ratio = f64::from(took_iv) / f64::from(from_start1);
    assert!(
        (ratio - 0.8).abs() < 0.05,
        "IV branch ratio {ratio}, expected about 0.8"
    );
}

#[test]
fn sequence_views_resolve_against_the_automaton() {
    let mut a = Automaton::new();
    let entry = a.add_state("entry", false, true);
    let s = a.add_state("opening", true, false);
    let u = a.add_state("restatement", false, false);
    let end = a.add_state("close", false, true);
    a.add_transition(sym("ii"), entry, s, 0.0);
    a.add_transition(sym("ii"), s, u, 0.0);
    a.add_transition(sym("V"), u, end, 0.0);

    let mut rng = StdRng::seed_from_u64(5);
    let seq = a
        .generate_from_start_and_length_with(&sym("ii"), 3, &mut rng)
        .expect("single path");

    assert_eq!(seq.symbols(&a), syms(&["ii", "ii", "V"]));
    assert_eq!(seq.collapsed_symbols(&a), syms(&["ii", "V"]));
    assert_eq!(
        seq.state_names(&a),
        vec!["entry", "opening", "restatement", "close"]
    );

    let key: Pitch = "C".parse().unwrap();
    let chords: Vec<String> = seq
        .chords(&a, &key)
        .unwrap()
        .iter()
        .map(|c| c.to_string())
        .collect();
    assert_eq!(chords, vec!["Dm7", "G7"]);
}

#[test]
fn default_grammar_generates_valid_progressions() {
    let mut grammar = jazzlib::default_grammar();
    grammar.train(&[
        syms(&["ii", "V", "I"]),
        syms(&["I", "vi", "ii", "V", "I"]),
        syms(&["iii", "vi", "ii", "V", "I"]),
    ]);

    let mut rng = StdRng::seed_from_u64(11);
    let mut produced = 0;
    for _ in 0..20 {
        if let Some(seq) = grammar.generate_from_start_and_end_with(&sym("ii"), &sym("I"), &mut rng)
        {
            produced += 1;
            let symbols = seq.symbols(&grammar);
            assert_eq!(symbols[0], sym("ii"));
            assert_eq!(*symbols.last().unwrap(), sym("I"));
            assert!(
                grammar.validate(&symbols),
                "generated sequence must parse: {symbols:?}"
            );
        }
    }
    assert!(produced > 0, "at least some walks should close");
}