//! Symbol tests — Mehegan parsing, chord classification, and the
//! spelling-independent equality rule.

use jazzlib::{Chord, Error, Pitch, Quality, Symbol};
use pretty_assertions::assert_eq;

fn sym(s: &str) -> Symbol {
    Symbol::from_mehegan(s).expect(s)
}

fn chord(s: &str) -> Chord {
    s.parse().expect(s)
}

fn key(s: &str) -> Pitch {
    s.parse().expect(s)
}

#[test]
fn parse_with_default_qualities() {
    assert_eq!(sym("I"), sym("IM"));
    assert_eq!(sym("IV"), sym("IVM"));
    assert_eq!(sym("ii"), sym("IIm"));
    assert_eq!(sym("iii"), sym("IIIm"));
    assert_eq!(sym("vi"), sym("VIm"));
    assert_eq!(sym("V"), sym("Vx"));
    assert_eq!(sym("VII"), sym("VIIø"));
}

#[test]
fn numeral_case_is_free_but_quality_case_is_not() {
    assert_eq!(sym("biiim"), sym("bIIIm"));
    assert_eq!(sym("biiiM"), sym("bIIIM"));
    // M = major seventh, m = minor seventh
    assert_ne!(sym("bIIIM"), sym("bIIIm"));
}

#[test]
fn display_round_trips() {
    for s in ["IM", "IIm", "bIIIM", "#Io", "Vx", "bVIIx", "IVs", "VIIø"] {
        assert_eq!(sym(s).to_string(), s);
        assert_eq!(sym(&sym(s).to_string()), sym(s));
    }
}

#[test]
fn rejects_malformed_symbols() {
    assert!(Symbol::from_mehegan("").is_err());
    assert!(Symbol::from_mehegan("H").is_err());
    assert!(Symbol::from_mehegan("IIII").is_err());
    assert!(Symbol::from_mehegan("bVIII").is_err());
    assert!(Symbol::from_mehegan("b").is_err());
    assert!(Symbol::from_mehegan("#x").is_err());
}

#[test]
fn equality_is_by_interval_not_spelling() {
    assert_eq!(sym("bVx"), sym("#IVx"));
    assert_eq!(sym("bIIm"), sym("#Im"));
    // Same interval, different quality: distinct
    assert_ne!(sym("bVx"), sym("#IVo"));

    use std::collections::HashSet;
    let mut set = HashSet::new();
    set.insert(sym("bVx"));
    assert!(set.contains(&sym("#IVx")));
}

#[test]
fn from_interval_prefers_flat_spellings() {
    assert_eq!(Symbol::from_interval(1, Quality::Dominant).numeral(), "bII");
    assert_eq!(Symbol::from_interval(3, Quality::Major).numeral(), "bIII");
    assert_eq!(Symbol::from_interval(6, Quality::Dominant).numeral(), "bV");
    assert_eq!(Symbol::from_interval(8, Quality::Major).numeral(), "bVI");
    assert_eq!(Symbol::from_interval(10, Quality::Dominant).numeral(), "bVII");
    assert_eq!(Symbol::from_interval(7, Quality::Dominant).numeral(), "V");
    // Intervals wrap
    assert_eq!(Symbol::from_interval(12, Quality::Major), sym("IM"));
}

#[test]
fn transposition_renormalizes_spelling() {
    assert_eq!(sym("ii").transposed(2), sym("iii"));
    assert_eq!(sym("ii").transposed(-1), sym("bIIm"));
    assert_eq!(sym("I").transposed(-1).numeral(), "VII");
    assert_eq!(sym("V").transposed(12), sym("V"));
    assert_eq!(sym("bVIIx").transposed(2), sym("Ix"));
}

#[test]
fn classifies_diatonic_chords_in_c() {
    let c = key("C");
    let cases = [
        ("Cmaj7", "IM"),
        ("Dm7", "IIm"),
        ("Em7", "IIIm"),
        ("Fmaj7", "IVM"),
        ("G7", "Vx"),
        ("Am7", "VIm"),
        ("Bm7b5", "VIIø"),
    ];
    for (chord_str, expected) in cases {
        let got = Symbol::from_chord(&c, &chord(chord_str)).expect(chord_str);
        assert_eq!(got, sym(expected), "{chord_str}");
    }
}

#[test]
fn classifies_qualities_by_interval_content() {
    let c = key("C");
    // Triads classify like their seventh-chord family
    assert_eq!(Symbol::from_chord(&c, &chord("C")).unwrap(), sym("IM"));
    assert_eq!(Symbol::from_chord(&c, &chord("Cm")).unwrap(), sym("Im"));
    assert_eq!(Symbol::from_chord(&c, &chord("Cdim")).unwrap(), sym("Io"));
    assert_eq!(Symbol::from_chord(&c, &chord("Cdim7")).unwrap(), sym("Io"));
    assert_eq!(Symbol::from_chord(&c, &chord("Cm7b5")).unwrap(), sym("Iø"));
    assert_eq!(Symbol::from_chord(&c, &chord("C7sus4")).unwrap(), sym("Is"));
    assert_eq!(Symbol::from_chord(&c, &chord("Csus4")).unwrap(), sym("Is"));
    // Augmented carries a major third and no minor seventh
    assert_eq!(Symbol::from_chord(&c, &chord("Caug")).unwrap(), sym("IM"));
}

#[test]
fn classifies_altered_roots() {
    let c = key("C");
    assert_eq!(Symbol::from_chord(&c, &chord("Eb7")).unwrap(), sym("bIIIx"));
    assert_eq!(Symbol::from_chord(&c, &chord("Db7")).unwrap(), sym("bIIx"));
    assert_eq!(Symbol::from_chord(&c, &chord("F#7")).unwrap(), sym("#IVx"));
    assert_eq!(Symbol::from_chord(&c, &chord("Gb7")).unwrap(), sym("bVx"));
    // bVx and #IVx are the same symbol, whatever the chord spelling
    assert_eq!(
        Symbol::from_chord(&c, &chord("F#7")).unwrap(),
        Symbol::from_chord(&c, &chord("Gb7")).unwrap()
    );
}

#[test]
fn classification_retries_enharmonic_respellings() {
    // G#m7 against Ab: the direct spelling names an augmented unison
    // family interval and still resolves to the tonic minor
    let ab = key("Ab");
    assert_eq!(Symbol::from_chord(&ab, &chord("G#m7")).unwrap(), sym("Im"));
    // C#7 against Db
    let db = key("Db");
    assert_eq!(Symbol::from_chord(&db, &chord("C#7")).unwrap(), sym("Ix"));
}

#[test]
fn interval_naming_can_fail() {
    let c = key("C");
    let weird: Pitch = "F##".parse().unwrap();
    assert!(matches!(
        c.interval_to(&weird),
        Err(Error::NoSuchInterval(_, _))
    ));
    // The enharmonic respelling (G) rescues classification
    assert_eq!(
        Symbol::from_chord(&c, &Chord::new(weird, jazzlib::ChordKind::Dominant7)).unwrap(),
        sym("Vx")
    );
}

#[test]
fn realizes_symbols_as_chords() {
    let c = key("C");
    assert_eq!(sym("IIm").to_chord(&c).unwrap().to_string(), "Dm7");
    assert_eq!(sym("bIIIM").to_chord(&c).unwrap().to_string(), "Ebmaj7");
    assert_eq!(sym("bVx").to_chord(&c).unwrap().to_string(), "Gb7");
    assert_eq!(sym("VIIø").to_chord(&c).unwrap().to_string(), "Bm7b5");
    assert_eq!(sym("Io").to_chord(&c).unwrap().to_string(), "Cdim7");

    let bb = key("Bb");
    assert_eq!(sym("Vs").to_chord(&bb).unwrap().to_string(), "F7sus4");
    assert_eq!(sym("ii").to_chord(&bb).unwrap().to_string(), "Cm7");
}

#[test]
fn chord_and_symbol_round_trip() {
    let keys = ["C", "F", "Bb", "Eb", "A", "E"];
    let symbols = ["IM", "IIm", "bIIIx", "IVM", "bVx", "Vx", "VIm", "bVIIx", "VIIø"];
    for k in keys {
        let k = key(k);
        for s in symbols {
            let s = sym(s);
            let realized = s.to_chord(&k).unwrap();
            let back = Symbol::from_chord(&k, &realized).unwrap();
            assert_eq!(back, s, "key {k}");
        }
    }
}

#[test]
fn slash_chords_classify_by_root() {
    let c = key("C");
    let g7_over_b = chord("G7/B");
    assert_eq!(Symbol::from_chord(&c, &g7_over_b).unwrap(), sym("Vx"));
}

#[test]
fn invalid_quality_characters_are_rejected() {
    assert!(matches!(Quality::from_code('q'), Err(Error::InvalidQuality('q'))));
    assert!(matches!(Quality::from_code('X'), Err(Error::InvalidQuality('X'))));
    assert_eq!(Quality::from_code('ø').unwrap(), Quality::HalfDiminished);
}
