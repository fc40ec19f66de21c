//! Mehegan symbols: roman-numeral chord functions relative to a key.
//!
//! A symbol is a scale degree (with optional flat/sharp alteration) plus a
//! seventh-chord quality, e.g. `IIm`, `Vx`, `bIIIM`. Two symbols are equal
//! when their half-step interval from the tonic and their quality match —
//! the numeral spelling is display only, so `bVx` and `#IVx` are the same
//! symbol.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chord::{Chord, ChordKind, IntervalClass, Pitch, DIATONIC_SEMITONES};
use crate::error::Error;

const ROMAN_NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// Canonical (degree, alteration) spelling for each half-step interval,
/// flat-wise: bII, bIII, bV, bVI, bVII.
const CANONICAL_SPELLINGS: [(u8, i8); 12] = [
    (0, 0),  // I
    (1, -1), // bII
    (1, 0),  // II
    (2, -1), // bIII
    (2, 0),  // III
    (3, 0),  // IV
    (4, -1), // bV
    (4, 0),  // V
    (5, -1), // bVI
    (5, 0),  // VI
    (6, -1), // bVII
    (6, 0),  // VII
];

// ─── Quality ─────────────────────────────────────────────────────────

/// The closed set of seventh-chord qualities a symbol can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    /// `M` — major seventh
    Major,
    /// `m` — minor seventh
    Minor,
    /// `x` — dominant seventh
    Dominant,
    /// `o` — diminished seventh
    Diminished,
    /// `ø` — half-diminished seventh
    HalfDiminished,
    /// `s` — suspended
    Suspended,
}

impl Quality {
    /// Single-character code used in Mehegan strings and dumps.
    /// Case-sensitive: `M` and `m` are different qualities.
    pub fn code(self) -> char {
        match self {
            Quality::Major => 'M',
            Quality::Minor => 'm',
            Quality::Dominant => 'x',
            Quality::Diminished => 'o',
            Quality::HalfDiminished => 'ø',
            Quality::Suspended => 's',
        }
    }

    pub fn from_code(c: char) -> Result<Quality, Error> {
        match c {
            'M' => Ok(Quality::Major),
            'm' => Ok(Quality::Minor),
            'x' => Ok(Quality::Dominant),
            'o' => Ok(Quality::Diminished),
            'ø' => Ok(Quality::HalfDiminished),
            's' => Ok(Quality::Suspended),
            other => Err(Error::InvalidQuality(other)),
        }
    }

    /// The canonical seventh chord each quality maps back to.
    pub fn chord_kind(self) -> ChordKind {
        match self {
            Quality::Major => ChordKind::MajorSeventh,
            Quality::Minor => ChordKind::MinorSeventh,
            Quality::Dominant => ChordKind::Dominant7,
            Quality::Diminished => ChordKind::DiminishedSeventh,
            Quality::HalfDiminished => ChordKind::HalfDiminished,
            Quality::Suspended => ChordKind::DominantSus4,
        }
    }
}

impl Serialize for Quality {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for Quality {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Quality::from_code(c).map_err(serde::de::Error::custom),
            _ => Err(serde::de::Error::custom(format!("invalid quality '{s}'"))),
        }
    }
}

// ─── Symbol ──────────────────────────────────────────────────────────

/// A Mehegan symbol. Immutable; derived symbols (`transposed`,
/// `with_quality`) are new values.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Symbol {
    /// Scale degree index: 0 = I .. 6 = VII
    degree: u8,
    /// Numeral alteration: -1 = flat, 1 = sharp
    alteration: i8,
    quality: Quality,
}

impl Symbol {
    /// Build from a numeral string ("I", "bIII", "#iv") and a quality.
    pub fn new(numeral: &str, quality: Quality) -> Result<Symbol, Error> {
        let (degree, alteration) = parse_numeral(numeral)
            .ok_or_else(|| Error::InvalidSymbolSyntax(numeral.to_string()))?;
        Ok(Symbol {
            degree,
            alteration,
            quality,
        })
    }

    /// Parse a full Mehegan string like "ii", "Vx", "bIIIM", "#ivø".
    /// The numeral is case-insensitive; the quality letter is
    /// case-sensitive. An omitted quality falls back to the numeral's
    /// default: I,IV -> M; II,III,VI -> m; V -> x; VII -> ø.
    pub fn from_mehegan(s: &str) -> Result<Symbol, Error> {
        let (numeral_part, quality) = split_quality(s);
        let (degree, alteration) = parse_numeral(numeral_part)
            .ok_or_else(|| Error::InvalidSymbolSyntax(s.to_string()))?;
        let quality = match quality {
            Some(q) => q,
            None => default_quality(degree),
        };
        Ok(Symbol {
            degree,
            alteration,
            quality,
        })
    }

    /// Build at an absolute half-step interval from the tonic using the
    /// canonical flat-wise spelling (1 -> bII, 6 -> bV, ...).
    pub fn from_interval(half_steps: u8, quality: Quality) -> Symbol {
        let (degree, alteration) = CANONICAL_SPELLINGS[(half_steps % 12) as usize];
        Symbol {
            degree,
            alteration,
            quality,
        }
    }

    /// Classify a chord relative to a key. The numeral comes from the
    /// diatonic interval from `key` to the chord root (retrying enharmonic
    /// respellings when the direct spelling has no nameable interval);
    /// the quality comes from the chord's interval content.
    pub fn from_chord(key: &Pitch, chord: &Chord) -> Result<Symbol, Error> {
        let (mut degree, half_steps) = interval_with_respelling(key, &chord.root)?;

        // Doubly-flat numerals collapse onto the next numeral down:
        // a diminished third from C is spelled II, not bbIII.
        let mut alteration =
            wrapped_offset(half_steps, DIATONIC_SEMITONES[degree as usize]);
        if alteration == -2 {
            degree = (degree + 6) % 7;
            alteration = wrapped_offset(half_steps, DIATONIC_SEMITONES[degree as usize]);
        }
        if !(-1..=1).contains(&alteration) {
            return Err(Error::NoSuchInterval(
                key.to_string(),
                chord.root.to_string(),
            ));
        }

        let quality = classify_quality(chord)?;
        Ok(Symbol {
            degree,
            alteration: alteration as i8,
            quality,
        })
    }

    /// Realize the symbol as a chord in the given key. The chord root
    /// letter follows the numeral spelling (bIII of C is Eb, not D#).
    pub fn to_chord(&self, key: &Pitch) -> Result<Chord, Error> {
        let letter = (key.letter + self.degree) % 7;
        let target_pc = (key.pc() + self.interval()) % 12;
        let natural = Pitch::new(letter, 0).pc();
        let accidental = (target_pc as i16 - natural as i16 + 18).rem_euclid(12) - 6;
        if accidental.abs() > 2 {
            return Err(Error::NoSuchInterval(key.to_string(), self.to_string()));
        }
        let root = Pitch::new(letter, accidental as i8);
        Ok(Chord::new(root, self.quality.chord_kind()))
    }

    /// Half-step interval from the tonic, 0-11. Always derived from the
    /// numeral, never stored independently.
    pub fn interval(&self) -> u8 {
        (DIATONIC_SEMITONES[self.degree as usize] as i16 + self.alteration as i16)
            .rem_euclid(12) as u8
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// The numeral spelling without the quality letter ("bIII").
    pub fn numeral(&self) -> String {
        let prefix = match self.alteration {
            -1 => "b",
            1 => "#",
            _ => "",
        };
        format!("{}{}", prefix, ROMAN_NUMERALS[self.degree as usize])
    }

    /// Transpose by a signed number of half-steps, renormalizing to the
    /// canonical spelling. Quality is unchanged.
    pub fn transposed(&self, half_steps: i16) -> Symbol {
        let interval = (self.interval() as i16 + half_steps).rem_euclid(12) as u8;
        Symbol::from_interval(interval, self.quality)
    }

    /// Same numeral, different quality.
    pub fn with_quality(&self, quality: Quality) -> Symbol {
        Symbol { quality, ..*self }
    }
}

/// Equality is by (interval, quality) only — `bVx` equals `#IVx`.
impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.interval() == other.interval() && self.quality == other.quality
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.interval().hash(state);
        self.quality.hash(state);
    }
}

impl fmt::Display for Symbol {
    /// Full display form: numeral plus quality code ("IVM", "bVIIx").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.numeral(), self.quality.code())
    }
}

impl FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Symbol::from_mehegan(s)
    }
}

// ─── Parsing & classification helpers ────────────────────────────────

/// Split a trailing quality code off a Mehegan string, if present.
/// Only `i`/`v` letters (either case) can belong to the numeral, so a
/// trailing `x` is always a quality.
fn split_quality(s: &str) -> (&str, Option<Quality>) {
    if let Some(last) = s.chars().next_back() {
        if let Ok(q) = Quality::from_code(last) {
            // Roman numerals never end the string with a quality letter
            // that is also a numeral letter, except nothing: M,x,o,ø,s are
            // unambiguous; 'm' is too (numerals use only i/v).
            return (&s[..s.len() - last.len_utf8()], Some(q));
        }
    }
    (s, None)
}

fn parse_numeral(s: &str) -> Option<(u8, i8)> {
    let (alteration, rest) = match s.chars().next()? {
        'b' => (-1i8, &s[1..]),
        '#' => (1i8, &s[1..]),
        _ => (0i8, s),
    };
    if rest.is_empty() || !rest.chars().all(|c| matches!(c, 'i' | 'I' | 'v' | 'V')) {
        return None;
    }
    let upper = rest.to_ascii_uppercase();
    let degree = ROMAN_NUMERALS.iter().position(|&r| r == upper)? as u8;
    Some((degree, alteration))
}

fn default_quality(degree: u8) -> Quality {
    match degree {
        0 | 3 => Quality::Major,         // I, IV
        4 => Quality::Dominant,          // V
        6 => Quality::HalfDiminished,    // VII
        _ => Quality::Minor,             // II, III, VI
    }
}

/// Signed offset of `half_steps` from a canonical interval, wrapped to
/// -6..=5.
fn wrapped_offset(half_steps: u8, canonical: u8) -> i16 {
    (half_steps as i16 - canonical as i16 + 18).rem_euclid(12) - 6
}

/// Interval from key to chord root, retrying accidental-toggled spellings
/// of the root (then the key) when the direct spelling is unnameable.
fn interval_with_respelling(key: &Pitch, root: &Pitch) -> Result<(u8, u8), Error> {
    let keys = [Some(*key), key.enharmonic()];
    let roots = [Some(*root), root.enharmonic()];
    let mut last_err = None;
    for k in keys.iter().flatten() {
        for r in roots.iter().flatten() {
            match k.interval_to(r) {
                Ok(pair) => return Ok(pair),
                Err(e) => last_err = Some(e),
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        Error::NoSuchInterval(key.to_string(), root.to_string())
    }))
}

/// Map a chord's interval content onto the closed quality set.
fn classify_quality(chord: &Chord) -> Result<Quality, Error> {
    use IntervalClass::*;

    if chord.has(MajorThird) {
        return Ok(if chord.has(MinorSeventh) {
            Quality::Dominant
        } else {
            Quality::Major
        });
    }
    if chord.has(MinorThird) {
        if chord.has(DiminishedFifth) {
            if chord.has(MinorSeventh) {
                return Ok(Quality::HalfDiminished);
            }
            if !chord.has(MajorSeventh) {
                return Ok(Quality::Diminished);
            }
        }
        return Ok(Quality::Minor);
    }
    if chord.has(PerfectFourth) {
        return Ok(Quality::Suspended);
    }
    Err(Error::UnclassifiableChord(chord.to_string()))
}
