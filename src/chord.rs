//! Pitch and chord values — the narrow musical surface the automaton
//! consumes. A `Pitch` is a spelled note letter plus accidentals (so Db and
//! C# are distinct spellings of the same pitch class), and a `Chord` is a
//! root, an optional bass, and a quality whose interval content drives
//! symbol classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Half-step offsets of the natural letters C D E F G A B.
const NATURAL_SEMITONES: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Half-step offsets of the diatonic scale degrees 1-7 (major scale).
pub(crate) const DIATONIC_SEMITONES: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

const LETTER_NAMES: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

// ─── Pitch ───────────────────────────────────────────────────────────

/// A spelled pitch class: letter (C..B) plus accidental offset
/// (-2 = double flat .. 2 = double sharp).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    /// Letter index: 0 = C, 1 = D, ... 6 = B
    pub letter: u8,
    /// Accidental: -1 = flat, 1 = sharp
    pub accidental: i8,
}

impl Pitch {
    pub fn new(letter: u8, accidental: i8) -> Self {
        Pitch {
            letter: letter % 7,
            accidental,
        }
    }

    /// Pitch class 0-11 (C = 0).
    pub fn pc(&self) -> u8 {
        let base = NATURAL_SEMITONES[self.letter as usize] as i16;
        (base + self.accidental as i16).rem_euclid(12) as u8
    }

    /// The diatonic interval from `self` up to `other`: returns
    /// (scale-degree index 0-6, half-steps 0-11). Fails when the letter
    /// distance and half-step distance don't combine into a nameable
    /// interval (e.g. C up to F##) — callers retry with an enharmonic
    /// respelling.
    pub fn interval_to(&self, other: &Pitch) -> Result<(u8, u8), Error> {
        let degree = (other.letter + 7 - self.letter) % 7;
        let half_steps = (other.pc() + 12 - self.pc()) % 12;
        let canonical = DIATONIC_SEMITONES[degree as usize] as i16;
        // Wrap the offset into -6..=5 so octave crossings compare correctly
        let offset = (half_steps as i16 - canonical + 18).rem_euclid(12) - 6;

        // Unison/fourth/fifth name dim..aug; the rest name dim..aug with a
        // doubly-altered low end (diminished = major - 2)
        let valid = if matches!(degree, 0 | 3 | 4) {
            (-1..=1).contains(&offset)
        } else {
            (-2..=1).contains(&offset)
        };
        if valid {
            Ok((degree, half_steps))
        } else {
            Err(Error::NoSuchInterval(self.to_string(), other.to_string()))
        }
    }

    /// The same pitch class respelled with the adjacent letter, if the
    /// current spelling carries an accidental (C# -> Db, Gb -> F#).
    /// Naturals have no simpler respelling and return None.
    pub fn enharmonic(&self) -> Option<Pitch> {
        if self.accidental == 0 {
            return None;
        }
        let letter = if self.accidental > 0 {
            (self.letter + 1) % 7
        } else {
            (self.letter + 6) % 7
        };
        let base = NATURAL_SEMITONES[letter as usize] as i16;
        let accidental = (self.pc() as i16 - base + 18).rem_euclid(12) - 6;
        if accidental.abs() > 2 {
            return None;
        }
        Some(Pitch::new(letter, accidental as i8))
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", LETTER_NAMES[self.letter as usize])?;
        for _ in 0..self.accidental.abs() {
            write!(f, "{}", if self.accidental < 0 { 'b' } else { '#' })?;
        }
        Ok(())
    }
}

impl FromStr for Pitch {
    type Err = Error;

    /// Parse "C", "Ab", "F#", "Bbb" etc.
    fn from_str(s: &str) -> Result<Self, Error> {
        let mut chars = s.chars();
        let letter_char = chars
            .next()
            .ok_or_else(|| Error::InvalidSymbolSyntax(s.to_string()))?;
        let letter = LETTER_NAMES
            .iter()
            .position(|&c| c == letter_char.to_ascii_uppercase())
            .ok_or_else(|| Error::InvalidSymbolSyntax(s.to_string()))? as u8;

        let mut accidental: i8 = 0;
        for c in chars {
            match c {
                'b' => accidental -= 1,
                '#' => accidental += 1,
                _ => return Err(Error::InvalidSymbolSyntax(s.to_string())),
            }
        }
        if accidental.abs() > 2 {
            return Err(Error::InvalidSymbolSyntax(s.to_string()));
        }
        Ok(Pitch::new(letter, accidental))
    }
}

// ─── Interval classes ────────────────────────────────────────────────

/// The named intervals whose presence or absence classifies a chord
/// quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalClass {
    MinorThird,
    MajorThird,
    PerfectFourth,
    DiminishedFifth,
    MinorSeventh,
    MajorSeventh,
}

impl IntervalClass {
    pub fn half_steps(self) -> u8 {
        match self {
            IntervalClass::MinorThird => 3,
            IntervalClass::MajorThird => 4,
            IntervalClass::PerfectFourth => 5,
            IntervalClass::DiminishedFifth => 6,
            IntervalClass::MinorSeventh => 10,
            IntervalClass::MajorSeventh => 11,
        }
    }
}

// ─── Chord kinds ─────────────────────────────────────────────────────

/// Supported chord qualities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordKind {
    Major,
    MajorSeventh,
    Minor,
    MinorSeventh,
    Dominant7,
    Diminished,
    DiminishedSeventh,
    HalfDiminished,
    Augmented,
    Sus4,
    DominantSus4,
}

impl ChordKind {
    /// Half-step intervals above the root, root included.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordKind::Major => &[0, 4, 7],
            ChordKind::MajorSeventh => &[0, 4, 7, 11],
            ChordKind::Minor => &[0, 3, 7],
            ChordKind::MinorSeventh => &[0, 3, 7, 10],
            ChordKind::Dominant7 => &[0, 4, 7, 10],
            ChordKind::Diminished => &[0, 3, 6],
            ChordKind::DiminishedSeventh => &[0, 3, 6, 9],
            ChordKind::HalfDiminished => &[0, 3, 6, 10],
            ChordKind::Augmented => &[0, 4, 8],
            ChordKind::Sus4 => &[0, 5, 7],
            ChordKind::DominantSus4 => &[0, 5, 7, 10],
        }
    }

    /// Display suffix ("maj7", "m7", "7sus4", ...).
    pub fn suffix(self) -> &'static str {
        match self {
            ChordKind::Major => "",
            ChordKind::MajorSeventh => "maj7",
            ChordKind::Minor => "m",
            ChordKind::MinorSeventh => "m7",
            ChordKind::Dominant7 => "7",
            ChordKind::Diminished => "dim",
            ChordKind::DiminishedSeventh => "dim7",
            ChordKind::HalfDiminished => "m7b5",
            ChordKind::Augmented => "aug",
            ChordKind::Sus4 => "sus4",
            ChordKind::DominantSus4 => "7sus4",
        }
    }

    fn parse_suffix(suffix: &str) -> Option<ChordKind> {
        match suffix {
            "" | "M" => Some(ChordKind::Major),
            "maj7" | "M7" => Some(ChordKind::MajorSeventh),
            "m" | "min" => Some(ChordKind::Minor),
            "m7" | "min7" => Some(ChordKind::MinorSeventh),
            "7" | "dom7" => Some(ChordKind::Dominant7),
            "dim" | "o" => Some(ChordKind::Diminished),
            "dim7" | "o7" => Some(ChordKind::DiminishedSeventh),
            "m7b5" | "ø" => Some(ChordKind::HalfDiminished),
            "aug" | "+" => Some(ChordKind::Augmented),
            "sus4" | "sus" => Some(ChordKind::Sus4),
            "7sus4" | "7sus" => Some(ChordKind::DominantSus4),
            _ => None,
        }
    }
}

// ─── Chord ───────────────────────────────────────────────────────────

/// A chord: root pitch, optional bass (slash chords), and quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub root: Pitch,
    pub bass: Option<Pitch>,
    pub kind: ChordKind,
}

impl Chord {
    pub fn new(root: Pitch, kind: ChordKind) -> Self {
        Chord {
            root,
            bass: None,
            kind,
        }
    }

    pub fn with_bass(mut self, bass: Pitch) -> Self {
        self.bass = Some(bass);
        self
    }

    /// Whether the chord contains the given interval above its root.
    pub fn has(&self, interval: IntervalClass) -> bool {
        self.kind.intervals().contains(&interval.half_steps())
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root, self.kind.suffix())?;
        if let Some(bass) = self.bass {
            write!(f, "/{bass}")?;
        }
        Ok(())
    }
}

impl FromStr for Chord {
    type Err = Error;

    /// Parse a chord symbol string like "Dm7", "Bbmaj7", "G7sus4" or
    /// "Db7/Ab".
    fn from_str(s: &str) -> Result<Self, Error> {
        let (main, bass) = match s.split_once('/') {
            Some((m, b)) => (m, Some(b.parse::<Pitch>()?)),
            None => (s, None),
        };

        // Root = leading letter plus accidentals; the rest is the suffix.
        let mut split = 1;
        let bytes = main.as_bytes();
        if split > main.len() || !bytes[0].is_ascii_alphabetic() {
            return Err(Error::InvalidSymbolSyntax(s.to_string()));
        }
        while split < main.len() && (bytes[split] == b'b' || bytes[split] == b'#') {
            // A 'b' may open a suffix too (e.g. the "b5" in "m7b5") but a
            // suffix never starts with it, so greedy accidental consumption
            // is safe here.
            split += 1;
        }
        let root: Pitch = main[..split].parse()?;
        let kind = ChordKind::parse_suffix(&main[split..])
            .ok_or_else(|| Error::InvalidSymbolSyntax(s.to_string()))?;

        let mut chord = Chord::new(root, kind);
        chord.bass = bass;
        Ok(chord)
    }
}
