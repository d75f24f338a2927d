//! Note identifiers
//!
//! A note is a letter name (with an optional sharp) plus an octave number,
//! e.g. `C4` or `F#5`.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Marker used in note names for a sharp
pub const SHARP: char = '#';

/// Default ASCII marker substituted for the sharp in sample file names
pub const DEFAULT_SAMPLE_SHARP_MARKER: char = 'b';

/// The twelve pitch classes of an octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Letter {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

/// White-key letters in keyboard order
pub const WHITE_LETTERS: [Letter; 7] = [
    Letter::C,
    Letter::D,
    Letter::E,
    Letter::F,
    Letter::G,
    Letter::A,
    Letter::B,
];

impl Letter {
    /// All pitch classes in ascending order
    pub const ALL: [Letter; 12] = [
        Letter::C,
        Letter::CSharp,
        Letter::D,
        Letter::DSharp,
        Letter::E,
        Letter::F,
        Letter::FSharp,
        Letter::G,
        Letter::GSharp,
        Letter::A,
        Letter::ASharp,
        Letter::B,
    ];

    /// Display name, e.g. `"C#"`
    pub fn name(self) -> &'static str {
        match self {
            Letter::C => "C",
            Letter::CSharp => "C#",
            Letter::D => "D",
            Letter::DSharp => "D#",
            Letter::E => "E",
            Letter::F => "F",
            Letter::FSharp => "F#",
            Letter::G => "G",
            Letter::GSharp => "G#",
            Letter::A => "A",
            Letter::ASharp => "A#",
            Letter::B => "B",
        }
    }

    /// Whether this letter is played on a black key
    pub fn is_sharp(self) -> bool {
        matches!(
            self,
            Letter::CSharp | Letter::DSharp | Letter::FSharp | Letter::GSharp | Letter::ASharp
        )
    }

    /// The sharp one semitone above this letter, if a black key sits there.
    ///
    /// E and B have no sharp on a piano, and sharps have no sharp of their own.
    pub fn sharp(self) -> Option<Letter> {
        match self {
            Letter::C => Some(Letter::CSharp),
            Letter::D => Some(Letter::DSharp),
            Letter::F => Some(Letter::FSharp),
            Letter::G => Some(Letter::GSharp),
            Letter::A => Some(Letter::ASharp),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Letter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Letter::ALL
            .iter()
            .copied()
            .find(|l| l.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidNote(s.to_string()))
    }
}

/// A pitch: letter name plus octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note {
    pub octave: i8,
    pub letter: Letter,
}

impl Note {
    pub fn new(letter: Letter, octave: i8) -> Self {
        Self { octave, letter }
    }

    /// File stem of the sample for this note, with the sharp replaced by `marker`.
    ///
    /// `C#4` with marker `b` becomes `Cb4`.
    pub fn sample_stem(&self, marker: char) -> String {
        self.to_string().replace(SHARP, &marker.to_string())
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.octave)
    }
}

impl FromStr for Note {
    type Err = Error;

    /// Parse names like `C4`, `f#5` or `A-1`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| c == '-' || c.is_ascii_digit())
            .ok_or_else(|| Error::InvalidNote(s.to_string()))?;
        let (letter, octave) = s.split_at(split);
        let letter: Letter = letter.parse().map_err(|_| Error::InvalidNote(s.to_string()))?;
        let octave: i8 = octave.parse().map_err(|_| Error::InvalidNote(s.to_string()))?;
        Ok(Note::new(letter, octave))
    }
}
