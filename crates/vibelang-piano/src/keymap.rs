//! Computer keyboard to note mapping
//!
//! Maps typed characters to note letters. Most keys play in the lower
//! octave and move up one octave while Shift is held; a key may instead be
//! pinned to a fixed octave.
//!
//! ```text
//!     W   E       T   Y   U          (black keys)
//!     C#  D#      F#  G#  A#
//!   A   S   D   F   G   H   J   K    (white keys)
//!   C   D   E   F   G   A   B   C5
//! ```

use crate::layout::DEFAULT_OCTAVES;
use crate::note::{Letter, Note};

/// How a binding chooses its octave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OctaveMode {
    /// Lower octave, or upper octave while Shift is held
    Shiftable,
    /// Always this octave
    Fixed(i8),
}

/// A key binding entry: computer key character -> note letter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    /// The character representing this key (lowercase)
    pub key_char: char,
    /// The character to display (for rendering, usually uppercase)
    pub display_char: char,
    /// Note letter played by this key
    pub letter: Letter,
    /// Octave selection
    pub octave: OctaveMode,
}

impl KeyBinding {
    pub fn shiftable(key_char: char, letter: Letter) -> Self {
        Self {
            key_char,
            display_char: key_char.to_ascii_uppercase(),
            letter,
            octave: OctaveMode::Shiftable,
        }
    }

    pub fn fixed(key_char: char, letter: Letter, octave: i8) -> Self {
        Self {
            key_char,
            display_char: key_char.to_ascii_uppercase(),
            letter,
            octave: OctaveMode::Fixed(octave),
        }
    }
}

/// Immutable lookup table from characters to notes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMap {
    bindings: Vec<KeyBinding>,
    lower_octave: i8,
    upper_octave: i8,
}

impl Default for InputMap {
    fn default() -> Self {
        Self::us_layout()
    }
}

impl InputMap {
    /// Build a map from explicit bindings
    pub fn new(bindings: Vec<KeyBinding>, lower_octave: i8, upper_octave: i8) -> Self {
        let bindings = bindings
            .into_iter()
            .map(|b| KeyBinding {
                key_char: b.key_char.to_ascii_lowercase(),
                ..b
            })
            .collect();
        Self {
            bindings,
            lower_octave,
            upper_octave,
        }
    }

    /// US QWERTY layout: home row plays white keys, the row above plays sharps
    pub fn us_layout() -> Self {
        let [lower, upper] = DEFAULT_OCTAVES;
        let bindings = vec![
            // White keys (home row)
            KeyBinding::shiftable('a', Letter::C),
            KeyBinding::shiftable('s', Letter::D),
            KeyBinding::shiftable('d', Letter::E),
            KeyBinding::shiftable('f', Letter::F),
            KeyBinding::shiftable('g', Letter::G),
            KeyBinding::shiftable('h', Letter::A),
            KeyBinding::shiftable('j', Letter::B),
            // Black keys (QWERTY row)
            KeyBinding::shiftable('w', Letter::CSharp),
            KeyBinding::shiftable('e', Letter::DSharp),
            KeyBinding::shiftable('t', Letter::FSharp),
            KeyBinding::shiftable('y', Letter::GSharp),
            KeyBinding::shiftable('u', Letter::ASharp),
            // Top C, reachable without Shift
            KeyBinding::fixed('k', Letter::C, upper),
        ];
        Self::new(bindings, lower, upper)
    }

    /// German QWERTZ layout
    ///
    /// Same physical keys as the US layout; the key in the US Y position
    /// types 'z' on a German keyboard.
    pub fn german_layout() -> Self {
        let mut map = Self::us_layout();
        if let Some(binding) = map.bindings.iter_mut().find(|b| b.key_char == 'y') {
            binding.key_char = 'z';
            binding.display_char = 'Z';
        }
        map
    }

    /// Use a different octave pair for shiftable keys
    pub fn with_octaves(mut self, lower_octave: i8, upper_octave: i8) -> Self {
        self.lower_octave = lower_octave;
        self.upper_octave = upper_octave;
        self
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// Get the binding for a given key character
    pub fn binding(&self, c: char) -> Option<&KeyBinding> {
        let c = c.to_ascii_lowercase();
        self.bindings.iter().find(|b| b.key_char == c)
    }

    /// Check if a character is part of the keyboard
    pub fn is_mapped(&self, c: char) -> bool {
        self.binding(c).is_some()
    }

    /// Resolve a key press to a note, taking the Shift state into account
    pub fn resolve(&self, c: char, shift: bool) -> Option<Note> {
        let binding = self.binding(c)?;
        let octave = match binding.octave {
            OctaveMode::Fixed(octave) => octave,
            OctaveMode::Shiftable if shift => self.upper_octave,
            OctaveMode::Shiftable => self.lower_octave,
        };
        Some(Note::new(binding.letter, octave))
    }

    /// Display character of the binding that plays `note` without Shift
    pub fn label_for(&self, note: Note) -> Option<char> {
        self.bindings
            .iter()
            .find(|b| self.resolve(b.key_char, false) == Some(note))
            .map(|b| b.display_char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_selects_upper_octave() {
        let map = InputMap::us_layout();
        assert_eq!(map.resolve('a', false), Some(Note::new(Letter::C, 4)));
        assert_eq!(map.resolve('a', true), Some(Note::new(Letter::C, 5)));
        assert_eq!(map.resolve('w', false), Some(Note::new(Letter::CSharp, 4)));
        assert_eq!(map.resolve('u', true), Some(Note::new(Letter::ASharp, 5)));
    }

    #[test]
    fn test_fixed_key_ignores_shift() {
        let map = InputMap::us_layout();
        assert_eq!(map.resolve('k', false), Some(Note::new(Letter::C, 5)));
        assert_eq!(map.resolve('k', true), Some(Note::new(Letter::C, 5)));
        assert_eq!(map.resolve('K', true), Some(Note::new(Letter::C, 5)));
    }

    #[test]
    fn test_case_insensitive() {
        let map = InputMap::us_layout();
        // Shift+A arrives as 'A' from most terminals
        assert_eq!(map.resolve('A', true), map.resolve('a', true));
        assert!(map.is_mapped('J'));
    }

    #[test]
    fn test_unmapped_keys() {
        let map = InputMap::us_layout();
        assert_eq!(map.resolve('q', false), None);
        assert_eq!(map.resolve('1', true), None);
        assert!(!map.is_mapped(' '));
    }

    #[test]
    fn test_german_layout() {
        let map = InputMap::german_layout();
        assert_eq!(map.resolve('z', false), Some(Note::new(Letter::GSharp, 4)));
        assert_eq!(map.resolve('y', false), None);
        assert_eq!(map.bindings().len(), InputMap::us_layout().bindings().len());
    }

    #[test]
    fn test_with_octaves() {
        let map = InputMap::us_layout().with_octaves(2, 3);
        assert_eq!(map.resolve('d', false), Some(Note::new(Letter::E, 2)));
        assert_eq!(map.resolve('d', true), Some(Note::new(Letter::E, 3)));
        // Fixed bindings keep their octave
        assert_eq!(map.resolve('k', false), Some(Note::new(Letter::C, 5)));
    }

    #[test]
    fn test_labels() {
        let map = InputMap::us_layout();
        assert_eq!(map.label_for(Note::new(Letter::C, 4)), Some('A'));
        assert_eq!(map.label_for(Note::new(Letter::C, 5)), Some('K'));
        assert_eq!(map.label_for(Note::new(Letter::D, 5)), None);
    }
}
