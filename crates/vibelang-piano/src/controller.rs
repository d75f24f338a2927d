//! Input/state controller
//!
//! Owns the key records, turns pointer and keyboard events into key presses
//! and releases, and triggers sample playback for every press.
//!
//! Releasing is coarse: any pointer-up or key-up releases every key, so a
//! chord held on the computer keyboard lets go as soon as one of its keys is
//! released.

use crate::audio::{SampleLibrary, SamplePlayer};
use crate::error::Result;
use crate::keymap::InputMap;
use crate::layout::{compute_layout_with, Key, LayoutSettings, Point, DEFAULT_OCTAVES};
use crate::note::Note;
use std::time::{Duration, Instant};

/// Default auto-release timeout in milliseconds
/// Must be longer than the OS key repeat delay (typically 300-500ms)
pub const DEFAULT_KEY_RELEASE_MS: u64 = 400;

/// Everything the controller needs besides the display size
#[derive(Debug, Clone)]
pub struct PianoConfig {
    /// Octaves to lay out, lowest first
    pub octaves: Vec<i8>,
    /// Margins around the keys
    pub layout: LayoutSettings,
    /// Computer key -> note mapping
    pub input_map: InputMap,
    /// Where samples live
    pub samples: SampleLibrary,
    /// Release keyboard-pressed keys after this long without a key-down
    pub key_release_timeout: Duration,
}

impl Default for PianoConfig {
    fn default() -> Self {
        Self {
            octaves: DEFAULT_OCTAVES.to_vec(),
            layout: LayoutSettings::default(),
            input_map: InputMap::default(),
            samples: SampleLibrary::default(),
            key_release_timeout: Duration::from_millis(DEFAULT_KEY_RELEASE_MS),
        }
    }
}

/// Input events the controller understands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Primary pointer button pressed at a position
    PointerDown { point: Point },
    /// Primary pointer button released
    PointerUp,
    /// Computer key pressed, with the Shift state at the time
    KeyDown { key: char, shift: bool },
    /// Computer key released
    KeyUp { key: char },
    /// Display region changed size
    Resize { width: u32, height: u32 },
    /// Application should exit
    Quit,
}

/// What the event loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Keyboard state plus the audio collaborator
pub struct KeyboardController {
    config: PianoConfig,
    keys: Vec<Key>,
    player: Box<dyn SamplePlayer>,
    /// Last key-down that pressed a key, for auto-release
    last_key_down: Option<Instant>,
}

impl KeyboardController {
    /// Lay out the keyboard for a `width` x `height` region
    pub fn new(
        config: PianoConfig,
        player: Box<dyn SamplePlayer>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let keys = compute_layout_with(&config.layout, width, height, &config.octaves)?;
        Ok(Self {
            config,
            keys,
            player,
            last_key_down: None,
        })
    }

    /// Dispatch a single input event
    pub fn handle(&mut self, event: InputEvent) -> Flow {
        match event {
            InputEvent::PointerDown { point } => {
                self.on_pointer_down(point);
            }
            InputEvent::PointerUp => self.on_pointer_up(),
            InputEvent::KeyDown { key, shift } => {
                self.on_key_down(key, shift);
            }
            InputEvent::KeyUp { key } => self.on_key_up(key),
            InputEvent::Resize { width, height } => {
                if let Err(e) = self.resize(width, height) {
                    log::warn!("Keeping previous layout: {}", e);
                }
            }
            InputEvent::Quit => {
                self.release_all();
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Press the key under the pointer.
    ///
    /// Black keys are tested first since they cover the upper part of their
    /// white neighbours. At most one key is pressed.
    pub fn on_pointer_down(&mut self, point: Point) -> Option<Note> {
        let index = self
            .keys
            .iter()
            .position(|k| k.is_black && k.contains(point))
            .or_else(|| self.keys.iter().position(|k| !k.is_black && k.contains(point)))?;
        Some(self.press(index))
    }

    /// Release every key
    pub fn on_pointer_up(&mut self) {
        self.clear_pressed();
    }

    /// Press the key mapped to a computer key
    /// Returns the note if a key was pressed
    pub fn on_key_down(&mut self, key: char, shift: bool) -> Option<Note> {
        let note = self.config.input_map.resolve(key, shift)?;
        let index = self.keys.iter().position(|k| k.note == note)?;
        self.last_key_down = Some(Instant::now());
        Some(self.press(index))
    }

    /// Release every key, whichever computer key went up
    pub fn on_key_up(&mut self, _key: char) {
        self.clear_pressed();
        self.last_key_down = None;
    }

    /// Play the sample for `note`.
    ///
    /// Missing samples and playback failures are logged and swallowed.
    /// Returns whether playback was started.
    pub fn play_trigger(&self, note: &Note) -> bool {
        let path = match self.config.samples.locate(note) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{}", e);
                return false;
            }
        };
        match self.player.play(&path) {
            Ok(()) => {
                log::debug!("Playing {} from {}", note, path.display());
                true
            }
            Err(e) => {
                log::warn!("Failed to play {}: {}", note, e);
                false
            }
        }
    }

    /// Recompute the layout for a new region size.
    ///
    /// On error the current layout stays in place. A new layout starts with
    /// every key released.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.keys = compute_layout_with(&self.config.layout, width, height, &self.config.octaves)?;
        self.last_key_down = None;
        Ok(())
    }

    /// Release all pressed keys
    /// Returns the notes that were pressed
    pub fn release_all(&mut self) -> Vec<Note> {
        let released = self.pressed_notes();
        self.clear_pressed();
        self.last_key_down = None;
        released
    }

    /// Release keys pressed from the keyboard once no key-down has arrived
    /// for the release timeout. For terminals that never report key-up.
    /// Returns true if keys were released.
    pub fn expire_key_presses(&mut self, now: Instant) -> bool {
        match self.last_key_down {
            Some(pressed_at)
                if now.saturating_duration_since(pressed_at) > self.config.key_release_timeout =>
            {
                self.on_key_up('\0');
                true
            }
            _ => false,
        }
    }

    /// All keys, whites first, then blacks
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn white_keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter().filter(|k| !k.is_black)
    }

    pub fn black_keys(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter().filter(|k| k.is_black)
    }

    pub fn key_for_note(&self, note: Note) -> Option<&Key> {
        self.keys.iter().find(|k| k.note == note)
    }

    /// Currently pressed notes, lowest first
    pub fn pressed_notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.keys.iter().filter(|k| k.is_pressed).map(|k| k.note).collect();
        notes.sort();
        notes
    }

    pub fn is_note_pressed(&self, note: Note) -> bool {
        self.key_for_note(note).is_some_and(|k| k.is_pressed)
    }

    pub fn input_map(&self) -> &InputMap {
        &self.config.input_map
    }

    pub fn player_name(&self) -> &str {
        self.player.name()
    }

    fn press(&mut self, index: usize) -> Note {
        let key = &mut self.keys[index];
        key.is_pressed = true;
        let note = key.note;
        self.play_trigger(&note);
        note
    }

    fn clear_pressed(&mut self) {
        for key in &mut self.keys {
            key.is_pressed = false;
        }
    }
}
