//! OS-level keyboard input using rdev
//!
//! This module provides reliable key press and release detection by
//! intercepting keyboard events at the OS level, bypassing terminal limitations.
//! Most terminals report neither key releases nor a bare Shift press.

use crate::config::KeyboardLayout;
use crossbeam_channel::{unbounded, Receiver, Sender};
use rdev::{listen, Event, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Keyboard events from the OS-level listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsKeyEvent {
    /// A key was pressed
    Press(char),
    /// A key was released
    Release(char),
    /// Either Shift key changed state (true = held)
    Shift(bool),
}

/// OS-level keyboard listener that captures key press and release events
pub struct OsKeyboardListener {
    /// Channel receiver for keyboard events
    event_rx: Receiver<OsKeyEvent>,
    /// Shutdown flag
    shutdown: Arc<AtomicBool>,
    /// Listener thread handle
    _thread: JoinHandle<()>,
}

impl OsKeyboardListener {
    /// Start the OS keyboard listener
    ///
    /// Returns None if the listener couldn't be started (e.g., on systems without X11)
    pub fn new(layout: KeyboardLayout) -> Option<Self> {
        // Check if we can listen for keyboard events on this system
        if !is_available() {
            return None;
        }

        let (tx, rx) = unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        // Spawn listener thread
        let thread = thread::spawn(move || {
            run_listener(tx, shutdown_clone, layout);
        });

        // Give the thread a moment to start
        thread::sleep(std::time::Duration::from_millis(100));

        Some(Self {
            event_rx: rx,
            shutdown,
            _thread: thread,
        })
    }

    /// Try to receive a keyboard event (non-blocking)
    pub fn try_recv(&self) -> Option<OsKeyEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl Drop for OsKeyboardListener {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Map an rdev Key to the character it types on the given layout
///
/// rdev reports physical key positions, not logical characters. Only keys
/// the piano can use are mapped.
pub fn key_to_char(key: Key, layout: KeyboardLayout) -> Option<char> {
    match layout {
        KeyboardLayout::German => key_to_char_german(key),
        KeyboardLayout::Us | KeyboardLayout::Custom => key_to_char_us(key),
    }
}

/// Map rdev Key to character using US QWERTY layout
pub fn key_to_char_us(key: Key) -> Option<char> {
    match key {
        // Home row
        Key::KeyA => Some('a'),
        Key::KeyS => Some('s'),
        Key::KeyD => Some('d'),
        Key::KeyF => Some('f'),
        Key::KeyG => Some('g'),
        Key::KeyH => Some('h'),
        Key::KeyJ => Some('j'),
        Key::KeyK => Some('k'),
        Key::KeyL => Some('l'),

        // QWERTY row
        Key::KeyQ => Some('q'),
        Key::KeyW => Some('w'),
        Key::KeyE => Some('e'),
        Key::KeyR => Some('r'),
        Key::KeyT => Some('t'),
        Key::KeyY => Some('y'),
        Key::KeyU => Some('u'),
        Key::KeyI => Some('i'),
        Key::KeyO => Some('o'),
        Key::KeyP => Some('p'),

        // Bottom row
        Key::KeyZ => Some('z'),
        Key::KeyX => Some('x'),
        Key::KeyC => Some('c'),
        Key::KeyV => Some('v'),
        Key::KeyB => Some('b'),
        Key::KeyN => Some('n'),
        Key::KeyM => Some('m'),
        Key::Comma => Some(','),
        Key::Dot => Some('.'),
        Key::Slash => Some('/'),
        Key::Minus => Some('-'),

        // Number row
        Key::Num1 => Some('1'),
        Key::Num2 => Some('2'),
        Key::Num3 => Some('3'),
        Key::Num4 => Some('4'),
        Key::Num5 => Some('5'),
        Key::Num6 => Some('6'),
        Key::Num7 => Some('7'),
        Key::Num8 => Some('8'),
        Key::Num9 => Some('9'),
        Key::Num0 => Some('0'),

        // Control keys
        Key::Escape => Some('\x1b'),
        Key::Space => Some(' '),

        _ => None,
    }
}

/// Map rdev Key to character using German QWERTZ layout
///
/// Same as US except that Y and Z trade places and '-' sits right of '.'
pub fn key_to_char_german(key: Key) -> Option<char> {
    match key {
        // KeyY = physical Y position on US = German Z key on QWERTZ row
        Key::KeyY => Some('z'),
        // KeyZ = physical Z position on US = German Y key on bottom row
        Key::KeyZ => Some('y'),
        // The '-' key on German keyboards is at the physical position of '/' on US keyboards
        Key::Slash => Some('-'),
        // 'ß' is not a piano key
        Key::Minus => None,
        other => key_to_char_us(other),
    }
}

/// Keys the listener can report
const REPORTED_KEYS: [Key; 42] = [
    Key::KeyA, Key::KeyB, Key::KeyC, Key::KeyD, Key::KeyE, Key::KeyF, Key::KeyG,
    Key::KeyH, Key::KeyI, Key::KeyJ, Key::KeyK, Key::KeyL, Key::KeyM, Key::KeyN,
    Key::KeyO, Key::KeyP, Key::KeyQ, Key::KeyR, Key::KeyS, Key::KeyT, Key::KeyU,
    Key::KeyV, Key::KeyW, Key::KeyX, Key::KeyY, Key::KeyZ,
    Key::Num0, Key::Num1, Key::Num2, Key::Num3, Key::Num4,
    Key::Num5, Key::Num6, Key::Num7, Key::Num8, Key::Num9,
    Key::Comma, Key::Dot, Key::Slash, Key::Minus, Key::Escape, Key::Space,
];

/// Physical key that types `c` on the given layout, if the listener reports it
///
/// Characters without one must be taken from terminal events instead.
pub fn key_for_char(c: char, layout: KeyboardLayout) -> Option<Key> {
    let c = c.to_ascii_lowercase();
    REPORTED_KEYS
        .into_iter()
        .find(|&key| key_to_char(key, layout) == Some(c))
}

fn is_shift(key: Key) -> bool {
    matches!(key, Key::ShiftLeft | Key::ShiftRight)
}

/// Run the rdev listener (blocking - runs in its own thread)
fn run_listener(tx: Sender<OsKeyEvent>, shutdown: Arc<AtomicBool>, layout: KeyboardLayout) {
    let callback = move |event: Event| {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        let message = match event.event_type {
            EventType::KeyPress(key) if is_shift(key) => Some(OsKeyEvent::Shift(true)),
            EventType::KeyRelease(key) if is_shift(key) => Some(OsKeyEvent::Shift(false)),
            EventType::KeyPress(key) => key_to_char(key, layout).map(OsKeyEvent::Press),
            EventType::KeyRelease(key) => key_to_char(key, layout).map(OsKeyEvent::Release),
            _ => None,
        };
        if let Some(message) = message {
            let _ = tx.send(message);
        }
    };

    // This blocks until an error occurs
    if let Err(e) = listen(callback) {
        log::error!("OS keyboard listener error: {:?}", e);
    }
}

/// Check if the OS keyboard listener is likely to work on this system
pub fn is_available() -> bool {
    // On Linux, rdev requires X11 or Wayland
    #[cfg(target_os = "linux")]
    {
        std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
    }

    #[cfg(not(target_os = "linux"))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping_us() {
        assert_eq!(key_to_char_us(Key::KeyA), Some('a'));
        assert_eq!(key_to_char_us(Key::KeyY), Some('y'));
        assert_eq!(key_to_char_us(Key::KeyK), Some('k'));
        assert_eq!(key_to_char_us(Key::Num1), Some('1'));
        assert_eq!(key_to_char_us(Key::Slash), Some('/'));
        assert_eq!(key_to_char_us(Key::F1), None);
    }

    #[test]
    fn test_key_mapping_german() {
        assert_eq!(key_to_char_german(Key::KeyY), Some('z')); // German Z on US Y position
        assert_eq!(key_to_char_german(Key::KeyZ), Some('y')); // German Y on US Z position
        assert_eq!(key_to_char_german(Key::KeyA), Some('a'));
        assert_eq!(key_to_char_german(Key::Slash), Some('-'));
        assert_eq!(key_to_char_german(Key::Minus), None);
        assert_eq!(key_to_char_german(Key::Num1), Some('1'));
    }

    #[test]
    fn test_key_for_char() {
        assert_eq!(key_for_char('1', KeyboardLayout::Custom), Some(Key::Num1));
        assert_eq!(key_for_char('A', KeyboardLayout::Us), Some(Key::KeyA));
        assert_eq!(key_for_char('z', KeyboardLayout::German), Some(Key::KeyY));
        assert_eq!(key_for_char('-', KeyboardLayout::German), Some(Key::Slash));
        assert_eq!(key_for_char(' ', KeyboardLayout::Us), Some(Key::Space));
        assert_eq!(key_for_char(';', KeyboardLayout::Us), None);
        assert_eq!(key_for_char('!', KeyboardLayout::Us), None);
    }

    #[test]
    fn test_every_bound_key_is_reported() {
        use crate::config::{Config, CustomKeyMapping};

        for layout in [KeyboardLayout::Us, KeyboardLayout::German] {
            let mut config = Config::default();
            config.keyboard.layout = layout;
            let piano = config.to_piano_config().unwrap();
            for binding in piano.input_map.bindings() {
                assert!(
                    key_for_char(binding.key_char, layout).is_some(),
                    "{:?} has no key for {:?}",
                    layout,
                    binding.key_char
                );
            }
        }

        let mut config = Config::default();
        config.keyboard.layout = KeyboardLayout::Custom;
        config.keyboard.custom_mappings = Some(
            ['1', ',', '.', '/', '-', '0']
                .iter()
                .map(|&key| CustomKeyMapping {
                    key,
                    display: None,
                    note: "C".to_string(),
                    octave: None,
                })
                .collect(),
        );
        let piano = config.to_piano_config().unwrap();
        for binding in piano.input_map.bindings() {
            assert!(key_for_char(binding.key_char, KeyboardLayout::Custom).is_some());
        }
    }

    #[test]
    fn test_layout_dispatch() {
        assert_eq!(key_to_char(Key::KeyY, KeyboardLayout::German), Some('z'));
        assert_eq!(key_to_char(Key::KeyY, KeyboardLayout::Us), Some('y'));
        assert_eq!(key_to_char(Key::Escape, KeyboardLayout::Custom), Some('\x1b'));
        assert!(is_shift(Key::ShiftRight));
        assert!(!is_shift(Key::KeyA));
    }
}
