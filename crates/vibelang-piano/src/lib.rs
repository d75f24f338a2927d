//! vibelang-piano - Two-octave on-screen piano for VibeLang
//!
//! A terminal piano that plays one sample file per note, driven by the mouse
//! or the computer keyboard. Features include:
//!
//! - Layout engine that fits two (or more) octaves of keys into any window size
//! - Mouse input with black keys taking priority over the white keys below them
//! - Computer keyboard input (US QWERTY or German QWERTZ), Shift for the upper octave
//! - Sample playback through rodio, silent fallback when no device is available
//! - OS-level key detection for reliable key release handling
//! - Configurable via TOML file
//!
//! # Usage as a Library
//!
//! ```no_run
//! use vibelang_piano::{audio, Config, KeyboardController, Point};
//!
//! let config = Config::load_or_default();
//! let mut piano = KeyboardController::new(
//!     config.to_piano_config()?,
//!     audio::default_player(),
//!     140,
//!     40,
//! )?;
//!
//! // Press the key under a point, then release everything
//! if let Some(note) = piano.on_pointer_down(Point::new(3.0, 30.0)) {
//!     println!("Pressed {}", note);
//! }
//! piano.on_pointer_up();
//!
//! // 'w' is C# in the lower octave, Shift moves it up one octave
//! piano.on_key_down('w', true);
//! # Ok::<(), vibelang_piano::Error>(())
//! ```

pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod keymap;
pub mod layout;
pub mod note;
pub mod os_keyboard;
pub mod ui;

// Re-export main types
pub use audio::{default_player, RodioPlayer, SampleLibrary, SamplePlayer, SilentPlayer};
pub use config::{Config, KeyboardLayout, Theme};
pub use controller::{Flow, InputEvent, KeyboardController, PianoConfig};
pub use error::{Error, Result};
pub use keymap::{InputMap, KeyBinding, OctaveMode};
pub use layout::{compute_layout, compute_layout_with, Key, LayoutSettings, Point, Rect};
pub use note::{Letter, Note};
pub use os_keyboard::{is_available as os_keyboard_available, OsKeyEvent, OsKeyboardListener};
pub use ui::{render_piano, KeyboardWidget};
