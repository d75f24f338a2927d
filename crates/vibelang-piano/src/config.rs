//! Configuration file support for vibe-piano
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/vibe-piano/config.toml`
//! - macOS: `~/Library/Application Support/vibe-piano/config.toml`
//! - Windows: `%APPDATA%\vibe-piano\config.toml`

use crate::audio::{SampleLibrary, DEFAULT_SAMPLE_DIR, DEFAULT_SAMPLE_EXTENSION};
use crate::controller::{PianoConfig, DEFAULT_KEY_RELEASE_MS};
use crate::error::{Error, Result};
use crate::keymap::{InputMap, KeyBinding, OctaveMode};
use crate::layout::{LayoutSettings, DEFAULT_OCTAVES};
use crate::note::{Letter, DEFAULT_SAMPLE_SHARP_MARKER};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keyboard configuration
    pub keyboard: KeyboardSettings,
    /// Sample file configuration
    pub samples: SampleSettings,
    /// Space around the keys
    pub display: LayoutSettings,
    /// UI/Theme configuration
    pub theme: Theme,
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => {
                log::warn!("No config directory, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from `path`, or return default if it is missing or invalid
    pub fn load_or_default_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(path).unwrap_or_else(|e| {
            log::warn!("Ignoring config at {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "vibe-piano") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::write_default_config_file(&path)?;
        Ok(path)
    }

    /// Write the commented default config to `path`
    pub fn write_default_config_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = r#"# vibe-piano configuration file
# https://github.com/trusch/vibelang

[keyboard]
# Keyboard layout: "us", "german", or "custom"
layout = "us"

# Octaves shown on screen, lowest first.
# Keys play in the first octave, Shift moves them to the last one.
octaves = [4, 5]

# Auto-release timeout in milliseconds
# Keys are released after this time if no key-up event is detected
key_release_ms = 400

# Custom key mappings (only used when layout = "custom")
# [[keyboard.custom_mappings]]
# key = "a"
# note = "C"
#
# [[keyboard.custom_mappings]]
# key = "k"
# note = "C"
# octave = 5

[samples]
# Directory containing one sample per note, e.g. C4.wav, Cb4.wav (= C#4)
directory = "sounds"

# Sample file extension
extension = "wav"

# Character written instead of '#' in sample file names
sharp_marker = "b"

[display]
# Terminal rows above and below the keys
margin_top = 2
margin_bottom = 2

[theme]
# Colors for the keyboard display
white_key_color = "white"
black_key_color = "black"
pressed_white_key_color = "gray"
pressed_black_key_color = "dark_gray"
border_color = "dark_gray"
text_color = "white"

# Show note names on white keys
show_note_names = true

# Show keyboard shortcuts help
show_help = true
"#;

        fs::write(path, content)?;
        Ok(())
    }

    /// Convert to PianoConfig for the controller
    pub fn to_piano_config(&self) -> Result<PianoConfig> {
        let octaves = if self.keyboard.octaves.is_empty() {
            DEFAULT_OCTAVES.to_vec()
        } else {
            self.keyboard.octaves.clone()
        };
        let lower = octaves[0];
        let upper = *octaves.last().unwrap_or(&lower);
        let upper = if upper == lower { lower.saturating_add(1) } else { upper };

        let input_map = match self.keyboard.layout {
            KeyboardLayout::Us => InputMap::us_layout(),
            KeyboardLayout::German => InputMap::german_layout(),
            KeyboardLayout::Custom => match self.keyboard.custom_mappings {
                Some(ref mappings) => {
                    let bindings = mappings
                        .iter()
                        .map(|m| m.to_key_binding())
                        .collect::<Result<Vec<_>>>()?;
                    InputMap::new(bindings, lower, upper)
                }
                // Use custom mappings if provided, otherwise default to US
                None => InputMap::us_layout(),
            },
        };

        Ok(PianoConfig {
            octaves,
            layout: self.display,
            input_map: input_map.with_octaves(lower, upper),
            samples: SampleLibrary::from_settings(&self.samples),
            key_release_timeout: Duration::from_millis(self.keyboard.key_release_ms),
        })
    }
}

/// Keyboard layout preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardLayout {
    /// US QWERTY layout
    #[default]
    Us,
    /// German QWERTZ layout
    German,
    /// Custom layout (use custom_mappings)
    Custom,
}

/// Keyboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardSettings {
    /// Keyboard layout preset
    pub layout: KeyboardLayout,
    /// Octaves on screen, lowest first
    pub octaves: Vec<i8>,
    /// Auto-release timeout in milliseconds
    pub key_release_ms: u64,
    /// Custom key mappings (only used when layout = "custom")
    pub custom_mappings: Option<Vec<CustomKeyMapping>>,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            layout: KeyboardLayout::Us,
            octaves: DEFAULT_OCTAVES.to_vec(),
            key_release_ms: DEFAULT_KEY_RELEASE_MS,
            custom_mappings: None,
        }
    }
}

/// Custom key mapping for TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomKeyMapping {
    /// The key character
    pub key: char,
    /// Display character (optional, defaults to uppercase of key)
    pub display: Option<char>,
    /// Note letter, e.g. "C" or "F#"
    pub note: String,
    /// Fixed octave; without one the key follows Shift
    pub octave: Option<i8>,
}

impl CustomKeyMapping {
    /// Convert to KeyBinding
    pub fn to_key_binding(&self) -> Result<KeyBinding> {
        let letter: Letter = self.note.parse()?;
        Ok(KeyBinding {
            key_char: self.key.to_ascii_lowercase(),
            display_char: self.display.unwrap_or_else(|| self.key.to_ascii_uppercase()),
            letter,
            octave: match self.octave {
                Some(octave) => OctaveMode::Fixed(octave),
                None => OctaveMode::Shiftable,
            },
        })
    }
}

/// Sample settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSettings {
    /// Directory holding the sample files
    pub directory: PathBuf,
    /// Sample file extension
    pub extension: String,
    /// ASCII stand-in for '#' in file names
    pub sharp_marker: char,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_SAMPLE_DIR),
            extension: DEFAULT_SAMPLE_EXTENSION.to_string(),
            sharp_marker: DEFAULT_SAMPLE_SHARP_MARKER,
        }
    }
}

/// Theme/UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// White key color
    pub white_key_color: String,
    /// Black key color
    pub black_key_color: String,
    /// Pressed white key color
    pub pressed_white_key_color: String,
    /// Pressed black key color
    pub pressed_black_key_color: String,
    /// Key outline color
    pub border_color: String,
    /// Status text color
    pub text_color: String,
    /// Show note names on keys
    pub show_note_names: bool,
    /// Show help text
    pub show_help: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            white_key_color: "white".to_string(),
            black_key_color: "black".to_string(),
            pressed_white_key_color: "gray".to_string(),
            pressed_black_key_color: "dark_gray".to_string(),
            border_color: "dark_gray".to_string(),
            text_color: "white".to_string(),
            show_note_names: true,
            show_help: true,
        }
    }
}

impl Theme {
    /// Parse a color string to ratatui Color
    pub fn parse_color(s: &str) -> ratatui::style::Color {
        use ratatui::style::Color;
        match s.to_lowercase().as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "gray" | "grey" => Color::Gray,
            "dark_gray" | "dark_grey" | "darkgray" | "darkgrey" => Color::DarkGray,
            "light_red" | "lightred" => Color::LightRed,
            "light_green" | "lightgreen" => Color::LightGreen,
            "light_yellow" | "lightyellow" => Color::LightYellow,
            "light_blue" | "lightblue" => Color::LightBlue,
            "light_magenta" | "lightmagenta" => Color::LightMagenta,
            "light_cyan" | "lightcyan" => Color::LightCyan,
            "white" => Color::White,
            // Try parsing as RGB hex
            s if s.starts_with('#') && s.len() == 7 => {
                let channel = |range: std::ops::Range<usize>| {
                    s.get(range).and_then(|hex| u8::from_str_radix(hex, 16).ok())
                };
                match (channel(1..3), channel(3..5), channel(5..7)) {
                    (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
                    _ => Color::White,
                }
            }
            _ => Color::White,
        }
    }

    /// Color of a key in the given state
    pub fn key_color(&self, is_black: bool, is_pressed: bool) -> ratatui::style::Color {
        let name = match (is_black, is_pressed) {
            (false, false) => &self.white_key_color,
            (false, true) => &self.pressed_white_key_color,
            (true, false) => &self.black_key_color,
            (true, true) => &self.pressed_black_key_color,
        };
        Self::parse_color(name)
    }

    /// Get border color
    pub fn border(&self) -> ratatui::style::Color {
        Self::parse_color(&self.border_color)
    }

    /// Get status text color
    pub fn text(&self) -> ratatui::style::Color {
        Self::parse_color(&self.text_color)
    }
}
