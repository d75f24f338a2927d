//! vibe-piano - Two-octave on-screen piano for VibeLang
//!
//! Click the keys or play them with the computer keyboard; every note plays
//! its own sample file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use vibelang_piano::{
    audio::{self, SampleLibrary},
    config::{Config, KeyboardLayout, Theme},
    controller::{Flow, InputEvent, KeyboardController},
    layout::Point,
    note::{Letter, Note},
    os_keyboard::{is_available as os_keyboard_available, key_for_char, OsKeyEvent, OsKeyboardListener},
    ui::render_piano,
};

/// 60 frames per second
const FRAME_BUDGET: Duration = Duration::from_micros(16_667);

#[derive(Parser)]
#[command(name = "vibe-piano")]
#[command(author, version, about = "Two-octave on-screen piano for VibeLang", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (default: ~/.config/vibe-piano/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the note samples
    #[arg(short, long)]
    samples: Option<PathBuf>,

    /// Sample file extension
    #[arg(short, long)]
    extension: Option<String>,

    /// Keyboard layout
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Us,
    German,
}

impl From<LayoutArg> for KeyboardLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Us => KeyboardLayout::Us,
            LayoutArg::German => KeyboardLayout::German,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
    /// List the sample file expected for every note
    CheckSamples,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            let path = Config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
            return Ok(());
        }
        Some(Commands::ConfigPath) => {
            let path = Config::config_path()?;
            println!("{}", path.display());
            return Ok(());
        }
        _ => {}
    }

    // Load config
    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(),
    };

    // Apply CLI overrides
    if let Some(samples) = cli.samples {
        config.samples.directory = samples;
    }
    if let Some(extension) = cli.extension {
        config.samples.extension = extension;
    }
    if let Some(layout) = cli.layout {
        config.keyboard.layout = layout.into();
    }

    if let Some(Commands::CheckSamples) = cli.command {
        return check_samples(&config);
    }

    // Run the TUI
    run_tui(config)
}

fn check_samples(config: &Config) -> Result<()> {
    let piano_config = config.to_piano_config()?;
    println!("Samples in {}:", piano_config.samples.directory().display());
    let missing = report_samples(&piano_config.samples, &piano_config.octaves);
    if missing > 0 {
        println!("{} sample(s) missing", missing);
    } else {
        println!("All samples found");
    }
    Ok(())
}

/// Print every note's sample path, returning how many are missing
fn report_samples(samples: &SampleLibrary, octaves: &[i8]) -> usize {
    let mut missing = 0;
    for &octave in octaves {
        for letter in Letter::ALL {
            let note = Note::new(letter, octave);
            match samples.locate(&note) {
                Ok(path) => println!("  {:<4} {}", note, path.display()),
                Err(_) => {
                    missing += 1;
                    println!("  {:<4} {} (missing)", note, samples.path_for(&note).display());
                }
            }
        }
    }
    missing
}

fn run_tui(config: Config) -> Result<()> {
    let piano_config = config.to_piano_config()?;
    let (width, height) = crossterm::terminal::size()?;

    // Fails before the terminal is touched if the window is too small
    let mut piano = KeyboardController::new(
        piano_config,
        audio::default_player(),
        width as u32,
        height as u32,
    )
    .context("Terminal too small for the keyboard")?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create OS keyboard listener
    let os_keyboard = if os_keyboard_available() {
        OsKeyboardListener::new(config.keyboard.layout)
    } else {
        None
    };
    if os_keyboard.is_none() {
        log::info!("OS keyboard listener unavailable, releasing keys after a timeout");
    }

    // Main loop
    let result = run_event_loop(
        &mut terminal,
        &mut piano,
        os_keyboard.as_ref(),
        config.keyboard.layout,
        &config.theme,
    );

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    piano: &mut KeyboardController,
    os_keyboard: Option<&OsKeyboardListener>,
    layout: KeyboardLayout,
    theme: &Theme,
) -> Result<()> {
    let os_layout = os_keyboard.map(|_| layout);
    let mut has_focus = true;
    let mut shift_held = false;
    // Set while the newest key press came from the terminal, which never reports its release
    let mut terminal_pressed = false;

    loop {
        let frame_start = Instant::now();

        // Draw
        terminal.draw(|frame| render_piano(frame, piano, theme))?;

        // Process OS keyboard events only when focused
        if let Some(os_kb) = os_keyboard {
            while let Some(event) = os_kb.try_recv() {
                if !has_focus {
                    continue;
                }
                let input = match event {
                    OsKeyEvent::Shift(held) => {
                        shift_held = held;
                        continue;
                    }
                    OsKeyEvent::Press('\x1b') => InputEvent::Quit,
                    OsKeyEvent::Press(c) => {
                        terminal_pressed = false;
                        InputEvent::KeyDown { key: c, shift: shift_held }
                    }
                    OsKeyEvent::Release(c) => InputEvent::KeyUp { key: c },
                };
                if piano.handle(input) == Flow::Quit {
                    return Ok(());
                }
            }
        }

        // Terminals rarely report key releases
        if (os_keyboard.is_none() || terminal_pressed) && piano.expire_key_presses(Instant::now()) {
            terminal_pressed = false;
        }

        // Poll for terminal events until the frame budget is spent
        let mut remaining = FRAME_BUDGET.saturating_sub(frame_start.elapsed());
        while event::poll(remaining)? {
            let input = match event::read()? {
                Event::FocusGained => {
                    has_focus = true;
                    None
                }
                Event::FocusLost => {
                    has_focus = false;
                    shift_held = false;
                    piano.release_all();
                    None
                }
                Event::Resize(width, height) => Some(InputEvent::Resize {
                    width: width as u32,
                    height: height as u32,
                }),
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerDown {
                        point: Point::cell_center(mouse.column, mouse.row),
                    }),
                    MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::PointerUp),
                    _ => None,
                },
                Event::Key(key) => {
                    has_focus = true;
                    match (key.kind, key.code) {
                        (KeyEventKind::Press, KeyCode::Esc) => Some(InputEvent::Quit),
                        (KeyEventKind::Press, KeyCode::Char('c'))
                            if key.modifiers.contains(KeyModifiers::CONTROL) =>
                        {
                            Some(InputEvent::Quit)
                        }
                        (_, KeyCode::Char(c)) if !handled_by_terminal(c, os_layout) => None,
                        (KeyEventKind::Press, KeyCode::Char(c)) => {
                            terminal_pressed = os_keyboard.is_some();
                            Some(InputEvent::KeyDown {
                                key: c,
                                shift: key.modifiers.contains(KeyModifiers::SHIFT)
                                    || c.is_ascii_uppercase(),
                            })
                        }
                        (KeyEventKind::Release, KeyCode::Char(c)) => {
                            Some(InputEvent::KeyUp { key: c })
                        }
                        _ => None,
                    }
                }
                _ => None,
            };

            if let Some(input) = input {
                if piano.handle(input) == Flow::Quit {
                    return Ok(());
                }
            }
            remaining = FRAME_BUDGET.saturating_sub(frame_start.elapsed());
        }
    }
}

/// Whether a typed character is taken from terminal events.
/// Characters the OS listener reports are left to it.
fn handled_by_terminal(c: char, os_layout: Option<KeyboardLayout>) -> bool {
    match os_layout {
        Some(layout) => key_for_char(c, layout).is_none(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_samples_counts_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("C4.wav"), b"RIFF").unwrap();
        std::fs::write(dir.path().join("Cb4.wav"), b"RIFF").unwrap();

        let samples = SampleLibrary::new(dir.path(), "wav");
        assert_eq!(report_samples(&samples, &[4, 5]), 22);
        assert_eq!(report_samples(&samples, &[]), 0);
    }

    #[test]
    fn test_handled_by_terminal() {
        assert!(handled_by_terminal('a', None));
        assert!(!handled_by_terminal('a', Some(KeyboardLayout::Us)));
        assert!(!handled_by_terminal('A', Some(KeyboardLayout::Us)));
        assert!(!handled_by_terminal('1', Some(KeyboardLayout::Custom)));
        // No physical key types these, so the terminal must deliver them
        assert!(handled_by_terminal(';', Some(KeyboardLayout::Custom)));
        assert!(handled_by_terminal('ö', Some(KeyboardLayout::German)));
    }

    #[test]
    fn test_layout_arg() {
        let cli = Cli::parse_from(["vibe-piano", "--layout", "german", "--samples", "/tmp/s"]);
        assert!(matches!(cli.layout, Some(LayoutArg::German)));
        assert_eq!(KeyboardLayout::from(LayoutArg::German), KeyboardLayout::German);
        assert_eq!(cli.samples, Some(PathBuf::from("/tmp/s")));
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["vibe-piano", "check-samples"]);
        assert!(matches!(cli.command, Some(Commands::CheckSamples)));
    }
}
