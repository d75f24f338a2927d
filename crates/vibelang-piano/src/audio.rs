//! Sample lookup and playback backends
//!
//! Every note has one sample file named after it, e.g. `sounds/Cb4.wav` for
//! C#4. Playback goes through rodio and is fire-and-forget: each trigger gets
//! its own detached sink, so repeated notes layer on top of each other.

use crate::config::SampleSettings;
use crate::error::{Error, Result};
use crate::note::{Note, DEFAULT_SAMPLE_SHARP_MARKER};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Directory searched for samples when nothing else is configured
pub const DEFAULT_SAMPLE_DIR: &str = "sounds";

/// Extension of sample files when nothing else is configured
pub const DEFAULT_SAMPLE_EXTENSION: &str = "wav";

/// Resolves notes to sample files on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLibrary {
    directory: PathBuf,
    extension: String,
    sharp_marker: char,
}

impl Default for SampleLibrary {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_DIR, DEFAULT_SAMPLE_EXTENSION)
    }
}

impl SampleLibrary {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension: String = extension.into();
        Self {
            directory: directory.into(),
            extension: extension.trim_start_matches('.').to_string(),
            sharp_marker: DEFAULT_SAMPLE_SHARP_MARKER,
        }
    }

    /// Create from settings
    pub fn from_settings(settings: &SampleSettings) -> Self {
        Self::new(settings.directory.clone(), settings.extension.as_str()).with_sharp_marker(settings.sharp_marker)
    }

    /// Use a different ASCII character in place of '#' in file names
    pub fn with_sharp_marker(mut self, marker: char) -> Self {
        self.sharp_marker = marker;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path the sample for `note` is expected at (it may not exist)
    pub fn path_for(&self, note: &Note) -> PathBuf {
        self.directory
            .join(format!("{}.{}", note.sample_stem(self.sharp_marker), self.extension))
    }

    /// Path of an existing sample for `note`.
    ///
    /// Checks the filesystem on every call; a file added while running is
    /// picked up on the next trigger.
    pub fn locate(&self, note: &Note) -> Result<PathBuf> {
        let path = self.path_for(note);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::SampleNotFound(path))
        }
    }
}

/// Audio output trait
pub trait SamplePlayer {
    /// Start playing the sample file at `path` without waiting for it to finish
    fn play(&self, path: &Path) -> Result<()>;

    /// Human readable backend name
    fn name(&self) -> &str;
}

/// Plays samples on the default output device
pub struct RodioPlayer {
    /// Keep the stream alive, dropping it silences all sinks
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioPlayer {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| Error::Audio(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl SamplePlayer for RodioPlayer {
    fn play(&self, path: &Path) -> Result<()> {
        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| Error::Audio(format!("{}: {}", path.display(), e)))?;
        let sink = Sink::try_new(&self.handle).map_err(|e| Error::Audio(e.to_string()))?;
        sink.append(source);
        sink.detach();
        Ok(())
    }

    fn name(&self) -> &str {
        "default output"
    }
}

/// Player without an output device (no audio available, or testing)
pub struct SilentPlayer;

impl SamplePlayer for SilentPlayer {
    fn play(&self, path: &Path) -> Result<()> {
        log::debug!("Silent playback of {}", path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Open the default audio device, falling back to silence
pub fn default_player() -> Box<dyn SamplePlayer> {
    match RodioPlayer::new() {
        Ok(player) => {
            log::info!("Audio output opened");
            Box::new(player)
        }
        Err(e) => {
            log::warn!("Failed to open audio output, playing silently: {}", e);
            Box::new(SilentPlayer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Letter;

    #[test]
    fn test_sharp_becomes_flat_marker() {
        let library = SampleLibrary::default();
        let path = library.path_for(&Note::new(Letter::CSharp, 4));
        assert_eq!(path, Path::new("sounds").join("Cb4.wav"));

        let path = library.path_for(&Note::new(Letter::B, 5));
        assert_eq!(path, Path::new("sounds").join("B5.wav"));
    }

    #[test]
    fn test_custom_extension_and_marker() {
        let library = SampleLibrary::new("/samples", ".ogg").with_sharp_marker('s');
        let path = library.path_for(&Note::new(Letter::FSharp, 5));
        assert_eq!(path, Path::new("/samples").join("Fs5.ogg"));
        assert_eq!(library.directory(), Path::new("/samples"));
    }

    #[test]
    fn test_locate_missing_sample() {
        let dir = tempfile::tempdir().unwrap();
        let library = SampleLibrary::new(dir.path(), "wav");
        let note = Note::new(Letter::CSharp, 4);

        match library.locate(&note) {
            Err(Error::SampleNotFound(path)) => assert!(path.ends_with("Cb4.wav")),
            other => panic!("expected SampleNotFound, got {:?}", other),
        }

        std::fs::write(dir.path().join("Cb4.wav"), b"RIFF").unwrap();
        assert_eq!(library.locate(&note).unwrap(), dir.path().join("Cb4.wav"));
    }

    #[test]
    fn test_locate_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("E4.wav")).unwrap();
        let library = SampleLibrary::new(dir.path(), "wav");
        assert!(library.locate(&Note::new(Letter::E, 4)).is_err());
    }

    #[test]
    fn test_silent_player() {
        let player = SilentPlayer;
        assert!(player.play(Path::new("sounds/C4.wav")).is_ok());
        assert_eq!(player.name(), "silent");
    }
}
