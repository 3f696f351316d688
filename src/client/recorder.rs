//! Audio capture helper: picks a recording format the platform supports and
//! turns a finished recording into an uploadable file.

use bytes::Bytes;
use thiserror::Error;

/// Recording formats in order of preference.
pub const MIME_PREFERENCES: &[&str] = &["audio/mpeg", "audio/mp4", "audio/webm", "audio/ogg"];

/// A file-like value ready to be sent as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecorderError {
    #[error("Audio recording is not supported on this device.")]
    Unsupported,
    #[error("Already recording")]
    AlreadyRecording,
    #[error("Not recording")]
    NotRecording,
    #[error("Could not start recording: {0}")]
    Start(String),
    #[error("Recording failed: {0}")]
    Capture(String),
}

/// The platform's media-capture capability.
pub trait AudioCapture {
    /// Whether the platform can record in this container type.
    fn supports(&self, mime: &str) -> bool;
    fn start(&mut self, mime: &str) -> Result<(), String>;
    /// Stop recording and return the captured bytes.
    fn stop(&mut self) -> Result<Bytes, String>;
}

/// First preferred type the platform supports, or `None` when recording is
/// unavailable.
pub fn pick_mime_type<C: AudioCapture + ?Sized>(capture: &C) -> Option<&'static str> {
    MIME_PREFERENCES
        .iter()
        .copied()
        .find(|mime| capture.supports(mime))
}

/// Upload name for a recording made for `text`, e.g. `"big cat!"` becomes
/// `big_cat_sound.mp3`.
pub fn audio_file_name(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join("_");
    let safe: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let base = if safe.is_empty() { "word" } else { safe.as_str() };
    format!("{base}_sound.mp3")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RecorderState {
    Idle,
    Recording { mime: &'static str, file_name: String },
}

/// Start/stop state machine over an [`AudioCapture`].
pub struct AudioRecorder<C: AudioCapture> {
    capture: C,
    state: RecorderState,
    last: Option<MediaFile>,
}

impl<C: AudioCapture> AudioRecorder<C> {
    pub fn new(capture: C) -> Self {
        Self {
            capture,
            state: RecorderState::Idle,
            last: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        pick_mime_type(&self.capture).is_some()
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// The most recent finished recording.
    pub fn last_recording(&self) -> Option<&MediaFile> {
        self.last.as_ref()
    }

    /// Begin recording audio for the entry whose display text is `text`.
    pub fn start(&mut self, text: &str) -> Result<(), RecorderError> {
        if self.is_recording() {
            return Err(RecorderError::AlreadyRecording);
        }

        let mime = pick_mime_type(&self.capture).ok_or(RecorderError::Unsupported)?;
        self.capture.start(mime).map_err(RecorderError::Start)?;

        tracing::debug!(mime, "Recording started");
        self.state = RecorderState::Recording {
            mime,
            file_name: audio_file_name(text),
        };
        Ok(())
    }

    pub fn stop(&mut self) -> Result<MediaFile, RecorderError> {
        let (mime, file_name) = match std::mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Recording { mime, file_name } => (mime, file_name),
            RecorderState::Idle => return Err(RecorderError::NotRecording),
        };

        let bytes = self.capture.stop().map_err(RecorderError::Capture)?;
        let file = MediaFile {
            file_name,
            mime: mime.to_string(),
            bytes,
        };
        self.last = Some(file.clone());
        Ok(file)
    }

    pub fn into_inner(self) -> C {
        self.capture
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Capture double that supports a fixed set of types and returns canned bytes.
    #[derive(Default)]
    pub(crate) struct FakeCapture {
        pub supported: Vec<&'static str>,
        pub started_with: Option<String>,
        pub fail_start: bool,
    }

    impl AudioCapture for FakeCapture {
        fn supports(&self, mime: &str) -> bool {
            self.supported.contains(&mime)
        }

        fn start(&mut self, mime: &str) -> Result<(), String> {
            if self.fail_start {
                return Err("permission denied".into());
            }
            self.started_with = Some(mime.to_string());
            Ok(())
        }

        fn stop(&mut self) -> Result<Bytes, String> {
            Ok(Bytes::from_static(b"ID3fake"))
        }
    }

    #[test]
    fn test_audio_file_name() {
        assert_eq!(audio_file_name("big cat!"), "big_cat_sound.mp3");
        assert_eq!(audio_file_name("  a   b  "), "a_b_sound.mp3");
        assert_eq!(audio_file_name("pâté-de_foie"), "pt-de_foie_sound.mp3");
        assert_eq!(audio_file_name("!!!"), "word_sound.mp3");
        assert_eq!(audio_file_name(""), "word_sound.mp3");
    }

    #[test]
    fn test_pick_mime_type_follows_preference_order() {
        let capture = FakeCapture {
            supported: vec!["audio/ogg", "audio/webm"],
            ..Default::default()
        };
        assert_eq!(pick_mime_type(&capture), Some("audio/webm"));

        let none = FakeCapture::default();
        assert_eq!(pick_mime_type(&none), None);
    }

    #[test]
    fn test_recorder_start_stop() {
        let mut recorder = AudioRecorder::new(FakeCapture {
            supported: vec!["audio/mp4"],
            ..Default::default()
        });

        assert_eq!(recorder.stop(), Err(RecorderError::NotRecording));
        recorder.start("sea shell").unwrap();
        assert!(recorder.is_recording());
        assert_eq!(recorder.start("again"), Err(RecorderError::AlreadyRecording));

        let file = recorder.stop().unwrap();
        assert!(!recorder.is_recording());
        assert_eq!(file.file_name, "sea_shell_sound.mp3");
        assert_eq!(file.mime, "audio/mp4");
        assert_eq!(recorder.last_recording(), Some(&file));
        assert_eq!(
            recorder.into_inner().started_with.as_deref(),
            Some("audio/mp4")
        );
    }

    #[test]
    fn test_recorder_unsupported_and_start_failure() {
        let mut recorder = AudioRecorder::new(FakeCapture::default());
        assert!(!recorder.is_supported());
        assert_eq!(recorder.start("x"), Err(RecorderError::Unsupported));

        let mut failing = AudioRecorder::new(FakeCapture {
            supported: vec!["audio/mpeg"],
            fail_start: true,
            ..Default::default()
        });
        assert!(matches!(failing.start("x"), Err(RecorderError::Start(_))));
        assert!(!failing.is_recording());
    }
}
