//! Speech input and output.
//!
//! Recognition and synthesis are done by external engines; this module defines
//! the seams they plug into and the small amount of logic around them.

use crate::error::SpeechError;
use crate::languages::AUTO_DETECT;
use async_trait::async_trait;
use serde::Serialize;

/// Recognition language used when neither the selection nor the system
/// provide one.
pub const FALLBACK_RECOGNITION_LANGUAGE: &str = "pt-BR";

/// A synthesis voice offered by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    /// Stable engine identifier
    pub uri: String,
    pub name: String,
    /// BCP 47 tag, e.g. "pt-BR"
    pub lang: String,
}

/// Speech-to-text engine.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen once. `Ok(None)` means the session ended without a final result.
    async fn listen(&self, lang: &str) -> Result<Option<String>, SpeechError>;
}

/// Text-to-speech engine.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn voices(&self) -> Vec<Voice>;

    /// Play `text`, interrupting anything already playing. `None` voice means
    /// the engine default for `lang`.
    async fn speak(&self, text: &str, lang: &str, voice: Option<&Voice>) -> Result<(), SpeechError>;
}

/// Pick the recognition language for a source selection.
pub fn recognition_language(source: &str, system_locale: Option<&str>) -> String {
    if source != AUTO_DETECT {
        return source.to_string();
    }
    system_locale
        .filter(|locale| !locale.is_empty())
        .unwrap_or(FALLBACK_RECOGNITION_LANGUAGE)
        .to_string()
}

/// Voices whose language shares the target's primary subtag.
pub fn voices_for_language<'a>(voices: &'a [Voice], target: &str) -> Vec<&'a Voice> {
    let prefix = target
        .split('-')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    voices
        .iter()
        .filter(|voice| voice.lang.to_lowercase().starts_with(&prefix))
        .collect()
}

/// Shorten engine voice names for the voice picker.
pub fn voice_label(name: &str) -> String {
    let mut label = name.to_string();
    if label.contains("Desktop") {
        label = label.replace("- Desktop", "").replace("Desktop", "");
    }
    if label.contains("Microsoft") {
        label = label.replace("Microsoft", "");
    }
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cached voice list, refreshed when the engine reports a change.
#[derive(Debug, Default)]
pub struct VoiceCache {
    voices: Vec<Voice>,
}

impl VoiceCache {
    pub async fn refresh(&mut self, synthesizer: &dyn SpeechSynthesizer) {
        self.voices = synthesizer.voices().await;
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn for_language(&self, target: &str) -> Vec<&Voice> {
        voices_for_language(&self.voices, target)
    }

    pub fn find(&self, uri: &str) -> Option<&Voice> {
        self.voices.iter().find(|voice| voice.uri == uri)
    }
}
