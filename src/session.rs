//! Popup session: the state a single popup window holds between open and close.
//!
//! A `Session` owns the in-flight flag, the current language selection, the
//! text fields and the voice cache, and runs the translate → record → count
//! pipeline on top of the client and the persistent store.

use crate::client::TranslationClient;
use crate::config::Config;
use crate::engagement::EngagementCounter;
use crate::error::{SpeechError, StorageError, TranslateError};
use crate::history::{HistoryEntryView, HistoryManager, TranslationRecord};
use crate::languages::{LanguageCatalog, AUTO_DETECT, PROVIDER_AUTO_DETECT};
use crate::settings::{LanguageSelection, SettingsStore};
use crate::speech::{
    recognition_language, voice_label, SpeechRecognizer, SpeechSynthesizer, VoiceCache,
};
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the popup currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupState {
    pub selection: LanguageSelection,
    pub source_text: String,
    pub translated_text: String,
    pub review_prompt_visible: bool,
}

/// Result of a completed translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationOutcome {
    pub translated_text: String,
    pub detected_source: String,
    /// Whether a new history record was stored
    pub recorded: bool,
    /// Whether the review prompt should be shown now
    pub show_review_prompt: bool,
}

/// Result of one speech-to-text activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    /// The engine ended without a final transcript.
    NoResult,
    /// A transcript replaced the source text and was translated.
    Translated {
        transcript: String,
        result: Result<TranslationOutcome, TranslateError>,
    },
}

/// A voice picker entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceOption {
    pub uri: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Locale used for speech recognition when the source is auto-detect
    pub system_locale: Option<String>,
    /// Pause before a context-menu launch translates automatically
    pub auto_translate_delay: Duration,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            system_locale: config.system_locale.clone(),
            auto_translate_delay: config.auto_translate_delay(),
        }
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct Session {
    client: TranslationClient,
    history: HistoryManager,
    engagement: EngagementCounter,
    settings: SettingsStore,
    options: SessionOptions,
    state: Mutex<PopupState>,
    in_flight: AtomicBool,
    voices: tokio::sync::Mutex<VoiceCache>,
}

impl Session {
    /// Open a session, restoring the last-used language pair when available.
    pub async fn open(
        client: TranslationClient,
        store: Arc<dyn KeyValueStore>,
        options: SessionOptions,
    ) -> Self {
        let settings = SettingsStore::new(Arc::clone(&store));
        let selection = match settings.load_last_pair(LanguageSelection::default()).await {
            Ok(selection) => selection,
            Err(e) => {
                warn!("Could not restore last languages: {}", e);
                LanguageSelection::default()
            }
        };
        debug!(
            "Session opened with {} → {}",
            selection.source, selection.target
        );

        Self {
            client,
            history: HistoryManager::new(Arc::clone(&store)),
            engagement: EngagementCounter::new(store),
            settings,
            options,
            state: Mutex::new(PopupState {
                selection,
                ..PopupState::default()
            }),
            in_flight: AtomicBool::new(false),
            voices: tokio::sync::Mutex::new(VoiceCache::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PopupState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> PopupState {
        self.state().clone()
    }

    pub fn selection(&self) -> LanguageSelection {
        self.state().selection.clone()
    }

    pub fn is_translating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn select_languages(&self, selection: LanguageSelection) {
        self.state().selection = selection;
    }

    pub fn set_source_text(&self, text: impl Into<String>) {
        self.state().source_text = text.into();
    }

    /// Swap the selected languages, and the texts when a translation is shown.
    pub fn swap_languages(&self) {
        let mut state = self.state();
        state.selection = state.selection.swapped();
        if !state.translated_text.is_empty() {
            let PopupState {
                source_text,
                translated_text,
                ..
            } = &mut *state;
            std::mem::swap(source_text, translated_text);
        }
    }

    /// Translate the current source text with the current selection.
    pub async fn translate_current(&self) -> Result<TranslationOutcome, TranslateError> {
        let (text, selection) = {
            let state = self.state();
            (state.source_text.clone(), state.selection.clone())
        };
        self.translate(&text, &selection.source, &selection.target)
            .await
    }

    /// Run the translation pipeline.
    ///
    /// Empty input and a call made while another translation is pending return
    /// immediately without touching any state. Once a request has been issued,
    /// the *current* selection is saved as the last-used pair regardless of the
    /// outcome; it may differ from `source`/`target` if the selection changed
    /// while the request was pending.
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<TranslationOutcome, TranslateError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or_else(|| {
            debug!("Translation already in progress, ignoring");
            TranslateError::AlreadyInProgress
        })?;

        self.state().translated_text.clear();

        let result = match self.client.translate(text, source, target).await {
            Ok(translation) => {
                self.state().translated_text = translation.translated_text.clone();

                let mut outcome = TranslationOutcome {
                    translated_text: translation.translated_text,
                    detected_source: translation.detected_source,
                    recorded: false,
                    show_review_prompt: false,
                };

                if !outcome.translated_text.is_empty() {
                    self.record_success(text, target, &mut outcome).await;
                }

                info!("Translation completed");
                Ok(outcome)
            }
            Err(e) => {
                warn!("Translation failed: {}", e);
                Err(e)
            }
        };

        let selection = self.selection();
        if let Err(e) = self.settings.save_last_pair(&selection).await {
            warn!("Failed to save last languages: {}", e);
        }

        result
    }

    async fn record_success(&self, text: &str, target: &str, outcome: &mut TranslationOutcome) {
        let record = TranslationRecord::new(
            text,
            outcome.translated_text.clone(),
            outcome.detected_source.clone(),
            target,
        );

        match self.history.record(record).await {
            Ok(recorded) => outcome.recorded = recorded,
            Err(e) => warn!("Failed to save history: {}", e),
        }

        match self.engagement.record_success().await {
            Ok(true) => {
                outcome.show_review_prompt = true;
                self.state().review_prompt_visible = true;
            }
            Ok(false) => {}
            Err(e) => warn!("Failed to update translation count: {}", e),
        }
    }

    /// Context-menu entry: pre-fill the source text and, when `auto` is set,
    /// translate after the settle delay. Without text the popup is left as is.
    pub async fn launch(
        &self,
        text: Option<&str>,
        auto: bool,
    ) -> Option<Result<TranslationOutcome, TranslateError>> {
        let text = text.filter(|text| !text.trim().is_empty())?;
        self.set_source_text(text);
        if !auto {
            return None;
        }
        tokio::time::sleep(self.options.auto_translate_delay).await;
        Some(self.translate_current().await)
    }

    /// Load a history record back into the popup.
    pub fn restore_from_history(&self, record: &TranslationRecord) {
        let source = if record.source == PROVIDER_AUTO_DETECT
            || !LanguageCatalog::get().contains(&record.source)
        {
            AUTO_DETECT.to_string()
        } else {
            record.source.clone()
        };

        let mut state = self.state();
        state.source_text = record.original.clone();
        state.translated_text = record.translated.clone();
        state.selection = LanguageSelection::new(source, record.target.clone());
    }

    pub async fn history(&self) -> Result<Vec<TranslationRecord>, StorageError> {
        self.history.load().await
    }

    pub async fn history_view(&self) -> Result<Vec<HistoryEntryView>, StorageError> {
        self.history.view().await
    }

    pub async fn clear_history(&self) -> Result<(), StorageError> {
        self.history.clear().await
    }

    /// The user rated or dismissed the review prompt.
    pub async fn mark_reviewed(&self) -> Result<(), StorageError> {
        self.state().review_prompt_visible = false;
        self.engagement.mark_reviewed().await
    }

    /// Listen once and translate whatever was heard.
    pub async fn listen(
        &self,
        recognizer: &dyn SpeechRecognizer,
    ) -> Result<ListenOutcome, SpeechError> {
        let lang = recognition_language(
            &self.selection().source,
            self.options.system_locale.as_deref(),
        );
        debug!("Listening in {}", lang);

        match recognizer.listen(&lang).await {
            Ok(Some(transcript)) => {
                self.set_source_text(transcript.clone());
                let result = self.translate_current().await;
                Ok(ListenOutcome::Translated { transcript, result })
            }
            Ok(None) => Ok(ListenOutcome::NoResult),
            Err(e) => {
                warn!("Speech recognition failed: {}", e);
                Err(e)
            }
        }
    }

    /// Voices matching the current target language.
    pub async fn voice_options(&self, synthesizer: &dyn SpeechSynthesizer) -> Vec<VoiceOption> {
        let target = self.selection().target;
        let mut cache = self.voices.lock().await;
        if cache.is_empty() {
            cache.refresh(synthesizer).await;
        }
        cache
            .for_language(&target)
            .into_iter()
            .map(|voice| VoiceOption {
                uri: voice.uri.clone(),
                label: voice_label(&voice.name),
            })
            .collect()
    }

    /// The engine's voice list changed.
    pub async fn refresh_voices(&self, synthesizer: &dyn SpeechSynthesizer) {
        self.voices.lock().await.refresh(synthesizer).await;
    }

    /// Read the translated text aloud. An unknown `voice_uri` falls back to the
    /// engine default.
    pub async fn speak(
        &self,
        synthesizer: &dyn SpeechSynthesizer,
        voice_uri: Option<&str>,
    ) -> Result<(), SpeechError> {
        let (text, target) = {
            let state = self.state();
            (state.translated_text.clone(), state.selection.target.clone())
        };
        if text.is_empty() {
            return Err(SpeechError::NothingToSpeak);
        }

        let voice = {
            let mut cache = self.voices.lock().await;
            if voice_uri.is_some() && cache.is_empty() {
                cache.refresh(synthesizer).await;
            }
            voice_uri.and_then(|uri| cache.find(uri).cloned())
        };

        synthesizer.speak(&text, &target, voice.as_ref()).await.map_err(|e| {
            warn!("Speech playback failed: {}", e);
            e
        })
    }
}
