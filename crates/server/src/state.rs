//! Application state shared across axum handlers.
//!
//! There is exactly one session per bound port (§9 "Open questions"), so
//! unlike a multi-tenant server this holds no session registry — just the
//! validated settings, the recognizer factory, and the two stateless
//! provider adapters every new connection's Session Controller needs.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use voice_translate_config::ServerSettings;
use voice_translate_core::{CoreError, SpeakingFlag, SpeechToText, TextToSpeech, Translator};
use voice_translate_providers::{SttAdapter, TranslateAdapter, TtsAdapter};

use crate::session::RecognizerFactory;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ServerSettings>,
    pub recognizer_factory: RecognizerFactory,
    pub translator: Arc<dyn Translator>,
    pub tts: Arc<dyn TextToSpeech>,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(settings: ServerSettings, metrics_handle: PrometheusHandle) -> Self {
        let settings = Arc::new(settings);
        let translator = Arc::new(TranslateAdapter::new(settings.translate.clone()));
        let tts = Arc::new(TtsAdapter::streaming(settings.tts.clone()));
        let recognizer_factory = default_recognizer_factory(settings.clone());
        Self {
            settings,
            recognizer_factory,
            translator,
            tts,
            metrics_handle,
        }
    }

    /// Constructs `AppState` with every collaborator supplied explicitly,
    /// for tests that wire in mock `SpeechToText`/`Translator`/`TextToSpeech`
    /// implementations instead of the real cloud provider adapters (§10.5).
    pub fn with_adapters(
        settings: ServerSettings,
        recognizer_factory: RecognizerFactory,
        translator: Arc<dyn Translator>,
        tts: Arc<dyn TextToSpeech>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            recognizer_factory,
            translator,
            tts,
            metrics_handle,
        }
    }
}

/// Builds the production `RecognizerFactory`: one fresh `SttAdapter`
/// websocket connection per listening window (§4.4 "one websocket per
/// recognition session").
fn default_recognizer_factory(settings: Arc<ServerSettings>) -> RecognizerFactory {
    Arc::new(move |speaking: SpeakingFlag| {
        let settings = settings.clone();
        Box::pin(async move {
            SttAdapter::connect(
                &settings.stt,
                &settings.channel.source_locale,
                settings.channel.audio_format,
                speaking,
            )
            .await
            .map(|adapter| Arc::new(adapter) as Arc<dyn SpeechToText>)
            .map_err(CoreError::from)
        })
    })
}
