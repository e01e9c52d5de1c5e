//! The channel server's `axum` router (§4.2 Transport, §10.4 Metrics).
//!
//! Three routes: the `/ws` upgrade that starts a Session Controller, and
//! `/health`/`/metrics` for operational visibility. There is no REST
//! surface beyond that — this bridge has no resources to CRUD, unlike the
//! teacher's sales-agent API.

use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::websocket::ws_handler;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    channel: String,
    version: &'static str,
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy",
        channel: state.settings.channel.channel.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::init_metrics;
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use std::sync::Arc;
    use voice_translate_config::{ProviderCredentials, ServerSettings};
    use voice_translate_core::{
        AudioChunk, AudioFormat, ChannelConfig, CoreError, RecognizerEvent, SpeakingFlag,
        SpeechToText, SynthesisEvent, TextToSpeech, Translator,
    };

    struct NullRecognizer;

    #[async_trait]
    impl SpeechToText for NullRecognizer {
        async fn submit(&self, _: AudioChunk) -> Result<(), CoreError> {
            Ok(())
        }
        fn events(&self) -> BoxStream<'static, RecognizerEvent> {
            Box::pin(futures::stream::empty())
        }
        async fn shutdown(&self) {}
    }

    struct NullTranslator;

    #[async_trait]
    impl Translator for NullTranslator {
        async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, CoreError> {
            Ok(String::new())
        }
    }

    struct NullTts;

    #[async_trait]
    impl TextToSpeech for NullTts {
        async fn synthesize(
            &self,
            _: &str,
            _: &str,
            _: u64,
        ) -> Result<BoxStream<'static, SynthesisEvent>, CoreError> {
            Ok(Box::pin(futures::stream::empty()))
        }
    }

    fn settings() -> ServerSettings {
        ServerSettings {
            bind_host: "127.0.0.1".into(),
            bind_port: 0,
            channel: ChannelConfig {
                channel: "ES".into(),
                source_locale: "es-ES".into(),
                target_lang: "en".into(),
                voice: "en-US-JennyNeural".into(),
                audio_format: AudioFormat::DEFAULT,
            },
            stt: ProviderCredentials { key: "k".into(), region: "r".into(), endpoint: None },
            translate: ProviderCredentials { key: "k".into(), region: "r".into(), endpoint: None },
            tts: ProviderCredentials { key: "k".into(), region: "r".into(), endpoint: None },
            chunk_ms: 20,
            heartbeat_timeout_secs: 20,
            max_frame_bytes: 50_000_000,
            log_json: false,
        }
    }

    #[test]
    fn router_builds() {
        let recognizer_factory: crate::session::RecognizerFactory =
            Arc::new(|_speaking: SpeakingFlag| {
                Box::pin(async { Ok(Arc::new(NullRecognizer) as Arc<dyn SpeechToText>) })
            });
        let state = AppState::with_adapters(
            settings(),
            recognizer_factory,
            Arc::new(NullTranslator),
            Arc::new(NullTts),
            init_metrics(),
        );
        let _ = create_router(state);
    }
}
