//! Speech-to-text adapter (§4.4 "Recognizer Adapter", §6 "Provider contract
//! (STT)").
//!
//! Modeled on the documented Azure Cognitive Services Speech streaming
//! protocol and the generic streaming-STT-over-websocket shape used by
//! comparable providers (e.g. Doubao's ASR streaming API): one websocket
//! per recognition session, binary frames carrying uplink PCM, JSON text
//! frames carrying recognition events.
//!
//! The provider connection is owned by two cooperative tasks spawned at
//! `connect` time: a writer draining the `submit()` channel onto the
//! socket, and a reader turning incoming JSON frames into
//! [`RecognizerEvent`]s. Both run until the socket closes or
//! [`SttAdapter::shutdown`] is called.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

use voice_translate_config::ProviderCredentials;
use voice_translate_core::{
    AudioChunk, AudioFormat, CoreError, RecognizerEvent, SpeakingFlag, SpeechToText,
};

use crate::error::ProviderError;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const AUDIO_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Partial { text: String },
    Recognized { text: String },
    Canceled { reason: String },
}

pub struct SttAdapter {
    audio_tx: mpsc::Sender<Vec<u8>>,
    events_rx: Mutex<Option<mpsc::Receiver<RecognizerEvent>>>,
    closed: Arc<AtomicBool>,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
}

impl SttAdapter {
    /// Startup sequence (§4.4): create push stream -> create recognizer ->
    /// subscribe handlers -> start continuous recognition. The websocket
    /// handshake plays the role of "create recognizer"; the two spawned
    /// tasks are "subscribe handlers" and "start continuous recognition".
    pub async fn connect(
        credentials: &ProviderCredentials,
        source_locale: &str,
        format: AudioFormat,
        speaking: SpeakingFlag,
    ) -> Result<Self, ProviderError> {
        let endpoint = credentials.endpoint.clone().unwrap_or_else(|| {
            format!(
                "wss://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1",
                credentials.region
            )
        });
        let url = format!(
            "{}?language={}&format=simple&sampleRate={}&bitsPerSample={}&channels={}",
            endpoint,
            source_locale,
            format.sample_rate,
            format.bits_per_sample,
            format.channels
        );

        let mut request = url
            .into_client_request()
            .map_err(|e| ProviderError::WebSocket(e.to_string()))?;
        request.headers_mut().insert(
            "Ocp-Apim-Subscription-Key",
            credentials
                .key
                .parse()
                .map_err(|_| ProviderError::Protocol("invalid STT subscription key".into()))?,
        );

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| ProviderError::WebSocket(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (audio_tx, mut audio_rx) = mpsc::channel::<Vec<u8>>(AUDIO_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel::<RecognizerEvent>(EVENT_CHANNEL_CAPACITY);
        let closed = Arc::new(AtomicBool::new(false));

        let writer_task = tokio::spawn(async move {
            while let Some(bytes) = audio_rx.recv().await {
                if write.send(Message::Binary(bytes)).await.is_err() {
                    break;
                }
            }
            let _ = write.send(Message::Close(None)).await;
        });

        let reader_task = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => {
                        let _ = events_tx
                            .try_send(RecognizerEvent::Canceled {
                                reason: "connection closed by provider".into(),
                            });
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = events_tx.try_send(RecognizerEvent::Canceled {
                            reason: e.to_string(),
                        });
                        break;
                    }
                };

                let Ok(event) = serde_json::from_str::<WireEvent>(&text) else {
                    tracing::trace!(raw = %text, "unrecognized STT wire frame, ignored");
                    continue;
                };

                let mapped = match event {
                    WireEvent::Partial { text } => RecognizerEvent::Partial { text },
                    WireEvent::Recognized { text } => {
                        let trimmed = text.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        // §4.4: while SpeakingFlag is set, finalized hypotheses
                        // are discarded here at the adapter boundary, not
                        // queued for later delivery.
                        if speaking.is_set() {
                            tracing::trace!(
                                text = %trimmed,
                                "dropping recognized text while SpeakingFlag is set"
                            );
                            continue;
                        }
                        RecognizerEvent::Recognized {
                            text: trimmed.to_string(),
                        }
                    }
                    WireEvent::Canceled { reason } => RecognizerEvent::Canceled { reason },
                };

                // Provider-callback-equivalent path: never block the reader
                // loop on a full queue, drop instead (§9 "Cooperative async
                // vs. provider threads").
                if events_tx.try_send(mapped).is_err() {
                    tracing::warn!("recognizer event queue full, dropping event");
                }
            }
        });

        Ok(Self {
            audio_tx,
            events_rx: Mutex::new(Some(events_rx)),
            closed,
            writer_task,
            reader_task,
        })
    }

}

#[async_trait]
impl SpeechToText for SttAdapter {
    async fn submit(&self, chunk: AudioChunk) -> Result<(), CoreError> {
        self.audio_tx
            .send(chunk.bytes.to_vec())
            .await
            .map_err(|_| ProviderError::WebSocket("STT push stream closed".into()).into())
    }

    fn events(&self) -> BoxStream<'static, RecognizerEvent> {
        let rx = self
            .events_rx
            .try_lock()
            .ok()
            .and_then(|mut guard| guard.take());
        match rx {
            Some(rx) => Box::pin(ReceiverStream::new(rx)),
            None => Box::pin(futures::stream::empty()),
        }
    }

    /// Shutdown sequence (§4.4, reverse order): stop continuous recognition
    /// (abort the reader), close the push stream (drop the audio sender,
    /// letting the writer task finish and close the socket), unsubscribe
    /// (drop the event sender via task completion). Idempotent and
    /// tolerates provider errors (§8 property 8).
    async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

impl Drop for SttAdapter {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Hand-rolled loopback websocket server (§10.5): accepts one
    /// connection, sends the given wire events in order, then closes.
    async fn serve_events(listener: TcpListener, events: Vec<&'static str>) {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        for event in events {
            ws.send(Message::Text(event.to_string())).await.unwrap();
        }
        let _ = ws.close(None).await;
    }

    fn credentials(endpoint: String) -> ProviderCredentials {
        ProviderCredentials { key: "k".into(), region: "eastus".into(), endpoint: Some(endpoint) }
    }

    #[tokio::test]
    async fn emits_only_finalized_nonempty_recognitions() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_events(
            listener,
            vec![
                r#"{"type":"partial","text":"hola"}"#,
                r#"{"type":"recognized","text":"  "}"#,
                r#"{"type":"recognized","text":"hola mundo"}"#,
            ],
        ));

        let adapter = SttAdapter::connect(
            &credentials(format!("ws://{addr}")),
            "es-ES",
            AudioFormat::DEFAULT,
            SpeakingFlag::new(),
        )
        .await
        .unwrap();

        let mut events = adapter.events();
        let mut recognized = Vec::new();
        while let Some(event) = events.next().await {
            match event {
                RecognizerEvent::Recognized { text } => recognized.push(text),
                RecognizerEvent::Partial { .. } | RecognizerEvent::Canceled { .. } => {}
            }
        }

        assert_eq!(recognized, vec!["hola mundo".to_string()]);
    }

    #[tokio::test]
    async fn drops_recognized_events_while_speaking_flag_is_set() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_events(
            listener,
            vec![r#"{"type":"recognized","text":"hello world"}"#],
        ));

        let speaking = SpeakingFlag::new();
        speaking.set();

        let adapter = SttAdapter::connect(
            &credentials(format!("ws://{addr}")),
            "es-ES",
            AudioFormat::DEFAULT,
            speaking,
        )
        .await
        .unwrap();

        let mut events = adapter.events();
        let collected: Vec<_> = events.by_ref().collect().await;
        assert!(
            collected
                .iter()
                .all(|e| !matches!(e, RecognizerEvent::Recognized { .. })),
            "expected no Recognized events while SpeakingFlag is set, got {collected:?}"
        );
    }

    #[tokio::test]
    async fn connection_close_surfaces_as_canceled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_events(listener, vec![]));

        let adapter = SttAdapter::connect(
            &credentials(format!("ws://{addr}")),
            "es-ES",
            AudioFormat::DEFAULT,
            SpeakingFlag::new(),
        )
        .await
        .unwrap();

        let mut events = adapter.events();
        let event = tokio::time::timeout(std::time::Duration::from_secs(2), events.next())
            .await
            .expect("timed out waiting for the canceled event")
            .expect("event stream ended without a Canceled event");
        assert!(matches!(event, RecognizerEvent::Canceled { .. }));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_events(listener, vec![]));

        let adapter = SttAdapter::connect(
            &credentials(format!("ws://{addr}")),
            "es-ES",
            AudioFormat::DEFAULT,
            SpeakingFlag::new(),
        )
        .await
        .unwrap();

        adapter.shutdown().await;
        adapter.shutdown().await;
    }
}
