//! Session Controller (§4.8) and the concurrency model around it (§5).
//!
//! One call to [`run`] owns one session end to end. Internally it is four
//! cooperative tasks wired together by bounded channels, communicating
//! exclusively through them — no shared mutable state crosses a task
//! boundary except [`SpeakingFlag`], which is written only here and read
//! only by the recognizer adapter's own callback loop.
//!
//! - `ws_reader` drains inbound binary frames off the socket into the
//!   ingress buffer, applying real backpressure: a full ingress buffer
//!   makes `ws_reader` stop reading, which stalls the socket.
//! - `audio_writer` drains the ingress buffer into the recognizer and owns
//!   the recognizer's lifecycle, including the one-shot restart §7
//!   specifies for `RecognizerFailed`.
//! - `pipeline_worker` is the state machine itself: one utterance at a
//!   time through translation and synthesis, the `SpeakingFlag`, and every
//!   control frame's content.
//! - `tts_sender` is the only task that touches the socket's write half,
//!   which is what keeps a binary synthesis frame from ever interleaving
//!   with an unrelated control frame (§5 "Shared resources").

use axum::extract::ws::{Message, WebSocket};
use futures::future::BoxFuture;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use voice_translate_config::ServerSettings;
use voice_translate_core::{
    AudioChunk, ChannelConfig, ControlFrame, CoreError, RecognizerEvent, SessionId, SpeakingFlag,
    SpeechToText, SynthesisEvent, SynthesisFrame, TextToSpeech, TranslationResult, Translator,
    Utterance,
};

/// Builds a fresh recognizer connection for one listening window, given the
/// session's echo-interlock flag. Held as `Arc<dyn SpeechToText>` rather
/// than a concrete adapter type so tests can inject a recognizer backed by
/// a loopback mock instead of a real cloud STT endpoint (§10.5).
pub type RecognizerFactory = Arc<
    dyn Fn(SpeakingFlag) -> BoxFuture<'static, Result<Arc<dyn SpeechToText>, CoreError>>
        + Send
        + Sync,
>;

const INGRESS_BUFFER_CAPACITY: usize = 150;
const UTTERANCE_QUEUE_CAPACITY: usize = 50;
const SIGNAL_CHANNEL_CAPACITY: usize = 8;
const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

const TRANSLATE_TIME_BUDGET: Duration = Duration::from_secs(10);
const SYNTHESIS_TIME_BUDGET: Duration = Duration::from_secs(15);

/// One item on the single multiplexed channel `tts_sender` drains.
///
/// Folding control frames and binary synthesis frames into one channel,
/// rather than giving each its own, is what makes ordering between them
/// free: whichever `pipeline_worker` enqueues first is sent first.
enum Outbound {
    Control(ControlFrame),
    Frame(SynthesisFrame),
}

/// What `audio_writer` tells `pipeline_worker` about the recognizer's
/// health, independent of the text it recognizes.
enum RecognizerSignal {
    Canceled(String),
    /// The recognizer could not be restarted after the first failure, or
    /// never connected at all. Fatal for the session.
    Terminated(String),
}

/// Runs one session to completion. Returns once all four tasks have
/// exited, which happens within the cancellation-promptness bound (§8
/// property 6) of the transport closing or any stage hitting a fatal
/// error.
pub async fn run(
    socket: WebSocket,
    session_id: SessionId,
    settings: Arc<ServerSettings>,
    recognizer_factory: RecognizerFactory,
    translator: Arc<dyn Translator>,
    tts: Arc<dyn TextToSpeech>,
) {
    // Every log line in this session, including the four tasks spawned
    // below, is tagged with this span (§10.1: "session-scoped logs are
    // tagged with the channel label and session id"), so a log aggregator
    // can group one session's output without each call site repeating
    // both fields.
    let span = tracing::info_span!("session", %session_id, channel = %settings.channel.channel);
    run_inner(socket, settings, recognizer_factory, translator, tts, span.clone())
        .instrument(span)
        .await
}

async fn run_inner(
    socket: WebSocket,
    settings: Arc<ServerSettings>,
    recognizer_factory: RecognizerFactory,
    translator: Arc<dyn Translator>,
    tts: Arc<dyn TextToSpeech>,
    span: tracing::Span,
) {
    tracing::info!("session started");
    metrics::gauge!("voice_translate_active_sessions").increment(1.0);

    let (sink, stream) = socket.split();
    let cancel = CancellationToken::new();

    let (ingress_tx, ingress_rx) = mpsc::channel::<AudioChunk>(INGRESS_BUFFER_CAPACITY);
    let (utterance_tx, utterance_rx) = mpsc::channel::<String>(UTTERANCE_QUEUE_CAPACITY);
    let (signal_tx, signal_rx) = mpsc::channel::<RecognizerSignal>(SIGNAL_CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel::<Outbound>(OUTBOUND_CHANNEL_CAPACITY);

    let speaking = SpeakingFlag::new();

    // INIT -> LISTENING: the ready frame is enqueued before any task that
    // could race it onto the wire even exists.
    let _ = outbound_tx.try_send(Outbound::Control(ControlFrame::Ready {
        channel: settings.channel.channel.clone(),
    }));

    let ws_reader_task = tokio::spawn(
        ws_reader(
            stream,
            ingress_tx,
            cancel.clone(),
            Duration::from_secs(settings.heartbeat_timeout_secs),
        )
        .instrument(span.clone()),
    );

    let audio_writer_task = tokio::spawn(
        audio_writer(
            recognizer_factory,
            speaking.clone(),
            ingress_rx,
            utterance_tx,
            signal_tx,
            cancel.clone(),
        )
        .instrument(span.clone()),
    );

    let pipeline_worker_task = tokio::spawn(
        pipeline_worker(
            settings.clone(),
            speaking,
            utterance_rx,
            signal_rx,
            translator,
            tts,
            outbound_tx,
            cancel.clone(),
        )
        .instrument(span.clone()),
    );

    let tts_sender_task =
        tokio::spawn(tts_sender(sink, outbound_rx, cancel).instrument(span.clone()));

    let _ = tokio::join!(
        ws_reader_task,
        audio_writer_task,
        pipeline_worker_task,
        tts_sender_task
    );

    metrics::gauge!("voice_translate_active_sessions").decrement(1.0);
    tracing::info!("session terminated");
}

/// Reads inbound binary (PCM) frames off the socket and pushes them into
/// the ingress buffer. `send().await` rather than `try_send` is the
/// backpressure mechanism §4.3 describes: once the buffer is full this
/// task stops polling the socket, which stalls the TCP connection.
async fn ws_reader(
    mut stream: SplitStream<WebSocket>,
    ingress_tx: mpsc::Sender<AudioChunk>,
    cancel: CancellationToken,
    heartbeat_timeout: Duration,
) {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = tokio::time::timeout(heartbeat_timeout, stream.next()) => next,
        };

        let message = match next {
            Ok(Some(Ok(message))) => message,
            Ok(Some(Err(e))) => {
                tracing::warn!(error = %e, "websocket read error, closing session");
                break;
            }
            Ok(None) => break,
            Err(_elapsed) => {
                tracing::warn!("heartbeat timeout, closing session");
                break;
            }
        };

        match message {
            Message::Binary(bytes) => {
                if ingress_tx.send(AudioChunk::from(bytes)).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            // Ping/Pong/Text: axum answers Pings with Pongs internally; any
            // stray text frame from this client is outside the uplink
            // protocol (§4.2 control frames are server->client only) and is
            // ignored rather than treated as an error.
            _ => continue,
        }
    }

    cancel.cancel();
}

/// Drains the ingress buffer into the recognizer and owns its connection
/// lifecycle, including the one-shot restart §7 assigns to
/// `RecognizerFailed`.
async fn audio_writer(
    recognizer_factory: RecognizerFactory,
    speaking: SpeakingFlag,
    mut ingress_rx: mpsc::Receiver<AudioChunk>,
    utterance_tx: mpsc::Sender<String>,
    signal_tx: mpsc::Sender<RecognizerSignal>,
    cancel: CancellationToken,
) {
    let mut restarted_once = false;

    'connect: loop {
        let adapter = match recognizer_factory(speaking.clone()).await {
            Ok(adapter) => adapter,
            Err(e) => {
                let _ = signal_tx
                    .send(RecognizerSignal::Terminated(e.to_string()))
                    .await;
                cancel.cancel();
                return;
            }
        };

        let mut events = adapter.events();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    adapter.shutdown().await;
                    return;
                }
                chunk = ingress_rx.recv() => {
                    let Some(chunk) = chunk else {
                        adapter.shutdown().await;
                        cancel.cancel();
                        return;
                    };
                    if let Err(e) = adapter.submit(chunk).await {
                        tracing::warn!(error = %e, "recognizer submit failed");
                        adapter.shutdown().await;
                        if restarted_once {
                            let _ = signal_tx
                                .send(RecognizerSignal::Terminated(e.to_string()))
                                .await;
                            cancel.cancel();
                            return;
                        }
                        restarted_once = true;
                        continue 'connect;
                    }
                }
                event = events.next() => {
                    match event {
                        Some(RecognizerEvent::Partial { .. }) => {
                            // §4.5: partials are never enqueued.
                        }
                        Some(RecognizerEvent::Recognized { text }) => {
                            if utterance_tx.try_send(text).is_err() {
                                metrics::counter!("voice_translate_utterances_dropped_total")
                                    .increment(1);
                                tracing::warn!("utterance queue full, dropping recognized text");
                            }
                        }
                        Some(RecognizerEvent::Canceled { reason }) => {
                            let _ = signal_tx
                                .send(RecognizerSignal::Canceled(reason.clone()))
                                .await;
                            adapter.shutdown().await;
                            if restarted_once {
                                let _ = signal_tx
                                    .send(RecognizerSignal::Terminated(reason))
                                    .await;
                                cancel.cancel();
                                return;
                            }
                            restarted_once = true;
                            continue 'connect;
                        }
                        None => {
                            adapter.shutdown().await;
                            if restarted_once {
                                let _ = signal_tx
                                    .send(RecognizerSignal::Terminated(
                                        "recognizer event stream ended".into(),
                                    ))
                                    .await;
                                cancel.cancel();
                                return;
                            }
                            restarted_once = true;
                            continue 'connect;
                        }
                    }
                }
            }
        }
    }
}

/// The Session Controller state machine (§4.8). One utterance at a time,
/// strictly through PROCESSING and SPEAKING, in dequeue order.
async fn pipeline_worker(
    settings: Arc<ServerSettings>,
    speaking: SpeakingFlag,
    mut utterance_rx: mpsc::Receiver<String>,
    mut signal_rx: mpsc::Receiver<RecognizerSignal>,
    translator: Arc<dyn Translator>,
    tts: Arc<dyn TextToSpeech>,
    outbound_tx: mpsc::Sender<Outbound>,
    cancel: CancellationToken,
) {
    let channel = settings.channel.clone();
    let mut sequence: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            signal = signal_rx.recv() => {
                match signal {
                    Some(RecognizerSignal::Canceled(reason)) => {
                        let _ = outbound_tx
                            .send(Outbound::Control(ControlFrame::SttCanceled { reason }))
                            .await;
                    }
                    Some(RecognizerSignal::Terminated(reason)) => {
                        let _ = outbound_tx
                            .send(Outbound::Control(ControlFrame::Error { error: reason }))
                            .await;
                        cancel.cancel();
                        break;
                    }
                    None => {
                        cancel.cancel();
                        break;
                    }
                }
            }
            text = utterance_rx.recv() => {
                let Some(text) = text else {
                    cancel.cancel();
                    break;
                };

                // Sequence numbers are assigned on dequeue, not on
                // recognition (§4.8), so queued items travel as plain text
                // until this point, where they become a proper `Utterance`.
                sequence += 1;
                let utterance = Utterance { text, sequence };
                metrics::counter!("voice_translate_utterances_admitted_total").increment(1);

                process_utterance(
                    utterance,
                    &channel,
                    &speaking,
                    translator.as_ref(),
                    tts.as_ref(),
                    &outbound_tx,
                )
                .await;
            }
        }
    }
}

/// PROCESSING -> SPEAKING -> LISTENING (or PROCESSING -> LISTENING on
/// translation failure) for exactly one utterance.
///
/// The `stt` frame is sent as soon as the utterance is dequeued, ahead of
/// the translate call — §8 scenario S2 requires it to reach the client even
/// when translation subsequently fails, so it cannot wait on that outcome.
async fn process_utterance(
    utterance: Utterance,
    channel: &ChannelConfig,
    speaking: &SpeakingFlag,
    translator: &dyn Translator,
    tts: &dyn TextToSpeech,
    outbound_tx: &mpsc::Sender<Outbound>,
) {
    let Utterance { text, sequence } = utterance;

    // S2: the recognized text is surfaced as its own `stt` frame as soon as
    // the utterance is dequeued, independent of whether translation goes on
    // to succeed — a translation failure must not hide what was recognized.
    let _ = outbound_tx
        .send(Outbound::Control(ControlFrame::Stt { text: text.clone() }))
        .await;

    let translate_started = std::time::Instant::now();
    let translation = tokio::time::timeout(
        TRANSLATE_TIME_BUDGET,
        translator.translate(&text, &channel.source_locale, &channel.target_lang),
    )
    .await;
    metrics::histogram!("voice_translate_translation_latency_seconds")
        .record(translate_started.elapsed().as_secs_f64());

    let translated = match translation {
        Ok(Ok(translated)) => TranslationResult { text: translated, sequence },
        Ok(Err(e)) => {
            tracing::warn!(error = %e, sequence, "translation failed");
            let _ = outbound_tx
                .send(Outbound::Control(ControlFrame::Error {
                    error: e.to_string(),
                }))
                .await;
            return;
        }
        Err(_elapsed) => {
            let _ = outbound_tx
                .send(Outbound::Control(ControlFrame::Error {
                    error: "translation timed out".into(),
                }))
                .await;
            return;
        }
    };

    // §9 open question: an empty translation is a no-op, not an error.
    if translated.text.trim().is_empty() {
        return;
    }

    speaking.set();

    let _ = outbound_tx
        .send(Outbound::Control(ControlFrame::Translate {
            text: translated.text.clone(),
        }))
        .await;
    let _ = outbound_tx.send(Outbound::Control(ControlFrame::TtsStart)).await;

    let synthesis_started = std::time::Instant::now();
    let synth = tokio::time::timeout(
        SYNTHESIS_TIME_BUDGET,
        tts.synthesize(&translated.text, &channel.voice, translated.sequence),
    )
    .await;

    let mut frames = match synth {
        Ok(Ok(frames)) => frames,
        Ok(Err(e)) => {
            speaking.clear();
            let _ = outbound_tx
                .send(Outbound::Control(ControlFrame::Error {
                    error: e.to_string(),
                }))
                .await;
            return;
        }
        Err(_elapsed) => {
            speaking.clear();
            let _ = outbound_tx
                .send(Outbound::Control(ControlFrame::Error {
                    error: "synthesis timed out".into(),
                }))
                .await;
            return;
        }
    };

    let mut failed = false;
    while let Some(event) = frames.next().await {
        match event {
            SynthesisEvent::Frame(frame) => {
                let is_last = frame.is_last;
                if outbound_tx.send(Outbound::Frame(frame)).await.is_err() {
                    failed = true;
                    break;
                }
                if is_last {
                    break;
                }
            }
            SynthesisEvent::Error(message) => {
                let _ = outbound_tx
                    .send(Outbound::Control(ControlFrame::Error { error: message }))
                    .await;
                failed = true;
                break;
            }
        }
    }

    metrics::histogram!("voice_translate_synthesis_latency_seconds")
        .record(synthesis_started.elapsed().as_secs_f64());

    speaking.clear();
    if !failed {
        let _ = outbound_tx.send(Outbound::Control(ControlFrame::TtsEnd)).await;
    }
}

/// The sole writer of the socket's send half (§5 "Shared resources"): both
/// control frames and binary synthesis frames pass through here, in the
/// order `pipeline_worker` enqueued them, so they can never interleave.
async fn tts_sender(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            item = outbound_rx.recv() => {
                let Some(item) = item else { break };
                let message = match item {
                    Outbound::Control(frame) => Message::Text(frame.to_json()),
                    Outbound::Frame(frame) => Message::Binary(frame.bytes.to_vec()),
                };
                if sink.send(message).await.is_err() {
                    break;
                }
            }
        }
    }

    cancel.cancel();
    let _ = sink.close().await;
}
