//! Speech recognition seam (§4.4 "Recognizer Adapter").
//!
//! The shape here is push-in, events-out: the caller feeds PCM chunks as
//! they arrive off the wire and, independently, drains a stream of
//! recognizer events. This mirrors how every real continuous-recognition
//! API actually works (a provider-owned background task pushes partial and
//! final results whenever it has them) rather than forcing a
//! request/response shape onto an inherently async, multi-result process.

use crate::audio::AudioChunk;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// One event surfaced by a recognizer session (§4.4 "Recognizer events").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// A non-final partial transcript. Never enqueued, logged only at
    /// trace level — see §4.5 "Ingress Buffer only enqueues finals".
    Partial { text: String },
    /// A finalized, non-empty transcript ready for translation.
    Recognized { text: String },
    /// The provider ended the recognition session on its own (timeout,
    /// quota, connection drop). The session must restart recognition to
    /// keep listening.
    Canceled { reason: String },
}

/// A live recognizer session: one per listening window.
///
/// Implementors own whatever provider connection backs this (a WebSocket,
/// a gRPC stream, ...). The session layer holds this behind `Arc<dyn
/// SpeechToText>` so recognizer restarts (§7 `RecognizerFailed`) can be
/// injected with a mock in tests; `shutdown` is therefore part of the
/// trait rather than left to `Drop`, so its idempotence (§8 property 8) is
/// something a caller — and a test — can observe directly.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Push one chunk of uplink PCM into the recognizer.
    ///
    /// Must not block waiting for a result — recognizer events arrive
    /// independently via `events()`. Errors here are transport-level
    /// failures pushing the chunk, not recognition failures.
    async fn submit(&self, chunk: AudioChunk) -> Result<(), crate::error::CoreError>;

    /// A stream of recognizer events for this session, in arrival order.
    ///
    /// The stream ends only when the provider connection is closed; a
    /// `Canceled` event does not end the stream unless the provider also
    /// closes the underlying connection immediately after.
    fn events(&self) -> BoxStream<'static, RecognizerEvent>;

    /// Shutdown sequence (§4.4, reverse of startup): stop continuous
    /// recognition, close the push stream, unsubscribe. Must be idempotent
    /// and must tolerate provider errors internally rather than propagate
    /// them — there is nothing a caller can do differently on a failed
    /// teardown.
    async fn shutdown(&self);
}
