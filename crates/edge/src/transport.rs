//! Transport half of the edge client (§4.2).
//!
//! Two cooperative tasks over one `tokio-tungstenite` connection, the same
//! split the server's `SttAdapter` uses internally: an uplink task drains
//! captured PCM onto the socket, a downlink task turns incoming frames into
//! control-frame logging and playback pushes.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use voice_translate_core::ControlFrame;

use crate::error::EdgeError;
use crate::playback::PlaybackSink;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub async fn connect(url: &str) -> Result<WsStream, EdgeError> {
    let (stream, _response) = connect_async(url).await?;
    Ok(stream)
}

/// Drains captured PCM chunks onto the socket until the channel closes or
/// the send fails (peer gone).
pub async fn run_uplink(
    mut sink: futures::stream::SplitSink<WsStream, Message>,
    mut chunk_rx: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    while let Some(chunk) = chunk_rx.recv().await {
        if sink.send(Message::Binary(chunk)).await.is_err() {
            tracing::warn!("uplink send failed, transport likely closed");
            break;
        }
    }
    let _ = sink.close().await;
}

/// Reads control frames and binary synthesis frames until the socket
/// closes, logging the former and routing the latter to `playback`.
pub async fn run_downlink(
    mut stream: futures::stream::SplitStream<WsStream>,
    playback: std::sync::Arc<PlaybackSink>,
) {
    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "downlink read error, closing session");
                break;
            }
        };

        match message {
            Message::Binary(bytes) => playback.push(&bytes),
            Message::Text(text) => match ControlFrame::from_json(&text) {
                Ok(ControlFrame::Ready { channel }) => {
                    tracing::info!(channel, "session ready");
                }
                Ok(ControlFrame::Stt { text }) => tracing::info!(text, "recognized"),
                Ok(ControlFrame::Translate { text }) => tracing::info!(text, "translated"),
                Ok(ControlFrame::TtsStart) => tracing::debug!("synthesis started"),
                Ok(ControlFrame::TtsEnd) => tracing::debug!("synthesis ended"),
                Ok(ControlFrame::Error { error }) => tracing::warn!(error, "session reported error"),
                Ok(ControlFrame::SttCanceled { reason }) => {
                    tracing::warn!(reason, "recognizer canceled, server is restarting it")
                }
                Err(e) => tracing::warn!(error = %e, "malformed control frame, ignored"),
            },
            Message::Close(_) => break,
            _ => continue,
        }
    }
}
