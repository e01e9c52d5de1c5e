//! The single `/ws` upgrade route.
//!
//! There is no session registry to look up here (§9 "one session per port"):
//! every accepted connection gets its own `SessionId` and is handed straight
//! to `session::run`, which owns it end to end.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::IntoResponse;

use voice_translate_core::SessionId;

use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let session_id = SessionId::new_v4();
    ws.max_frame_size(state.settings.max_frame_bytes)
        .on_upgrade(move |socket| async move {
            crate::session::run(
                socket,
                session_id,
                state.settings.clone(),
                state.recognizer_factory.clone(),
                state.translator.clone(),
                state.tts.clone(),
            )
            .await;
        })
}
