//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::AppError;
use crate::protocol::{ClientWsMessage, ServerWsMessage, SignInIn, SubmitIn};
use crate::logic;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "defit_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "defit_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply = handle_text(&txt, &state).await;
        let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "defit_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "defit_backend", "WebSocket disconnected");
}

/// Parse one text frame and produce the reply, errors included.
pub async fn handle_text(txt: &str, state: &AppState) -> ServerWsMessage {
  match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "defit_backend", message = ?incoming, "WS received");
      handle_client_ws(incoming, state)
        .await
        .unwrap_or_else(|e| ServerWsMessage::Error { message: e.to_string() })
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
  }
}

#[instrument(level = "info", skip_all)]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> Result<ServerWsMessage, AppError> {
  let reply = match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::SignIn { id, username } => {
      ServerWsMessage::SignedIn(logic::sign_in(state, SignInIn { id, username }).await?)
    }

    ClientWsMessage::SignOut { session_id } => ServerWsMessage::SignedOut(logic::sign_out(state, &session_id).await),

    ClientWsMessage::ListChallenges { category, level, session_id } => {
      ServerWsMessage::Challenges(logic::list_challenges(state, category, level, session_id.as_deref()).await?)
    }

    ClientWsMessage::GetChallenge { challenge_id } => {
      let challenge = logic::get_challenge(state, &challenge_id)?;
      info!(target: "challenge", id = %challenge.id, "WS challenge served");
      ServerWsMessage::Challenge { challenge }
    }

    ClientWsMessage::Submit { session_id, challenge_id, code } => {
      let out = logic::submit(state, SubmitIn { session_id, challenge_id, code }).await?;
      info!(target: "challenge", id = %out.challenge_id, passed = out.passed, new_badges = out.new_badges.len(), "WS submit evaluated");
      ServerWsMessage::SubmitResult(out)
    }

    ClientWsMessage::Dashboard { session_id } => ServerWsMessage::Dashboard(logic::dashboard(state, &session_id).await?),

    ClientWsMessage::Profile { session_id } => ServerWsMessage::Profile(logic::profile(state, &session_id).await?),

    ClientWsMessage::Badges => ServerWsMessage::Badges(logic::badges(state)),
  };
  Ok(reply)
}
