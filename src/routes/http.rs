//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; errors render through `AppError`.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::protocol::*;
use crate::state::AppState;
use crate::logic;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(user_id = %body.id))]
pub async fn http_post_sign_in(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SignInIn>,
) -> Result<Json<SignInOut>, AppError> {
  let out = logic::sign_in(&state, body).await?;
  info!(target: "defit_backend", session_id = %out.session_id, points = out.user.progress.points, "HTTP sign_in");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_sign_out(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> impl IntoResponse {
  Json(logic::sign_out(&state, &body.session_id).await)
}

#[instrument(level = "info", skip(state), fields(category = ?q.category, level = ?q.level))]
pub async fn http_get_challenges(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ChallengeListQuery>,
) -> Result<Json<ChallengeListOut>, AppError> {
  let out = logic::list_challenges(&state, q.category, q.level, q.session_id.as_deref()).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(challenge_id = %q.challenge_id))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ChallengeQuery>,
) -> Result<Json<ChallengeOut>, AppError> {
  let out = logic::get_challenge(&state, &q.challenge_id)?;
  info!(target: "challenge", id = %out.id, "HTTP challenge served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(challenge_id = %body.challenge_id, code_len = body.code.len()))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, AppError> {
  let out = logic::submit(&state, body).await?;
  info!(target: "challenge", id = %out.challenge_id, passed = out.passed, new_badges = out.new_badges.len(), "HTTP submit evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, q))]
pub async fn http_get_dashboard(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionIn>,
) -> Result<Json<DashboardOut>, AppError> {
  Ok(Json(logic::dashboard(&state, &q.session_id).await?))
}

#[instrument(level = "info", skip(state, q))]
pub async fn http_get_profile(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionIn>,
) -> Result<Json<ProfileOut>, AppError> {
  Ok(Json(logic::profile(&state, &q.session_id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_badges(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::badges(&state))
}
