//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Sign-in / sign-out (session lifecycle)
//!   - Challenge listing and lookup
//!   - Submission: evaluate, award on pass, persist
//!   - Dashboard, profile and badge views

use tracing::{error, info, instrument, warn};

use crate::domain::{Category, Level, Profile, Progress};
use crate::error::AppError;
use crate::evaluator::{evaluate, Evaluation};
use crate::progress::{summarize, Award};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state, body), fields(user_id = %body.id))]
pub async fn sign_in(state: &AppState, body: SignInIn) -> Result<SignInOut, AppError> {
  let profile = Profile { id: body.id, username: body.username };
  let session = state.open_session(profile).await?;
  let session = session.lock().await;
  Ok(SignInOut { session_id: session.id.clone(), user: session.user.clone() })
}

#[instrument(level = "info", skip(state))]
pub async fn sign_out(state: &AppState, session_id: &str) -> SignOutOut {
  let signed_out = state.close_session(session_id).await;
  info!(target: "defit_backend", %session_id, signed_out, "Sign-out");
  SignOutOut { signed_out }
}

/// Challenges for one (category, level). With a session, each item carries the
/// user's completion flag.
#[instrument(level = "info", skip(state))]
pub async fn list_challenges(
  state: &AppState,
  category: Category,
  level: Level,
  session_id: Option<&str>,
) -> Result<ChallengeListOut, AppError> {
  let progress = match session_id {
    Some(id) => {
      let session = state.session(id).await?;
      let progress = session.lock().await.user.progress.clone();
      Some(progress)
    }
    None => None,
  };
  let challenges = state
    .catalog
    .filter(category, level)
    .map(|c| to_out(c, progress.as_ref().is_some_and(|p| p.has_completed(&c.id))))
    .collect();
  Ok(ChallengeListOut { category, level, challenges })
}

#[instrument(level = "info", skip(state))]
pub fn get_challenge(state: &AppState, challenge_id: &str) -> Result<ChallengeOut, AppError> {
  state
    .catalog
    .challenge(challenge_id)
    .map(|c| to_out(c, false))
    .ok_or_else(|| AppError::UnknownChallenge(challenge_id.to_string()))
}

/// Evaluate a submission and, on a first pass, award points and badges and save.
///
/// Evaluation runs on the blocking pool before the session lock is taken; the lock
/// is then held from award to save. A failed save is reported via `saved = false`;
/// the awarded progress stays in memory.
#[instrument(level = "info", skip(state, body), fields(challenge_id = %body.challenge_id, code_len = body.code.len()))]
pub async fn submit(state: &AppState, body: SubmitIn) -> Result<SubmitOut, AppError> {
  let challenge = state
    .catalog
    .challenge(&body.challenge_id)
    .ok_or_else(|| AppError::UnknownChallenge(body.challenge_id.clone()))?;
  let session = state.session(&body.session_id).await?;

  let evaluation = evaluate_off_thread(challenge.category, body.code, challenge.solution.clone()).await;
  let mut session = session.lock().await;
  let award = evaluation.passed.then(|| session.record_pass(&state.catalog, challenge));
  let already_completed = award == Some(Award::AlreadyCompleted);

  let saved = match &award {
    Some(Award::Awarded { .. }) => session.persist().await.is_ok(),
    _ => true,
  };
  if !saved {
    warn!(target: "defit_backend", user_id = %session.user.id, "Progress kept in memory only");
  }

  let points_awarded = award.as_ref().map_or(0, Award::points);
  let new_badges = award
    .as_ref()
    .map(Award::new_badges)
    .unwrap_or_default()
    .iter()
    .filter_map(|id| state.catalog.badge(id))
    .map(|b| badge_out(b, true))
    .collect();
  info!(target: "challenge", id = %challenge.id, passed = evaluation.passed, points = points_awarded, saved, "Submission handled");

  Ok(SubmitOut {
    challenge_id: challenge.id.clone(),
    output: evaluation.output,
    passed: evaluation.passed,
    points_awarded,
    already_completed,
    new_badges,
    progress: session.user.progress.clone(),
    saved,
  })
}

async fn evaluate_off_thread(category: Category, code: String, reference: String) -> Evaluation {
  tokio::task::spawn_blocking(move || evaluate(category, &code, &reference))
    .await
    .unwrap_or_else(|e| {
      error!(target: "challenge", error = %e, "Evaluation task failed");
      Evaluation { output: "Error: evaluation failed".into(), passed: false }
    })
}

#[instrument(level = "info", skip(state))]
pub async fn dashboard(state: &AppState, session_id: &str) -> Result<DashboardOut, AppError> {
  let session = state.session(session_id).await?;
  let session = session.lock().await;
  Ok(DashboardOut {
    username: session.user.username.clone(),
    summary: summarize(&session.user.progress, &state.catalog),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn profile(state: &AppState, session_id: &str) -> Result<ProfileOut, AppError> {
  let session = state.session(session_id).await?;
  let session = session.lock().await;
  Ok(ProfileOut {
    user: session.user.clone(),
    badges: badges_for(state, Some(&session.user.progress)),
  })
}

pub fn badges(state: &AppState) -> BadgesOut {
  BadgesOut { badges: badges_for(state, None) }
}

fn badges_for(state: &AppState, progress: Option<&Progress>) -> Vec<BadgeOut> {
  state
    .catalog
    .badges()
    .iter()
    .map(|b| badge_out(b, progress.is_some_and(|p| p.has_badge(&b.id))))
    .collect()
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::catalog::Catalog;
  use crate::store::{MemoryStore, UserStore};

  fn state() -> AppState {
    AppState::new(Catalog::default(), Arc::new(MemoryStore::new()))
  }

  async fn signed_in(state: &AppState) -> String {
    sign_in(state, SignInIn { id: "1".into(), username: "ada".into() })
      .await
      .unwrap()
      .session_id
  }

  fn submission(session_id: &str, challenge_id: &str, code: &str) -> SubmitIn {
    SubmitIn { session_id: session_id.into(), challenge_id: challenge_id.into(), code: code.into() }
  }

  #[tokio::test]
  async fn passing_submission_awards_once_and_saves() {
    let state = state();
    let sid = signed_in(&state).await;

    let out = submit(&state, submission(&sid, "py-hello", "print(\"Hello, World!\")")).await.unwrap();
    assert!(out.passed && out.saved);
    assert_eq!(out.output, "Hello, World!");
    assert_eq!(out.points_awarded, 100);
    let ids: Vec<&str> = out.new_badges.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["points-100", "complete-1"]);

    let again = submit(&state, submission(&sid, "py-hello", "print('Hello, World!')")).await.unwrap();
    assert!(again.passed && again.already_completed);
    assert_eq!(again.points_awarded, 0);
    assert!(again.new_badges.is_empty());
    assert_eq!(again.progress.points, 100);

    let stored = state.store.load("defit_user_1").await.unwrap().unwrap();
    assert_eq!(stored.progress.points, 100);
  }

  #[tokio::test]
  async fn failing_submission_changes_nothing() {
    let state = state();
    let sid = signed_in(&state).await;
    let out = submit(&state, submission(&sid, "py-arithmetic", "print(7 + 6)")).await.unwrap();
    assert!(!out.passed && !out.already_completed);
    assert_eq!(out.output, "13");
    assert_eq!(out.progress, Progress::default());
  }

  #[tokio::test]
  async fn unknown_ids_are_errors() {
    let state = state();
    let sid = signed_in(&state).await;
    assert!(matches!(
      submit(&state, submission(&sid, "nope", "")).await,
      Err(AppError::UnknownChallenge(_))
    ));
    assert!(matches!(
      submit(&state, submission("stale", "py-hello", "")).await,
      Err(AppError::UnknownSession(_))
    ));
    assert!(matches!(get_challenge(&state, "nope"), Err(AppError::UnknownChallenge(_))));
  }

  #[tokio::test]
  async fn views_reflect_progress() {
    let state = state();
    let sid = signed_in(&state).await;
    submit(&state, submission(&sid, "html-image", "<img alt=\"\" src=\"logo.png\">")).await.unwrap();

    let list = list_challenges(&state, Category::MarkupStyle, Level::Beginner, Some(&sid)).await.unwrap();
    let done: Vec<(&str, bool)> = list.challenges.iter().map(|c| (c.id.as_str(), c.completed)).collect();
    assert_eq!(done, vec![("html-heading", false), ("html-link", false), ("html-image", true)]);

    let dash = dashboard(&state, &sid).await.unwrap();
    assert_eq!(dash.summary.completed, 1);

    let prof = profile(&state, &sid).await.unwrap();
    let earned: Vec<&str> = prof.badges.iter().filter(|b| b.earned).map(|b| b.id.as_str()).collect();
    assert_eq!(earned, vec!["points-100", "complete-1"]);
    assert!(badges(&state).badges.iter().all(|b| !b.earned));
  }

  #[tokio::test]
  async fn runaway_submission_is_answered_without_taking_the_server_down() {
    let state = state();
    let sid = signed_in(&state).await;

    let chain = format!("print(1{})", "+1".repeat(30_000));
    let out = submit(&state, submission(&sid, "py-arithmetic", &chain)).await.unwrap();
    assert!(!out.passed);
    assert!(out.output.starts_with("Evaluation error:"));

    let growth = "x = [0] * 1000\ny = [x] * 1000\nprint(y)";
    let out = submit(&state, submission(&sid, "py-arithmetic", growth)).await.unwrap();
    assert!(!out.passed);
    assert!(out.output.starts_with("Error: limit exceeded"));

    // the session is still usable afterwards
    let ok = submit(&state, submission(&sid, "py-hello", "print('Hello, World!')")).await.unwrap();
    assert!(ok.passed);
  }

  #[tokio::test]
  async fn sign_out_ends_the_session() {
    let state = state();
    let sid = signed_in(&state).await;
    assert!(sign_out(&state, &sid).await.signed_out);
    assert!(!sign_out(&state, &sid).await.signed_out);
    assert!(matches!(dashboard(&state, &sid).await, Err(AppError::UnknownSession(_))));
  }
}
