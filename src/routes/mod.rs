//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/auth/sign_in", post(http::http_post_sign_in))
        .route("/api/v1/auth/sign_out", post(http::http_post_sign_out))
        .route("/api/v1/challenges", get(http::http_get_challenges))
        .route("/api/v1/challenge", get(http::http_get_challenge))
        .route("/api/v1/submit", post(http::http_post_submit))
        .route("/api/v1/dashboard", get(http::http_get_dashboard))
        .route("/api/v1/profile", get(http::http_get_profile))
        .route("/api/v1/badges", get(http::http_get_badges))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::store::MemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::new(Catalog::default(), Arc::new(MemoryStore::new()));
        build_router(Arc::new(state))
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = call(&app(), get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn unknown_challenge_is_404_with_error_body() {
        let (status, body) = call(&app(), get("/api/v1/challenge?challengeId=nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown challenge: nope");
    }

    #[tokio::test]
    async fn challenge_payload_hides_the_solution() {
        let (status, body) = call(&app(), get("/api/v1/challenge?challengeId=html-heading")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "First heading");
        assert!(body.get("solution").is_none());
    }

    #[tokio::test]
    async fn sign_in_submit_and_dashboard() {
        let app = app();
        let (status, signed) = call(&app, post_json("/api/v1/auth/sign_in", json!({ "id": "3", "username": "kim" }))).await;
        assert_eq!(status, StatusCode::OK);
        let sid = signed["sessionId"].as_str().unwrap().to_string();
        assert_eq!(signed["user"]["progress"]["points"], 0);

        let submit = json!({ "sessionId": sid, "challengeId": "html-heading", "code": "<h1>\n  Hello\n</h1>" });
        let (status, result) = call(&app, post_json("/api/v1/submit", submit)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["passed"], true);
        assert_eq!(result["newBadges"][0]["id"], "points-100");
        assert_eq!(result["saved"], true);

        let (_, dash) = call(&app, get(&format!("/api/v1/dashboard?sessionId={sid}"))).await;
        assert_eq!(dash["summary"]["points"], 100);
        assert_eq!(dash["summary"]["categories"][1]["levels"][0]["completed"], 1);

        let (_, list) = call(&app, get(&format!("/api/v1/challenges?category=markup_style&level=beginner&sessionId={sid}"))).await;
        assert_eq!(list["challenges"][0]["completed"], true);

        let (status, _) = call(&app, post_json("/api/v1/auth/sign_out", json!({ "sessionId": sid }))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, get(&format!("/api/v1/profile?sessionId={sid}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
