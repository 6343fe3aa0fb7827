//! End-to-end HTTP tests: router + token policy + scripted render backend.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pdfgate_core::token::{
    signature_hex, FixedClock, SharedSecret, TokenVerifier, VerificationPolicy,
};
use pdfgate_gateway::{app_state::AppState, config, router};

use common::{Recorder, Script, ScriptedBackend, Step, FAKE_PDF};

const NOW: u64 = 1_700_000_000;
const SECRET: &str = "abc";
const ORIGIN: &str = "http://localhost:5000";

fn required() -> VerificationPolicy {
    let secret = SharedSecret::new(SECRET).unwrap();
    VerificationPolicy::Required(TokenVerifier::with_clock(secret, Arc::new(FixedClock(NOW))))
}

fn app(policy: VerificationPolicy, script: Script) -> (Router, Arc<Recorder>, AppState) {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let (backend, recorder) = ScriptedBackend::new(script);
    let state = AppState::new(cfg, policy, backend);
    (router::build_router(state.clone()).unwrap(), recorder, state)
}

fn token_fields(expiry: u64) -> Value {
    let exp = expiry.to_string();
    let sig = signature_hex(&SharedSecret::new(SECRET).unwrap(), "t1", "s1", &exp).unwrap();
    json!({ "token": "t1", "student_id": "s1", "expiry": expiry, "signature": sig })
}

fn with_url(mut v: Value, url: &str) -> Value {
    v["url"] = json!(url);
    v
}

async fn post(app: Router, path: &str, body: Value) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, bytes)
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn valid_token_renders_pdf() {
    let (app, recorder, _) = app(required(), Script::default());
    let body = with_url(token_fields(NOW + 300), "http://localhost:5000/results/42");

    let (status, headers, bytes) = post(app, "/generate-pdf", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"MYCAREERCHOICES.pdf\""
    );
    assert_eq!(bytes, FAKE_PDF);
    recorder.assert_each_released_once();
}

#[tokio::test]
async fn missing_url_is_rejected_first() {
    let (app, recorder, _) = app(required(), Script::default());
    let (status, _, bytes) = post(app, "/generate-pdf", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&bytes)["error"], "MISSING_INPUT");
    assert_eq!(recorder.launches(), 0);
}

#[tokio::test]
async fn no_token_is_unauthorized() {
    let (app, recorder, state) = app(required(), Script::default());
    let (status, _, bytes) =
        post(app, "/generate-pdf", json!({ "url": "http://localhost:5000/r" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&bytes)["error"], "UNAUTHORIZED");
    assert_eq!(recorder.launches(), 0);
    assert_eq!(state.metrics().token_checks.get(&[("result", "unauthorized")]), 1);
}

#[tokio::test]
async fn partial_token_is_missing_input() {
    let (app, recorder, _) = app(required(), Script::default());
    let mut body = with_url(token_fields(NOW + 300), "http://localhost:5000/r");
    body.as_object_mut().unwrap().remove("signature");

    let (status, _, bytes) = post(app, "/generate-pdf", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&bytes)["error"], "MISSING_INPUT");
    assert_eq!(recorder.launches(), 0);
}

#[tokio::test]
async fn expired_or_forged_token_is_forbidden_without_detail() {
    let mut forged = with_url(token_fields(NOW + 300), "http://localhost:5000/r");
    forged["student_id"] = json!("s2");
    let expired = with_url(token_fields(NOW - 1), "http://localhost:5000/r");
    let mut malformed = with_url(token_fields(NOW + 300), "http://localhost:5000/r");
    malformed["signature"] = json!("not-hex");

    let mut bodies = Vec::new();
    for body in [forged, expired, malformed] {
        let (app, recorder, _) = app(required(), Script::default());
        let (status, _, bytes) = post(app, "/generate-pdf", body).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(recorder.launches(), 0);
        bodies.push(json_body(&bytes));
    }

    // Sub-causes are indistinguishable to the caller.
    assert!(bodies.iter().all(|b| *b == bodies[0]));
    assert_eq!(bodies[0]["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn open_mode_renders_without_token() {
    let (app, recorder, state) = app(VerificationPolicy::Open, Script::default());
    let (status, _, bytes) =
        post(app, "/generate-pdf", json!({ "url": "https://example.com/" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, FAKE_PDF);
    assert_eq!(recorder.launches(), 1);
    assert_eq!(state.metrics().token_checks.get(&[("result", "skipped")]), 1);
}

#[tokio::test]
async fn open_mode_ignores_token_fields_of_any_type() {
    let bodies = [
        json!({ "url": "https://example.com/", "token": 5 }),
        json!({ "url": "https://example.com/", "expiry": -1 }),
        json!({ "url": "https://example.com/", "expiry": 1.5 }),
        json!({ "url": "https://example.com/", "expiry": true, "signature": {} }),
    ];
    for body in bodies {
        let (app, recorder, _) = app(VerificationPolicy::Open, Script::default());
        let (status, _, bytes) = post(app, "/generate-pdf", body.clone()).await;
        assert_eq!(status, StatusCode::OK, "body={body}");
        assert_eq!(bytes, FAKE_PDF);
        assert_eq!(recorder.launches(), 1);
    }
}

#[tokio::test]
async fn mistyped_token_fields_are_invalid_token() {
    let mut negative = with_url(token_fields(NOW + 300), "http://localhost:5000/r");
    negative["expiry"] = json!(-1);
    negative["signature"] =
        json!(signature_hex(&SharedSecret::new(SECRET).unwrap(), "t1", "s1", "-1").unwrap());
    let mut fractional = with_url(token_fields(NOW + 300), "http://localhost:5000/r");
    fractional["expiry"] = json!(1.5);
    let mut boolean = with_url(token_fields(NOW + 300), "http://localhost:5000/r");
    boolean["token"] = json!(true);

    for body in [negative, fractional, boolean] {
        let (app, recorder, state) = app(required(), Script::default());
        let (status, _, bytes) = post(app, "/generate-pdf", body.clone()).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "body={body}");
        assert_eq!(json_body(&bytes)["error"], "INVALID_TOKEN");
        assert_eq!(recorder.launches(), 0);
        assert_eq!(state.metrics().token_checks.get(&[("result", "invalid_token")]), 1);
    }
}

#[tokio::test]
async fn unsupported_scheme_never_reaches_backend() {
    let (app, recorder, _) = app(VerificationPolicy::Open, Script::default());
    let (status, _, bytes) =
        post(app, "/generate-pdf", json!({ "url": "file:///etc/passwd" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&bytes)["error"], "INVALID_INPUT");
    assert_eq!(recorder.launches(), 0);
}

#[tokio::test]
async fn render_failure_is_classified_not_leaked() {
    let (app, recorder, _) = app(
        required(),
        Script {
            navigate: Step::Fail("net::ERR_NAME_NOT_RESOLVED at http://unreachable.invalid"),
            ..Default::default()
        },
    );
    let body = with_url(token_fields(NOW + 300), "http://unreachable.invalid/");

    let (status, _, bytes) = post(app, "/generate-pdf", body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let v = json_body(&bytes);
    assert_eq!(v["error"], "RENDER_FAILED");
    assert_eq!(v["reason"], "navigation_failed");
    assert!(!bytes.windows(3).any(|w| w == b"ERR"), "backend detail leaked");
    recorder.assert_each_released_once();
}

#[tokio::test]
async fn verify_token_endpoint() {
    let (app, _, _) = app(required(), Script::default());

    let (status, _, bytes) = post(app.clone(), "/verify-token", token_fields(NOW + 300)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&bytes), json!({ "valid": true }));

    let (status, _, bytes) = post(app.clone(), "/verify-token", token_fields(NOW - 5)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&bytes), json!({ "valid": false }));

    let mut mistyped = token_fields(NOW + 300);
    mistyped["expiry"] = json!(1.5);
    let (status, _, bytes) = post(app.clone(), "/verify-token", mistyped).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&bytes), json!({ "valid": false }));

    let (status, _, bytes) = post(app, "/verify-token", json!({ "token": "t1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&bytes), json!({ "valid": false, "error": "MISSING_INPUT" }));
}

#[tokio::test]
async fn verify_token_bad_json_keeps_verdict_shape() {
    let (app, _, _) = app(required(), Script::default());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/verify-token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(json_body(&bytes), json!({ "valid": false, "error": "INVALID_INPUT" }));
}

#[tokio::test]
async fn verify_token_open_mode_is_always_valid() {
    let (app, _, _) = app(VerificationPolicy::Open, Script::default());
    let (status, _, bytes) = post(app, "/verify-token", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&bytes), json!({ "valid": true }));
}

#[tokio::test]
async fn cors_allows_only_configured_origin() {
    let preflight = |origin: &'static str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/generate-pdf")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let (app, _, _) = app(required(), Script::default());
    let resp = app.clone().oneshot(preflight(ORIGIN)).await.unwrap();
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);

    let resp = app.oneshot(preflight("http://evil.example")).await.unwrap();
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn ops_endpoints() {
    let (app, _, _) = app(VerificationPolicy::Open, Script::default());
    let (status, _, _) = post(app.clone(), "/generate-pdf", json!({ "url": "https://example.com" })).await;
    assert_eq!(status, StatusCode::OK);

    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::OK);

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let text = String::from_utf8(resp.into_body().collect().await.unwrap().to_bytes().to_vec()).unwrap();
    assert!(text.contains("pdfgate_renders_total{outcome=\"ok\"} 1"), "{text}");
    assert!(text.contains("pdfgate_sessions_open 0"), "{text}");
}
