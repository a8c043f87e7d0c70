//! In-process tests for the HTTP surface.
//!
//! Each test builds the router over a fixed environment map, so no test
//! touches the real process environment.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use devops_demo::readiness::{self, ReadinessFlag};
use devops_demo::state::BootTime;
use devops_demo::templates::init_templates;
use devops_demo::{create_router, AppState};

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn app_with(pairs: &[(&str, &str)], flag: ReadinessFlag) -> Router {
    app_booted(BootTime::now(), pairs, flag)
}

fn app_booted(boot: BootTime, pairs: &[(&str, &str)], flag: ReadinessFlag) -> Router {
    let tera = init_templates().expect("templates");
    create_router(AppState::new(boot, flag, Arc::new(env(pairs)), tera))
}

fn ready_app(pairs: &[(&str, &str)]) -> Router {
    let flag = ReadinessFlag::new();
    readiness::start_timer(&flag, Duration::ZERO);
    app_with(pairs, flag)
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(app, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn healthz_is_ok_even_when_not_ready() {
    let app = app_with(&[("FORCE_NOT_READY", "1")], ReadinessFlag::new());
    let (status, json) = get_json(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert!(json["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn healthz_uptime_never_decreases() {
    let app = ready_app(&[]);
    let mut last = 0;
    for _ in 0..5 {
        let (_, json) = get_json(app.clone(), "/healthz").await;
        let uptime = json["uptime_seconds"].as_u64().unwrap();
        assert!(uptime >= last);
        last = uptime;
    }
}

#[tokio::test]
async fn readyz_ready_immediately_with_zero_delay() {
    let (status, json) = get_json(ready_app(&[]), "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "ready": true }));
}

#[tokio::test(start_paused = true)]
async fn readyz_reports_startup_delay_until_timer_fires() {
    let flag = ReadinessFlag::new();
    readiness::start_timer(&flag, Duration::from_secs(3));
    let app = app_with(&[], flag);

    let (status, json) = get_json(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["ready"], false);
    assert_eq!(json["reason"], "startup delay");

    tokio::time::sleep(Duration::from_millis(2900)).await;
    let (status, _) = get_json(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let (status, json) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
}

#[tokio::test]
async fn readyz_forced_overrides_everything() {
    let app = ready_app(&[
        ("FORCE_NOT_READY", "1"),
        ("DEPENDENCY_REQUIRED", "1"),
        ("DEPENDENCY_OK", "0"),
    ]);
    let (status, json) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["reason"], "forced");
}

#[tokio::test]
async fn readyz_dependency_gate_fails_after_delay() {
    let app = ready_app(&[("DEPENDENCY_REQUIRED", "1"), ("DEPENDENCY_OK", "no")]);
    let (status, json) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["reason"], "dependency check failed");
}

#[tokio::test]
async fn readyz_dependency_gate_passes_by_default() {
    let (status, _) = get_json(ready_app(&[("DEPENDENCY_REQUIRED", "1")]), "/readyz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn root_json_snapshot() {
    let app = ready_app(&[("FAIL_MODE", "nope"), ("MEMORY_HOG_MB", "64")]);
    let (status, json) = get_json(app, "/?json=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "agentic-devops-demo-app");
    assert!(json["uptime_seconds"].is_u64());
    assert_eq!(json["env"]["FAIL_MODE"], "nope");
    assert_eq!(json["env"]["MEMORY_HOG_MB"], "64");
    assert_eq!(json["env"]["CONFIG_PATH"], "/config/config.json");
    assert_eq!(json["env"]["REQUIRE_ENV"], "0");
}

#[tokio::test]
async fn root_html_page() {
    let app = ready_app(&[("STARTUP_DELAY_SECONDS", "30")]);
    let (status, headers, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(body.contains("<title>Agentic DevOps Demo App</title>"));
    assert!(body.contains(r#"<strong id="uptime">0s</strong>"#));
    assert!(body.contains("STARTUP_DELAY_SECONDS"));
    assert!(body.contains("<code>30</code>"));
}

#[tokio::test]
async fn root_html_when_json_param_is_not_one() {
    let (status, headers, body) = get(ready_app(&[]), "/?json=true").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(body.contains("Agentic DevOps Demo App"));
}

#[tokio::test]
async fn root_repeated_json_param_uses_first_value() {
    let (status, json) = get_json(ready_app(&[]), "/?json=1&json=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "agentic-devops-demo-app");

    let (status, headers, _) = get(ready_app(&[]), "/?json=0&json=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn uptime_is_measured_from_process_boot() {
    let boot = BootTime {
        instant: std::time::Instant::now() - Duration::from_secs(90),
        wall: chrono::Utc::now(),
    };
    let flag = ReadinessFlag::new();
    readiness::start_timer(&flag, Duration::ZERO);

    let (_, _, body) = get(app_booted(boot, &[], flag.clone()), "/").await;
    assert!(body.contains(r#"<strong id="uptime">1m 3"#), "{body}");

    let (_, json) = get_json(app_booted(boot, &[], flag), "/healthz").await;
    assert!(json["uptime_seconds"].as_u64().unwrap() >= 90);
}

#[tokio::test]
async fn root_html_escapes_values() {
    let (_, _, body) = get(ready_app(&[("FAIL_MODE", "<script>")]), "/").await;
    assert!(!body.contains("<script>"));
    assert!(body.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn probes_are_not_cacheable() {
    let (_, headers, _) = get(ready_app(&[]), "/readyz").await;
    assert_eq!(headers["cache-control"], "no-store");
    let (_, headers, _) = get(ready_app(&[]), "/healthz").await;
    assert_eq!(headers["cache-control"], "no-store");
    let (_, headers, _) = get(ready_app(&[]), "/").await;
    assert_eq!(headers["cache-control"], "no-cache");
}

#[tokio::test]
async fn every_response_has_request_id() {
    for uri in ["/", "/healthz", "/readyz", "/missing"] {
        let (_, headers, _) = get(ready_app(&[]), uri).await;
        let id = headers["x-request-id"].to_str().unwrap();
        assert!(uuid_like(id), "{uri}: {id}");
    }
}

#[tokio::test]
async fn unknown_path_is_404() {
    let (status, _, _) = get(ready_app(&[]), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|&c| c == '-').count() == 4
}
