use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;

fn post(uri: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::get(uri)
        .body(axum::body::Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn predict_rejects_missing_identifiers() {
    let world = seeded_world();
    let router = router_for(&world);

    let response = router
        .oneshot(post(
            "/api/v1/dispatch/predict",
            json!({ "shift_id": "shift-1" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload
        .get("error")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .contains("required"));
}

#[tokio::test]
async fn predict_round_trip_returns_recommendations_and_skips() {
    let world = seeded_world();
    let router = router_for(&world);

    let response = router
        .oneshot(post(
            "/api/v1/dispatch/predict",
            json!({
                "shift_id": "shift-1",
                "organization_id": "org-metro",
                "auto_assign": true
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;

    let recommendations = payload
        .get("recommendations")
        .and_then(serde_json::Value::as_array)
        .expect("recommendations present");
    assert_eq!(recommendations.len(), 1);
    assert_eq!(
        recommendations[0].get("candidate_id"),
        Some(&json!("cand-alpha"))
    );

    let skipped = payload
        .pointer("/guardrails/skipped")
        .and_then(serde_json::Value::as_array)
        .expect("skip list present");
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].get("candidate_id"), Some(&json!("cand-bravo")));
    assert_eq!(skipped[0].get("reason"), Some(&json!("do_not_assign")));

    assert_eq!(payload.get("auto_assigned"), Some(&json!(true)));
    assert!(payload.get("assignment_id").is_some());

    assert_eq!(world.audit.predictions().len(), 1);
}

#[tokio::test]
async fn autofill_requires_an_organization() {
    let world = seeded_world();
    let router = router_for(&world);

    let response = router
        .oneshot(post("/api/v1/dispatch/autofill", json!({})))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn autofill_round_trip_reports_filled_shifts() {
    let world = seeded_world();
    world.shifts.add_open("shift-1", downtown_window());
    let router = router_for(&world);

    let response = router
        .oneshot(post(
            "/api/v1/dispatch/autofill",
            json!({ "organization_id": "org-metro", "limit": 5 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let filled = payload
        .get("filled")
        .and_then(serde_json::Value::as_array)
        .expect("filled present");
    assert_eq!(filled.len(), 1);
    assert_eq!(filled[0].get("shift_id"), Some(&json!("shift-1")));
}

#[tokio::test]
async fn feedback_route_rejects_unknown_assignments() {
    let world = seeded_world();
    let router = router_for(&world);

    let response = router
        .oneshot(post(
            "/api/v1/dispatch/feedback",
            json!({ "assignment_id": "asg-missing", "result": "success" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feedback_route_records_known_assignments() {
    let world = seeded_world();
    world.assignments.add_known("asg-0001");
    let router = router_for(&world);

    let response = router
        .oneshot(post(
            "/api/v1/dispatch/feedback",
            json!({
                "assignment_id": "asg-0001",
                "result": "success",
                "responded_in": 120
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(world.feedback.entries().len(), 1);
}

#[tokio::test]
async fn weights_route_exposes_the_active_vector() {
    let world = seeded_world();
    let router = router_for(&world);

    let response = router
        .oneshot(get("/api/v1/dispatch/weights"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("source"), Some(&json!("default")));
    let accept = payload
        .pointer("/active/accept")
        .and_then(serde_json::Value::as_f64)
        .expect("accept weight present");
    assert!((accept - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn autotune_route_reports_the_pass_outcome() {
    let world = seeded_world();
    let router = router_for(&world);

    let response = router
        .oneshot(post("/api/v1/dispatch/autotune", json!({})))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("success"), Some(&json!(false)));
    assert_eq!(payload.get("reason"), Some(&json!("insufficient_data")));
}
