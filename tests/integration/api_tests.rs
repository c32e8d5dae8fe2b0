// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_local_app_with_engine, create_push_app, AppOptions, GatedEngine};
use axum::http::StatusCode;
use crawljob::domain::models::job::JobState;
use crawljob::domain::repositories::job_registry::JobRegistry;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const ARTIFACT: &[u8] = br#"[{"title":"Example Domain","url":"https://example.com/","html":"Example Domain"}]"#;

fn example_config() -> Value {
    json!({
        "url": "https://example.com",
        "match": "https://example.com/**",
        "selector": "body"
    })
}

fn gated_app(options: AppOptions) -> (super::helpers::TestApp, Arc<GatedEngine>) {
    let output_dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(GatedEngine::new(output_dir.path(), ARTIFACT));
    let app = create_local_app_with_engine(engine.clone(), output_dir, options);
    (app, engine)
}

/// 提交示例配置后，结果在爬取完成前不可用，完成后返回完整产物
#[tokio::test]
async fn test_example_submission_then_retrieval() {
    let (app, engine) = gated_app(AppOptions::default());

    let response = app.server.post("/crawl").json(&example_config()).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    let id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains(&id.to_string()));
    assert!(message.contains("/retrieve/"));

    let pending = app.server.get(&format!("/retrieve/{}", id)).await;
    assert_eq!(pending.status_code(), StatusCode::NOT_FOUND);
    let pending: Value = pending.json();
    assert_eq!(pending["message"], "Job not yet completed or submitted.");

    engine.release(1);
    let job = app.wait_for_job(id).await.unwrap();
    assert_eq!(job.state, JobState::Completed);

    let done = app.server.get(&format!("/retrieve/{}", id)).await;
    assert_eq!(done.status_code(), StatusCode::OK);
    assert_eq!(done.header("content-type"), "application/json");
    assert_eq!(done.as_bytes().as_ref(), ARTIFACT);
}

#[tokio::test]
async fn test_completed_job_with_missing_artifact_is_server_error() {
    let (app, engine) = gated_app(AppOptions::default());

    let response = app.server.post("/crawl").json(&example_config()).await;
    let body: Value = response.json();
    let id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();

    engine.release(1);
    let job = app.wait_for_job(id).await.unwrap();
    assert_eq!(job.state, JobState::Completed);
    std::fs::remove_file(app.output_dir.path().join(format!("{}.json", id))).unwrap();

    let retrieve = app.server.get(&format!("/retrieve/{}", id)).await;
    assert_eq!(retrieve.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = retrieve.json();
    assert_eq!(body["message"], "Error occurred during retrieving");
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn test_missing_required_field_is_rejected_without_creating_job() {
    let (app, _engine) = gated_app(AppOptions::default());

    let response = app
        .server
        .post("/crawl")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["message"], "Error occurred during crawling");
    assert!(body.get("error").is_some());
    assert!(body.get("id").is_none());
    assert!(app.registry.is_empty());
}

#[tokio::test]
async fn test_out_of_range_value_is_rejected_with_field_details() {
    let (app, _engine) = gated_app(AppOptions::default());
    let mut config = example_config();
    config["maxPagesToCrawl"] = json!(0);

    let response = app.server.post("/crawl").json(&config).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["message"], "Error occurred during crawling");
    let fields = body["error"].as_object().unwrap();
    assert_eq!(fields.len(), 1);
    let (_, errors) = fields.iter().next().unwrap();
    assert_eq!(errors[0]["code"], "range");
    assert!(app.registry.is_empty());
}

#[tokio::test]
async fn test_unparseable_body_is_client_error() {
    let (app, _engine) = gated_app(AppOptions::default());

    let response = app
        .server
        .post("/crawl")
        .bytes("{ not json".into())
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
    assert!(app.registry.is_empty());
}

#[tokio::test]
async fn test_retrieve_unknown_or_malformed_id_is_not_found() {
    let (app, _engine) = gated_app(AppOptions::default());

    let unknown = app
        .server
        .get(&format!("/retrieve/{}", Uuid::new_v4()))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

    let malformed = app.server.get("/retrieve/not-a-job").await;
    assert_eq!(malformed.status_code(), StatusCode::NOT_FOUND);
    let body: Value = malformed.json();
    assert_eq!(body["message"], "Job not yet completed or submitted.");
}

#[tokio::test]
async fn test_concurrent_submissions_get_distinct_ids() {
    let (app, engine) = gated_app(AppOptions::default());

    let responses = futures::future::join_all(
        (0..32).map(|_| async { app.server.post("/crawl").json(&example_config()).await }),
    )
    .await;

    let ids: HashSet<Uuid> = responses
        .iter()
        .map(|response| {
            assert_eq!(response.status_code(), StatusCode::OK);
            let body: Value = response.json();
            Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
        })
        .collect();
    assert_eq!(ids.len(), 32);
    assert_eq!(app.registry.len(), 32);

    engine.release(32);
    for id in ids {
        let job = app.wait_for_job(id).await.unwrap();
        assert_eq!(job.state, JobState::Completed);
    }
}

#[tokio::test]
async fn test_full_registry_rejects_new_jobs() {
    let (app, engine) = gated_app(AppOptions {
        capacity: 1,
        ..AppOptions::default()
    });

    let first = app.server.post("/crawl").json(&example_config()).await;
    assert_eq!(first.status_code(), StatusCode::OK);

    let second = app.server.post("/crawl").json(&example_config()).await;
    assert_eq!(second.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = second.json();
    assert_eq!(body["message"], "Error occurred during crawling");

    // A finished job can be evicted to make room, its artifact goes with it
    engine.release(1);
    let first: Value = first.json();
    let first_id = Uuid::parse_str(first["id"].as_str().unwrap()).unwrap();
    app.wait_for_job(first_id).await;
    let artifact = app.output_dir.path().join(format!("{}.json", first_id));
    assert!(artifact.exists());

    let third = app.server.post("/crawl").json(&example_config()).await;
    assert_eq!(third.status_code(), StatusCode::OK);
    assert!(app.registry.lookup(first_id).await.unwrap().is_none());
    assert!(!artifact.exists());
}

#[tokio::test]
async fn test_push_mode_has_no_retrieve_route() {
    let app = create_push_app().await;
    // Nothing listens on the discard port, the crawl fails fast
    let config = json!({
        "url": "http://127.0.0.1:9/",
        "match": "http://127.0.0.1:9/**"
    });

    let response = app.server.post("/crawl").json(&config).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let id = body["id"].as_str().unwrap();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains(&format!("s3://crawl-results/{}.json", id)));

    let retrieve = app.server.get(&format!("/retrieve/{}", id)).await;
    assert_eq!(retrieve.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_version() {
    let (app, _engine) = gated_app(AppOptions::default());

    let health = app.server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.text(), "OK");

    let version = app.server.get("/version").await;
    assert_eq!(version.text(), env!("CARGO_PKG_VERSION"));
}
