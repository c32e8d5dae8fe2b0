// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_local_app, create_push_app};
use axum::http::StatusCode;
use crawljob::domain::models::job::{ArtifactLocation, JobState};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                "<html><head><title>{}</title></head><body>{}</body></html>",
                title, body
            ),
            "text/html",
        ))
        .mount(server)
        .await;
}

async fn site() -> MockServer {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<a href="/guide">Guide</a>"#).await;
    mount_page(&server, "/guide", "Guide", "<main>Step one</main>").await;
    server
}

fn submitted_id(body: &Value) -> Uuid {
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

/// 本地检索：爬取完成后返回的内容与磁盘上的产物逐字节一致
#[tokio::test]
async fn test_local_crawl_end_to_end() {
    let site = site().await;
    let app = create_local_app().await;

    let response = app
        .server
        .post("/crawl")
        .json(&json!({
            "url": site.uri(),
            "match": format!("{}/**", site.uri()),
            "selector": "body"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let id = submitted_id(&response.json());

    let job = app.wait_for_job(id).await.unwrap();
    assert_eq!(job.state, JobState::Completed);
    let Some(ArtifactLocation::LocalPath { path }) = job.artifact_location else {
        panic!("expected a local artifact");
    };
    assert_eq!(path, app.output_dir.path().join(format!("{}.json", id)));

    let retrieved = app.server.get(&format!("/retrieve/{}", id)).await;
    assert_eq!(retrieved.status_code(), StatusCode::OK);
    let on_disk = tokio::fs::read(&path).await.unwrap();
    assert_eq!(retrieved.as_bytes().as_ref(), on_disk.as_slice());

    let pages: Vec<Value> = retrieved.json();
    let titles: Vec<_> = pages.iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Home", "Guide"]);
    assert_eq!(pages[1]["html"], "Step one");
}

#[tokio::test]
async fn test_failed_crawl_is_not_retrievable() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;
    let app = create_local_app().await;

    let response = app
        .server
        .post("/crawl")
        .json(&json!({
            "url": site.uri(),
            "match": format!("{}/**", site.uri())
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let id = submitted_id(&response.json());

    let job = app.wait_for_job(id).await.unwrap();
    assert_eq!(job.state, JobState::Failed);
    assert!(job.error.is_some());

    let retrieved = app.server.get(&format!("/retrieve/{}", id)).await;
    assert_eq!(retrieved.status_code(), StatusCode::NOT_FOUND);
}

/// 推送模式：完成后恰好执行一次上传，键为产物名称
#[tokio::test]
async fn test_push_crawl_uploads_once() {
    let site = site().await;
    let app = create_push_app().await;

    let response = app
        .server
        .post("/crawl")
        .json(&json!({
            "url": site.uri(),
            "match": format!("{}/**", site.uri())
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let id = submitted_id(&response.json());

    // Uploaded jobs leave the registry
    assert!(app.wait_for_job(id).await.is_none());

    let storage = app.storage.as_ref().unwrap();
    let puts = storage.puts();
    assert_eq!(puts.len(), 1);
    let (key, body) = &puts[0];
    assert_eq!(key, &format!("{}.json", id));

    let pages: Vec<Value> = serde_json::from_slice(body).unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["url"], format!("{}/", site.uri()));
    assert!(!app.output_dir.path().join(key).exists());
}

/// 并发提交的任务各自独立完成，产物互不混淆
#[tokio::test]
async fn test_concurrent_crawls_keep_artifacts_separate() {
    let server = MockServer::start().await;
    for n in 0..8 {
        mount_page(&server, &format!("/site{}", n), &format!("Site {}", n), "content").await;
    }
    let app = create_local_app().await;

    let responses = futures::future::join_all((0..8).map(|n| {
        let config = json!({
            "url": format!("{}/site{}", server.uri(), n),
            "match": format!("{}/site{}", server.uri(), n)
        });
        let server = &app.server;
        async move { server.post("/crawl").json(&config).await }
    }))
    .await;

    for (n, response) in responses.iter().enumerate() {
        assert_eq!(response.status_code(), StatusCode::OK);
        let id = submitted_id(&response.json());

        let job = app.wait_for_job(id).await.unwrap();
        assert_eq!(job.state, JobState::Completed);

        let pages: Vec<Value> = app.server.get(&format!("/retrieve/{}", id)).await.json();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0]["title"], format!("Site {}", n));
    }
}
