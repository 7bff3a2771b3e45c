// Integration tests against the router directly, via `tower::ServiceExt::oneshot`
// rather than a bound TCP listener.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use zigdocs_server::config::Config;
use zigdocs_server::http::router::build_router;

fn test_app(data_dir: &std::path::Path) -> axum::Router {
    let cfg = Config {
        data_dir: data_dir.to_path_buf(),
        ..Config::default()
    };
    let state = zigdocs_server::build_app_state(&cfg);
    build_router(state)
}

#[tokio::test]
async fn index_page_returns_200() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("zigdocs"));
}

#[tokio::test]
async fn unsupported_host_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/invalid.example/org/repo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("not supported"));
}

#[tokio::test]
async fn invalid_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/github.com/org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("invalid"));
}

#[tokio::test]
async fn cold_miss_returns_queued_page() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/github.com/octocat/hello-world")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("queued"));
}
