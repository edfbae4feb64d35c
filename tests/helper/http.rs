//! In-process HTTP utilities

use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;

use modserver::config::ServerConfig;
use modserver::proxy::server::build_router;

/// Response status, content type and body
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

/// Create a router serving the given module directory
pub fn create_test_router(mod_dir: &Path) -> Router {
    build_router(&ServerConfig::new(mod_dir)).unwrap()
}

/// Create a router with a custom request deadline
pub fn create_test_router_with_timeout(mod_dir: &Path, request_timeout_ms: u64) -> Router {
    let config = ServerConfig {
        request_timeout_ms,
        ..ServerConfig::new(mod_dir)
    };
    build_router(&config).unwrap()
}

/// Send a GET request and return the response with its body unread
pub async fn get_streaming(router: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

/// Send a GET request through the router
pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Method::GET, uri).await
}

pub async fn send(router: &Router, method: Method, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|value| value.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        content_type,
        body,
    }
}
