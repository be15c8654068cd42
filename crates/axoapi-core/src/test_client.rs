//! TestClient for driving an engine without binding a socket
//!
//! Requests go through the complete service: routes, schema endpoints,
//! engine middleware and layers.
//!
//! # Example
//!
//! ```rust,ignore
//! use axoapi_core::{Engine, Operation, TestClient};
//!
//! #[tokio::test]
//! async fn documents_pets() {
//!     let mut engine = Engine::new();
//!     engine.get("/pets", Operation::new().summary("List pets"), list_pets);
//!
//!     let client = TestClient::new(engine);
//!     client.get("/pets").await.assert_status(200);
//!
//!     let doc = client.openapi().await;
//!     assert_eq!(doc["paths"]["/pets"]["get"]["summary"], "List pets");
//! }
//! ```

use crate::engine::Engine;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::Router;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::{de::DeserializeOwned, Serialize};
use std::net::SocketAddr;
use tower::ServiceExt;

/// Sends requests straight into an engine's service
#[derive(Debug, Clone)]
pub struct TestClient {
    router: Router,
    schema_path: String,
}

impl TestClient {
    /// Finish setting up `engine` and wrap its service
    pub fn new(engine: Engine) -> Self {
        let schema_path = engine.openapi_config().schema_path.clone();
        Self {
            router: engine.into_router(),
            schema_path,
        }
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a POST request with a JSON body
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> TestResponse {
        self.request(TestRequest::post(path).json(body)).await
    }

    /// Fetch and parse the served OpenAPI document.
    ///
    /// # Panics
    ///
    /// Panics if the document is not served or is not JSON.
    pub async fn openapi(&self) -> serde_json::Value {
        let response = self.get(&self.schema_path).await;
        response.assert_status(200);
        response
            .json()
            .expect("OpenAPI document is not valid JSON")
    }

    /// Send a request built with [`TestRequest`]
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let mut builder = http::Request::builder().method(req.method).uri(req.path);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(req.headers);
        }
        let mut request = builder
            .body(Body::from(req.body.unwrap_or_default()))
            .expect("invalid test request");
        if let Some(peer) = req.peer {
            request.extensions_mut().insert(ConnectInfo(peer));
        }

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        TestResponse::from_response(response).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    peer: Option<SocketAddr>,
}

impl TestRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
            peer: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header; invalid names or values are ignored
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            key.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, val);
        }
        self
    }

    /// Set a JSON body and the matching content type
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(body) {
            self.body = Some(Bytes::from(bytes));
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Pretend the request arrived from `peer`
    pub fn peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }
}

/// A collected response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: axum::response::Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// # Panics
    ///
    /// Panics if the header is missing or has another value.
    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self
            .headers
            .get(key)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    /// # Panics
    ///
    /// Panics if the body doesn't contain `expected`.
    pub fn assert_body_contains(&self, expected: &str) -> &Self {
        let body = self.text();
        assert!(
            body.contains(expected),
            "Expected body to contain '{}', got '{}'",
            expected,
            body
        );
        self
    }
}
