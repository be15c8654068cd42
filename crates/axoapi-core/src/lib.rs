//! # axoapi core
//!
//! Wraps axum's router so that every registered route is also recorded in
//! an OpenAPI 3.0 document, which the engine serves together with a Redoc
//! page once it starts.
//!
//! This crate is not meant to be used directly. Use `axoapi-rs` instead.

mod config;
mod document;
mod engine;
mod error;
mod group;
pub mod middleware;
mod proxy;
mod server;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;
pub mod view;

// Public API
pub use config::{default_addr, listen_address, EngineConfig, DEFAULT_ADDR, ENV_PREFIX};
pub use document::SchemaDocument;
pub use engine::Engine;
pub use error::{Error, Result};
pub use group::{RouteInfo, RouterGroup};
pub use middleware::{Middleware, Next, TracingLayer};
pub use proxy::{ClientIp, TrustedProxies};
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};
pub use view::{Templates, ViewError};

pub use axoapi_openapi::{
    Info, OpenApiConfig, OpenApiDocument, Operation, Parameter, RedocOptions, RequestBody,
    ResponseSpec, SchemaRef,
};
