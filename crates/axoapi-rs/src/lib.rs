//! # axoapi
//!
//! Self-documenting routers for axum.
//!
//! Register routes on an [`Engine`] the way you would on an axum `Router`,
//! passing an [`Operation`] that describes each one. When the engine starts
//! it serves the collected OpenAPI 3.0 document at `/openapi.json` and a
//! Redoc page at `/openapi`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use axoapi_rs::prelude::*;
//!
//! #[derive(Serialize, Schema)]
//! struct Pet {
//!     id: u64,
//!     name: String,
//! }
//!
//! async fn find_pet(Path(id): Path<u64>) -> Json<Pet> {
//!     Json(Pet { id, name: "Rex".into() })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut engine = Engine::with_defaults();
//!     engine.info(Info::new("Pet Store", "1.0.0"));
//!     engine.get(
//!         "/pets/:id",
//!         Operation::new()
//!             .summary("Find pet by ID")
//!             .json_response::<Pet>(200, "A pet"),
//!         find_pet,
//!     );
//!     engine.run(":8080").await
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `tls` - `Engine::run_tls` with rustls
//! - `test-utils` - `TestClient` for driving an engine in tests

// Re-export core functionality
pub use axoapi_core::*;

/// The OpenAPI document model and Redoc rendering
pub mod openapi {
    pub use axoapi_openapi::*;
}

/// Prelude module - import everything you need with `use axoapi_rs::prelude::*`
pub mod prelude {
    // Engine and routing
    pub use axoapi_core::{
        ClientIp, Engine, EngineConfig, Error, Middleware, Next, Result, RouteInfo, RouterGroup,
        SchemaDocument, Templates, TracingLayer, TrustedProxies, ViewError,
    };

    // Document model
    pub use axoapi_openapi::{
        Contact, Info, OpenApiDocument, Operation, Parameter, RedocOptions, RequestBody,
        ResponseSpec, Schema, SchemaRef,
    };

    // axum extractors and responses handlers usually need
    pub use axum::extract::{Extension, Path, Query, Request, State};
    pub use axum::response::{Html, IntoResponse, Response};
    pub use axum::Json;
    pub use axum::http::{Method, StatusCode};

    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let _: fn() -> Result<()> = || Ok(());
        let _ = Operation::new().summary("compiles");
    }
}
