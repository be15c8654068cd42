//! Middleware support for axoapi
//!
//! Middleware is registered on the engine (`use_middleware`), on a route
//! group (`group_with`), or on the schema endpoints (`schema_middleware`).
//! Tower layers go through `Engine::layer` instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use axoapi_rs::prelude::*;
//!
//! let mut engine = Engine::new();
//! engine.use_middleware([TracingLayer::new().into()]);
//! engine.get("/", Operation::new(), handler);
//! engine.run(":8080").await
//! ```

mod layer;
mod tracing_layer;

pub(crate) use layer::apply_chain;
pub use layer::{BoxFuture, Middleware};
pub use tracing_layer::TracingLayer;

pub use axum::middleware::Next;
