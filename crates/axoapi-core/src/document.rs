//! Shared handle to the OpenAPI document

use axoapi_openapi::{Info, OpenApiDocument, Operation};
use http::Method;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The OpenAPI document of one engine.
///
/// The engine creates the handle and passes a clone into every route group,
/// so all registrations land in the same document. Writes are expected
/// during setup; once serving starts, the schema endpoint only reads. The
/// lock makes later mutation safe, and the next request sees it.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    inner: Arc<RwLock<OpenApiDocument>>,
}

impl SchemaDocument {
    pub fn new(document: OpenApiDocument) -> Self {
        Self {
            inner: Arc::new(RwLock::new(document)),
        }
    }

    /// Replace the document's info block
    pub fn set_info(&self, info: Info) {
        self.write().set_info(info);
    }

    /// Read access to the document
    pub fn read(&self) -> RwLockReadGuard<'_, OpenApiDocument> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the document, for callers that need more than routes
    pub fn write(&self) -> RwLockWriteGuard<'_, OpenApiDocument> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current document
    pub fn snapshot(&self) -> OpenApiDocument {
        self.read().clone()
    }

    /// Record `operation` under the normalized `path` and `method`,
    /// returning the operation it replaced.
    pub fn record(&self, path: &str, method: &Method, operation: Operation) -> Option<Operation> {
        self.write().add_operation(path, method, operation)
    }
}

impl Default for SchemaDocument {
    fn default() -> Self {
        Self::new(OpenApiDocument::default())
    }
}
