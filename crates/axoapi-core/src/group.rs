//! Route groups that document what they register
//!
//! A [`RouterGroup`] owns an axum [`Router`] scoped to a path prefix. Every
//! route added through it is forwarded to axum unchanged and also recorded
//! in the engine's OpenAPI document under the full, normalized path.

use crate::document::SchemaDocument;
use crate::error::{Error, Result};
use crate::middleware::{apply_chain, Middleware};
use axoapi_openapi::{is_documented_method, join_paths, Operation};
use axum::handler::Handler;
use axum::routing::{on, MethodFilter};
use axum::Router;
use http::Method;
use std::sync::{Arc, Mutex, PoisonError};

/// A registered route, as listed by `Engine::routes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    /// Full path in router syntax, e.g. `/api/pets/:id`
    pub path: String,
}

pub(crate) type RouteTable = Arc<Mutex<Vec<RouteInfo>>>;

macro_rules! method_fns {
    ($($(#[$doc:meta])* $name:ident => $method:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<H, T>(&mut self, path: &str, operation: Operation, handler: H) -> &mut Self
            where
                H: Handler<T, ()>,
                T: 'static,
            {
                self.add_route(Method::$method, MethodFilter::$method, path, operation, handler)
            }
        )*
    };
}

/// A set of routes sharing a path prefix and middleware
///
/// # Example
///
/// ```rust,ignore
/// engine.group("/api", |api| {
///     api.get("/pets", Operation::new().summary("List pets"), list_pets);
///     api.group("/admin", |admin| {
///         admin.delete("/pets/:id", Operation::new(), delete_pet);
///     });
/// });
/// ```
pub struct RouterGroup {
    base_path: String,
    router: Router,
    document: SchemaDocument,
    routes: RouteTable,
}

impl RouterGroup {
    /// The root group of an engine
    pub(crate) fn root(document: SchemaDocument, routes: RouteTable) -> Self {
        Self {
            base_path: "/".to_string(),
            router: Router::new(),
            document,
            routes,
        }
    }

    /// Full path prefix of this group
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Handle to the document this group records into
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// Build a child group under `path`
    pub fn group<F>(&mut self, path: &str, build: F) -> &mut Self
    where
        F: FnOnce(&mut RouterGroup),
    {
        self.group_with(path, Vec::new(), build)
    }

    /// Build a child group under `path` whose routes all run `middleware`
    /// first, in order
    pub fn group_with<I, F>(&mut self, path: &str, middleware: I, build: F) -> &mut Self
    where
        I: IntoIterator<Item = Middleware>,
        F: FnOnce(&mut RouterGroup),
    {
        let mut child = RouterGroup {
            base_path: join_paths(&self.base_path, path),
            router: Router::new(),
            document: self.document.clone(),
            routes: self.routes.clone(),
        };
        build(&mut child);

        let middleware: Vec<Middleware> = middleware.into_iter().collect();
        let child_router = apply_chain(child.router, &middleware);

        let prefix = path.trim_matches('/');
        let router = std::mem::take(&mut self.router);
        self.router = if prefix.is_empty() {
            router.merge(child_router)
        } else {
            router.nest(&format!("/{}", prefix), child_router)
        };
        self
    }

    /// Register a handler for any method axum can route.
    ///
    /// Fails with [`Error::UnsupportedMethod`] when axum has no method filter
    /// for `method` (e.g. an extension method).
    pub fn handle<H, T>(
        &mut self,
        method: Method,
        path: &str,
        operation: Operation,
        handler: H,
    ) -> Result<&mut Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| Error::UnsupportedMethod(method.clone()))?;
        Ok(self.add_route(method, filter, path, operation, handler))
    }

    method_fns! {
        /// Register a GET route
        get => GET;
        /// Register a POST route
        post => POST;
        /// Register a PUT route
        put => PUT;
        /// Register a PATCH route
        patch => PATCH;
        /// Register a DELETE route
        delete => DELETE;
        /// Register a HEAD route
        head => HEAD;
        /// Register an OPTIONS route
        options => OPTIONS;
        /// Register a TRACE route
        trace => TRACE;
    }

    fn add_route<H, T>(
        &mut self,
        method: Method,
        filter: MethodFilter,
        path: &str,
        operation: Operation,
        handler: H,
    ) -> &mut Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let full_path = join_paths(&self.base_path, path);

        if is_documented_method(&method) {
            if self.document.record(&full_path, &method, operation).is_some() {
                tracing::debug!(method = %method, path = %full_path, "replaced documented operation");
            }
        } else {
            tracing::warn!(
                method = %method,
                path = %full_path,
                "OpenAPI 3.0 has no operation for this method, route is not documented"
            );
        }

        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RouteInfo {
                method: method.clone(),
                path: full_path.clone(),
            });
        tracing::debug!(method = %method, path = %full_path, "registered route");

        let route_path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let router = std::mem::take(&mut self.router);
        self.router = router.route(&route_path, on(filter, handler));
        self
    }

    pub(crate) fn router(&self) -> &Router {
        &self.router
    }

    pub(crate) fn update_router(&mut self, f: impl FnOnce(Router) -> Router) {
        let router = std::mem::take(&mut self.router);
        self.router = f(router);
    }
}

impl std::fmt::Debug for RouterGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterGroup")
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}
