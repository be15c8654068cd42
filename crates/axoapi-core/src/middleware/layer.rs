//! Middleware chains for axoapi routes
//!
//! A [`Middleware`] is an async function of the request and the rest of the
//! chain. Returning a response without calling `next.run(req)` aborts the
//! chain; nothing after it (including the handler) runs.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::Router;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed middleware future
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

type BoxedMiddleware = Arc<dyn Fn(Request, Next) -> BoxFuture + Send + Sync>;

/// A cloneable, type-erased middleware function
#[derive(Clone)]
pub struct Middleware {
    inner: BoxedMiddleware,
}

impl Middleware {
    /// Wrap an async function as middleware
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use axoapi_core::middleware::Middleware;
    ///
    /// let auth = Middleware::from_fn(|req, next| async move {
    ///     if req.headers().contains_key("x-api-key") {
    ///         next.run(req).await
    ///     } else {
    ///         StatusCode::UNAUTHORIZED.into_response()
    ///     }
    /// });
    /// ```
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |req: Request, next: Next| -> BoxFuture {
                Box::pin(f(req, next))
            }),
        }
    }

    /// Run this middleware for one request
    pub async fn call(&self, req: Request, next: Next) -> Response {
        (self.inner)(req, next).await
    }

    /// Wrap every route currently in `router` with this middleware
    pub(crate) fn wrap(&self, router: Router) -> Router {
        let middleware = self.clone();
        router.layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            let middleware = middleware.clone();
            async move { middleware.call(req, next).await }
        }))
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware").finish_non_exhaustive()
    }
}

/// Wrap the routes of `router` so `chain` runs in order, first entry outermost
pub(crate) fn apply_chain(router: Router, chain: &[Middleware]) -> Router {
    chain
        .iter()
        .rev()
        .fold(router, |router, middleware| middleware.wrap(router))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use http::StatusCode;
    use std::sync::Mutex;
    use tower::ServiceExt;

    fn recorder(id: usize, order: Arc<Mutex<Vec<(usize, &'static str)>>>) -> Middleware {
        Middleware::from_fn(move |req, next| {
            let order = order.clone();
            async move {
                order.lock().unwrap().push((id, "pre"));
                let response = next.run(req).await;
                order.lock().unwrap().push((id, "post"));
                response
            }
        })
    }

    fn request(path: &str) -> Request {
        http::Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn chain_runs_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let chain = vec![recorder(0, order.clone()), recorder(1, order.clone())];
        let router = apply_chain(Router::new().route("/", get(|| async { "ok" })), &chain);

        let response = router.oneshot(request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *order.lock().unwrap(),
            vec![(0, "pre"), (1, "pre"), (1, "post"), (0, "post")]
        );
    }

    #[tokio::test]
    async fn short_circuit_skips_the_rest() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let deny = Middleware::from_fn(|_req, _next| async { StatusCode::FORBIDDEN.into_response() });
        let chain = vec![deny, recorder(1, order.clone())];
        let router = apply_chain(Router::new().route("/", get(|| async { "ok" })), &chain);

        let response = router.oneshot(request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(order.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_chain_leaves_router_alone() {
        let router = apply_chain(Router::new().route("/", get(|| async { "ok" })), &[]);
        let response = router.oneshot(request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
