//! The axoapi engine

use crate::config::{default_addr, listen_address, EngineConfig};
use crate::document::SchemaDocument;
use crate::error::{Error, Result};
use crate::group::{RouteInfo, RouteTable, RouterGroup};
use crate::middleware::{apply_chain, Middleware, TracingLayer};
use crate::proxy::{resolve_client_ip, TrustedProxies};
use crate::server;
use crate::view::Templates;
use axoapi_openapi::{
    openapi_json, redoc_html, Info, OpenApiConfig, OpenApiDocument, Operation, RedocOptions,
    RedocUi,
};
use axum::extract::Request;
use axum::handler::Handler;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter, Route};
use axum::{Extension, Router};
use http::Method;
use std::convert::Infallible;
use std::path::Path;
use std::sync::{Arc, PoisonError};
use tokio::net::TcpListener;
use tower::{Layer, Service, ServiceExt};
use tower_http::catch_panic::CatchPanicLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type RouterFn = Arc<dyn Fn(Router) -> Router + Send + Sync>;

macro_rules! root_method_fns {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($name), "` route on the root group")]
            pub fn $name<H, T>(&mut self, path: &str, operation: Operation, handler: H) -> &mut Self
            where
                H: Handler<T, ()>,
                T: 'static,
            {
                self.root.$name(path, operation, handler);
                self.service = None;
                self
            }
        )*
    };
}

/// An axum router that documents itself
///
/// Routes are registered through the engine or its groups, each with an
/// [`Operation`] describing it. Starting the engine mounts the OpenAPI
/// document at `/openapi.json` and a Redoc page at `/openapi` unless
/// configured otherwise.
///
/// # Example
///
/// ```rust,ignore
/// use axoapi_rs::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let mut engine = Engine::with_defaults();
///     engine.info(Info::new("Pet Store", "1.0.0"));
///     engine.get("/pets/:id", Operation::new().summary("Find pet by ID"), find_pet);
///     engine.run(":8080").await
/// }
/// ```
pub struct Engine {
    root: RouterGroup,
    document: SchemaDocument,
    routes: RouteTable,
    addr: Option<String>,
    openapi: OpenApiConfig,
    ui_options: Option<RedocOptions>,
    schema_middleware: Vec<Middleware>,
    wrappers: Vec<RouterFn>,
    trusted_proxies: TrustedProxies,
    templates: Option<Templates>,
    schema_mounted: bool,
    service: Option<Router>,
}

impl Engine {
    /// Create an engine with no middleware
    pub fn new() -> Self {
        init_tracing();

        let document = SchemaDocument::new(OpenApiDocument::default());
        let routes = RouteTable::default();
        Self {
            root: RouterGroup::root(document.clone(), routes.clone()),
            document,
            routes,
            addr: None,
            openapi: OpenApiConfig::default(),
            ui_options: None,
            schema_middleware: Vec::new(),
            wrappers: Vec::new(),
            trusted_proxies: TrustedProxies::none(),
            templates: None,
            schema_mounted: false,
            service: None,
        }
    }

    /// Create an engine that logs every request and turns handler panics
    /// into `500` responses
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine
            .use_middleware([TracingLayer::new().into()])
            .layer(CatchPanicLayer::new());
        engine
    }

    /// Create an engine from loaded configuration
    pub fn from_config(config: EngineConfig) -> Self {
        let mut engine = Self::new();
        engine.addr = Some(config.addr);
        engine.openapi = config.openapi;
        engine
    }

    /// Replace the document's info block
    pub fn info(&mut self, info: Info) -> &mut Self {
        self.document.set_info(info);
        self
    }

    /// Shared handle to the OpenAPI document.
    ///
    /// Changes made through it are served on the next request, even after
    /// the engine has started.
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn schema_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.openapi.schema_path = path.into();
        self
    }

    pub fn schema_ui_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.openapi.schema_ui_path = path.into();
        self
    }

    /// Serve neither the document nor the UI. There is no way back.
    pub fn disable_schema_handler(&mut self) -> &mut Self {
        self.openapi.enabled = false;
        self
    }

    /// Middleware run before both schema endpoints, replacing any set before
    pub fn schema_middleware<I>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        self.schema_middleware = middleware.into_iter().collect();
        self
    }

    /// Display options for the mounted Redoc page
    pub fn schema_ui_options(&mut self, options: RedocOptions) -> &mut Self {
        self.ui_options = Some(options);
        self
    }

    /// Middleware run for every request, including the schema endpoints
    /// and unmatched paths
    pub fn use_middleware<I>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        for middleware in middleware {
            self.wrappers
                .push(Arc::new(move |router: Router| middleware.wrap(router)));
        }
        self.service = None;
        self
    }

    /// Wrap every request in a tower layer.
    ///
    /// Layers and middleware nest in registration order: the first one
    /// added sees the request first.
    pub fn layer<L>(&mut self, layer: L) -> &mut Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.wrappers
            .push(Arc::new(move |router: Router| router.layer(layer.clone())));
        self.service = None;
        self
    }

    /// Handler for requests no route matches
    pub fn no_route<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.root.update_router(|router| router.fallback(handler));
        self.service = None;
        self
    }

    /// Trust forwarding headers from these addresses or CIDR ranges when
    /// resolving [`ClientIp`](crate::ClientIp)
    pub fn trusted_proxies<I, S>(&mut self, proxies: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.trusted_proxies = TrustedProxies::parse(proxies)?;
        self.service = None;
        Ok(self)
    }

    /// Load HTML templates matching a glob pattern
    pub fn load_html_glob(&mut self, pattern: &str) -> Result<&mut Self> {
        let templates = Templates::from_glob(pattern)?;
        Ok(self.set_html_template(templates))
    }

    /// Load HTML templates from a list of files
    pub fn load_html_files<I, P>(&mut self, files: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let templates = Templates::from_files(files)?;
        Ok(self.set_html_template(templates))
    }

    /// Make `templates` available to handlers as `Extension<Templates>`
    pub fn set_html_template(&mut self, templates: Templates) -> &mut Self {
        tracing::debug!(templates = ?templates.template_names(), "loaded HTML templates");
        self.templates = Some(templates);
        self.service = None;
        self
    }

    pub(crate) fn openapi_config(&self) -> &OpenApiConfig {
        &self.openapi
    }

    /// Every route registered so far, in registration order
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A `GET` endpoint that serves the current document as JSON
    pub fn schema_handler(&self) -> MethodRouter {
        let document = self.document.clone();
        get(move || {
            let document = document.clone();
            async move { openapi_json(&document.read()) }
        })
    }

    /// A `GET` endpoint that serves the Redoc page.
    ///
    /// Without options the download button is hidden.
    pub fn schema_ui_handler(&self, options: Option<RedocOptions>) -> MethodRouter {
        let options = options.unwrap_or_else(RedocOptions::builtin);
        let ui = Arc::new(RedocUi::new(&self.openapi.schema_path, &options));
        get(move || {
            let ui = ui.clone();
            async move { redoc_html(&ui) }
        })
    }

    /// Build a child group on the root
    pub fn group<F>(&mut self, path: &str, build: F) -> &mut Self
    where
        F: FnOnce(&mut RouterGroup),
    {
        self.root.group(path, build);
        self.service = None;
        self
    }

    /// Build a child group on the root with its own middleware
    pub fn group_with<I, F>(&mut self, path: &str, middleware: I, build: F) -> &mut Self
    where
        I: IntoIterator<Item = Middleware>,
        F: FnOnce(&mut RouterGroup),
    {
        self.root.group_with(path, middleware, build);
        self.service = None;
        self
    }

    /// Register a route for an arbitrary method on the root group
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
        self.root.handle(method, path, operation, handler)?;
        self.service = None;
        Ok(self)
    }

    root_method_fns!(get, post, put, patch, delete, head, options, trace);

    /// Mount the schema endpoints, once.
    fn prepare(&mut self) {
        if self.schema_mounted {
            return;
        }
        self.schema_mounted = true;

        if !self.openapi.enabled {
            tracing::debug!("schema handler disabled");
            return;
        }

        let endpoints = Router::new()
            .route(&self.openapi.schema_path, self.schema_handler())
            .route(
                &self.openapi.schema_ui_path,
                self.schema_ui_handler(self.ui_options.clone()),
            );
        let endpoints = apply_chain(endpoints, &self.schema_middleware);
        self.root.update_router(|router| router.merge(endpoints));
        self.service = None;

        tracing::info!(
            schema_path = %self.openapi.schema_path,
            schema_ui_path = %self.openapi.schema_ui_path,
            "serving OpenAPI document"
        );
    }

    /// The complete service: routes, schema endpoints, middleware and layers
    fn service(&mut self) -> Router {
        self.prepare();
        if let Some(service) = &self.service {
            return service.clone();
        }

        let mut router = self.root.router().clone();
        for wrap in self.wrappers.iter().rev() {
            router = wrap(router);
        }
        router = resolve_client_ip(router, self.trusted_proxies.clone());
        if let Some(templates) = &self.templates {
            router = router.layer(Extension(templates.clone()));
        }

        self.service = Some(router.clone());
        router
    }

    /// Finish setup and hand the service to another server
    pub fn into_router(mut self) -> Router {
        self.service()
    }

    /// Dispatch a single request without a socket
    pub async fn serve_request<B>(&mut self, request: http::Request<B>) -> Response
    where
        B: axum::body::HttpBody<Data = bytes::Bytes> + Send + 'static,
        B::Error: Into<axum::BoxError>,
    {
        let request = request.map(axum::body::Body::new);
        match self.service().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    /// Listen on `addr` (`":8080"` means all interfaces) and serve forever
    pub async fn run(&mut self, addr: &str) -> Result<()> {
        let addr = listen_address(addr);
        let listener = TcpListener::bind(&addr).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::InvalidInput {
                Error::InvalidAddress(addr.clone())
            } else {
                Error::Io(err)
            }
        })?;
        self.run_listener(listener).await
    }

    /// Listen on the configured address, `PORT`, or `0.0.0.0:8080`
    pub async fn run_default(&mut self) -> Result<()> {
        let addr = self.addr.clone().unwrap_or_else(default_addr);
        self.run(&addr).await
    }

    /// Serve on an already bound listener
    pub async fn run_listener(&mut self, listener: TcpListener) -> Result<()> {
        let router = self.service();
        server::serve_tcp(listener, router).await
    }

    /// Serve on a bound standard library listener
    pub async fn run_std_listener(&mut self, listener: std::net::TcpListener) -> Result<()> {
        listener.set_nonblocking(true)?;
        let listener = TcpListener::from_std(listener)?;
        self.run_listener(listener).await
    }

    /// Serve on an inherited listening socket, e.g. from systemd.
    ///
    /// The engine takes ownership of `fd` and closes it when serving stops.
    #[cfg(unix)]
    pub async fn run_fd(&mut self, fd: std::os::fd::OwnedFd) -> Result<()> {
        self.run_std_listener(std::net::TcpListener::from(fd)).await
    }

    /// Serve on a Unix domain socket at `path`
    #[cfg(unix)]
    pub async fn run_unix(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let listener = tokio::net::UnixListener::bind(path)?;
        let router = self.service();
        server::serve_unix(listener, router).await
    }

    /// Serve HTTPS on `addr` with PEM encoded certificate chain and key
    #[cfg(feature = "tls")]
    pub async fn run_tls(&mut self, addr: &str, cert_file: &str, key_file: &str) -> Result<()> {
        let acceptor = server::tls_acceptor(cert_file, key_file)?;
        let addr = listen_address(addr);
        let listener = TcpListener::bind(&addr).await?;
        let router = self.service();
        server::serve_tls(listener, acceptor, router).await
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("openapi", &self.openapi)
            .field("routes", &self.routes().len())
            .field("schema_mounted", &self.schema_mounted)
            .finish_non_exhaustive()
    }
}

/// Install the global subscriber unless one is already set
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,axoapi=debug")))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ClientIp;
    use crate::view::Context;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use http::{header, StatusCode};
    use http_body_util::BodyExt;
    use std::net::SocketAddr;
    use std::sync::Mutex;

    fn get_request(uri: &str) -> http::Request<Body> {
        http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn fetch(engine: &mut Engine, uri: &str) -> (StatusCode, http::HeaderMap, String) {
        let response = engine.serve_request(get_request(uri)).await;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn serves_document_and_ui_at_default_paths() {
        let mut engine = Engine::new();
        engine.info(Info::new("Pet Store", "1.0.0"));
        engine.get("/pets/:id", Operation::new().summary("Find pet by ID"), || async { "pet" });

        let (status, headers, body) = fetch(&mut engine, "/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["openapi"], "3.0.0");
        assert_eq!(json["info"]["title"], "Pet Store");
        assert_eq!(json["paths"]["/pets/{id}"]["get"]["summary"], "Find pet by ID");

        let (status, headers, body) = fetch(&mut engine, "/openapi").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert!(body.contains(r#"Redoc.init("/openapi.json", {"hideDownloadButton":true}"#));

        assert_eq!(fetch(&mut engine, "/pets/1").await.2, "pet");
    }

    #[tokio::test]
    async fn custom_paths_and_options() {
        let mut engine = Engine::new();
        engine
            .schema_path("/docs/spec.json")
            .schema_ui_path("/docs")
            .schema_ui_options(RedocOptions::new().disable_search(true));

        assert_eq!(fetch(&mut engine, "/openapi.json").await.0, StatusCode::NOT_FOUND);
        assert_eq!(fetch(&mut engine, "/docs/spec.json").await.0, StatusCode::OK);

        let (_, _, body) = fetch(&mut engine, "/docs").await;
        assert!(body.contains(r#"Redoc.init("/docs/spec.json", {"disableSearch":true}"#));
    }

    #[tokio::test]
    async fn disabled_schema_is_not_served() {
        let mut engine = Engine::new();
        engine.disable_schema_handler();
        engine.get("/pets", Operation::new(), || async { "[]" });

        assert_eq!(fetch(&mut engine, "/openapi.json").await.0, StatusCode::NOT_FOUND);
        assert_eq!(fetch(&mut engine, "/openapi").await.0, StatusCode::NOT_FOUND);
        assert_eq!(fetch(&mut engine, "/pets").await.0, StatusCode::OK);
        assert!(engine.document().snapshot().paths.contains_key("/pets"));
    }

    #[tokio::test]
    async fn endpoints_are_mounted_once() {
        let mut engine = Engine::new();
        for _ in 0..3 {
            assert_eq!(fetch(&mut engine, "/openapi.json").await.0, StatusCode::OK);
        }

        // Registering after the first request rebuilds the service, not the endpoints.
        engine.get("/late", Operation::new(), || async { "late" });
        assert_eq!(fetch(&mut engine, "/late").await.2, "late");
        let (_, _, body) = fetch(&mut engine, "/openapi.json").await;
        assert!(body.contains("\"/late\""));
    }

    #[tokio::test]
    async fn document_changes_after_start_are_served() {
        let mut engine = Engine::new();
        assert_eq!(fetch(&mut engine, "/openapi.json").await.0, StatusCode::OK);

        engine.document().set_info(Info::new("Renamed", "2.0.0"));
        let (_, _, body) = fetch(&mut engine, "/openapi.json").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["info"]["title"], "Renamed");
        assert_eq!(json["info"]["version"], "2.0.0");
    }

    #[tokio::test]
    async fn schema_middleware_runs_in_order_and_can_abort() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = |name: &'static str, seen: Arc<Mutex<Vec<&'static str>>>| {
            Middleware::from_fn(move |req, next| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(name);
                    next.run(req).await
                }
            })
        };
        let guard = Middleware::from_fn(|req: Request, next: axum::middleware::Next| async move {
            if req.headers().contains_key("x-docs-key") {
                next.run(req).await
            } else {
                StatusCode::UNAUTHORIZED.into_response()
            }
        });

        let mut engine = Engine::new();
        engine.schema_middleware([record("a", seen.clone()), record("b", seen.clone()), guard]);
        engine.get("/pets", Operation::new(), || async { "[]" });

        assert_eq!(fetch(&mut engine, "/openapi.json").await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(fetch(&mut engine, "/openapi").await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "a", "b"]);

        let request = http::Request::builder()
            .uri("/openapi.json")
            .header("x-docs-key", "1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(engine.serve_request(request).await.status(), StatusCode::OK);

        // Ordinary routes skip the schema chain.
        seen.lock().unwrap().clear();
        assert_eq!(fetch(&mut engine, "/pets").await.0, StatusCode::OK);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn engine_middleware_wraps_everything() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let counter = {
            let hits = hits.clone();
            Middleware::from_fn(move |req: Request, next: axum::middleware::Next| {
                let hits = hits.clone();
                async move {
                    hits.lock().unwrap().push(req.uri().path().to_string());
                    next.run(req).await
                }
            })
        };

        let mut engine = Engine::new();
        engine.use_middleware([counter]);
        engine.no_route(|| async { (StatusCode::NOT_FOUND, "nothing here") });
        engine.get("/pets", Operation::new(), || async { "[]" });

        fetch(&mut engine, "/pets").await;
        fetch(&mut engine, "/openapi.json").await;
        let (status, _, body) = fetch(&mut engine, "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "nothing here");

        assert_eq!(*hits.lock().unwrap(), vec!["/pets", "/openapi.json", "/missing"]);
    }

    #[tokio::test]
    async fn defaults_recover_from_panics() {
        async fn boom() -> &'static str {
            panic!("boom")
        }

        let mut engine = Engine::with_defaults();
        engine.get("/boom", Operation::new(), boom);

        assert_eq!(
            fetch(&mut engine, "/boom").await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn routes_are_listed() {
        let mut engine = Engine::new();
        engine.get("/pets", Operation::new(), || async { "" });
        engine.group("/admin", |admin| {
            admin.delete("/pets/:id", Operation::new(), || async { "" });
        });

        let routes = engine.routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[1].method, Method::DELETE);
        assert_eq!(routes[1].path, "/admin/pets/:id");
    }

    #[tokio::test]
    async fn client_ip_honours_trusted_proxies() {
        let mut engine = Engine::new();
        engine.get(
            "/ip",
            Operation::new(),
            |ClientIp(ip): ClientIp| async move { ip.map(|ip| ip.to_string()).unwrap_or_default() },
        );

        let request = |peer: &str| {
            let mut req = http::Request::builder()
                .uri("/ip")
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::empty())
                .unwrap();
            req.extensions_mut()
                .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
            req
        };

        let body = |response: Response| async move {
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            String::from_utf8(bytes.to_vec()).unwrap()
        };

        let response = engine.serve_request(request("10.0.0.1:5000")).await;
        assert_eq!(body(response).await, "10.0.0.1");

        engine.trusted_proxies(["10.0.0.0/8"]).unwrap();
        let response = engine.serve_request(request("10.0.0.1:5000")).await;
        assert_eq!(body(response).await, "203.0.113.7");

        assert!(engine.trusted_proxies(["bogus"]).is_err());
    }

    #[tokio::test]
    async fn templates_reach_handlers() {
        let mut tera = tera::Tera::default();
        tera.add_raw_template("index.html", "<h1>{{ title }}</h1>").unwrap();

        let mut engine = Engine::new();
        engine.set_html_template(Templates::from_tera(tera));
        engine.get(
            "/",
            Operation::new(),
            |Extension(templates): Extension<Templates>| async move {
                let mut ctx = Context::new();
                ctx.insert("title", "Pets");
                templates.render("index.html", &ctx)
            },
        );

        let (status, _, body) = fetch(&mut engine, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>Pets</h1>");
    }

    #[test]
    fn from_config_applies_settings() {
        let config = EngineConfig {
            addr: "127.0.0.1:9999".into(),
            openapi: OpenApiConfig::new().schema_path("/spec.json").disabled(),
        };
        let engine = Engine::from_config(config);
        assert_eq!(engine.addr.as_deref(), Some("127.0.0.1:9999"));
        assert_eq!(engine.openapi.schema_path, "/spec.json");
        assert!(!engine.openapi.enabled);
    }

    #[tokio::test]
    async fn run_listener_serves_over_tcp() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut engine = Engine::new();
        engine.get("/ping", Operation::new(), || async { "pong" });
        tokio::spawn(async move { engine.run_listener(listener).await });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /openapi.json HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
        assert!(response.contains("\"/ping\""));
    }

    async fn raw_get<S>(mut stream: S, path: &str) -> String
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn run_std_listener_mounts_schema() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut engine = Engine::new();
        engine.info(Info::new("Pet Store", "1.0.0"));
        tokio::spawn(async move { engine.run_std_listener(listener).await });

        let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let response = raw_get(stream, "/openapi.json").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
        assert!(response.contains("\"Pet Store\""), "{}", response);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_fd_takes_ownership_of_the_socket() {
        use std::os::fd::OwnedFd;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let fd = OwnedFd::from(listener);

        let mut engine = Engine::new();
        tokio::spawn(async move { engine.run_fd(fd).await });

        let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let response = raw_get(stream, "/openapi").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
        assert!(response.contains("text/html; charset=utf-8"), "{}", response);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_unix_mounts_schema() {
        let path = std::env::temp_dir().join(format!("axoapi-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut engine = Engine::new();
        let socket = path.clone();
        tokio::spawn(async move { engine.run_unix(socket).await });

        let mut stream = None;
        for _ in 0..50 {
            match tokio::net::UnixStream::connect(&path).await {
                Ok(connected) => {
                    stream = Some(connected);
                    break;
                }
                Err(_) => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
            }
        }
        let response = raw_get(stream.expect("unix socket never came up"), "/openapi.json").await;
        let _ = std::fs::remove_file(&path);
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
        assert!(response.contains("\"openapi\":\"3.0.0\""), "{}", response);
    }

    #[tokio::test]
    async fn run_rejects_bad_addresses() {
        let mut engine = Engine::new();
        let err = engine.run("not an address").await.unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_) | Error::Io(_)), "{:?}", err);
    }
}
