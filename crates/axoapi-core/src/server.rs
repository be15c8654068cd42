//! HTTP server implementation

use crate::error::Result;
use axum::extract::ConnectInfo;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing::{debug, error, info};

/// Back-off after an accept error that is not tied to a single connection,
/// e.g. running out of file descriptors
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Accept TCP connections forever, one task per connection
pub(crate) async fn serve_tcp(listener: TcpListener, router: Router) -> Result<()> {
    info!("axoapi server running on http://{}", listener.local_addr()?);

    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                handle_accept_error(err).await;
                continue;
            }
        };
        let router = router.clone();
        tokio::spawn(serve_connection(stream, router, Some(remote_addr)));
    }
}

/// Accept connections on a Unix domain socket
#[cfg(unix)]
pub(crate) async fn serve_unix(listener: tokio::net::UnixListener, router: Router) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("axoapi server running on unix:{:?}", addr.as_pathname());
    }

    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(err) => {
                handle_accept_error(err).await;
                continue;
            }
        };
        let router = router.clone();
        tokio::spawn(serve_connection(stream, router, None));
    }
}

/// Accept TCP connections and complete a TLS handshake on each
#[cfg(feature = "tls")]
pub(crate) async fn serve_tls(
    listener: TcpListener,
    acceptor: tokio_rustls::TlsAcceptor,
    router: Router,
) -> Result<()> {
    info!("axoapi server running on https://{}", listener.local_addr()?);

    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                handle_accept_error(err).await;
                continue;
            }
        };
        let router = router.clone();
        let acceptor = acceptor.clone();

        tokio::spawn(async move {
            match acceptor.accept(stream).await {
                Ok(stream) => serve_connection(stream, router, Some(remote_addr)).await,
                Err(err) => debug!(peer = %remote_addr, error = %err, "TLS handshake failed"),
            }
        });
    }
}

/// Errors that end one pending connection but leave the listener usable
fn is_connection_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

/// Log an accept error and keep the accept loop alive
async fn handle_accept_error(err: io::Error) {
    if is_connection_error(&err) {
        debug!(error = %err, "accept failed");
        return;
    }
    error!(error = %err, "accept failed, retrying in {:?}", ACCEPT_BACKOFF);
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

/// Build a TLS acceptor from PEM encoded certificate chain and private key files
#[cfg(feature = "tls")]
pub(crate) fn tls_acceptor(cert_file: &str, key_file: &str) -> Result<tokio_rustls::TlsAcceptor> {
    use crate::error::Error;
    use std::fs::File;
    use std::io::BufReader;
    use std::sync::Arc;
    use tokio_rustls::rustls::ServerConfig;

    let mut cert_reader = BufReader::new(File::open(cert_file)?);
    let certs = rustls_pemfile::certs(&mut cert_reader).collect::<std::io::Result<Vec<_>>>()?;
    if certs.is_empty() {
        return Err(Error::Tls(format!("no certificates found in {}", cert_file)));
    }

    let mut key_reader = BufReader::new(File::open(key_file)?);
    let key = rustls_pemfile::private_key(&mut key_reader)?
        .ok_or_else(|| Error::Tls(format!("no private key found in {}", key_file)))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|err| Error::Tls(err.to_string()))?;

    Ok(tokio_rustls::TlsAcceptor::from(Arc::new(config)))
}

/// Serve HTTP/1 on one connection.
///
/// When the peer address is known it is exposed to handlers as
/// `ConnectInfo<SocketAddr>`. Connection errors only end this connection.
pub(crate) async fn serve_connection<I>(io: I, router: Router, remote_addr: Option<SocketAddr>)
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |mut req: hyper::Request<Incoming>| {
        let router = router.clone();
        if let Some(addr) = remote_addr {
            req.extensions_mut().insert(ConnectInfo(addr));
        }
        router.oneshot(req)
    });

    if let Err(err) = http1::Builder::new()
        .serve_connection(TokioIo::new(io), service)
        .with_upgrades()
        .await
    {
        debug!(peer = ?remote_addr, error = %err, "connection error");
    }
}
