//! Error types for axoapi

use http::Method;
use thiserror::Error;

/// Result type alias for axoapi operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while configuring or starting an engine.
///
/// Request-time failures never surface here; they become HTTP responses.
#[derive(Debug, Error)]
pub enum Error {
    /// Binding or accepting on a listener failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A listen address could not be parsed or resolved
    #[error("invalid listen address `{0}`")]
    InvalidAddress(String),

    /// The router has no method filter for this HTTP method
    #[error("unsupported HTTP method `{0}`")]
    UnsupportedMethod(Method),

    /// A trusted proxy entry is neither an IP address nor a CIDR range
    #[error("invalid trusted proxy `{0}`")]
    InvalidProxy(String),

    /// Loading or parsing HTML templates failed
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// Reading configuration from the environment failed
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Loading the certificate or key for TLS failed
    #[error("TLS error: {0}")]
    Tls(String),
}
