//! Trusted proxies and client IP resolution
//!
//! Forwarding headers (`X-Forwarded-For`, `X-Real-IP`) are honored only when
//! the direct peer is a trusted proxy. No proxy is trusted until the engine
//! is told otherwise.

use crate::error::{Error, Result};
use async_trait::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts, Request};
use axum::middleware::Next;
use axum::response::Response;
use axum::Router;
use http::request::Parts;
use http::HeaderMap;
use ipnet::IpNet;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// The set of networks whose forwarding headers are believed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedProxies {
    networks: Vec<IpNet>,
}

impl TrustedProxies {
    /// Trust nobody; the peer address is always the client address
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a list of IP addresses and CIDR ranges.
    ///
    /// A bare address is trusted as a single-host network.
    pub fn parse<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let networks = entries
            .into_iter()
            .map(|entry| {
                let entry = entry.as_ref().trim();
                entry
                    .parse::<IpNet>()
                    .or_else(|_| entry.parse::<IpAddr>().map(IpNet::from))
                    .map_err(|_| Error::InvalidProxy(entry.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { networks })
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Whether `ip` belongs to a trusted network
    pub fn is_trusted(&self, ip: IpAddr) -> bool {
        self.networks.iter().any(|net| net.contains(&ip))
    }

    /// Work out the client address for a request that arrived from `peer`.
    ///
    /// `X-Forwarded-For` is walked right to left, skipping trusted hops; the
    /// first untrusted entry is the client. When every hop is trusted the
    /// leftmost entry wins. `X-Real-IP` is the fallback. Malformed headers
    /// leave the peer address in place.
    pub fn resolve(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> Option<IpAddr> {
        let peer_ip = peer?;
        if !self.is_trusted(peer_ip) {
            return Some(peer_ip);
        }

        if let Some(ip) = self.from_forwarded_for(headers) {
            return Some(ip);
        }

        let real_ip = headers
            .get(X_REAL_IP)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok());
        Some(real_ip.unwrap_or(peer_ip))
    }

    fn from_forwarded_for(&self, headers: &HeaderMap) -> Option<IpAddr> {
        let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
        let hops = value
            .split(',')
            .map(|hop| hop.trim().parse::<IpAddr>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .ok()?;

        hops.iter()
            .rev()
            .find(|ip| !self.is_trusted(**ip))
            .or_else(|| hops.first())
            .copied()
    }
}

/// The resolved client address of a request.
///
/// `None` when the request did not come through a socket, e.g. in tests
/// driven through [`Engine::serve_request`](crate::Engine::serve_request).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        if let Some(ip) = parts.extensions.get::<ClientIp>() {
            return Ok(*ip);
        }
        Ok(ClientIp(peer_ip(&parts.extensions)))
    }
}

fn peer_ip(extensions: &http::Extensions) -> Option<IpAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Resolve [`ClientIp`] once per request so handlers and middleware share it
pub(crate) fn resolve_client_ip(router: Router, proxies: TrustedProxies) -> Router {
    router.layer(axum::middleware::from_fn(move |mut req: Request, next: Next| {
        let proxies = proxies.clone();
        async move {
            let client = proxies.resolve(peer_ip(req.extensions()), req.headers());
            req.extensions_mut().insert(ClientIp(client));
            let response: Response = next.run(req).await;
            response
        }
    }))
}
