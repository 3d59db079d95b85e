//! Request extractors.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::UserAgent;

use docseal_core::verification::RequestMetadata;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Peers whose `X-Forwarded-For` header is believed.
///
/// Installed as a request extension by the router. Empty means the header
/// is never read.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<[IpAddr]>);

impl TrustedProxies {
    /// Trust the given proxy addresses.
    pub fn new(proxies: impl IntoIterator<Item = IpAddr>) -> Self {
        Self(proxies.into_iter().collect())
    }

    /// Returns true if `peer` is a trusted proxy.
    #[must_use]
    pub fn contains(&self, peer: IpAddr) -> bool {
        self.0.contains(&peer)
    }
}

/// Caller address and user agent for verification attempts.
///
/// The address is the peer address, or the first `X-Forwarded-For` entry
/// when the peer is a [`TrustedProxies`] member. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata(pub RequestMetadata);

fn forwarded_for(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(X_FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|ip| !ip.is_empty())
        .map(String::from)
}

fn client_ip(parts: &Parts) -> Option<String> {
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let via_trusted_proxy = peer.is_some_and(|peer| {
        parts
            .extensions
            .get::<TrustedProxies>()
            .is_some_and(|proxies| proxies.contains(peer))
    });

    via_trusted_proxy
        .then(|| forwarded_for(parts))
        .flatten()
        .or_else(|| peer.map(|ip| ip.to_string()))
}

impl<S> FromRequestParts<S> for ClientMetadata
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = client_ip(parts);
        let user_agent = TypedHeader::<UserAgent>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(ua)| ua.as_str().to_string());

        Ok(Self(RequestMetadata {
            ip_address,
            user_agent,
        }))
    }
}
