//! Exposure rules for `serve-argocd`: loopback by default, and a bearer token
//! whenever the proxy is reachable from elsewhere.

use anyhow::{Context as AnyhowContext, Result};
use std::net::SocketAddr;

pub(crate) const AUTH_TOKEN_ENV: &str = "CATALOG_BRIDGE_AUTH_TOKEN";

/// Shared secret callers present as `Authorization: Bearer <token>`.
#[derive(Clone, Debug)]
pub(crate) struct BearerToken(String);

impl BearerToken {
    pub(crate) fn new(raw: &str) -> Result<Self> {
        let token = raw.trim();
        anyhow::ensure!(!token.is_empty(), "auth token must be non-empty");
        Ok(Self(token.to_string()))
    }

    /// `--auth-token`, else `$CATALOG_BRIDGE_AUTH_TOKEN`, else none.
    pub(crate) fn from_flag_or_env(flag: Option<&str>) -> Result<Option<Self>> {
        match flag {
            Some(raw) => Self::new(raw).map(Some),
            None => std::env::var(AUTH_TOKEN_ENV)
                .ok()
                .map(|raw| Self::new(&raw))
                .transpose(),
        }
    }

    pub(crate) fn accepts(&self, authorization: &str) -> bool {
        authorization
            .trim()
            .strip_prefix("Bearer ")
            .is_some_and(|presented| same_secret(presented.trim(), &self.0))
    }
}

/// Compares without stopping at the first differing byte.
fn same_secret(presented: &str, expected: &str) -> bool {
    let presented = presented.as_bytes();
    let mismatch = expected
        .bytes()
        .enumerate()
        .fold(presented.len() ^ expected.len(), |acc, (idx, byte)| {
            acc | usize::from(byte ^ presented.get(idx).copied().unwrap_or_default())
        });
    mismatch == 0
}

/// Where the proxy listens and what it demands from callers.
#[derive(Debug)]
pub(crate) struct Exposure {
    pub(crate) addrs: Vec<SocketAddr>,
    pub(crate) token: Option<BearerToken>,
    pub(crate) public: bool,
}

impl Exposure {
    pub(crate) async fn resolve(bind: &str, public: bool, token_flag: Option<&str>) -> Result<Self> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
            .await
            .with_context(|| format!("Failed to resolve bind address: {bind}"))?
            .collect();
        anyhow::ensure!(!addrs.is_empty(), "Bind address {bind} resolved to nothing");

        let token = BearerToken::from_flag_or_env(token_flag)?;
        Self::check(bind, addrs, public, token)
    }

    fn check(
        bind: &str,
        addrs: Vec<SocketAddr>,
        public: bool,
        token: Option<BearerToken>,
    ) -> Result<Self> {
        if !public {
            if let Some(addr) = addrs.iter().find(|addr| !addr.ip().is_loopback()) {
                anyhow::bail!(
                    "Refusing to bind to non-loopback address without --public: {bind} resolves to {addr}. \
                     To expose the proxy, pass --public with --auth-token or {AUTH_TOKEN_ENV}."
                );
            }
        } else if token.is_none() {
            anyhow::bail!("--public requires an auth token: set --auth-token or export {AUTH_TOKEN_ENV}");
        }

        Ok(Self {
            addrs,
            token,
            public,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(raw: &str) -> Vec<SocketAddr> {
        vec![raw.parse().unwrap()]
    }

    fn token(raw: &str) -> Option<BearerToken> {
        Some(BearerToken::new(raw).unwrap())
    }

    #[test]
    fn bearer_token_accepts_only_its_own_secret() {
        let token = BearerToken::new("  argo-proxy  ").unwrap();
        assert!(token.accepts("Bearer argo-proxy"));
        assert!(token.accepts("  Bearer  argo-proxy "));
        assert!(!token.accepts("argo-proxy"));
        assert!(!token.accepts("Basic argo-proxy"));
        assert!(!token.accepts("Bearer argo-prox"));
        assert!(!token.accepts("Bearer argo-proxy2"));
        assert!(!token.accepts("Bearer "));
    }

    #[test]
    fn blank_token_is_rejected() {
        assert!(BearerToken::new("   ").is_err());
        assert!(BearerToken::from_flag_or_env(Some("")).is_err());
        assert!(BearerToken::from_flag_or_env(Some("from-flag"))
            .unwrap()
            .is_some_and(|t| t.accepts("Bearer from-flag")));
    }

    #[test]
    fn loopback_proxy_needs_no_token() {
        let exposure = Exposure::check("127.0.0.1:7007", addr("127.0.0.1:7007"), false, None).unwrap();
        assert!(exposure.token.is_none());
        assert!(!exposure.public);

        Exposure::check("[::1]:7007", addr("[::1]:7007"), false, None).unwrap();
    }

    #[test]
    fn non_loopback_proxy_needs_public() {
        let err = Exposure::check("0.0.0.0:7007", addr("0.0.0.0:7007"), false, token("t"))
            .unwrap_err();
        assert!(err.to_string().contains("Refusing to bind"));

        let mixed = vec!["127.0.0.1:7007".parse().unwrap(), "10.0.0.5:7007".parse().unwrap()];
        assert!(Exposure::check("argo-proxy:7007", mixed, false, None).is_err());
    }

    #[test]
    fn public_proxy_needs_a_token() {
        let err = Exposure::check("0.0.0.0:7007", addr("0.0.0.0:7007"), true, None).unwrap_err();
        assert!(err.to_string().contains("--public requires an auth token"));

        let exposure =
            Exposure::check("0.0.0.0:7007", addr("0.0.0.0:7007"), true, token("t")).unwrap();
        assert!(exposure.public);
        assert!(exposure.token.is_some());
    }

    #[tokio::test]
    async fn localhost_resolves_to_loopback() {
        let exposure = Exposure::resolve("localhost:0", false, Some("t")).await.unwrap();
        assert!(exposure.addrs.iter().all(|a| a.ip().is_loopback()));
    }
}
