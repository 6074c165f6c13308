//! HTTP client construction for the API and download clients.
//!
//! Some restricted sandbox environments panic while reqwest queries system
//! proxy settings. Construction is therefore guarded: on a builder panic the
//! client is rebuilt with system lookup disabled and the proxy taken from
//! the usual environment variables instead.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

/// Timeouts applied to one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    /// TCP/TLS connect timeout.
    pub connect: Option<Duration>,
    /// Idle timeout between reads of the response.
    pub read: Option<Duration>,
}

impl ClientTimeouts {
    /// No timeouts at all.
    pub const NONE: Self = Self {
        connect: None,
        read: None,
    };
}

/// Builds a client from `configure`, retrying once without system proxy
/// lookup when the builder panics.
pub(crate) fn build_guarded(
    label: &str,
    timeouts: ClientTimeouts,
    configure: impl Fn(ClientBuilder) -> ClientBuilder,
) -> Result<Client, reqwest::Error> {
    match try_build(timeouts, &configure, false) {
        Ok(result) => result,
        Err(()) => {
            warn!(
                client = label,
                "HTTP client builder panicked while loading system proxy settings; retrying with env-proxy fallback"
            );
            match try_build(timeouts, &configure, true) {
                Ok(result) => result,
                // Nothing left to fall back to; build a proxy-free client.
                Err(()) => base_builder(timeouts).no_proxy().build(),
            }
        }
    }
}

fn try_build(
    timeouts: ClientTimeouts,
    configure: &impl Fn(ClientBuilder) -> ClientBuilder,
    disable_system_proxy_lookup: bool,
) -> Result<Result<Client, reqwest::Error>, ()> {
    catch_unwind(AssertUnwindSafe(|| {
        let mut builder = configure(base_builder(timeouts));
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build()
    }))
    .map_err(|_| ())
}

fn base_builder(timeouts: ClientTimeouts) -> ClientBuilder {
    let mut builder = Client::builder().gzip(true);
    if let Some(connect) = timeouts.connect {
        builder = builder.connect_timeout(connect);
    }
    if let Some(read) = timeouts.read {
        builder = builder.read_timeout(read);
    }
    builder
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_proxy_for_unknown_scheme_is_none() {
        assert_eq!(env_proxy_for_scheme("ftp"), None);
    }

    #[test]
    fn test_build_guarded_with_timeouts_succeeds() {
        let timeouts = ClientTimeouts {
            connect: Some(Duration::from_secs(1)),
            read: Some(Duration::from_secs(1)),
        };
        let client = build_guarded("test", timeouts, |builder| builder.cookie_store(true));
        assert!(client.is_ok());
    }
}
