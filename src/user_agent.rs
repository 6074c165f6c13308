//! Shared User-Agent strings for the API and download HTTP clients.

/// Browser User-Agent sent to the Neat API.
///
/// The web API only serves requests that look like they come from the web
/// app, so the API client presents itself as a desktop browser.
pub(crate) const API_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for item downloads (identifies the tool).
#[must_use]
pub(crate) fn default_download_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("neat-mirror/{version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_user_agent_contains_crate_version() {
        let ua = default_download_user_agent();
        assert_eq!(
            ua.strip_prefix("neat-mirror/"),
            Some(env!("CARGO_PKG_VERSION")),
            "download UA must carry crate version: {ua}"
        );
    }

    #[test]
    fn test_api_user_agent_looks_like_browser() {
        assert!(API_USER_AGENT.starts_with("Mozilla/5.0"));
    }
}
