//! Core connection types shared by the client and the CLI.

use url::Url;

use crate::error::{GhostwriterError, Result};

/// Path prefix of the Admin API, appended to the site URL.
pub const API_ROOT: &str = "/ghost/api/admin";

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Long-lived connection configuration: site URL plus composite admin key.
///
/// Owned by the caller and lent to the request pipeline, which never mutates it.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
    admin_key: String,
}

impl Endpoint {
    /// Build an endpoint, normalizing the site URL.
    ///
    /// A missing scheme defaults to `https://`; trailing slashes are dropped.
    pub fn new(base_url: &str, admin_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            admin_key: admin_key.into(),
        })
    }

    /// Normalized site URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw composite admin key (`<id>:<hexsecret>`).
    pub fn admin_key(&self) -> &str {
        &self.admin_key
    }

    /// Full URL of an Admin API resource path (e.g. `/posts/`).
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{API_ROOT}{path}", self.base_url)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url)
            .field("admin_key", &"<redacted>")
            .finish()
    }
}

/// Normalize a user-supplied site URL.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GhostwriterError::config("site URL is empty"));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| GhostwriterError::config(format!("invalid site URL '{raw}': {e}")))?;
    if parsed.host_str().is_none() {
        return Err(GhostwriterError::config(format!(
            "invalid site URL '{raw}': missing host"
        )));
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_url() {
        let endpoint = Endpoint::new("blog.example.com/", "abc:00").unwrap();
        assert_eq!(endpoint.base_url(), "https://blog.example.com");

        let endpoint = Endpoint::new("http://localhost:2368//", "abc:00").unwrap();
        assert_eq!(endpoint.base_url(), "http://localhost:2368");
    }

    #[test]
    fn api_url_appends_root() {
        let endpoint = Endpoint::new("https://blog.example.com/", "abc:00").unwrap();
        assert_eq!(
            endpoint.api_url("/posts/"),
            "https://blog.example.com/ghost/api/admin/posts/"
        );
    }

    #[test]
    fn debug_redacts_key() {
        let endpoint = Endpoint::new("https://blog.example.com", "abc:deadbeef").unwrap();
        let printed = format!("{endpoint:?}");
        assert!(!printed.contains("deadbeef"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn empty_url_is_rejected() {
        assert!(Endpoint::new("  ", "abc:00").is_err());
    }
}
