//! Connection settings for the builder backend

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings the HTTP client is built from.
///
/// `credential` is the pre-encoded base64 `user:password` pair sent as a
/// Basic Authorization header; `None` sends unauthenticated requests.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub credential: Option<String>,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Read settings from the environment:
    /// - `PAGESMITH_API_URL` (required)
    /// - `PAGESMITH_API_CREDENTIAL` (optional, pre-encoded base64)
    /// - `PAGESMITH_API_TIMEOUT_SECS` (optional)
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("PAGESMITH_API_URL").ok()?;
        let credential = std::env::var("PAGESMITH_API_CREDENTIAL").ok();
        let timeout_secs = std::env::var("PAGESMITH_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Some(Self {
            base_url,
            credential,
            timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = RemoteConfig::new("http://localhost:5000/api");
        assert_eq!(config.base_url, "http://localhost:5000/api");
        assert_eq!(config.credential, None);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);

        let config = config.with_credential("dXNlcjpwYXNz");
        assert_eq!(config.credential.as_deref(), Some("dXNlcjpwYXNz"));
    }
}
