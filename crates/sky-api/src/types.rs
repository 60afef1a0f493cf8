//! Shared types for Sky API clients.

use crate::error::SkyApiError;
use reqwest::Response;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;

/// Marker used by sample configuration files for unset keys.
const PLACEHOLDER_KEY_PREFIX: &str = "你的";

/// A configured third-party API endpoint.
///
/// The key is stored using `SecretString` so it never shows up in logs.
#[derive(Clone)]
pub struct Endpoint {
    /// Display name used in error messages (e.g. "大蜡烛").
    pub name: String,
    pub url: String,
    key: Option<SecretString>,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && !k.starts_with(PLACEHOLDER_KEY_PREFIX))
            .map(SecretString::new);

        Self {
            name: name.into(),
            url: url.into(),
            key,
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// The API key, or `NotConfigured` if none is set.
    pub fn key(&self) -> Result<&str, SkyApiError> {
        self.key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .ok_or_else(|| SkyApiError::NotConfigured(self.name.clone()))
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("configured", &self.is_configured())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Base64-encoded image bytes, without a `data:` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData(pub String);

impl ImageData {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Weekly travelling-spirit (ancestor) information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorInfo {
    pub image: Option<ImageData>,
    pub text: String,
}

/// Seconds since the epoch, sent as the cache-busting `time` parameter.
pub(crate) fn unix_time() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Turn a non-success response into an `Api` error.
///
/// Prefers the JSON `message` (or `msg`) field, falls back to the raw body.
pub(crate) async fn error_from_response(response: Response) -> SkyApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let detail = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => json
            .get("message")
            .or_else(|| json.get("msg"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| json.to_string()),
        Err(_) if body.is_empty() => format!("状态码: {}", status),
        Err(_) => body,
    };

    SkyApiError::Api { status, detail }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_key_is_unconfigured() {
        let endpoint = Endpoint::new(
            "大蜡烛",
            "http://localhost",
            Some("你的大蜡烛API密钥".into()),
            Duration::from_secs(1),
        );
        assert!(!endpoint.is_configured());
        assert!(matches!(endpoint.key(), Err(SkyApiError::NotConfigured(_))));
    }

    #[test]
    fn test_debug_hides_key() {
        let endpoint = Endpoint::new(
            "任务",
            "http://localhost",
            Some("super-secret".into()),
            Duration::from_secs(1),
        );
        assert_eq!(endpoint.key().unwrap(), "super-secret");
        assert!(!format!("{:?}", endpoint).contains("super-secret"));
    }
}
