//! Sync peer connection string.

use std::fmt;
use std::str::FromStr;

use url::Url;

use mc_core::error::{McError, McResult};

/// Where the sync provider connects: `wss://<host>/?key=<app-key>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEndpoint {
    secure: bool,
    host: String,
    key: String,
}

impl PeerEndpoint {
    /// Build a secure endpoint from its parts.
    pub fn new(host: impl Into<String>, key: impl Into<String>) -> McResult<Self> {
        let (host, key) = (host.into(), key.into());
        if host.trim().is_empty() {
            return Err(McError::InvalidEndpoint("host is empty".into()));
        }
        if key.trim().is_empty() {
            return Err(McError::InvalidEndpoint("app key is empty".into()));
        }
        Ok(Self { secure: true, host, key })
    }

    /// Parse a `ws://` or `wss://` connection string carrying a `key` query.
    pub fn parse(raw: &str) -> McResult<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| McError::InvalidEndpoint(format!("{raw}: {e}")))?;

        let secure = match url.scheme() {
            "wss" => true,
            "ws" => false,
            other => {
                return Err(McError::InvalidEndpoint(format!(
                    "unsupported scheme {other}, expected ws or wss"
                )))
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| McError::InvalidEndpoint(format!("{raw}: missing host")))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let key = url
            .query_pairs()
            .find(|(k, _)| k == "key")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| McError::InvalidEndpoint(format!("{raw}: missing key parameter")))?;

        Ok(Self { secure, host, key })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The application key the provider authenticates with.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "wss" } else { "ws" };
        write!(f, "{scheme}://{}/?key={}", self.host, self.key)
    }
}

impl FromStr for PeerEndpoint {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_core::constants::DEFAULT_SYNC_PEER;

    #[test]
    fn test_default_peer_parses_and_formats_back() {
        let endpoint = PeerEndpoint::parse(DEFAULT_SYNC_PEER).unwrap();
        assert_eq!(endpoint.host(), "cloud.jazz.tools");
        assert_eq!(endpoint.key(), "chat-example-jazz@garden.co");
        assert!(endpoint.is_secure());
        assert_eq!(endpoint.to_string(), DEFAULT_SYNC_PEER);
    }

    #[test]
    fn test_local_peer_with_port() {
        let endpoint: PeerEndpoint = "ws://localhost:4200/?key=dev".parse().unwrap();
        assert_eq!(endpoint.host(), "localhost:4200");
        assert!(!endpoint.is_secure());
        assert_eq!(endpoint.to_string(), "ws://localhost:4200/?key=dev");
    }

    #[test]
    fn test_rejects_http_and_missing_key() {
        assert!(PeerEndpoint::parse("https://cloud.jazz.tools/?key=a").is_err());
        assert!(PeerEndpoint::parse("wss://cloud.jazz.tools/").is_err());
        assert!(PeerEndpoint::parse("wss://cloud.jazz.tools/?key=").is_err());
        assert!(PeerEndpoint::parse("not a url").is_err());
    }

    #[test]
    fn test_new_validates_parts() {
        assert!(PeerEndpoint::new("", "k").is_err());
        assert!(PeerEndpoint::new("h", " ").is_err());
        assert_eq!(PeerEndpoint::new("h", "k").unwrap().to_string(), "wss://h/?key=k");
    }
}
