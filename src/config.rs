//! Submission configuration

use std::time::Duration;

/// Default SOCKS5 proxy (local Tor daemon)
pub const DEFAULT_PROXY: &str = "127.0.0.1:9050";

/// Default news server for POST
pub const DEFAULT_POST_SERVER: &str = "news.tcpreset.net:119";

/// Default peer for IHAVE
pub const DEFAULT_IHAVE_SERVER: &str =
    "peannyjkqwqfynd24p6dszvtchkq7hfkwymi5by5y332wmosy5dwfaqd.onion:119";

/// Default article size cap (32 KB)
pub const DEFAULT_MAX_ARTICLE_SIZE: usize = 32 * 1024;

/// Default bound on proxy connect + SOCKS5 handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(120);

/// Submission configuration
///
/// Holds everything the engine would otherwise hardcode: where the proxy is,
/// which server to reach through it, and how large an article may be.
///
/// # Example
///
/// ```
/// use nntp_submit::SubmitConfig;
/// use std::time::Duration;
///
/// let config = SubmitConfig::post()
///     .with_proxy("127.0.0.1:9150")
///     .with_connect_timeout(Duration::from_secs(30));
/// assert_eq!(config.server, "news.tcpreset.net:119");
/// assert_eq!(config.max_article_size, 32 * 1024);
/// ```
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmitConfig {
    /// SOCKS5 proxy address (`host:port`)
    #[cfg_attr(feature = "serde", serde(default = "default_proxy"))]
    pub proxy: String,

    /// News server address (`host:port`), resolved by the proxy
    pub server: String,

    /// Maximum article size in bytes, counted as the sum of `line length + 1`
    #[cfg_attr(feature = "serde", serde(default = "default_max_article_size"))]
    pub max_article_size: usize,

    /// Timeout for reaching the proxy and completing the SOCKS5 handshake
    #[cfg_attr(feature = "serde", serde(default = "default_connect_timeout"))]
    pub connect_timeout: Duration,
}

#[cfg(feature = "serde")]
fn default_proxy() -> String {
    DEFAULT_PROXY.to_string()
}

#[cfg(feature = "serde")]
fn default_max_article_size() -> usize {
    DEFAULT_MAX_ARTICLE_SIZE
}

#[cfg(feature = "serde")]
fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

impl SubmitConfig {
    /// Create a configuration for `server` reached through `proxy`
    pub fn new(proxy: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            proxy: proxy.into(),
            server: server.into(),
            max_article_size: DEFAULT_MAX_ARTICLE_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Defaults used by the POST client
    pub fn post() -> Self {
        Self::new(DEFAULT_PROXY, DEFAULT_POST_SERVER)
    }

    /// Defaults used by the IHAVE client
    pub fn ihave() -> Self {
        Self::new(DEFAULT_PROXY, DEFAULT_IHAVE_SERVER)
    }

    /// Replace the proxy address
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = proxy.into();
        self
    }

    /// Replace the server address
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Replace the article size cap
    pub fn with_max_article_size(mut self, max_article_size: usize) -> Self {
        self.max_article_size = max_article_size;
        self
    }

    /// Replace the connect timeout
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}
