use std::time::Duration;

/// Default ComfyUI address when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8188";

/// Default delay between two `/history` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Client configuration shared by the async and blocking clients.
///
/// Use [`ClientConfig::builder()`] for ergonomic construction, or
/// [`ClientConfig::default()`] for a local server with unbounded waits.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme, host and port of the ComfyUI server.
    pub base_url: String,

    /// Delay before each `/history` poll in `generate_image`.
    pub poll_interval: Duration,

    /// Give up waiting for a prompt after this long. `None` = wait forever.
    pub max_wait: Option<Duration>,

    /// Per-request HTTP timeout. `None` = whatever the HTTP client uses.
    pub request_timeout: Option<Duration>,

    /// Sent as `client_id` alongside submitted prompts when set.
    pub client_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            request_timeout: None,
            client_id: None,
        }
    }
}

impl ClientConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Config for a server at `base_url`, everything else default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize(base_url.into()),
            ..Self::default()
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server origin, e.g. `http://127.0.0.1:8188`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = normalize(base_url.into());
        self
    }

    /// Set the server origin from a host and port (plain HTTP).
    pub fn with_host_port(self, host: &str, port: u16) -> Self {
        self.with_base_url(format!("http://{}:{}", host, port))
    }

    /// Set the delay between history polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Bound the total time spent waiting for a prompt to finish.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.config.max_wait = Some(max_wait);
        self
    }

    /// Apply a timeout to every HTTP request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Associate submitted prompts with a client id.
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = Some(id.into());
        self
    }

    /// Build the final [`ClientConfig`].
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize("http://localhost:8188/".into()), "http://localhost:8188");
        assert_eq!(normalize("http://localhost:8188".into()), "http://localhost:8188");
        assert_eq!(normalize("http://host:8188///".into()), "http://host:8188");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8188");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(config.max_wait.is_none());
        assert!(config.request_timeout.is_none());
        assert!(config.client_id.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .with_host_port("10.0.0.5", 8190)
            .with_poll_interval(Duration::from_secs(3))
            .with_max_wait(Duration::from_secs(600))
            .with_request_timeout(Duration::from_secs(30))
            .with_client_id("render-farm")
            .build();

        assert_eq!(config.base_url, "http://10.0.0.5:8190");
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.max_wait, Some(Duration::from_secs(600)));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.client_id.as_deref(), Some("render-farm"));
    }

    #[test]
    fn test_new_trims_base_url() {
        let config = ClientConfig::new("http://comfy.local:8188/");
        assert_eq!(config.base_url, "http://comfy.local:8188");
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }
}
