use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api-endpoint";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how long to wait. Compiled in; nothing is read from the
/// environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl ProbeConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
