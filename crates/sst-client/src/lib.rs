mod completed;
mod errors;
mod health;
pub mod stream;

#[cfg(test)]
mod test_server;

use reqwest::Client;
use std::time::Duration;
use url::Url;

pub use errors::ClientError;
pub use health::{HEALTH_TIMEOUT, STATUS_PATH};
pub use stream::STREAM_PATH;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client bound to one dev server.
///
/// No overall request timeout is configured on the inner client: the event
/// stream is long-lived and each operation bounds itself.
pub struct DevServerClient {
    client: Client,
    base_url: String,
}

impl DevServerClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let trimmed = server_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|source| ClientError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;
        Ok(Self {
            client: Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
