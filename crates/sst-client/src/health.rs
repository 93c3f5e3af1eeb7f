use std::time::Duration;

use tracing::debug;

use crate::DevServerClient;

pub const STATUS_PATH: &str = "/api/completed";
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(1);

impl DevServerClient {
    /// Single liveness sample: one request, no retry.
    pub async fn is_up(&self) -> bool {
        let url = self.endpoint(STATUS_PATH);
        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    debug!(%url, %status, "health probe got non-success status");
                }
                status.is_success()
            }
            Err(err) => {
                debug!(%url, %err, "health probe failed");
                false
            }
        }
    }
}
