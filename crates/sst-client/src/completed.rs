use sst_core::proto::CompleteEvent;
use tracing::debug;

use crate::{ClientError, DevServerClient, STATUS_PATH};

impl DevServerClient {
    /// Latest deployment snapshot. A non-success status means the server has
    /// no completed deployment to report yet.
    pub async fn fetch_completed(&self) -> Result<Option<CompleteEvent>, ClientError> {
        let url = self.endpoint(STATUS_PATH);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "no deployment snapshot available");
            return Ok(None);
        }
        let completed = response.json::<CompleteEvent>().await?;
        Ok(Some(completed))
    }
}
