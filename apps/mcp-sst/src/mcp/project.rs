use serde_json::Value;
use sst_client::DevServerClient;
use sst_project::{Project, auto_discover};
use tracing::warn;

use super::rpc::{McpError, tool_result_error, tool_result_text};
use crate::config::Config;

pub const NO_SERVER: &str = "No running SST dev server found.";

/// Pick the dev server a call should talk to.
///
/// An explicit `stage` must exist. Without one the configured preferred
/// stage wins when it is running, then the first stage found.
pub fn select_project(config: &Config, stage: Option<&str>) -> Result<Option<Project>, McpError> {
    let mut projects =
        auto_discover(&config.working_dir).map_err(McpError::io("discovering SST projects"))?;
    if projects.is_empty() {
        return Ok(None);
    }

    if let Some(stage) = stage.filter(|stage| !stage.is_empty()) {
        return match projects.iter().position(|project| project.stage == stage) {
            Some(slot) => Ok(Some(projects.swap_remove(slot))),
            None => Err(McpError::UnknownStage(stage.to_string())),
        };
    }

    if let Some(preferred) = config.preferred_stage.as_deref() {
        match projects.iter().position(|project| project.stage == preferred) {
            Some(slot) => return Ok(Some(projects.swap_remove(slot))),
            None => warn!(stage = preferred, "preferred stage is not running"),
        }
    }

    Ok(projects.into_iter().next())
}

pub async fn is_running(project: &Project) -> bool {
    match DevServerClient::new(&project.server_url) {
        Ok(client) => client.is_up().await,
        Err(err) => {
            warn!(stage = %project.stage, %err, "unusable server url");
            false
        }
    }
}

/// Client for a server that just answered a health probe. The `Err` side is
/// the tool result to hand back instead.
pub async fn live_client(project: &Project) -> Result<DevServerClient, Value> {
    let client = DevServerClient::new(&project.server_url).map_err(|err| {
        warn!(stage = %project.stage, %err, "unusable server url");
        tool_result_error(&err.to_string())
    })?;
    if !client.is_up().await {
        return Err(tool_result_text(&format!(
            "SST dev server for '{}' not responding.",
            project.stage
        )));
    }
    Ok(client)
}
