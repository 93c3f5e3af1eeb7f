use serde::Deserialize;
use serde_json::{Value, json};
use sst_core::proto::LogResource;
use sst_project::{discover_server, list_log_files, project_root, tail_lines};

use super::project::select_project;
use super::rpc::{McpError, parse_required};
use crate::config::Config;

const MIME_TYPE: &str = "text/plain";

pub fn list(config: &Config) -> Result<Value, McpError> {
    let Some(project) = select_project(config, None)? else {
        return Ok(json!({ "resources": [] }));
    };
    let files = list_log_files(&project.log_dir).map_err(McpError::io("listing log tabs"))?;

    let resources: Vec<Value> = files
        .iter()
        .map(|file| {
            json!({
                "uri": LogResource::new(&project.stage, &file.name).uri(),
                "name": format!("{} ({})", file.name, project.stage),
                "description": format!("SST dev log: {}", file.name),
                "mimeType": MIME_TYPE,
            })
        })
        .collect();
    Ok(json!({ "resources": resources }))
}

#[derive(Deserialize)]
struct ReadParams {
    uri: String,
}

pub fn read(params: Option<&Value>, config: &Config, lines: usize) -> Result<Value, McpError> {
    let ReadParams { uri } = parse_required(params)?;
    let resource = LogResource::parse(&uri)?;

    let root = project_root(&config.working_dir).ok_or(McpError::NoProject)?;
    let project = discover_server(&root, &resource.stage)
        .map_err(McpError::io("reading server pointer"))?
        .ok_or_else(|| McpError::UnknownStage(resource.stage.clone()))?;
    let path = project.log_path(&resource.tab)?;
    let tail = tail_lines(&path, lines).map_err(McpError::io("reading log tab"))?;

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": MIME_TYPE,
            "text": tail.join("\n"),
        }]
    }))
}
