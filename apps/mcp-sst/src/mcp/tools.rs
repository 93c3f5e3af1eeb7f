use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::join_all;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};
use sst_core::events::{EventGroup, EventGroups, correlate, group_by_type};
use sst_core::proto::{DeploymentError, Event, FunctionInvocation, InvocationError};
use sst_project::{LogFile, Project, auto_discover, list_log_files, project_root};
use tracing::{debug, info, warn};

use super::project::{NO_SERVER, is_running, live_client, select_project};
use super::rpc::{
    McpError, parse_args, parse_required, tool_result_error, tool_result_json, tool_result_text,
};
use crate::config::Config;

const DEFAULT_LOG_LINES: usize = 50;
const STATUS_RESOURCE_LIMIT: usize = 20;
const INVOCATION_LOG_LIMIT: usize = 10;
const RECENT_EVENTS_PER_TYPE: usize = 5;

const TAB_REQUIRED: &str = "Error: 'tab' parameter required.";
const NO_DEPLOYMENT: &str = "No deployment data yet.";

pub fn definitions() -> Value {
    json!([
        {
            "name": "sst_discover",
            "description": "Discover running SST dev servers and available stages.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "directory": {"type": "string", "description": "Directory to search (defaults to the working directory)"}
                }
            }
        },
        {
            "name": "sst_list_tabs",
            "description": "List the log tabs written by SST dev.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "stage": {"type": "string", "description": "Stage name (optional)"}
                }
            }
        },
        {
            "name": "sst_read_logs",
            "description": "Read recent lines from an SST dev log tab, newest first. Page back with offset.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tab": {"type": "string", "description": "Tab name (e.g. 'sst', 'ui-function', 'pulumi')"},
                    "lines": {"type": "number", "description": "Number of lines (default: 50)"},
                    "offset": {"type": "number", "description": "Lines to skip from the newest end (default: 0)"}
                },
                "required": ["tab"]
            }
        },
        {
            "name": "sst_get_status",
            "description": "Get the current deployment status and resources from SST dev.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "stage": {"type": "string", "description": "Stage name (optional)"}
                }
            }
        },
        {
            "name": "sst_get_invocations",
            "description": "Listen to the SST dev event stream and report Lambda function invocations.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "timeoutMs": {"type": "number", "description": "Listen time in ms (default: 1000)"}
                }
            }
        },
        {
            "name": "sst_get_events",
            "description": "Listen to the SST dev event stream and summarize events by type.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "timeoutMs": {"type": "number", "description": "Listen time in ms (default: 1000)"},
                    "eventType": {"type": "string", "description": "Only report events of this type"}
                }
            }
        }
    ])
}

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

pub async fn call(params: Option<&Value>, config: &Config) -> Result<Value, McpError> {
    let CallParams { name, arguments } = parse_required(params)?;
    let arguments = arguments.as_ref();
    debug!(tool = %name, "tool call");

    match name.as_str() {
        "sst_discover" => discover(parse_args(arguments)?, config).await,
        "sst_list_tabs" => list_tabs(parse_args(arguments)?, config).await,
        "sst_read_logs" => read_logs(parse_args(arguments)?, config),
        "sst_get_status" => status(parse_args(arguments)?, config).await,
        "sst_get_invocations" => invocations(parse_args(arguments)?, config).await,
        "sst_get_events" => events(parse_args(arguments)?, config).await,
        _ => Err(McpError::UnknownTool(name)),
    }
}

/// Accepts any non-negative JSON number, truncating fractions.
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    number
        .as_u64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|value| value.is_finite() && *value >= 0.0)
                .map(|value| value as u64)
        })
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected a non-negative number, got {number}")))
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[derive(Debug, Default, Deserialize)]
struct DiscoverArgs {
    directory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StageArgs {
    stage: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReadLogsArgs {
    tab: Option<String>,
    #[serde(default, deserialize_with = "count")]
    lines: Option<u64>,
    #[serde(default, deserialize_with = "count")]
    offset: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectArgs {
    #[serde(default, deserialize_with = "count")]
    timeout_ms: Option<u64>,
    event_type: Option<String>,
}

impl CollectArgs {
    /// `0` or absent falls back to the configured window.
    fn budget(&self, config: &Config) -> Duration {
        match self.timeout_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => config.collect_timeout,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotFound<'a> {
    found: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_root: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveredProject<'a> {
    #[serde(flatten)]
    project: &'a Project,
    running: bool,
    log_files: Vec<String>,
}

#[derive(Serialize)]
struct Discovered<'a> {
    found: bool,
    projects: Vec<DiscoveredProject<'a>>,
}

async fn discover(args: DiscoverArgs, config: &Config) -> Result<Value, McpError> {
    let dir = match args.directory.as_deref().filter(|dir| !dir.is_empty()) {
        Some(dir) => config.resolve_dir(dir),
        None => config.working_dir.clone(),
    };
    let projects = auto_discover(&dir).map_err(McpError::io("discovering SST projects"))?;

    if projects.is_empty() {
        let body = match project_root(&dir) {
            Some(root) => NotFound {
                found: false,
                message: "SST project found but no dev servers running.",
                project_root: Some(root),
            },
            None => NotFound {
                found: false,
                message: "No SST project found",
                project_root: None,
            },
        };
        return tool_result_json(&body);
    }

    let running = join_all(projects.iter().map(|project| is_running(project))).await;
    let mut found = Vec::with_capacity(projects.len());
    for (project, running) in projects.iter().zip(running) {
        let log_files = list_log_files(&project.log_dir)
            .map_err(McpError::io("listing log tabs"))?
            .into_iter()
            .map(|file| file.name)
            .collect();
        found.push(DiscoveredProject {
            project,
            running,
            log_files,
        });
    }

    info!(dir = %dir.display(), stages = found.len(), "discovered dev servers");
    tool_result_json(&Discovered {
        found: true,
        projects: found,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TabEntry {
    name: String,
    size: String,
    last_modified: String,
}

impl From<LogFile> for TabEntry {
    fn from(file: LogFile) -> Self {
        Self {
            size: format_size(file.size),
            last_modified: format_timestamp(file.modified_at),
            name: file.name,
        }
    }
}

fn format_size(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

fn format_timestamp(at: SystemTime) -> String {
    DateTime::<Utc>::from(at).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TabsReport<'a> {
    stage: &'a str,
    server_url: &'a str,
    server_running: bool,
    tabs: Vec<TabEntry>,
}

async fn list_tabs(args: StageArgs, config: &Config) -> Result<Value, McpError> {
    let Some(project) = select_project(config, args.stage.as_deref())? else {
        return Ok(tool_result_text(NO_SERVER));
    };
    let files = list_log_files(&project.log_dir).map_err(McpError::io("listing log tabs"))?;
    let server_running = is_running(&project).await;

    tool_result_json(&TabsReport {
        stage: &project.stage,
        server_url: &project.server_url,
        server_running,
        tabs: files.into_iter().map(TabEntry::from).collect(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogsReport<'a> {
    tab: &'a str,
    stage: &'a str,
    total: usize,
    showing: usize,
    offset: usize,
    has_more: bool,
    lines: Vec<String>,
}

fn read_logs(args: ReadLogsArgs, config: &Config) -> Result<Value, McpError> {
    let Some(tab) = args.tab.filter(|tab| !tab.is_empty()) else {
        return Ok(tool_result_text(TAB_REQUIRED));
    };
    let limit = match args.lines {
        Some(lines) if lines > 0 => to_usize(lines),
        _ => DEFAULT_LOG_LINES,
    };
    let offset = args.offset.map(to_usize).unwrap_or(0);

    let Some(project) = select_project(config, None)? else {
        return Ok(tool_result_text(NO_SERVER));
    };
    let path = project.log_path(&tab)?;
    let page = sst_project::page(&path, offset, limit).map_err(McpError::io("reading log tab"))?;

    tool_result_json(&LogsReport {
        tab: &tab,
        stage: &project.stage,
        total: page.total,
        showing: page.lines.len(),
        offset,
        has_more: page.has_more,
        lines: page.lines,
    })
}

#[derive(Serialize)]
struct ResourceSummary<'a> {
    #[serde(rename = "type")]
    resource_type: &'a str,
    urn: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport<'a> {
    stage: &'a str,
    app: &'a str,
    finished: bool,
    errors: &'a Option<Vec<DeploymentError>>,
    outputs: &'a Option<Map<String, Value>>,
    hints: &'a Option<Map<String, Value>>,
    resource_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<Vec<ResourceSummary<'a>>>,
}

async fn status(args: StageArgs, config: &Config) -> Result<Value, McpError> {
    let Some(project) = select_project(config, args.stage.as_deref())? else {
        return Ok(tool_result_text(NO_SERVER));
    };
    let client = match live_client(&project).await {
        Ok(client) => client,
        Err(result) => return Ok(result),
    };

    let completed = match client.fetch_completed().await {
        Ok(Some(completed)) => completed,
        Ok(None) => return Ok(tool_result_text(NO_DEPLOYMENT)),
        Err(err) => {
            warn!(stage = %project.stage, %err, "failed to fetch deployment status");
            return Ok(tool_result_error(&err.to_string()));
        }
    };

    let resources = completed.resources.as_ref().map(|resources| {
        resources
            .iter()
            .take(STATUS_RESOURCE_LIMIT)
            .map(|resource| ResourceSummary {
                resource_type: &resource.resource_type,
                urn: &resource.urn,
            })
            .collect()
    });

    tool_result_json(&StatusReport {
        stage: &project.stage,
        app: &completed.app,
        finished: completed.finished,
        errors: &completed.errors,
        outputs: &completed.outputs,
        hints: &completed.hints,
        resource_count: completed.resource_count(),
        resources,
    })
}

/// Collect one window of events from a live server. The `Err` side is the
/// tool result to return instead.
async fn collect(project: &Project, budget: Duration) -> Result<Vec<Event>, Value> {
    let client = live_client(project).await?;
    client.collect_events(budget).await.map_err(|err| {
        warn!(stage = %project.stage, %err, "event stream failed");
        tool_result_error(&err.to_string())
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvocationSummary<'a> {
    function_id: &'a str,
    request_id: &'a str,
    has_output: bool,
    has_error: bool,
    log_count: usize,
    logs: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a InvocationError>,
}

impl<'a> From<&'a FunctionInvocation> for InvocationSummary<'a> {
    fn from(invocation: &'a FunctionInvocation) -> Self {
        let shown = invocation.logs.len().min(INVOCATION_LOG_LIMIT);
        Self {
            function_id: &invocation.function_id,
            request_id: &invocation.request_id,
            has_output: invocation
                .output
                .as_deref()
                .is_some_and(|output| !output.is_empty()),
            has_error: invocation.error.is_some(),
            log_count: invocation.logs.len(),
            logs: &invocation.logs[..shown],
            error: invocation.error.as_ref(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvocationsReport<'a> {
    stage: &'a str,
    collection_time_ms: u64,
    invocation_count: usize,
    invocations: Vec<InvocationSummary<'a>>,
}

async fn invocations(args: CollectArgs, config: &Config) -> Result<Value, McpError> {
    let budget = args.budget(config);
    let Some(project) = select_project(config, None)? else {
        return Ok(tool_result_text(NO_SERVER));
    };
    let events = match collect(&project, budget).await {
        Ok(events) => events,
        Err(result) => return Ok(result),
    };

    let invocations = correlate(&events);
    info!(
        stage = %project.stage,
        events = events.len(),
        invocations = invocations.len(),
        "collected invocations"
    );

    tool_result_json(&InvocationsReport {
        stage: &project.stage,
        collection_time_ms: budget.as_millis() as u64,
        invocation_count: invocations.len(),
        invocations: invocations.iter().map(InvocationSummary::from).collect(),
    })
}

#[derive(Serialize)]
struct TypeSummary<'a> {
    count: usize,
    recent: &'a [&'a Event],
}

impl<'a> From<&'a EventGroup<'a>> for TypeSummary<'a> {
    fn from(group: &'a EventGroup<'a>) -> Self {
        let from = group.events.len().saturating_sub(RECENT_EVENTS_PER_TYPE);
        Self {
            count: group.events.len(),
            recent: &group.events[from..],
        }
    }
}

/// Groups as a JSON object keyed by type, in first-seen order.
struct ByType<'g, 'a>(&'g EventGroups<'a>);

impl Serialize for ByType<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0
                .iter()
                .map(|group| (group.event_type, TypeSummary::from(group))),
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventsReport<'g, 'a> {
    stage: &'g str,
    collection_time_ms: u64,
    total_events: usize,
    event_types: Vec<&'a str>,
    events_by_type: ByType<'g, 'a>,
}

async fn events(args: CollectArgs, config: &Config) -> Result<Value, McpError> {
    let budget = args.budget(config);
    let Some(project) = select_project(config, None)? else {
        return Ok(tool_result_text(NO_SERVER));
    };
    let mut events = match collect(&project, budget).await {
        Ok(events) => events,
        Err(result) => return Ok(result),
    };

    if let Some(wanted) = args.event_type.as_deref().filter(|wanted| !wanted.is_empty()) {
        events.retain(|event| event.event_type == wanted);
    }
    let groups = group_by_type(&events);
    info!(
        stage = %project.stage,
        events = events.len(),
        types = groups.len(),
        "collected events"
    );

    tool_result_json(&EventsReport {
        stage: &project.stage,
        collection_time_ms: budget.as_millis() as u64,
        total_events: events.len(),
        event_types: groups.types().collect(),
        events_by_type: ByType(&groups),
    })
}
