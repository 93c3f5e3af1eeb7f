use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::Event;
use crate::CoreError;

pub const FUNCTION_INVOKED: &str = "aws.FunctionInvokedEvent";
pub const FUNCTION_LOG: &str = "aws.FunctionLogEvent";
pub const FUNCTION_RESPONSE: &str = "aws.FunctionResponseEvent";
pub const FUNCTION_ERROR: &str = "aws.FunctionErrorEvent";

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionInvoked {
    #[serde(rename = "FunctionID", default)]
    pub function_id: String,
    #[serde(rename = "WorkerID", default)]
    pub worker_id: String,
    #[serde(rename = "RequestID")]
    pub request_id: String,
    #[serde(rename = "Input", default, deserialize_with = "text_or_json")]
    pub input: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionLog {
    #[serde(rename = "FunctionID", default)]
    pub function_id: String,
    #[serde(rename = "WorkerID", default)]
    pub worker_id: String,
    #[serde(rename = "RequestID")]
    pub request_id: String,
    #[serde(rename = "Line", default)]
    pub line: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionResponse {
    #[serde(rename = "FunctionID", default)]
    pub function_id: String,
    #[serde(rename = "WorkerID", default)]
    pub worker_id: String,
    #[serde(rename = "RequestID")]
    pub request_id: String,
    #[serde(rename = "Output", default, deserialize_with = "text_or_json")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionError {
    #[serde(rename = "FunctionID", default)]
    pub function_id: String,
    #[serde(rename = "WorkerID", default)]
    pub worker_id: String,
    #[serde(rename = "RequestID")]
    pub request_id: String,
    #[serde(rename = "ErrorType", default)]
    pub error_type: String,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: String,
    #[serde(rename = "Trace", default)]
    pub trace: Option<Vec<String>>,
}

/// Typed view over the four function-lifecycle event types.
#[derive(Debug, Clone)]
pub enum FunctionEvent {
    Invoked(FunctionInvoked),
    Log(FunctionLog),
    Response(FunctionResponse),
    Error(FunctionError),
}

impl FunctionEvent {
    /// `None` when the event is not a function-lifecycle event at all.
    pub fn from_event(event: &Event) -> Option<Result<Self, CoreError>> {
        let decoded = match event.event_type.as_str() {
            FUNCTION_INVOKED => decode(FUNCTION_INVOKED, &event.payload).map(Self::Invoked),
            FUNCTION_LOG => decode(FUNCTION_LOG, &event.payload).map(Self::Log),
            FUNCTION_RESPONSE => decode(FUNCTION_RESPONSE, &event.payload).map(Self::Response),
            FUNCTION_ERROR => decode(FUNCTION_ERROR, &event.payload).map(Self::Error),
            _ => return None,
        };
        Some(decoded)
    }
}

fn decode<T: DeserializeOwned>(event_type: &'static str, payload: &Value) -> Result<T, CoreError> {
    T::deserialize(payload).map_err(|err| CoreError::decode(event_type, err))
}

/// Strings are kept verbatim; any other JSON value is rendered compactly.
fn text_or_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        Value::String(text) => text,
        other => other.to_string(),
    }))
}

/// Lifecycle of one function execution, rebuilt from the events that share
/// its request id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInvocation {
    pub function_id: String,
    pub request_id: String,
    pub worker_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<InvocationError>,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl From<FunctionInvoked> for FunctionInvocation {
    fn from(evt: FunctionInvoked) -> Self {
        Self {
            function_id: evt.function_id,
            request_id: evt.request_id,
            worker_id: evt.worker_id,
            input: evt.input,
            output: None,
            error: None,
            logs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub trace: Vec<String>,
}

impl From<FunctionError> for InvocationError {
    fn from(evt: FunctionError) -> Self {
        Self {
            error_type: evt.error_type,
            message: evt.error_message,
            trace: evt.trace.unwrap_or_default(),
        }
    }
}
