use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sst_core::CoreError;
use thiserror::Error;

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Failures surfaced to the client as JSON-RPC error objects.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid params: {0}")]
    InvalidParams(#[source] serde_json::Error),

    #[error("missing params")]
    MissingParams,

    #[error("no SST project found")]
    NoProject,

    #[error("no SST dev server for stage: {0}")]
    UnknownStage(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode result: {0}")]
    Encode(#[source] serde_json::Error),
}

impl McpError {
    pub fn io(context: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { context, source }
    }

    pub fn code(&self) -> i64 {
        match self {
            McpError::UnknownTool(_)
            | McpError::InvalidParams(_)
            | McpError::MissingParams
            | McpError::NoProject
            | McpError::UnknownStage(_)
            | McpError::Core(_) => INVALID_PARAMS,
            McpError::Io { .. } | McpError::Encode(_) => INTERNAL_ERROR,
        }
    }

    pub fn into_response(self, id: &Value) -> Value {
        jsonrpc_error(id, self.code(), &self.to_string())
    }
}

pub fn jsonrpc_result(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

pub fn jsonrpc_error(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message,
        },
    })
}

pub fn tool_result_text(text: &str) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
    })
}

/// A tool call that ran but failed, reported in-band with `isError`.
pub fn tool_result_error(text: &str) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "isError": true,
    })
}

/// Pretty-printed JSON as the text of a tool result.
pub fn tool_result_json<T: Serialize>(body: &T) -> Result<Value, McpError> {
    let text = serde_json::to_string_pretty(body).map_err(McpError::Encode)?;
    Ok(tool_result_text(&text))
}

/// Decode typed params. An absent or `null` value decodes as the default.
pub fn parse_args<T: DeserializeOwned + Default>(value: Option<&Value>) -> Result<T, McpError> {
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => T::deserialize(value).map_err(McpError::InvalidParams),
    }
}

/// Decode params that must be present.
pub fn parse_required<T: DeserializeOwned>(value: Option<&Value>) -> Result<T, McpError> {
    match value {
        None | Some(Value::Null) => Err(McpError::MissingParams),
        Some(value) => T::deserialize(value).map_err(McpError::InvalidParams),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Sample {
        name: Option<String>,
    }

    #[test]
    fn result_and_error_envelopes() {
        let result = jsonrpc_result(&json!(1), json!({"key": "value"}));
        assert_eq!(result["jsonrpc"], "2.0");
        assert_eq!(result["id"], 1);
        assert_eq!(result["result"]["key"], "value");

        let error = jsonrpc_error(&json!("a"), METHOD_NOT_FOUND, "Method not found: nope");
        assert_eq!(error["id"], "a");
        assert_eq!(error["error"]["code"], -32601);
        assert_eq!(error["error"]["message"], "Method not found: nope");
        assert!(error.get("result").is_none());
    }

    #[test]
    fn tool_results_mark_errors_in_band() {
        let ok = tool_result_text("hello");
        assert_eq!(ok["content"][0]["type"], "text");
        assert_eq!(ok["content"][0]["text"], "hello");
        assert!(ok.get("isError").is_none());

        let failed = tool_result_error("connection refused");
        assert_eq!(failed["isError"], true);
    }

    #[test]
    fn json_results_are_pretty_printed() {
        let result = tool_result_json(&json!({"a": 1})).unwrap();
        assert_eq!(result["content"][0]["text"], "{\n  \"a\": 1\n}");
    }

    #[test]
    fn error_codes() {
        assert_eq!(McpError::UnknownTool("x".into()).code(), INVALID_PARAMS);
        assert_eq!(McpError::UnknownStage("x".into()).code(), INVALID_PARAMS);
        assert_eq!(
            McpError::Core(CoreError::InvalidTab("..".into())).code(),
            INVALID_PARAMS
        );
        let io_err = McpError::io("reading logs")(io::Error::other("disk"));
        assert_eq!(io_err.code(), INTERNAL_ERROR);
        assert_eq!(io_err.to_string(), "reading logs: disk");

        let response = McpError::UnknownTool("nope".into()).into_response(&json!(7));
        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
        assert_eq!(response["error"]["message"], "unknown tool: nope");
    }

    #[test]
    fn absent_args_decode_as_default() {
        let sample: Sample = parse_args(None).unwrap();
        assert!(sample.name.is_none());
        let sample: Sample = parse_args(Some(&Value::Null)).unwrap();
        assert!(sample.name.is_none());
        let sample: Sample = parse_args(Some(&json!({"name": "x", "extra": 1}))).unwrap();
        assert_eq!(sample.name.as_deref(), Some("x"));

        let err = parse_args::<Sample>(Some(&json!({"name": 5}))).unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS);
        assert!(matches!(
            parse_required::<Sample>(None),
            Err(McpError::MissingParams)
        ));
    }
}
