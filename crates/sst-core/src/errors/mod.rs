use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed {event_type} payload: {source}")]
    Decode {
        event_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid tab name: {0:?}")]
    InvalidTab(String),

    #[error("invalid resource URI: {0}")]
    InvalidResourceUri(String),
}

impl CoreError {
    pub fn decode(event_type: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { event_type, source }
    }
}
