use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deployment-completion snapshot served at `/api/completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteEvent {
    #[serde(rename = "App", default)]
    pub app: String,
    #[serde(rename = "Stage", default)]
    pub stage: String,
    #[serde(rename = "Finished", default)]
    pub finished: bool,
    #[serde(rename = "Errors")]
    pub errors: Option<Vec<DeploymentError>>,
    #[serde(rename = "Outputs")]
    pub outputs: Option<Map<String, Value>>,
    #[serde(rename = "Hints")]
    pub hints: Option<Map<String, Value>>,
    #[serde(rename = "Resources")]
    pub resources: Option<Vec<Resource>>,
}

impl CompleteEvent {
    pub fn resources(&self) -> &[Resource] {
        self.resources.as_deref().unwrap_or_default()
    }

    pub fn resource_count(&self) -> usize {
        self.resources().len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentError {
    #[serde(rename = "URN", default)]
    pub urn: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "Type", default)]
    pub resource_type: String,
    #[serde(rename = "URN", default)]
    pub urn: String,
    #[serde(rename = "Outputs")]
    pub outputs: Option<Map<String, Value>>,
}
