use std::fmt;
use std::path::Component;
use std::path::Path;

use crate::CoreError;

pub const LOG_RESOURCE_SCHEME: &str = "sst://logs/";

/// `sst://logs/{stage}/{tab}` identifier of one log tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogResource {
    pub stage: String,
    pub tab: String,
}

impl LogResource {
    pub fn new(stage: impl Into<String>, tab: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            tab: tab.into(),
        }
    }

    pub fn parse(uri: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidResourceUri(uri.to_string());
        let rest = uri.strip_prefix(LOG_RESOURCE_SCHEME).ok_or_else(invalid)?;
        let (stage, tab) = rest.split_once('/').ok_or_else(invalid)?;
        if stage.is_empty() || tab.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(stage, tab))
    }

    pub fn uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LogResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LOG_RESOURCE_SCHEME}{}/{}", self.stage, self.tab)
    }
}

/// A tab name must map to exactly one file inside the log directory.
pub fn validate_tab_name(tab: &str) -> Result<&str, CoreError> {
    let mut components = Path::new(tab).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if tab.is_empty() || !single_normal || tab.contains(['/', '\\']) {
        return Err(CoreError::InvalidTab(tab.to_string()));
    }
    Ok(tab)
}
