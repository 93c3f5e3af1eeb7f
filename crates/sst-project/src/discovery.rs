//! Locating an SST project and its running dev servers on disk.
//!
//! A project root is the nearest directory holding `sst.config.ts` or
//! `sst.config.js`. Every `sst dev` process writes its listen URL to
//! `.sst/{stage}.server` and its log tabs to `.sst/log/{tab}.log`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sst_core::CoreError;
use sst_core::proto::validate_tab_name;
use tracing::{debug, warn};

const CONFIG_FILES: [&str; 2] = ["sst.config.ts", "sst.config.js"];
const STATE_DIR: &str = ".sst";
const SERVER_EXT: &str = "server";
const LOG_DIR: &str = "log";
const LOG_EXT: &str = "log";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub root: PathBuf,
    pub stage: String,
    pub server_url: String,
    pub log_dir: PathBuf,
}

impl Project {
    /// Path of the log file backing `tab`. Names that would escape the log
    /// directory are rejected.
    pub fn log_path(&self, tab: &str) -> Result<PathBuf, CoreError> {
        let tab = validate_tab_name(tab)?;
        Ok(self.log_dir.join(format!("{tab}.{LOG_EXT}")))
    }
}

/// Nearest config file at or above `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

pub fn project_root(start: &Path) -> Option<PathBuf> {
    find_config(start).and_then(|config| config.parent().map(Path::to_path_buf))
}

/// Stage names that have a `.server` pointer file, sorted.
pub fn available_stages(root: &Path) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(root.join(STATE_DIR)) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut stages = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(SERVER_EXT) {
            continue;
        }
        if let Some(stage) = path.file_stem().and_then(|stem| stem.to_str()) {
            stages.push(stage.to_string());
        }
    }
    stages.sort();
    Ok(stages)
}

pub fn discover_server(root: &Path, stage: &str) -> io::Result<Option<Project>> {
    let pointer = root.join(STATE_DIR).join(format!("{stage}.{SERVER_EXT}"));
    let contents = match fs::read_to_string(&pointer) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    let server_url = contents.trim();
    if server_url.is_empty() {
        warn!(path = %pointer.display(), "server pointer file is empty");
        return Ok(None);
    }

    Ok(Some(Project {
        root: root.to_path_buf(),
        stage: stage.to_string(),
        server_url: server_url.to_string(),
        log_dir: root.join(STATE_DIR).join(LOG_DIR),
    }))
}

/// Every discoverable stage of the project enclosing `start`.
pub fn auto_discover(start: &Path) -> io::Result<Vec<Project>> {
    let Some(root) = project_root(start) else {
        debug!(start = %start.display(), "no sst config found");
        return Ok(Vec::new());
    };

    let mut projects = Vec::new();
    for stage in available_stages(&root)? {
        if let Some(project) = discover_server(&root, &stage)? {
            projects.push(project);
        }
    }
    Ok(projects)
}
