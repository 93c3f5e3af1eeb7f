use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_RESOURCE_LINES: usize = 500;

/// Process-wide settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub working_dir: PathBuf,
    pub preferred_stage: Option<String>,
    pub collect_timeout: Duration,
    pub resource_lines: usize,
}

impl Config {
    pub fn new(working_dir: &Path) -> Self {
        Self {
            working_dir: working_dir
                .canonicalize()
                .unwrap_or_else(|_| working_dir.to_path_buf()),
            preferred_stage: None,
            collect_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            resource_lines: DEFAULT_RESOURCE_LINES,
        }
    }

    pub fn with_stage(mut self, stage: Option<String>) -> Self {
        self.preferred_stage = stage.filter(|stage| !stage.trim().is_empty());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        if timeout_ms > 0 {
            self.collect_timeout = Duration::from_millis(timeout_ms);
        }
        self
    }

    pub fn with_resource_lines(mut self, lines: usize) -> Self {
        if lines > 0 {
            self.resource_lines = lines;
        }
        self
    }

    /// Resolve a user-supplied directory against the working directory.
    pub fn resolve_dir(&self, dir: &str) -> PathBuf {
        let path = Path::new(dir);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_keep_defaults() {
        let config = Config::new(Path::new("/nonexistent/project"))
            .with_timeout_ms(0)
            .with_resource_lines(0)
            .with_stage(Some("  ".into()));
        assert_eq!(config.collect_timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.resource_lines, DEFAULT_RESOURCE_LINES);
        assert!(config.preferred_stage.is_none());
        assert_eq!(config.working_dir, PathBuf::from("/nonexistent/project"));
    }

    #[test]
    fn relative_dirs_resolve_against_working_dir() {
        let config = Config::new(Path::new("/nonexistent/project"));
        assert_eq!(
            config.resolve_dir("packages/web"),
            PathBuf::from("/nonexistent/project/packages/web")
        );
        assert_eq!(config.resolve_dir("/srv/app"), PathBuf::from("/srv/app"));
    }
}
