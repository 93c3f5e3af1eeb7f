pub mod discovery;
pub mod logs;

pub use discovery::{
    Project, auto_discover, available_stages, discover_server, find_config, project_root,
};
pub use logs::{LogFile, LogPage, LogWindow, list_log_files, page, read_log_lines, tail_lines};
