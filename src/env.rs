use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "update_paper_config.json";
pub const DEFAULT_SCRIPT_FILE: &str = "start_noupdate.sh";

/// On-disk locations the updater works with.
///
/// The updater lives in a folder inside the server directory, so by default
/// the server directory is the parent of the folder holding the executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config_file: PathBuf,
    pub server_dir: PathBuf,
}

impl Paths {
    pub fn resolve(config_file: Option<PathBuf>, server_dir: Option<PathBuf>) -> Self {
        let program_dir = program_dir();
        let server_dir = server_dir.unwrap_or_else(|| parent_or_self(&program_dir));
        let config_file = config_file.unwrap_or_else(|| program_dir.join(CONFIG_FILE));
        Self {
            config_file,
            server_dir,
        }
    }

    pub fn default_script(&self) -> PathBuf {
        self.server_dir.join(DEFAULT_SCRIPT_FILE)
    }
}

/// Directory containing the running executable, with symlinks resolved.
pub fn program_dir() -> PathBuf {
    env::current_exe()
        .and_then(|exe| exe.canonicalize())
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn parent_or_self(dir: &Path) -> PathBuf {
    dir.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.to_path_buf())
}
