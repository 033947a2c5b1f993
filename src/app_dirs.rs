use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "focus") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("focus_config.json")
        }
    }

    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("focus");
            Some(state_dir.join("focus.log"))
        } else {
            ProjectDirs::from("", "", "focus")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("focus.log"))
        }
    }
}
