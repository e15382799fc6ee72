use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "qclock").map(|pd| pd.config_dir().join("config.json"))
    }

    /// Default location for CSV exports
    pub fn export_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("qclock")
                .join("exports")
        } else {
            ProjectDirs::from("", "", "qclock")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("exports"))
                .unwrap_or_else(|| PathBuf::from("qclock-exports"))
        }
    }
}
