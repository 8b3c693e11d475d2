use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const APP_NAME: &str = "namecap";

pub fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", APP_NAME)
}

/// Default location of the persisted name list and settings.
pub fn default_data_dir() -> PathBuf {
  project_dirs().map(|d| d.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from(".namecap"))
}

/// User preferences that are not part of the name list itself.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Directory exports are written to; the working directory when unset.
  pub export_dir: Option<PathBuf>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = project_dirs() {
      self.save_to(proj_dirs.config_dir());
    }
  }

  /// Best-effort write of `prefs.toml` into `config_dir`; failures are logged, not returned.
  fn save_to(&self, config_dir: &Path) {
    if let Err(e) = std::fs::create_dir_all(config_dir) {
      warn!(dir = %config_dir.display(), err = %e, "config: failed to create config directory");
      return;
    }
    let config_file = config_dir.join("prefs.toml");
    match toml::to_string(self) {
      Ok(content) => {
        if let Err(e) = std::fs::write(&config_file, content) {
          warn!(path = %config_file.display(), err = %e, "config: failed to write prefs");
        }
      }
      Err(e) => warn!(err = %e, "config: failed to serialize prefs"),
    }
  }

  pub fn export_dir(&self) -> PathBuf {
    self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
  }
}
