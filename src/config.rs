use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub store: StoreConfig,
  /// Custom title for header (defaults to the store domain if not set)
  pub title: Option<String>,
  /// Demo credentials prefilled on the login screen, for workspaces that
  /// expose a throwaway account
  pub demo: Option<DemoConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Base url of the hosted backend, e.g. https://myproject.example.co
  pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
  pub email: String,
  pub password: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./deskview.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/deskview/config.yaml
  /// 4. ~/.config/deskview/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/deskview/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("deskview.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("deskview").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the store's anonymous API key from environment variables.
  ///
  /// Checks DESKVIEW_STORE_KEY first, then STORE_ANON_KEY as fallback. The
  /// key never lives in the config file.
  pub fn get_store_key() -> Result<String> {
    std::env::var("DESKVIEW_STORE_KEY")
      .or_else(|_| std::env::var("STORE_ANON_KEY"))
      .map_err(|_| {
        eyre!(
          "Store API key not found. Set DESKVIEW_STORE_KEY or STORE_ANON_KEY environment variable."
        )
      })
  }
}
