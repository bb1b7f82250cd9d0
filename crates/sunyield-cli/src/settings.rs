//! Runtime configuration: an optional TOML file layered with `SUNYIELD_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, builder::{ConfigBuilder, DefaultState}};
use serde::Deserialize;
use sunyield_core::site::{Site, default_sites};

/// Deserialised configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite database file. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Site catalogue registered by `sunyield init`.
  #[serde(default = "default_sites")]
  pub sites:      Vec<Site>,
}

fn default_store_path() -> PathBuf { PathBuf::from("sunyield.db") }

impl Settings {
  /// Read `path` if it exists, then apply environment overrides.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(Config::builder().add_source(File::from(path).required(false)))
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    let config = builder
      .add_source(Environment::with_prefix("SUNYIELD"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = config
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
