use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use sitematch_session::completion::Latency;

/// Settings read from `sitematch.toml`, overridden by `SITEMATCH_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub store_path:              PathBuf,
  pub registration_delay_ms:   u64,
  pub profile_update_delay_ms: u64,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store_path:              PathBuf::from("sitematch.sqlite3"),
      registration_delay_ms:   2000,
      profile_update_delay_ms: 1500,
    }
  }
}

impl AppConfig {
  /// Layer the optional config file under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SITEMATCH"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut cfg: AppConfig = settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn latency(&self) -> Latency {
    Latency::from_millis(self.registration_delay_ms, self.profile_update_delay_ms)
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

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::load(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.store_path, PathBuf::from("sitematch.sqlite3"));
    assert_eq!(cfg.latency(), Latency::default());
  }

  #[test]
  fn file_values_override_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "store_path = \"/tmp/site.db\"\nregistration_delay_ms = 0").unwrap();

    let cfg = AppConfig::load(file.path()).unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/site.db"));
    assert_eq!(cfg.registration_delay_ms, 0);
    assert_eq!(cfg.profile_update_delay_ms, 1500);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(
      expand_tilde(Path::new("~/sitematch.sqlite3")),
      PathBuf::from(home).join("sitematch.sqlite3")
    );
    assert_eq!(expand_tilde(Path::new("/abs/path")), PathBuf::from("/abs/path"));
  }
}
