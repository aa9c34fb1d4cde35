use serde::de::Deserialize;

use config::{Config, ConfigError, Value, File, Environment};

use crate::error::*;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub conf: Config
}

impl AppConfig {
  /// Load `conf/default`, then either `config_file` or `conf/{RUN_MODE}` plus
  /// `APP_*` environment overrides (`APP_BACKEND__PROJECT_ID` -> `backend.project_id`).
  pub fn new(config_file: Option<&str>) -> Result<Self> {
    let mut builder = Config::builder()
      // Load defaults
      .add_source(File::with_name("conf/default").required(false));

    if let Some(config_file) = config_file {
      builder = builder.add_source(File::with_name(config_file));
    } else {
      // Get RUN_MODE from environment
      let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
      builder = builder
        .add_source(File::with_name(&format!("conf/{}", env)).required(false))
        // Allow overrides from environment
        .add_source(Environment::with_prefix("APP").prefix_separator("_").separator("__"));
    }

    Ok(AppConfig {
      conf: builder.build()?,
    })
  }

  /// Config built only from key/value pairs.
  pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self> {
    let mut builder = Config::builder();
    for (key, val) in pairs {
      builder = builder.set_override(*key, *val)?;
    }
    Ok(AppConfig {
      conf: builder.build()?,
    })
  }

  /// Same config with `key` forced to `val`.
  pub fn with_override(self, key: &str, val: &str) -> Result<Self> {
    let conf = Config::builder()
      .add_source(self.conf)
      .set_override(key, val)?
      .build()?;
    Ok(AppConfig { conf })
  }

  pub fn get<'de, T: Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
    Ok(self.conf.get(key).map(Some).or_else(|e| {
      match e {
        ConfigError::NotFound(_) => Ok(None),
        err => Err(err),
      }
    })?)
  }

  pub fn get_str(&self, key: &str) -> Result<Option<String>> {
    let val = if let Some(val) = self.get::<Value>(key)? {
      Some(val.into_string()?)
    } else {
      None
    };
    Ok(val)
  }

  pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
    let val = if let Some(val) = self.get::<Value>(key)? {
      Some(val.into_int()?)
    } else {
      None
    };
    Ok(val)
  }

  pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
    let val = if let Some(val) = self.get::<Value>(key)? {
      Some(val.into_bool()?)
    } else {
      None
    };
    Ok(val)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn typed_getters() {
    let config = AppConfig::from_pairs(&[
      ("backend.kind", "memory"),
      ("post.latest_limit", "5"),
      ("user.allow_register", "false"),
    ]).unwrap();
    assert_eq!(config.get_str("backend.kind").unwrap(), Some("memory".to_string()));
    assert_eq!(config.get_int("post.latest_limit").unwrap(), Some(5));
    assert_eq!(config.get_bool("user.allow_register").unwrap(), Some(false));
    assert_eq!(config.get_str("backend.endpoint").unwrap(), None);
  }

  #[test]
  fn override_replaces_value() {
    let config = AppConfig::from_pairs(&[("backend.kind", "appwrite")]).unwrap()
      .with_override("backend.kind", "memory").unwrap();
    assert_eq!(config.get_str("backend.kind").unwrap(), Some("memory".to_string()));
  }
}
