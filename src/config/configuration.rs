//! The merged, immutable configuration tree.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::config::loader::ConfigError;
use crate::config::schema::HostConfig;

/// Opaque key-value configuration plus the typed host settings read from it.
///
/// Cloned into the service registry at start-up so registration code can read
/// its own sections without the host knowing about them.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    values: Table,
    settings: HostConfig,
    environment: String,
    files: Vec<PathBuf>,
}

impl Configuration {
    pub fn new(
        values: Table,
        settings: HostConfig,
        environment: String,
        files: Vec<PathBuf>,
    ) -> Self {
        Self {
            values,
            settings,
            environment,
            files,
        }
    }

    /// Build from typed settings alone, with no files or extra keys.
    pub fn from_settings(settings: HostConfig) -> Self {
        let values = match Value::try_from(&settings) {
            Ok(Value::Table(table)) => table,
            _ => Table::new(),
        };
        Self {
            values,
            settings,
            environment: String::new(),
            files: Vec::new(),
        }
    }

    pub fn settings(&self) -> &HostConfig {
        &self.settings
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Files that contributed to this configuration, in merge order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The whole merged tree.
    pub fn values(&self) -> &Table {
        &self.values
    }

    /// Look up a dotted key such as `worker.delay_ms`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Deserialize the section at `key` into `T`.
    pub fn section<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        value
            .clone()
            .try_into::<T>()
            .map(Some)
            .map_err(|source| ConfigError::Section {
                key: key.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Database {
        url: String,
        pool_size: u32,
    }

    fn sample() -> Configuration {
        let values: Table = r#"
            [database]
            url = "postgres://localhost/app"
            pool_size = 4

            [worker]
            delay_ms = 25
        "#
        .parse()
        .unwrap();
        Configuration::new(values, HostConfig::default(), "test".into(), Vec::new())
    }

    #[test]
    fn test_dotted_lookup() {
        let config = sample();
        assert_eq!(config.get("worker.delay_ms"), Some(&Value::Integer(25)));
        assert_eq!(config.get_str("database.url"), Some("postgres://localhost/app"));
        assert!(config.get("worker.missing").is_none());
        assert!(config.get("worker.delay_ms.deeper").is_none());
    }

    #[test]
    fn test_section_deserializes() {
        let config = sample();
        let db: Database = config.section("database").unwrap().unwrap();
        assert_eq!(db.pool_size, 4);
        assert!(config.section::<Database>("cache").unwrap().is_none());
    }

    #[test]
    fn test_section_type_error() {
        let config = sample();
        let err = config.section::<Database>("worker").unwrap_err();
        assert!(err.to_string().contains("worker"));
    }

    #[test]
    fn test_from_settings_exposes_values() {
        let config = Configuration::from_settings(HostConfig::default());
        assert_eq!(config.get("worker.delay_ms"), Some(&Value::Integer(10)));
        assert_eq!(config.get_str("logging.format"), Some("pretty"));
    }
}
