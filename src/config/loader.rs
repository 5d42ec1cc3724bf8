//! Configuration loading from disk, environment and command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::{Table, Value};

use crate::config::configuration::Configuration;
use crate::config::schema::HostConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Base file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "host.toml";

/// Prefix for environment variable overrides (`SERVICE_HOST__WORKER__DELAY_MS`).
pub const ENV_PREFIX: &str = "SERVICE_HOST__";

const ENV_SEPARATOR: &str = "__";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid override '{entry}': {reason}")]
    Override { entry: String, reason: String },

    #[error("invalid value for '{key}': {source}")]
    Section {
        key: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where configuration comes from, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit base file. When `None`, [`DEFAULT_CONFIG_FILE`] is used if present.
    pub path: Option<PathBuf>,

    /// Environment name selecting the `<stem>.<environment>.toml` overlay.
    pub environment: String,

    /// Process environment, filtered by [`ENV_PREFIX`].
    pub env_vars: Vec<(String, String)>,

    /// `key=value` overrides from the command line.
    pub overrides: Vec<String>,
}

/// Load, merge and validate configuration from every layer of `source`.
pub fn load_configuration(source: &ConfigSource) -> Result<Configuration, ConfigError> {
    let base_path = match &source.path {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.clone())),
        Some(path) => Some(path.clone()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    };

    let mut values = Table::new();
    let mut files = Vec::new();
    let schema = schema_table();

    if let Some(base) = base_path {
        merge_tables(&mut values, read_table(&base)?);
        files.push(base.clone());

        if let Some(overlay) = overlay_path(&base, &source.environment) {
            if overlay.exists() {
                merge_tables(&mut values, read_table(&overlay)?);
                files.push(overlay);
            }
        }
    }

    for (name, raw) in &source.env_vars {
        let Some(key) = env_key(name) else {
            continue;
        };
        let value = typed_scalar(&schema, &values, &key, raw);
        set_dotted(&mut values, &key, value).map_err(|reason| {
            ConfigError::Override {
                entry: name.clone(),
                reason,
            }
        })?;
    }

    for entry in &source.overrides {
        let (key, raw) = entry.split_once('=').ok_or_else(|| ConfigError::Override {
            entry: entry.clone(),
            reason: "expected KEY=VALUE".to_string(),
        })?;
        let key = key.trim();
        let value = typed_scalar(&schema, &values, key, raw.trim());
        set_dotted(&mut values, key, value).map_err(|reason| {
            ConfigError::Override {
                entry: entry.clone(),
                reason,
            }
        })?;
    }

    let settings = Value::Table(values.clone())
        .try_into::<HostConfig>()
        .map_err(|source| ConfigError::Section {
            key: "<root>".to_string(),
            source,
        })?;

    validate_config(&settings).map_err(ConfigError::Validation)?;

    Ok(Configuration::new(
        values,
        settings,
        source.environment.clone(),
        files,
    ))
}

/// Load and validate configuration from a single TOML file.
pub fn load_config(path: &Path) -> Result<Configuration, ConfigError> {
    load_configuration(&ConfigSource {
        path: Some(path.to_path_buf()),
        ..ConfigSource::default()
    })
}

fn read_table(path: &Path) -> Result<Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse::<Table>().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `config/host.toml` + `staging` → `config/host.staging.toml`.
fn overlay_path(base: &Path, environment: &str) -> Option<PathBuf> {
    if environment.is_empty() {
        return None;
    }
    let stem = base.file_stem()?.to_str()?;
    let file_name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}.{}", stem, environment, ext),
        None => format!("{}.{}", stem, environment),
    };
    Some(base.with_file_name(file_name))
}

/// Deep-merge `overlay` into `base`; overlay wins on conflicts.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            Value::Table(incoming) => {
                if let Some(Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, Value::Table(incoming));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    let rest = name.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.split(ENV_SEPARATOR).collect::<Vec<_>>().join(".").to_lowercase())
}

/// Defaults of the typed schema, used to tell which keys hold strings.
fn schema_table() -> Table {
    match Value::try_from(HostConfig::default()) {
        Ok(Value::Table(table)) => table,
        _ => Table::new(),
    }
}

/// Type a raw override after the value it replaces.
///
/// Schema fields and keys already set by a file keep their kind, so
/// `host.name=2024` stays a string. Other keys fall back to [`parse_scalar`].
fn typed_scalar(schema: &Table, values: &Table, key: &str, raw: &str) -> Value {
    match lookup(schema, key).or_else(|| lookup(values, key)) {
        Some(Value::String(_)) => Value::String(raw.to_string()),
        Some(Value::Table(_) | Value::Array(_) | Value::Datetime(_)) => {
            Value::String(raw.to_string())
        }
        _ => parse_scalar(raw),
    }
}

fn lookup<'a>(table: &'a Table, key: &str) -> Option<&'a Value> {
    let (parents, last) = match key.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, key),
    };
    let mut current = table;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            current = current.get(segment)?.as_table()?;
        }
    }
    current.get(last)
}

/// Interpret a raw override as integer, boolean or float when it reads back
/// unchanged; anything lossy (`1.10`, `007`) stays a string.
fn parse_scalar(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        if i.to_string() == raw {
            return Value::Integer(i);
        }
    }
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Boolean(b);
    }
    if raw.contains('.') {
        if let Ok(f) = raw.parse::<f64>() {
            if f.to_string() == raw {
                return Value::Float(f);
            }
        }
    }
    Value::String(raw.to_string())
}

fn set_dotted(table: &mut Table, key: &str, value: Value) -> Result<(), String> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err("empty key segment".to_string());
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| "empty key".to_string())?;

    let mut current = table;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        current = match entry {
            Value::Table(inner) => inner,
            _ => return Err(format!("'{}' is not a table", segment)),
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TaskFaultBehavior;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_layers_apply_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_file(
            dir.path(),
            "host.toml",
            "[worker]\ndelay_ms = 100\n\n[host]\nname = \"base\"\nshutdown_timeout_ms = 500\n",
        );
        write_file(
            dir.path(),
            "host.staging.toml",
            "[worker]\ndelay_ms = 200\n\n[host]\nname = \"staging\"\n",
        );

        let source = ConfigSource {
            path: Some(base),
            environment: "staging".into(),
            env_vars: vec![
                ("SERVICE_HOST__WORKER__DELAY_MS".into(), "300".into()),
                ("UNRELATED".into(), "ignored".into()),
            ],
            overrides: vec!["host.task_fault_behavior=ignore".into()],
        };

        let config = load_configuration(&source).unwrap();
        let settings = config.settings();
        assert_eq!(settings.worker.delay_ms, 300);
        assert_eq!(settings.host.name, "staging");
        assert_eq!(settings.host.shutdown_timeout_ms, 500);
        assert_eq!(settings.host.task_fault_behavior, TaskFaultBehavior::Ignore);
        assert_eq!(config.files().len(), 2);
    }

    #[test]
    fn test_override_beats_environment_variable() {
        let source = ConfigSource {
            env_vars: vec![("SERVICE_HOST__WORKER__DELAY_MS".into(), "300".into())],
            overrides: vec!["worker.delay_ms = 5".into()],
            ..ConfigSource::default()
        };
        let config = load_configuration(&source).unwrap();
        assert_eq!(config.settings().worker.delay_ms, 5);
    }

    #[test]
    fn test_missing_overlay_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_file(dir.path(), "app.toml", "[worker]\ndelay_ms = 42\n");
        let source = ConfigSource {
            path: Some(base),
            environment: "development".into(),
            ..ConfigSource::default()
        };
        let config = load_configuration(&source).unwrap();
        assert_eq!(config.settings().worker.delay_ms, 42);
        assert_eq!(config.files().len(), 1);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "host.toml", "[worker\ndelay_ms = ");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let source = ConfigSource {
            overrides: vec!["worker.delay_ms=soon".into()],
            ..ConfigSource::default()
        };
        let err = load_configuration(&source).unwrap_err();
        assert!(matches!(err, ConfigError::Section { .. }));
    }

    #[test]
    fn test_validation_failure_is_reported() {
        let source = ConfigSource {
            overrides: vec!["host.shutdown_timeout_ms=0".into()],
            ..ConfigSource::default()
        };
        let err = load_configuration(&source).unwrap_err();
        assert!(err.to_string().contains("host.shutdown_timeout_ms"));
    }

    #[test]
    fn test_override_without_equals_is_rejected() {
        let source = ConfigSource {
            overrides: vec!["worker.delay_ms".into()],
            ..ConfigSource::default()
        };
        assert!(matches!(
            load_configuration(&source),
            Err(ConfigError::Override { .. })
        ));
    }

    #[test]
    fn test_override_through_scalar_is_rejected() {
        let mut table = Table::new();
        set_dotted(&mut table, "worker", Value::Integer(1)).unwrap();
        let err = set_dotted(&mut table, "worker.delay_ms", Value::Integer(2)).unwrap_err();
        assert!(err.contains("not a table"));
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("12"), Value::Integer(12));
        assert_eq!(parse_scalar("true"), Value::Boolean(true));
        assert_eq!(parse_scalar("0.5"), Value::Float(0.5));
        assert_eq!(parse_scalar("json"), Value::String("json".into()));
        assert_eq!(parse_scalar("inf"), Value::String("inf".into()));
        assert_eq!(parse_scalar("1.10"), Value::String("1.10".into()));
        assert_eq!(parse_scalar("007"), Value::String("007".into()));
    }

    #[test]
    fn test_numeric_looking_name_stays_a_string() {
        let source = ConfigSource {
            env_vars: vec![("SERVICE_HOST__LOGGING__LEVEL".into(), "debug".into())],
            overrides: vec!["host.name=2024".into()],
            ..ConfigSource::default()
        };
        let config = load_configuration(&source).unwrap();
        assert_eq!(config.settings().host.name, "2024");
        assert_eq!(config.get_str("host.name"), Some("2024"));
    }

    #[test]
    fn test_numeric_env_var_for_string_field() {
        let source = ConfigSource {
            env_vars: vec![("SERVICE_HOST__HOST__NAME".into(), "42".into())],
            ..ConfigSource::default()
        };
        let config = load_configuration(&source).unwrap();
        assert_eq!(config.settings().host.name, "42");
    }

    #[test]
    fn test_unknown_key_keeps_lossy_number_as_string() {
        let source = ConfigSource {
            overrides: vec!["app.version=1.10".into(), "app.replicas=3".into()],
            ..ConfigSource::default()
        };
        let config = load_configuration(&source).unwrap();
        assert_eq!(config.get_str("app.version"), Some("1.10"));
        assert_eq!(config.get("app.replicas"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_override_follows_type_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_file(dir.path(), "host.toml", "[app]\nrelease = \"v1\"\n");
        let source = ConfigSource {
            path: Some(base),
            overrides: vec!["app.release=2".into()],
            ..ConfigSource::default()
        };
        let config = load_configuration(&source).unwrap();
        assert_eq!(config.get_str("app.release"), Some("2"));
    }

    #[test]
    fn test_overlay_path() {
        let path = overlay_path(Path::new("/etc/app/host.toml"), "staging").unwrap();
        assert_eq!(path, PathBuf::from("/etc/app/host.staging.toml"));
        assert!(overlay_path(Path::new("host.toml"), "").is_none());
    }

    #[test]
    fn test_unknown_sections_are_preserved() {
        let source = ConfigSource {
            overrides: vec!["database.url=postgres://localhost/app".into()],
            ..ConfigSource::default()
        };
        let config = load_configuration(&source).unwrap();
        assert_eq!(
            config.get_str("database.url"),
            Some("postgres://localhost/app")
        );
    }
}
