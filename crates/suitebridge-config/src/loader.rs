//! Configuration loading: environment variables take precedence over a
//! local YAML file (`spec.md` §6 "Configuration").

use std::env;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use suitebridge_core::error::{GatewayError, GatewayResult};

use crate::schema::Config;
use crate::validation::validate;

const CONFIG_FILE_ENV: &str = "SUITEBRIDGE_CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = "suitebridge.yaml";

/// Load and validate the gateway configuration.
///
/// Precedence: `SUITEBRIDGE_*` environment variables win over whatever the
/// YAML file (if any) supplies; the file supplies everything else. The
/// file's path is itself configurable via `SUITEBRIDGE_CONFIG_FILE` and is
/// never logged, per `spec.md` §6.
pub fn load() -> GatewayResult<Config> {
    let path = config_file_path();
    let mut value = read_file_value(&path)?;
    apply_env_overrides(&mut value);

    let config: Config = serde_yaml::from_value(value)
        .map_err(|e| GatewayError::validation(format!("invalid configuration: {e}")))?;
    validate(&config)?;
    Ok(config)
}

fn config_file_path() -> PathBuf {
    env::var(CONFIG_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

fn read_file_value(path: &Path) -> GatewayResult<Value> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_yaml::from_str(&contents)
            .map_err(|e| GatewayError::validation(format!("malformed configuration file: {e}"))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Value::Mapping(Mapping::new())),
        Err(e) => Err(GatewayError::validation(format!(
            "could not read configuration file: {e}"
        ))),
    }
}

fn set_nested(root: &mut Value, section: &str, key: &str, value: impl Into<Value>) {
    if !root.is_mapping() {
        *root = Value::Mapping(Mapping::new());
    }
    let mapping = root.as_mapping_mut().expect("just ensured mapping");
    let section_value = mapping
        .entry(Value::String(section.to_string()))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !section_value.is_mapping() {
        *section_value = Value::Mapping(Mapping::new());
    }
    section_value
        .as_mapping_mut()
        .expect("just ensured mapping")
        .insert(Value::String(key.to_string()), value.into());
}

fn apply_env_overrides(value: &mut Value) {
    let string_overrides = [
        ("SUITEBRIDGE_ACCOUNT_ID", "erp", "account_id"),
        ("SUITEBRIDGE_CONSUMER_KEY", "erp", "consumer_key"),
        ("SUITEBRIDGE_CONSUMER_SECRET", "erp", "consumer_secret"),
        ("SUITEBRIDGE_TOKEN_ID", "erp", "token_id"),
        ("SUITEBRIDGE_TOKEN_SECRET", "erp", "token_secret"),
        ("SUITEBRIDGE_HOST", "server", "host"),
    ];
    for (env_var, section, key) in string_overrides {
        if let Ok(val) = env::var(env_var) {
            set_nested(value, section, key, val);
        }
    }

    if let Ok(port) = env::var("SUITEBRIDGE_PORT") {
        if let Ok(port) = port.parse::<u16>() {
            set_nested(value, "server", "port", port as i64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch
    // them so they don't race each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "SUITEBRIDGE_CONFIG_FILE",
            "SUITEBRIDGE_ACCOUNT_ID",
            "SUITEBRIDGE_CONSUMER_KEY",
            "SUITEBRIDGE_CONSUMER_SECRET",
            "SUITEBRIDGE_TOKEN_ID",
            "SUITEBRIDGE_TOKEN_SECRET",
            "SUITEBRIDGE_HOST",
            "SUITEBRIDGE_PORT",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn env_vars_override_file_contents() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("cfg.yaml");
        std::fs::write(
            &file_path,
            "erp:\n  account_id: file-account\n  consumer_key: file-key\n  consumer_secret: file-secret\n  token_id: file-token\n  token_secret: file-token-secret\n",
        )
        .unwrap();

        env::set_var("SUITEBRIDGE_CONFIG_FILE", &file_path);
        env::set_var("SUITEBRIDGE_ACCOUNT_ID", "env-account");

        let config = load().unwrap();
        assert_eq!(config.erp.account_id, "env-account");
        assert_eq!(config.erp.consumer_key, "file-key");

        clear_env();
    }

    #[test]
    fn missing_required_field_fails_validation() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("SUITEBRIDGE_CONFIG_FILE", "/nonexistent/path/for/test.yaml");

        let result = load();
        assert!(result.is_err());

        clear_env();
    }
}
