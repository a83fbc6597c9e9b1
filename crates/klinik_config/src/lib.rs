use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

pub mod models;
pub use models::*;

/// Marker value replaced by the environment variable derived from the key path.
pub const SECRET_MARKER: &str = "secret_from_env";

/// Loads `config/default`, `config/{RUN_ENV}` and `KLINIK__*` environment overrides,
/// then resolves `secret_from_env` markers.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "KLINIK".to_string());
    let config_dir =
        PathBuf::from(env::var("KLINIK_CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        "Loading configuration from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = path.join("_").to_uppercase();
                match env::var(&env_key) {
                    Ok(env_val) => *obj = Value::String(env_val),
                    Err(_) => warn!("env var {} not found for {}", env_key, SECRET_MARKER),
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to rebuild config: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads `.env` (or the file named by `DOTENV_OVERRIDE`) once per process.
/// Returns the path that was attempted.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_marker_is_replaced_from_env() {
        env::set_var("GMAIL_REFRESH_TOKEN", "token-from-env");
        let mut config = AppConfig::local(8080);
        config.gmail = Some(GmailConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: SECRET_MARKER.to_string(),
            user: "clinic@example.com".to_string(),
            ..Default::default()
        });

        let resolved = apply_env_overrides_from_marker(config).unwrap();
        assert_eq!(resolved.gmail.unwrap().refresh_token, "token-from-env");
    }

    #[test]
    fn missing_secret_keeps_marker() {
        let mut config = AppConfig::local(8080);
        config.sheets = Some(SheetsConfig {
            spreadsheet_id: SECRET_MARKER.to_string(),
            ..Default::default()
        });
        env::remove_var("SHEETS_SPREADSHEET_ID");

        let resolved = apply_env_overrides_from_marker(config).unwrap();
        assert_eq!(resolved.sheets.unwrap().spreadsheet_id, SECRET_MARKER);
    }

    #[test]
    fn sheets_credentials_need_key_or_refresh_token() {
        let mut sheets = SheetsConfig {
            spreadsheet_id: "abc".to_string(),
            ..Default::default()
        };
        assert!(!sheets.has_credentials());
        sheets.key_path = Some("key.json".to_string());
        assert!(sheets.has_credentials());
    }
}
