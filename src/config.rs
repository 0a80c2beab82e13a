use crate::errors::{AppError, AppResult};
use crate::models::{BooleanResponse, ListQuery, SortDirection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.yaml";
const KEYRING_SERVICE: &str = "connect-board";
const KEYRING_ACCOUNT: &str = "record-store-token";

const ENV_STORE: &str = "CONNECT_BOARD_STORE";
const ENV_API_URL: &str = "CONNECT_BOARD_API_URL";
const ENV_BASE_ID: &str = "CONNECT_BOARD_BASE_ID";
const ENV_SQLITE_PATH: &str = "CONNECT_BOARD_SQLITE_PATH";
const ENV_TOKEN: &str = "CONNECT_BOARD_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    Airtable,
    Sqlite,
}

impl StoreBackend {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "airtable" => Ok(Self::Airtable),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(AppError::Config(format!("Unknown store backend '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub store: StoreBackend,
    pub api_url: String,
    pub base_id: String,
    pub members_table: String,
    pub events_table: String,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    pub timeout_secs: u64,
    pub sqlite_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            store: StoreBackend::Airtable,
            api_url: "https://api.airtable.com/v0".to_string(),
            base_id: String::new(),
            members_table: "members".to_string(),
            events_table: "Events".to_string(),
            sort_field: Some("auto".to_string()),
            sort_direction: SortDirection::Desc,
            timeout_secs: 30,
            sqlite_path: None,
        }
    }
}

impl AppSettings {
    pub fn load(config_dir: &Path) -> AppResult<Self> {
        let path = config_dir.join(SETTINGS_FILE);
        let mut settings = if path.is_file() {
            let raw = std::fs::read_to_string(&path)?;
            Self::from_yaml(&raw)?
        } else {
            tracing::info!(path = %path.display(), "no settings file; using defaults");
            Self::default()
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> AppResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(store) = lookup(ENV_STORE) {
            self.store = StoreBackend::parse(&store)?;
        }
        if let Some(api_url) = lookup(ENV_API_URL) {
            self.api_url = api_url;
        }
        if let Some(base_id) = lookup(ENV_BASE_ID) {
            self.base_id = base_id;
        }
        if let Some(path) = lookup(ENV_SQLITE_PATH) {
            self.sqlite_path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.members_table.trim().is_empty() || self.events_table.trim().is_empty() {
            return Err(AppError::Config("Table names cannot be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config("timeoutSecs must be positive".to_string()));
        }
        match self.store {
            StoreBackend::Airtable if self.base_id.trim().is_empty() => Err(AppError::Config(
                "baseId is required for the airtable store".to_string(),
            )),
            StoreBackend::Airtable if !self.api_url.starts_with("http") => Err(AppError::Config(format!(
                "apiUrl '{}' is not an http(s) URL",
                self.api_url
            ))),
            StoreBackend::Sqlite if self.sqlite_path.is_none() => Err(AppError::Config(
                "sqlitePath is required for the sqlite store".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            filter_by_formula: None,
            sort_field: self.sort_field.clone(),
            sort_direction: self.sort_direction,
        }
    }
}

pub fn resolve_store_token() -> AppResult<Option<String>> {
    if let Ok(token) = std::env::var(ENV_TOKEN) {
        if !token.trim().is_empty() {
            return Ok(Some(token));
        }
    }
    let entry = keyring_entry()?;
    match entry.get_password() {
        Ok(value) if !value.is_empty() => Ok(Some(value)),
        Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
        Err(error) => Err(AppError::Io(error.to_string())),
    }
}

pub fn save_store_token(token: &str) -> AppResult<BooleanResponse> {
    if token.trim().is_empty() {
        return Err(AppError::Validation("Token cannot be empty".to_string()));
    }
    keyring_entry()?
        .set_password(token)
        .map_err(|error| AppError::Io(error.to_string()))?;
    Ok(BooleanResponse { success: true })
}

pub fn clear_store_token() -> AppResult<BooleanResponse> {
    match keyring_entry()?.delete_credential() {
        Ok(_) | Err(keyring::Error::NoEntry) => Ok(BooleanResponse { success: true }),
        Err(error) => Err(AppError::Io(error.to_string())),
    }
}

pub fn has_store_token() -> AppResult<BooleanResponse> {
    Ok(BooleanResponse {
        success: resolve_store_token()?.is_some(),
    })
}

fn keyring_entry() -> AppResult<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT).map_err(|error| AppError::Io(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{AppSettings, StoreBackend, SETTINGS_FILE};
    use crate::models::SortDirection;
    use std::collections::HashMap;

    #[test]
    fn yaml_fills_missing_keys_with_defaults() {
        let settings = AppSettings::from_yaml("baseId: appXYZ\nmembersTable: people\n").expect("parse");
        assert_eq!(settings.base_id, "appXYZ");
        assert_eq!(settings.members_table, "people");
        assert_eq!(settings.events_table, "Events");
        assert_eq!(settings.sort_direction, SortDirection::Desc);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn env_overrides_switch_backend() {
        let mut settings = AppSettings::default();
        let env: HashMap<&str, &str> = [
            ("CONNECT_BOARD_STORE", "sqlite"),
            ("CONNECT_BOARD_SQLITE_PATH", "/tmp/board.db"),
        ]
        .into_iter()
        .collect();
        settings
            .apply_overrides(|key| env.get(key).map(|value| value.to_string()))
            .expect("overrides");
        assert_eq!(settings.store, StoreBackend::Sqlite);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_backend_and_missing_base_id() {
        let mut settings = AppSettings::default();
        let error = settings
            .apply_overrides(|key| (key == "CONNECT_BOARD_STORE").then(|| "postgres".to_string()))
            .expect_err("unknown backend");
        assert!(error.to_string().starts_with("CONFIG_INVALID"));
        assert!(AppSettings::default().validate().is_err());
    }

    #[test]
    fn load_reads_settings_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "store: sqlite\nsqlitePath: board.db\ntimeoutSecs: 5\n",
        )
        .expect("write settings");
        let settings = AppSettings::load(dir.path()).expect("load");
        assert_eq!(settings.timeout_secs, 5);
        assert_eq!(settings.list_query().sort_field.as_deref(), Some("auto"));
    }
}
