pub mod config;
pub mod directory;
pub mod disclosure;
pub mod errors;
pub mod ingest;
pub mod member_writes;
pub mod models;
pub mod ranking;
pub mod redaction;
pub mod resolver;
pub mod search;
pub mod session;
pub mod store;

use crate::config::{AppSettings, StoreBackend};
use crate::errors::{AppError, AppResult};
use crate::session::{BoardSnapshot, ViewSession};
use crate::store::airtable::RecordPage;
use crate::store::{AirtableConfig, AirtableStore, RecordStore, SqliteStore};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub const HOME_ENV: &str = "CONNECT_BOARD_HOME";
const DEFAULT_HOME: &str = ".connect-board";

const USAGE: &str = "usage: connect-board [snapshot [QUERY] | import TABLE FILE | token save TOKEN | token clear | token status]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Snapshot { query: String },
    Import { table: String, file: PathBuf },
    TokenSave(String),
    TokenClear,
    TokenStatus,
}

impl Command {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> AppResult<Self> {
        let args: Vec<String> = args.into_iter().collect();
        let words: Vec<&str> = args.iter().map(String::as_str).collect();
        match words.as_slice() {
            [] => Ok(Self::Snapshot { query: String::new() }),
            ["snapshot"] => Ok(Self::Snapshot { query: String::new() }),
            ["snapshot", query] => Ok(Self::Snapshot {
                query: (*query).to_string(),
            }),
            ["import", table, file] => Ok(Self::Import {
                table: (*table).to_string(),
                file: PathBuf::from(file),
            }),
            ["token", "save", token] => Ok(Self::TokenSave((*token).to_string())),
            ["token", "clear"] => Ok(Self::TokenClear),
            ["token", "status"] => Ok(Self::TokenStatus),
            _ => Err(AppError::Validation(USAGE.to_string())),
        }
    }
}

pub fn config_dir() -> PathBuf {
    std::env::var_os(HOME_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME))
}

pub fn run() -> AppResult<()> {
    let home = config_dir();
    std::fs::create_dir_all(&home)?;
    init_tracing(&home)?;

    let command = Command::parse(std::env::args().skip(1))?;
    let output = match command {
        Command::TokenSave(token) => serde_json::to_string_pretty(&config::save_store_token(&token)?)?,
        Command::TokenClear => serde_json::to_string_pretty(&config::clear_store_token()?)?,
        Command::TokenStatus => serde_json::to_string_pretty(&config::has_store_token()?)?,
        Command::Snapshot { query } => {
            let settings = AppSettings::load(&home)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let snapshot = runtime.block_on(load_snapshot(&settings, &query))?;
            serde_json::to_string_pretty(&snapshot)?
        }
        Command::Import { table, file } => {
            let settings = AppSettings::load(&home)?;
            let count = import_file(&settings, &table, &file)?;
            serde_json::to_string_pretty(&serde_json::json!({ "table": table, "imported": count }))?
        }
    };
    println!("{}", output);
    Ok(())
}

pub async fn load_snapshot(settings: &AppSettings, query: &str) -> AppResult<BoardSnapshot> {
    match settings.store {
        StoreBackend::Airtable => {
            let token = config::resolve_store_token()?;
            if token.is_none() {
                tracing::warn!("no store token configured; requests will be unauthenticated");
            }
            let store = AirtableStore::new(AirtableConfig::from_settings(settings, token))?;
            Ok(snapshot_from(&store, settings, query).await)
        }
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(sqlite_path(settings)?)?;
            Ok(snapshot_from(&store, settings, query).await)
        }
    }
}

pub async fn snapshot_from<S: RecordStore>(store: &S, settings: &AppSettings, query: &str) -> BoardSnapshot {
    let session = ViewSession::load(store, settings).await;
    let snapshot = session.snapshot(query);
    tracing::info!(
        query,
        members = snapshot.leaderboard.len(),
        events = snapshot.events.len(),
        skipped = snapshot.skipped.len(),
        failed = snapshot.load_state.has_failure(),
        "snapshot built"
    );
    snapshot
}

pub fn import_file(settings: &AppSettings, table: &str, file: &Path) -> AppResult<usize> {
    let raw = std::fs::read_to_string(file)?;
    let page: RecordPage = serde_json::from_str(&raw)?;
    let store = SqliteStore::open(sqlite_path(settings)?)?;
    let count = store.import(table, &page.records)?;
    tracing::info!(table, count, file = %file.display(), "records imported");
    Ok(count)
}

fn sqlite_path(settings: &AppSettings) -> AppResult<&Path> {
    settings
        .sqlite_path
        .as_deref()
        .ok_or_else(|| AppError::Config("sqlitePath is required for the sqlite store".to_string()))
}

fn init_tracing(home: &Path) -> AppResult<()> {
    let log_dir = home.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "board.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::Command;
    use crate::errors::AppError;
    use std::path::PathBuf;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|word| word.to_string()).collect()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            Command::parse(args(&[])).expect("empty"),
            Command::Snapshot { query: String::new() }
        );
        assert_eq!(
            Command::parse(args(&["snapshot", "ali"])).expect("snapshot"),
            Command::Snapshot {
                query: "ali".to_string()
            }
        );
        assert_eq!(
            Command::parse(args(&["import", "members", "members.json"])).expect("import"),
            Command::Import {
                table: "members".to_string(),
                file: PathBuf::from("members.json"),
            }
        );
        assert_eq!(Command::parse(args(&["token", "status"])).expect("status"), Command::TokenStatus);
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(matches!(
            Command::parse(args(&["token", "rotate"])),
            Err(AppError::Validation(_))
        ));
    }
}
