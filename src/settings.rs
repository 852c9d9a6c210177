//! Settings store
//!
//! Persists the download folder chosen on first launch. Values are JSON
//! keyed by setting name in a small SQLite database under the per-user app
//! data directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::collaborator::ConfigSource;
use crate::error::CollaboratorError;

const SCHEMA_VERSION: i64 = 1;

/// Settings keys used in the database.
pub mod keys {
    pub const APP_CONFIG: &str = "app_config";
}

/// The persisted configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default download directory.
    pub dir: String,
}

/// macOS:  ~/Library/Application Support/SnatchVid
/// Windows: %APPDATA%\\SnatchVid
/// Linux:  ~/.local/share/snatchvid
pub fn app_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("tech", "snsautomation", "SnatchVid")
        .map(|d| d.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("failed to resolve per-user app data directory"))
}

/// The OS download folder, offered as the initial choice in the folder picker.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("~/Downloads"))
}

pub struct SettingsStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Open the store at the per-user location and apply migrations.
    pub fn open() -> Result<Self> {
        let data = app_data_dir()?;
        fs::create_dir_all(&data).with_context(|| format!("create data dir: {}", data.display()))?;
        Self::open_at(&data.join("snatchvid.sqlite3"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite db: {}", path.display()))?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let mut store = Self::from_connection(conn)?;
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get a setting value by key.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let conn = self.conn.lock().await;
        let json: Option<String> = conn
            .query_row(
                "SELECT value_json FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query settings")?;

        json.map(|j| serde_json::from_str(&j).context("Failed to deserialize setting"))
            .transpose()
    }

    /// Set a setting value by key, replacing any previous value.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to serialize setting")?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO settings (key, value_json) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
            params![key, json],
        )
        .context("Failed to save setting")?;
        Ok(())
    }

    pub async fn app_config(&self) -> Result<Option<AppConfig>> {
        self.get::<AppConfig>(keys::APP_CONFIG).await
    }

    pub async fn save_app_config(&self, config: &AppConfig) -> Result<()> {
        self.set(keys::APP_CONFIG, config).await
    }
}

#[async_trait]
impl ConfigSource for SettingsStore {
    async fn config_exists(&self) -> bool {
        match self.app_config().await {
            Ok(config) => config.is_some(),
            Err(e) => {
                log::warn!("could not read settings: {e:#}");
                false
            }
        }
    }

    async fn read_config(&self) -> Option<String> {
        match self.app_config().await {
            Ok(config) => config.map(|c| c.dir),
            Err(e) => {
                log::warn!("could not read settings: {e:#}");
                None
            }
        }
    }

    async fn create_config(&self, dir: &str) -> Result<(), CollaboratorError> {
        self.save_app_config(&AppConfig {
            dir: dir.to_string(),
        })
        .await?;
        log::info!("download folder set to {dir}");
        Ok(())
    }
}

fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );
        "#,
    )?;

    let current_version: i64 = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |r| r.get::<_, String>(0),
        )
        .optional()?
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    if current_version > SCHEMA_VERSION {
        return Err(anyhow!(
            "settings schema version {} is newer than app supports {}",
            current_version,
            SCHEMA_VERSION
        ));
    }

    if current_version == 0 {
        let tx = conn.transaction()?;
        tx.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
              key TEXT PRIMARY KEY,
              value_json TEXT NOT NULL
            );
            "#,
        )?;
        tx.execute(
            "INSERT INTO meta(key, value) VALUES('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![SCHEMA_VERSION.to_string()],
        )?;
        tx.commit()?;
    }

    Ok(())
}
