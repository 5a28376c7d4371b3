//! Deployment configuration, stored as JSON in `.newsdesk/config.json`.

use std::borrow::Cow;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::Duration;
use newsdesk_core::db::ConnectionSpec;
use serde::{Deserialize, Serialize};

use crate::storage::{LocalBucket, POST_IMAGES_BUCKET};
use crate::{Error, Result};

/// Directory holding the configuration, relative to the working directory.
pub const CONFIG_DIR: &str = ".newsdesk";
/// Environment variable overriding the database, as `backend:connection-string`.
pub const DB_ENV: &str = "NEWSDESK_DB";
/// Environment variable overriding the listen address.
pub const LISTEN_ENV: &str = "NEWSDESK_LISTEN";

/// Where uploaded images are kept and served from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub bucket: String,
    /// URL prefix stored images are served under.
    pub public_base_url: String,
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            root: PathBuf::from(CONFIG_DIR).join("storage"),
            bucket: POST_IMAGES_BUCKET.to_string(),
            public_base_url: "/storage".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Everything needed to run newsdesk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsdeskConfig {
    pub database: ConnectionSpec,
    /// Address the HTTP server binds, e.g. `127.0.0.1:3000`.
    pub listen: String,
    pub storage: StorageConfig,
    pub session_ttl_hours: i64,
    pub pool_size: u32,
}

impl Default for NewsdeskConfig {
    fn default() -> Self {
        NewsdeskConfig {
            database: ConnectionSpec::new(
                "sqlite",
                PathBuf::from(CONFIG_DIR)
                    .join("newsdesk.db")
                    .to_string_lossy(),
            ),
            listen: "127.0.0.1:3000".to_string(),
            storage: StorageConfig::default(),
            session_ttl_hours: 24 * 7,
            pool_size: 8,
        }
    }
}

fn config_complete_if_dir(path: &Path) -> Cow<'_, Path> {
    if path.is_dir() {
        Cow::from(path.join("config.json"))
    } else {
        Cow::from(path)
    }
}

impl NewsdeskConfig {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        PathBuf::from(CONFIG_DIR).join("config.json")
    }

    /// Load a configuration file. A directory is taken to contain
    /// `config.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = config_complete_if_dir(path.as_ref());
        let config = serde_json::from_reader(fs::File::open(&path)?)?;
        Ok(config)
    }

    /// Load a configuration file, or the defaults if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = config_complete_if_dir(path.as_ref());
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the configuration, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = config_complete_if_dir(path.as_ref());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value. See [`DB_ENV`] and [`LISTEN_ENV`].
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(db) = lookup(DB_ENV).filter(|v| !v.trim().is_empty()) {
            self.database = ConnectionSpec::parse(db.trim())?;
        }
        if let Some(listen) = lookup(LISTEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.listen = listen.trim().to_string();
        }
        Ok(())
    }

    /// The listen address, parsed.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address {:?}: {e}", self.listen)))
    }

    /// How long a sign-in lasts.
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours.max(1))
    }

    /// The image bucket described by [`Self::storage`].
    pub fn bucket(&self) -> LocalBucket {
        LocalBucket::new(
            &self.storage.root,
            &self.storage.bucket,
            &self.storage.public_base_url,
        )
    }
}
