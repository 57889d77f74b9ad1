//! Key-value configuration storage backed by SQLite, and the resolved
//! runtime [`Settings`].
//!
//! Shares a database with [`SqliteStore`](crate::store::sqlite::SqliteStore);
//! pass the same path to both.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension};

use crate::consts::{
    CONFIG_KEYS, DEFAULT_BIND, DEFAULT_BREED_API_URL, DEFAULT_BREED_TIMEOUT_SECS, KEY_BIND,
    KEY_BREED_API_KEY, KEY_BREED_API_URL, KEY_BREED_TIMEOUT_SECS,
};

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("config connection lock poisoned"))
    }

    /// Get a config value by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a config value (upsert). Only known keys are accepted.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if !CONFIG_KEYS.contains(&key) {
            bail!(
                "unknown config key: {key} (known: {})",
                CONFIG_KEYS.join(", ")
            );
        }
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a config key.
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }

    /// All stored pairs, sorted by key.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config ORDER BY key ASC")?;
        let entries = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Values given on the command line or through the environment.
/// Each one beats the persisted config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub breed_api_url: Option<String>,
    pub breed_api_key: Option<String>,
    pub breed_timeout_secs: Option<u64>,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub breed_api_url: String,
    pub breed_api_key: Option<String>,
    pub breed_timeout: Duration,
}

impl Settings {
    /// Resolve each setting: override > persisted config > default.
    pub fn resolve(overrides: Overrides, config: &Config) -> Result<Self> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => config
                .get(KEY_BIND)?
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        };
        let bind: SocketAddr = bind
            .parse()
            .with_context(|| format!("invalid bind address: {bind}"))?;

        let breed_api_url = match overrides.breed_api_url {
            Some(url) => url,
            None => config
                .get(KEY_BREED_API_URL)?
                .unwrap_or_else(|| DEFAULT_BREED_API_URL.to_string()),
        };

        let breed_api_key = match overrides.breed_api_key {
            Some(key) => Some(key),
            None => config.get(KEY_BREED_API_KEY)?,
        }
        .filter(|key| !key.is_empty());

        let breed_timeout_secs = match overrides.breed_timeout_secs {
            Some(secs) => secs,
            None => match config.get(KEY_BREED_TIMEOUT_SECS)? {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("invalid {KEY_BREED_TIMEOUT_SECS}: {raw}"))?,
                None => DEFAULT_BREED_TIMEOUT_SECS,
            },
        };

        Ok(Self {
            bind,
            breed_api_url,
            breed_api_key,
            breed_timeout: Duration::from_secs(breed_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_config() -> Config {
        Config::open(":memory:").unwrap()
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let config = mem_config();
        assert!(config.get(KEY_BIND).unwrap().is_none());
    }

    #[test]
    fn set_and_get() {
        let config = mem_config();
        config.set(KEY_BIND, "0.0.0.0:9000").unwrap();
        assert_eq!(config.get(KEY_BIND).unwrap().unwrap(), "0.0.0.0:9000");
    }

    #[test]
    fn set_overwrites_existing() {
        let config = mem_config();
        config.set(KEY_BREED_TIMEOUT_SECS, "3").unwrap();
        config.set(KEY_BREED_TIMEOUT_SECS, "7").unwrap();
        assert_eq!(config.get(KEY_BREED_TIMEOUT_SECS).unwrap().unwrap(), "7");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let config = mem_config();
        let err = config.set("theme", "dark").unwrap_err();
        assert!(err.to_string().contains("unknown config key"));
    }

    #[test]
    fn remove_deletes_key() {
        let config = mem_config();
        config.set(KEY_BIND, "127.0.0.1:1").unwrap();
        config.remove(KEY_BIND).unwrap();
        assert!(config.get(KEY_BIND).unwrap().is_none());
    }

    #[test]
    fn remove_nonexistent_is_ok() {
        let config = mem_config();
        config.remove("nonexistent").unwrap();
    }

    #[test]
    fn entries_sorted_by_key() {
        let config = mem_config();
        config.set(KEY_BREED_TIMEOUT_SECS, "2").unwrap();
        config.set(KEY_BIND, "127.0.0.1:1").unwrap();
        let keys: Vec<_> = config.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, [KEY_BIND, KEY_BREED_TIMEOUT_SECS]);
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config-test.db");
        let path_str = path.to_str().unwrap();

        {
            let config = Config::open(path_str).unwrap();
            config.set(KEY_BREED_API_URL, "http://localhost/breeds").unwrap();
        }

        {
            let config = Config::open(path_str).unwrap();
            assert_eq!(
                config.get(KEY_BREED_API_URL).unwrap().unwrap(),
                "http://localhost/breeds"
            );
        }
    }

    // ── Settings resolution ──────────────────────────────────────────

    #[test]
    fn defaults_when_nothing_set() {
        let settings = Settings::resolve(Overrides::default(), &mem_config()).unwrap();
        assert_eq!(settings.bind, DEFAULT_BIND.parse().unwrap());
        assert_eq!(settings.breed_api_url, DEFAULT_BREED_API_URL);
        assert!(settings.breed_api_key.is_none());
        assert_eq!(
            settings.breed_timeout,
            Duration::from_secs(DEFAULT_BREED_TIMEOUT_SECS)
        );
    }

    #[test]
    fn persisted_config_beats_defaults() {
        let config = mem_config();
        config.set(KEY_BIND, "0.0.0.0:9100").unwrap();
        config.set(KEY_BREED_TIMEOUT_SECS, "2").unwrap();
        config.set(KEY_BREED_API_KEY, "live_abc").unwrap();

        let settings = Settings::resolve(Overrides::default(), &config).unwrap();
        assert_eq!(settings.bind.port(), 9100);
        assert_eq!(settings.breed_timeout, Duration::from_secs(2));
        assert_eq!(settings.breed_api_key.as_deref(), Some("live_abc"));
    }

    #[test]
    fn overrides_beat_persisted_config() {
        let config = mem_config();
        config.set(KEY_BREED_API_URL, "http://stored/breeds").unwrap();
        let overrides = Overrides {
            breed_api_url: Some("http://flag/breeds".to_string()),
            breed_timeout_secs: Some(9),
            ..Overrides::default()
        };

        let settings = Settings::resolve(overrides, &config).unwrap();
        assert_eq!(settings.breed_api_url, "http://flag/breeds");
        assert_eq!(settings.breed_timeout, Duration::from_secs(9));
    }

    #[test]
    fn empty_api_key_counts_as_none() {
        let overrides = Overrides {
            breed_api_key: Some(String::new()),
            ..Overrides::default()
        };
        let settings = Settings::resolve(overrides, &mem_config()).unwrap();
        assert!(settings.breed_api_key.is_none());
    }

    #[test]
    fn invalid_values_are_errors() {
        let config = mem_config();
        config.set(KEY_BREED_TIMEOUT_SECS, "soon").unwrap();
        assert!(Settings::resolve(Overrides::default(), &config).is_err());

        let overrides = Overrides {
            bind: Some("not an address".to_string()),
            ..Overrides::default()
        };
        assert!(Settings::resolve(overrides, &mem_config()).is_err());
    }
}
