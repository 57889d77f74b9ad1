//! Project-wide constants.

use std::path::PathBuf;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fewest targets a mission may hold.
pub const MIN_TARGETS: usize = 1;

/// Most targets a mission may hold, at creation and over its lifetime.
pub const MAX_TARGETS: usize = 3;

pub const MAX_CAT_NAME_LEN: usize = 120;
pub const MAX_BREED_LEN: usize = 200;
pub const MAX_TARGET_NAME_LEN: usize = 200;
pub const MAX_COUNTRY_LEN: usize = 120;

/// Address the API listens on when nothing else is configured.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// TheCatAPI breed catalog.
pub const DEFAULT_BREED_API_URL: &str = "https://api.thecatapi.com/v1/breeds";

/// Upper bound on a single breed catalog lookup.
pub const DEFAULT_BREED_TIMEOUT_SECS: u64 = 5;

// Persisted config keys.
pub const KEY_BIND: &str = "bind";
pub const KEY_BREED_API_URL: &str = "breed_api_url";
pub const KEY_BREED_API_KEY: &str = "breed_api_key";
pub const KEY_BREED_TIMEOUT_SECS: &str = "breed_timeout_secs";

pub const CONFIG_KEYS: &[&str] = &[
    KEY_BIND,
    KEY_BREED_API_URL,
    KEY_BREED_API_KEY,
    KEY_BREED_TIMEOUT_SECS,
];

/// Default database path: `~/.spycats/spycats.db`.
/// Single DB for cats, missions, targets, and config.
/// Falls back to the working directory when there is no home directory.
pub fn default_db_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".spycats").join("spycats.db"),
        None => PathBuf::from("spycats.db"),
    }
}
