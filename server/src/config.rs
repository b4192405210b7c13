//! Runtime configuration for the handicap service.
//!
//! Everything is read from environment variables with compiled-in defaults:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GOLFCAP_DATA_DIR` | platform data dir, else `./data` |
//! | `GOLFCAP_DB_PATH` | `<data dir>/golfcap.db` |
//! | `GOLFCAP_WORKERS` | `4` |
//! | `GOLFCAP_DEFAULT_INDEX` | unset |
//! | `GOLFCAP_UNKNOWN_HANDICAP` | `lenient` |
//! | `GOLFCAP_EXCEPTIONAL_SCORES` | off |
//! | `GOLFCAP_LOG_DIR` | unset (stderr only) |
//!
//! Unparseable values are ignored with a warning.

use std::path::PathBuf;

use handicap::{EngineConfig, UnknownHandicapPolicy, MAX_HANDICAP_INDEX};

const DEV_DATA_DIR: &str = "./data";
const DB_FILE_NAME: &str = "golfcap.db";
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Get the data directory for persistence.
///
/// Priority:
/// 1. GOLFCAP_DATA_DIR env variable if set
/// 2. the platform data directory (e.g. `~/.local/share/golfcap`)
/// 3. ./data as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GOLFCAP_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "golfcap") {
        return dirs.data_dir().to_path_buf();
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Get the SQLite database path.
pub fn get_db_path() -> PathBuf {
    match std::env::var("GOLFCAP_DB_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => get_data_dir().join(DB_FILE_NAME),
    }
}

/// Number of rebuild workers.
pub fn get_worker_count() -> usize {
    worker_count_from(std::env::var("GOLFCAP_WORKERS").ok().as_deref())
}

/// Directory for the rolling log file, if file logging is enabled.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("GOLFCAP_LOG_DIR").ok().map(PathBuf::from)
}

/// Engine rules configured from the environment.
pub fn engine_config_from_env() -> EngineConfig {
    engine_config_from(|key| std::env::var(key).ok())
}

fn worker_count_from(value: Option<&str>) -> usize {
    let Some(raw) = value else {
        return DEFAULT_WORKER_COUNT;
    };
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::warn!(value = raw, "Invalid GOLFCAP_WORKERS, using {}", DEFAULT_WORKER_COUNT);
            DEFAULT_WORKER_COUNT
        }
    }
}

/// Build an [`EngineConfig`] from a variable lookup.
pub fn engine_config_from(lookup: impl Fn(&str) -> Option<String>) -> EngineConfig {
    let mut config = EngineConfig::default();

    if let Some(raw) = lookup("GOLFCAP_DEFAULT_INDEX") {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v <= MAX_HANDICAP_INDEX => {
                config.default_starting_index = Some(v);
            }
            _ => tracing::warn!(value = %raw, "Invalid GOLFCAP_DEFAULT_INDEX, leaving unset"),
        }
    }

    if let Some(raw) = lookup("GOLFCAP_UNKNOWN_HANDICAP") {
        match raw.parse::<UnknownHandicapPolicy>() {
            Ok(policy) => config.unknown_handicap = policy,
            Err(e) => tracing::warn!(
                value = %raw,
                "{e}, using {}",
                UnknownHandicapPolicy::default()
            ),
        }
    }

    if let Some(raw) = lookup("GOLFCAP_EXCEPTIONAL_SCORES") {
        config.exceptional_scores = matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }

    config
}
