use anyhow::Result;
use compute::schedule::ScheduleSettings;
use moka::future::Cache;
use sea_orm::Database;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::schemas::AppState;

/// Optional settings file, looked up as `edir.toml` (or any format `config` knows).
const SETTINGS_FILE: &str = "edir";
/// Prefix of settings environment variables, e.g. `EDIR__SCHEDULE__BATCH_SIZE`.
const ENV_PREFIX: &str = "EDIR";

/// Report cache tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_capacity: u64,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 1000,
            ttl_secs: 300, // 5 minutes
        }
    }
}

/// Engine and cache settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub schedule: ScheduleSettings,
    pub cache: CacheSettings,
}

/// Load settings from defaults, an optional settings file and `EDIR__*` environment variables
pub fn load_settings() -> Result<AppSettings> {
    let settings = config::Config::builder()
        .add_source(config::Config::try_from(&AppSettings::default())?)
        .add_source(config::File::with_name(SETTINGS_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<AppSettings>()?;

    if settings.schedule.batch_size == 0 {
        anyhow::bail!("schedule.batch_size must be at least 1");
    }
    debug!("Loaded settings: {:?}", settings);
    Ok(settings)
}

/// Build the report cache
pub fn build_cache(settings: &CacheSettings) -> Cache<String, crate::schemas::CachedReport> {
    Cache::builder()
        .max_capacity(settings.max_capacity)
        .time_to_live(Duration::from_secs(settings.ttl_secs))
        .build()
}

/// Initialize application configuration and state for the given database
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    let settings = load_settings()?;

    // Connect to database
    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    let cache = build_cache(&settings.cache);

    Ok(AppState { db, cache, settings })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.schedule.batch_size, 500);
        assert_eq!(settings.schedule.horizon_months, 12);
        assert_eq!(settings.cache.ttl_secs, 300);
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: AppSettings = config::Config::builder()
            .add_source(config::File::from_str(
                "[schedule]\nbatch_size = 50\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.schedule.batch_size, 50);
        assert_eq!(settings.schedule.horizon_months, 12);
        assert_eq!(settings.cache, CacheSettings::default());
    }
}
