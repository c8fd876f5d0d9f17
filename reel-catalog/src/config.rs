//! Configuration resolution for reel-catalog
//!
//! Bootstrap settings come from the TOML file; the TMDB API key is resolved
//! at use time with Database → ENV → TOML priority so that a key saved
//! through the settings API takes effect without a restart.

use reel_common::config::{ImportDefaults, TomlConfig};
use reel_common::{Error, Result};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{debug, warn};

use crate::services::tmdb_client::{TmdbClient, TmdbConfig, TMDB_BASE_URL};

/// Environment variables checked for the TMDB API key, in order
pub const TMDB_API_KEY_ENV_VARS: [&str; 2] = ["REEL_TMDB_API_KEY", "TMDB_API_KEY"];

/// Settings shared by request handlers and the import supervisor
#[derive(Debug, Clone, Default)]
pub struct ServiceSettings {
    pub toml: TomlConfig,
}

impl ServiceSettings {
    pub fn new(toml: TomlConfig) -> Self {
        Self { toml }
    }

    pub fn import_defaults(&self) -> &ImportDefaults {
        &self.toml.import
    }

    pub fn tmdb_base_url(&self) -> String {
        self.toml
            .tmdb_base_url
            .clone()
            .unwrap_or_else(|| TMDB_BASE_URL.to_string())
    }
}

/// Where the TMDB API key was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    Database,
    Environment,
    Toml,
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve TMDB API key from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML. A missing key is not an error here;
/// the import job reports it when it starts.
pub async fn resolve_tmdb_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<(String, KeySource)>> {
    let mut found = Vec::new();

    if let Some(key) = crate::db::settings::get_tmdb_api_key(db).await? {
        if is_valid_key(&key) {
            found.push((key, KeySource::Database));
        }
    }

    let env_key = TMDB_API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|key| is_valid_key(key));
    if let Some(key) = env_key {
        found.push((key, KeySource::Environment));
    }

    if let Some(key) = &toml_config.tmdb_api_key {
        if is_valid_key(key) {
            found.push((key.clone(), KeySource::Toml));
        }
    }

    if found.len() > 1 {
        let sources: Vec<String> = found.iter().map(|(_, s)| format!("{:?}", s)).collect();
        warn!(
            "TMDB API key found in multiple sources: {}. Using {:?} (highest priority).",
            sources.join(", "),
            found[0].1
        );
    }

    let resolved = found.into_iter().next();
    if let Some((_, source)) = &resolved {
        debug!(?source, "TMDB API key resolved");
    }
    Ok(resolved)
}

/// Build a TMDB client with the currently configured key (possibly none)
pub async fn build_tmdb_client(
    db: &Pool<Sqlite>,
    settings: &ServiceSettings,
) -> Result<TmdbClient> {
    let api_key = resolve_tmdb_api_key(db, &settings.toml)
        .await?
        .map(|(key, _)| key);

    TmdbClient::new(TmdbConfig {
        api_key,
        base_url: settings.tmdb_base_url(),
        ..Default::default()
    })
    .map_err(|e| Error::Internal(format!("TMDB client init failed: {}", e)))
}
