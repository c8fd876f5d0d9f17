//! Import run parameters

use reel_common::config::ImportDefaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Entries per discover page (fixed by TMDB)
pub const DISCOVER_PAGE_SIZE: u32 = 20;

/// Parameters for a single import run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportParameters {
    /// Maximum entries inserted by the run (default: 1000)
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Pause between processed entries in milliseconds (default: 250)
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// First discover page to request (default: 1)
    #[serde(default = "default_start_page")]
    pub start_page: u32,

    /// Maximum discover pages fetched by the run (default: 500)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_limit() -> u32 {
    1000
}

fn default_page_delay_ms() -> u64 {
    250
}

fn default_start_page() -> u32 {
    1
}

fn default_max_pages() -> u32 {
    500
}

impl Default for ImportParameters {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            page_delay_ms: default_page_delay_ms(),
            start_page: default_start_page(),
            max_pages: default_max_pages(),
        }
    }
}

impl ImportParameters {
    /// Parameters for `limit` entries using the service-wide defaults
    pub fn with_defaults(limit: u32, defaults: &ImportDefaults) -> Self {
        Self {
            limit,
            page_delay_ms: defaults.page_delay_ms,
            max_pages: defaults.max_pages,
            ..Default::default()
        }
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ImportParameters::default();
        assert_eq!(params.limit, 1000);
        assert_eq!(params.page_delay(), Duration::from_millis(250));
        assert_eq!(params.start_page, 1);
        assert_eq!(params.max_pages, 500);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: ImportParameters = serde_json::from_str(r#"{"limit": 5}"#).unwrap();
        assert_eq!(params.limit, 5);
        assert_eq!(params.start_page, 1);
    }

    #[test]
    fn test_with_service_defaults() {
        let defaults = ImportDefaults {
            page_delay_ms: 0,
            max_pages: 3,
        };
        let params = ImportParameters::with_defaults(40, &defaults);
        assert_eq!(params.limit, 40);
        assert_eq!(params.page_delay_ms, 0);
        assert_eq!(params.max_pages, 3);
        assert_eq!(params.start_page, 1);
    }
}
