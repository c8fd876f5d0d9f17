//! Shared test helpers for reel-catalog integration tests
//!
//! `FakeCatalog` stands in for TMDB: pages are scripted per page number and
//! every call is counted, so tests can assert on what the job requested.

#![allow(dead_code)]

use async_trait::async_trait;
use reel_catalog::db::{CatalogStore, SqliteCatalogStore};
use reel_catalog::services::tmdb_client::{
    CastMember, CatalogSource, Credits, CrewMember, DiscoverMovie, TmdbError,
};
use reel_catalog::services::{ImportError, JobResources};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// In-memory catalog database with the schema applied (no seed movie)
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    reel_catalog::db::init_tables(&pool)
        .await
        .expect("Failed to initialize schema");
    pool
}

pub async fn movie_count(pool: &SqlitePool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies")
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

/// Discover result with a title, year and poster
pub fn discover(id: i64) -> DiscoverMovie {
    DiscoverMovie {
        id,
        title: Some(format!("Movie {}", id)),
        original_title: None,
        release_date: Some("2019-04-24".to_string()),
        poster_path: Some(format!("/poster{}.jpg", id)),
    }
}

/// A full discover page of consecutive ids starting at `first_id`
pub fn page_of(first_id: i64, count: usize) -> Vec<DiscoverMovie> {
    (0..count as i64).map(|i| discover(first_id + i)).collect()
}

enum ScriptedPage {
    Results(Vec<DiscoverMovie>),
    Status(u16),
}

/// Scripted stand-in for the TMDB client
pub struct FakeCatalog {
    configured: bool,
    pages: HashMap<u32, ScriptedPage>,
    failing_credits: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
    pub discover_calls: AtomicUsize,
    pub credits_calls: AtomicUsize,
    pub requested_pages: Mutex<Vec<u32>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            configured: true,
            pages: HashMap::new(),
            failing_credits: HashSet::new(),
            gate: None,
            discover_calls: AtomicUsize::new(0),
            credits_calls: AtomicUsize::new(0),
            requested_pages: Mutex::new(Vec::new()),
        }
    }

    /// No access credential
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn with_page(mut self, page: u32, results: Vec<DiscoverMovie>) -> Self {
        self.pages.insert(page, ScriptedPage::Results(results));
        self
    }

    pub fn with_page_status(mut self, page: u32, status: u16) -> Self {
        self.pages.insert(page, ScriptedPage::Status(status));
        self
    }

    /// Credits lookups for this external id time out
    pub fn with_failing_credits(mut self, external_id: &str) -> Self {
        self.failing_credits.insert(external_id.to_string());
        self
    }

    /// Discover calls wait for a permit on `gate`
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn discover_count(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }

    pub fn credits_count(&self) -> usize {
        self.credits_calls.load(Ordering::SeqCst)
    }

    pub fn pages_requested(&self) -> Vec<u32> {
        self.requested_pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn discover_page(&self, page: u32) -> Result<Vec<DiscoverMovie>, TmdbError> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_pages.lock().unwrap().push(page);

        match self.pages.get(&page) {
            Some(ScriptedPage::Results(results)) => Ok(results.clone()),
            Some(ScriptedPage::Status(code)) => Err(TmdbError::Status(*code)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_credits(&self, external_id: &str) -> Result<Credits, TmdbError> {
        self.credits_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_credits.contains(external_id) {
            return Err(TmdbError::Timeout);
        }

        Ok(Credits {
            cast: ["Lead", "Second", "Third"]
                .iter()
                .map(|n| CastMember {
                    name: Some(format!("{} {}", n, external_id)),
                })
                .collect(),
            crew: vec![
                CrewMember {
                    name: Some(format!("Director {}", external_id)),
                    job: Some("Director".to_string()),
                },
                CrewMember {
                    name: Some(format!("Producer {}", external_id)),
                    job: Some("Producer".to_string()),
                },
            ],
        })
    }

    async fn fetch_poster_path(&self, _external_id: &str) -> Result<Option<String>, TmdbError> {
        Ok(None)
    }
}

/// Job resources backed by a [`FakeCatalog`] and a test database
pub struct TestResources {
    pub catalog: Arc<FakeCatalog>,
    pub pool: SqlitePool,
}

impl TestResources {
    pub fn new(catalog: FakeCatalog, pool: SqlitePool) -> Arc<Self> {
        Arc::new(Self {
            catalog: Arc::new(catalog),
            pool,
        })
    }
}

#[async_trait]
impl JobResources for TestResources {
    async fn catalog_source(&self) -> Result<Arc<dyn CatalogSource>, ImportError> {
        let source: Arc<dyn CatalogSource> = self.catalog.clone();
        Ok(source)
    }

    fn record_store(&self) -> Box<dyn CatalogStore> {
        Box::new(SqliteCatalogStore::new(self.pool.clone()))
    }
}

/// Poll until `done` holds, failing the test after five seconds
pub async fn wait_until<F>(mut done: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
