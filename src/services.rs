//! Startup wiring.
//!
//! Builds the store, provider, catalog gateway and search aggregator from
//! configuration once; CLI commands and the HTTP server share the result.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use recipe_catalog_core::catalog::LocalCatalog;
use recipe_catalog_core::provider::{DisabledProvider, RecipeProvider};
use recipe_catalog_core::search::SearchAggregator;
use recipe_catalog_core::store::memory::InMemoryStore;
use recipe_catalog_core::store::RecipeStore;

use crate::config::{Backend, Config};
use crate::mealdb::MealDbClient;
use crate::sqlite_store::SqliteStore;
use crate::{db, migrate};

#[derive(Clone)]
pub struct Services {
    pub catalog: LocalCatalog,
    pub search: SearchAggregator,
    pub provider: Arc<dyn RecipeProvider>,
}

impl Services {
    pub fn new(store: Arc<dyn RecipeStore>, provider: Arc<dyn RecipeProvider>) -> Self {
        let catalog = LocalCatalog::new(store);
        Self {
            search: SearchAggregator::new(catalog.clone(), provider.clone()),
            catalog,
            provider,
        }
    }

    /// Opens the configured backend (running migrations for SQLite) and
    /// seeds the sample recipe when enabled.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = open_store(config).await?;

        let provider: Arc<dyn RecipeProvider> = if config.provider.enabled {
            Arc::new(MealDbClient::from_config(&config.provider))
        } else {
            Arc::new(DisabledProvider)
        };

        info!(
            backend = ?config.catalog.backend,
            provider = provider.name(),
            "catalog services ready"
        );

        let services = Self::new(store, provider);
        if config.catalog.seed_sample && services.catalog.seed_sample().await? {
            info!("seeded sample recipe into empty catalog");
        }
        Ok(services)
    }
}

/// Opens the configured backend, running migrations for SQLite.
pub async fn open_store(config: &Config) -> Result<Arc<dyn RecipeStore>> {
    let store: Arc<dyn RecipeStore> = match config.catalog.backend {
        Backend::Sqlite => {
            let pool = db::connect(config).await?;
            migrate::apply(&pool).await?;
            Arc::new(SqliteStore::new(pool))
        }
        Backend::Memory => Arc::new(InMemoryStore::new()),
    };
    Ok(store)
}
