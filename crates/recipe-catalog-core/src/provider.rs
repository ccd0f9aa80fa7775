//! Remote recipe provider abstraction.
//!
//! The server binary implements [`RecipeProvider`] over TheMealDB; tests
//! substitute in-process fakes. Implementations are expected to absorb
//! transport failures themselves and return empty results, but the
//! aggregator does not rely on it: an `Err` from any method is isolated the
//! same way.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Recipe;

#[async_trait]
pub trait RecipeProvider: Send + Sync {
    /// Short name used in logs (e.g. `"themealdb"`).
    fn name(&self) -> &str;

    /// Free-text search. Returned recipes are already normalized.
    async fn search(&self, term: &str) -> Result<Vec<Recipe>>;

    /// Lookup by id. Accepts both native ids and `ext_`-prefixed ids.
    async fn get_by_id(&self, id: &str) -> Result<Option<Recipe>>;

    /// Up to `count` random recipes; may return fewer, including none.
    async fn get_random(&self, count: usize) -> Result<Vec<Recipe>>;

    /// Releases any held connection resources. Later calls may re-acquire them.
    async fn close(&self) {}
}

/// Provider used when remote lookups are switched off in configuration.
pub struct DisabledProvider;

#[async_trait]
impl RecipeProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn search(&self, _term: &str) -> Result<Vec<Recipe>> {
        Ok(Vec::new())
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<Recipe>> {
        Ok(None)
    }

    async fn get_random(&self, _count: usize) -> Result<Vec<Recipe>> {
        Ok(Vec::new())
    }
}
