//! Storage abstraction for locally authored recipes.
//!
//! The [`RecipeStore`] trait is the seam between the catalog gateway and
//! whichever backend holds internal recipes (SQLite in the server binary,
//! [`memory::InMemoryStore`] in tests and `backend = "memory"`).
//!
//! Implementations must be `Send + Sync` and serialize their own writes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Recipe;

/// Abstract storage backend for internal recipes.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list`](RecipeStore::list) | All recipes, insertion order |
/// | [`get`](RecipeStore::get) | One recipe by id |
/// | [`insert`](RecipeStore::insert) | Add a new recipe |
/// | [`update`](RecipeStore::update) | Replace an existing recipe |
/// | [`delete`](RecipeStore::delete) | Remove by id |
/// | [`search`](RecipeStore::search) | Case-insensitive substring search |
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Recipe>>;

    /// `Ok(None)` when no recipe has this id.
    async fn get(&self, id: &str) -> Result<Option<Recipe>>;

    async fn insert(&self, recipe: &Recipe) -> Result<()>;

    /// Returns `false` when no recipe with `recipe.id` exists.
    async fn update(&self, recipe: &Recipe) -> Result<bool>;

    /// Returns `false` when no recipe had this id.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Recipes matching `query` on any searchable field (see
    /// [`Recipe::matches`]), in insertion order.
    async fn search(&self, query: &str) -> Result<Vec<Recipe>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.matches(&needle))
            .collect())
    }
}
