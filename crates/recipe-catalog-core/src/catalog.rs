//! Local catalog gateway.
//!
//! A thin facade over a [`RecipeStore`] that owns the catalog's business
//! rules: validation, case-insensitive title uniqueness, and the read-only
//! status of external recipes. Reads return canonical recipes as stored.
//!
//! Writes are serialized through one lock shared by every clone, so the
//! title check and the store write happen as a single step.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{Recipe, RecipeDraft, RecipeSource, ValidationErrors};
use crate::store::RecipeStore;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Recipe with ID '{0}' not found")]
    NotFound(String),

    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("Recipe with title '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Recipe '{0}' comes from an external provider and is read-only")]
    ReadOnly(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Clone)]
pub struct LocalCatalog {
    store: Arc<dyn RecipeStore>,
    writes: Arc<Mutex<()>>,
}

impl LocalCatalog {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self {
            store,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get_all(&self) -> CatalogResult<Vec<Recipe>> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: &str) -> CatalogResult<Recipe> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    pub async fn search(&self, query: &str) -> CatalogResult<Vec<Recipe>> {
        let hits = self.store.search(query).await?;
        debug!(query, hits = hits.len(), "local catalog search");
        Ok(hits)
    }

    pub async fn create(&self, draft: RecipeDraft) -> CatalogResult<Recipe> {
        draft.validate()?;
        let _guard = self.writes.lock().await;
        self.ensure_unique_title(&draft.title, None).await?;

        let recipe = Recipe::from_draft(draft, Utc::now());
        self.store.insert(&recipe).await?;
        info!(id = %recipe.id, title = %recipe.title, "recipe created");
        Ok(recipe)
    }

    pub async fn update(&self, id: &str, draft: RecipeDraft) -> CatalogResult<Recipe> {
        ensure_internal(id)?;
        let _guard = self.writes.lock().await;
        let mut recipe = self.get(id).await?;
        draft.validate()?;
        self.ensure_unique_title(&draft.title, Some(id)).await?;

        recipe.apply(draft, Utc::now());
        if !self.store.update(&recipe).await? {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        info!(id = %recipe.id, "recipe updated");
        Ok(recipe)
    }

    pub async fn delete(&self, id: &str) -> CatalogResult<()> {
        ensure_internal(id)?;
        let _guard = self.writes.lock().await;
        if !self.store.delete(id).await? {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        info!(id, "recipe deleted");
        Ok(())
    }

    /// Inserts the sample recipe when the catalog is empty. Returns whether
    /// anything was inserted.
    pub async fn seed_sample(&self) -> CatalogResult<bool> {
        if !self.store.list().await?.is_empty() {
            return Ok(false);
        }
        self.create(sample_draft()).await?;
        Ok(true)
    }

    async fn ensure_unique_title(&self, title: &str, except_id: Option<&str>) -> CatalogResult<()> {
        let wanted = title.trim().to_lowercase();
        let taken = self
            .store
            .list()
            .await?
            .iter()
            .any(|r| Some(r.id.as_str()) != except_id && r.title.to_lowercase() == wanted);
        if taken {
            return Err(CatalogError::DuplicateTitle(title.trim().to_string()));
        }
        Ok(())
    }
}

fn ensure_internal(id: &str) -> CatalogResult<()> {
    match RecipeSource::from_id(id) {
        RecipeSource::Internal => Ok(()),
        RecipeSource::External => Err(CatalogError::ReadOnly(id.to_string())),
    }
}

/// The recipe a fresh catalog starts with.
pub fn sample_draft() -> RecipeDraft {
    RecipeDraft {
        title: "Classic Spaghetti Carbonara".to_string(),
        description: "A traditional Italian pasta dish with eggs, cheese, and pancetta"
            .to_string(),
        ingredients: [
            "400g spaghetti",
            "200g pancetta or guanciale, diced",
            "4 large eggs",
            "100g Pecorino Romano cheese, grated",
            "2 cloves garlic, minced",
            "Black pepper to taste",
            "Salt for pasta water",
        ]
        .map(String::from)
        .to_vec(),
        instructions: [
            "Bring a large pot of salted water to boil",
            "Cook spaghetti according to package directions until al dente",
            "While pasta cooks, fry pancetta in a large pan until crispy",
            "In a bowl, whisk together eggs, cheese, and black pepper",
            "Drain pasta, reserving 1 cup pasta water",
            "Add hot pasta to the pan with pancetta",
            "Remove from heat and quickly mix in egg mixture",
            "Add pasta water gradually until creamy",
            "Serve immediately with extra cheese and pepper",
        ]
        .map(String::from)
        .to_vec(),
        tags: ["Italian", "pasta", "traditional"].map(String::from).to_vec(),
        cuisine: "Italian".to_string(),
    }
}
