//! In-memory [`RecipeStore`] for tests and the `memory` backend.
//!
//! A `Vec` behind `std::sync::RwLock`; insertion order is list order.

use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::Recipe;

use super::RecipeStore;

#[derive(Default)]
pub struct InMemoryStore {
    recipes: RwLock<Vec<Recipe>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipes(recipes: Vec<Recipe>) -> Self {
        Self {
            recipes: RwLock::new(recipes),
        }
    }
}

#[async_trait]
impl RecipeStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Recipe>> {
        let recipes = self
            .recipes
            .read()
            .map_err(|_| anyhow!("recipe store lock poisoned"))?;
        Ok(recipes.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Recipe>> {
        let recipes = self
            .recipes
            .read()
            .map_err(|_| anyhow!("recipe store lock poisoned"))?;
        Ok(recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, recipe: &Recipe) -> Result<()> {
        let mut recipes = self
            .recipes
            .write()
            .map_err(|_| anyhow!("recipe store lock poisoned"))?;
        if recipes.iter().any(|r| r.id == recipe.id) {
            bail!("recipe {} already stored", recipe.id);
        }
        recipes.push(recipe.clone());
        Ok(())
    }

    async fn update(&self, recipe: &Recipe) -> Result<bool> {
        let mut recipes = self
            .recipes
            .write()
            .map_err(|_| anyhow!("recipe store lock poisoned"))?;
        match recipes.iter_mut().find(|r| r.id == recipe.id) {
            Some(slot) => {
                *slot = recipe.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut recipes = self
            .recipes
            .write()
            .map_err(|_| anyhow!("recipe store lock poisoned"))?;
        let before = recipes.len();
        recipes.retain(|r| r.id != id);
        Ok(recipes.len() != before)
    }
}
