//! `recipes validate`: schema check over every stored recipe.

use anyhow::{bail, Result};

use recipe_catalog_core::models::Recipe;

use crate::config::Config;
use crate::services::open_store;

#[derive(Debug)]
pub struct InvalidRecipe {
    pub id: String,
    pub title: String,
    /// Field path -> message.
    pub errors: Vec<(String, String)>,
}

#[derive(Debug)]
pub struct ValidationReport {
    pub total_recipes: usize,
    pub valid_recipes: usize,
    pub invalid_recipes: usize,
    pub errors: Vec<InvalidRecipe>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.invalid_recipes == 0
    }
}

pub fn validate_recipes(recipes: &[Recipe]) -> ValidationReport {
    let errors: Vec<InvalidRecipe> = recipes
        .iter()
        .filter_map(|recipe| {
            recipe.validate().err().map(|e| InvalidRecipe {
                id: recipe.id.clone(),
                title: recipe.title.clone(),
                errors: e.fields.into_iter().collect(),
            })
        })
        .collect();

    ValidationReport {
        total_recipes: recipes.len(),
        valid_recipes: recipes.len() - errors.len(),
        invalid_recipes: errors.len(),
        errors,
    }
}

pub async fn run_validate(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let report = validate_recipes(&store.list().await?);

    println!("Total recipes:   {}", report.total_recipes);
    println!("Valid recipes:   {}", report.valid_recipes);
    println!("Invalid recipes: {}", report.invalid_recipes);

    for invalid in &report.errors {
        println!();
        println!("{} ({})", invalid.title, invalid.id);
        for (field, message) in &invalid.errors {
            println!("    {}: {}", field, message);
        }
    }

    if !report.is_clean() {
        bail!("{} recipe(s) failed validation", report.invalid_recipes);
    }
    println!("\nAll recipes are valid.");
    Ok(())
}
