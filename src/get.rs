//! `recipes get` and `recipes random`.

use anyhow::{bail, Result};

use recipe_catalog_core::catalog::CatalogError;
use recipe_catalog_core::models::{Recipe, RecipeSource};

use crate::config::Config;
use crate::search::summary_lines;
use crate::server::MAX_RANDOM_COUNT;
use crate::services::Services;

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        bail!("recipe id must not be empty");
    }

    let services = Services::from_config(config).await?;
    let recipe = match RecipeSource::from_id(id) {
        RecipeSource::External => services.provider.get_by_id(id).await?,
        RecipeSource::Internal => match services.catalog.get(id).await {
            Ok(recipe) => Some(recipe),
            Err(CatalogError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
    };
    services.provider.close().await;

    match recipe {
        Some(recipe) => {
            print!("{}", render_recipe(&recipe));
            Ok(())
        }
        None => bail!("Recipe with ID '{}' not found", id),
    }
}

pub async fn run_random(config: &Config, count: usize) -> Result<()> {
    if !(1..=MAX_RANDOM_COUNT as usize).contains(&count) {
        bail!("--count must be between 1 and {}", MAX_RANDOM_COUNT);
    }

    let services = Services::from_config(config).await?;
    let recipes = services.provider.get_random(count).await?;
    services.provider.close().await;

    if recipes.is_empty() {
        println!("No results.");
        return Ok(());
    }
    println!("{} of {} requested\n", recipes.len(), count);
    for (i, recipe) in recipes.iter().enumerate() {
        println!("{}. {}", i + 1, recipe.title);
        println!("{}", summary_lines(recipe));
    }
    Ok(())
}

/// Full text rendering of one recipe.
pub fn render_recipe(recipe: &Recipe) -> String {
    let mut out = String::from("--- Recipe ---\n");
    out.push_str(&format!("id:          {}\n", recipe.id));
    out.push_str(&format!("title:       {}\n", recipe.title));
    out.push_str(&format!("source:      {}\n", recipe.source.as_str()));
    out.push_str(&format!("cuisine:     {}\n", recipe.cuisine));
    if !recipe.tags.is_empty() {
        out.push_str(&format!("tags:        {}\n", recipe.tags.join(", ")));
    }
    if let Some(ref url) = recipe.image_url {
        out.push_str(&format!("image:       {}\n", url));
    }
    if let Some(ref url) = recipe.video_url {
        out.push_str(&format!("video:       {}\n", url));
    }
    out.push_str(&format!("created_at:  {}\n", recipe.created_at.to_rfc3339()));
    out.push_str(&format!("updated_at:  {}\n\n", recipe.updated_at.to_rfc3339()));

    out.push_str(&format!("{}\n\n", recipe.description));

    out.push_str(&format!("--- Ingredients ({}) ---\n", recipe.ingredients.len()));
    for ingredient in &recipe.ingredients {
        out.push_str(&format!("- {}\n", ingredient));
    }
    out.push('\n');

    out.push_str(&format!("--- Instructions ({}) ---\n", recipe.instructions.len()));
    for (i, step) in recipe.instructions.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, step));
    }
    out
}
