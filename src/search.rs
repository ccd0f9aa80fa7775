//! `recipes search`: combined search from the command line.

use anyhow::{bail, Result};

use recipe_catalog_core::models::{Recipe, SearchResult};

use crate::config::Config;
use crate::services::Services;

pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        println!("No results.");
        return Ok(());
    }
    if limit == Some(0) {
        bail!("--limit must be at least 1");
    }
    let limit = limit
        .unwrap_or(config.search.default_limit)
        .min(config.search.max_limit);

    let services = Services::from_config(config).await?;
    let result = services.search.combined_search(query, limit).await;
    services.provider.close().await;

    print!("{}", render_results(&result));
    Ok(())
}

/// Text rendering of a search result, one block per recipe.
pub fn render_results(result: &SearchResult) -> String {
    if result.recipes.is_empty() {
        return "No results.\n".to_string();
    }

    let mut out = format!(
        "{} result(s) for \"{}\" (internal: {}, external: {})\n\n",
        result.total_count, result.query, result.internal_count, result.external_count
    );
    for (i, recipe) in result.recipes.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {}\n",
            i + 1,
            recipe.source.as_str(),
            recipe.title
        ));
        out.push_str(&summary_lines(recipe));
        out.push('\n');
    }
    out
}

pub(crate) fn summary_lines(recipe: &Recipe) -> String {
    let mut out = format!("    cuisine: {}\n", recipe.cuisine);
    if !recipe.tags.is_empty() {
        out.push_str(&format!("    tags: {}\n", recipe.tags.join(", ")));
    }
    out.push_str(&format!(
        "    ingredients: {}, steps: {}\n",
        recipe.ingredients.len(),
        recipe.instructions.len()
    ));
    out.push_str(&format!("    id: {}\n", recipe.id));
    out
}
