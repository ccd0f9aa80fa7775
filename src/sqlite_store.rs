//! SQLite-backed [`RecipeStore`] implementation.
//!
//! List-valued fields are stored as JSON text columns and timestamps as
//! RFC 3339 strings. Search loads the table and applies the same
//! [`Recipe::matches`] predicate as the in-memory store, so both backends
//! agree on what a hit is.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use recipe_catalog_core::models::{Recipe, RecipeSource};
use recipe_catalog_core::store::RecipeStore;

const SELECT_COLUMNS: &str = "id, title, description, cuisine, ingredients_json, \
     instructions_json, tags_json, created_at, updated_at";

/// SQLite implementation of the [`RecipeStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid stored timestamp: {}", raw))?
        .with_timezone(&Utc))
}

fn decode_list(raw: &str, column: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).with_context(|| format!("invalid JSON in column {}", column))
}

fn row_to_recipe(row: &SqliteRow) -> Result<Recipe> {
    let id: String = row.try_get("id")?;
    let source = RecipeSource::from_id(&id);
    Ok(Recipe {
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        cuisine: row.try_get("cuisine")?,
        ingredients: decode_list(&row.try_get::<String, _>("ingredients_json")?, "ingredients_json")?,
        instructions: decode_list(
            &row.try_get::<String, _>("instructions_json")?,
            "instructions_json",
        )?,
        tags: decode_list(&row.try_get::<String, _>("tags_json")?, "tags_json")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
        source,
        id,
        image_url: None,
        video_url: None,
        external_area: None,
        external_category: None,
    })
}

#[async_trait]
impl RecipeStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Recipe>> {
        let rows = sqlx::query(&format!("SELECT {} FROM recipes ORDER BY seq", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_recipe).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Recipe>> {
        let row = sqlx::query(&format!("SELECT {} FROM recipes WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_recipe).transpose()
    }

    async fn insert(&self, recipe: &Recipe) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, title, description, cuisine, ingredients_json,
                                 instructions_json, tags_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&recipe.id)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(&recipe.cuisine)
        .bind(serde_json::to_string(&recipe.ingredients)?)
        .bind(serde_json::to_string(&recipe.instructions)?)
        .bind(serde_json::to_string(&recipe.tags)?)
        .bind(format_ts(&recipe.created_at))
        .bind(format_ts(&recipe.updated_at))
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert recipe {}", recipe.id))?;
        Ok(())
    }

    async fn update(&self, recipe: &Recipe) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE recipes SET
                title = ?,
                description = ?,
                cuisine = ?,
                ingredients_json = ?,
                instructions_json = ?,
                tags_json = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(&recipe.cuisine)
        .bind(serde_json::to_string(&recipe.ingredients)?)
        .bind(serde_json::to_string(&recipe.instructions)?)
        .bind(serde_json::to_string(&recipe.tags)?)
        .bind(format_ts(&recipe.updated_at))
        .bind(&recipe.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backend, Config};
    use crate::{db, migrate};
    use recipe_catalog_core::models::RecipeDraft;

    async fn store_in(dir: &tempfile::TempDir) -> SqliteStore {
        let mut cfg = Config::minimal();
        cfg.catalog.backend = Backend::Sqlite;
        cfg.db.path = dir.path().join("data").join("recipes.sqlite");
        let pool = db::connect(&cfg).await.unwrap();
        migrate::apply(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn recipe(title: &str) -> Recipe {
        Recipe::from_draft(
            RecipeDraft {
                title: title.to_string(),
                description: "Weeknight dinner".to_string(),
                ingredients: vec!["200g rice".to_string(), "1 egg".to_string()],
                instructions: vec!["Cook rice".to_string(), "Fry egg".to_string()],
                tags: vec!["Quick".to_string(), "Asian".to_string()],
                cuisine: "Korean".to_string(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_get_round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        let r = recipe("Bibimbap");

        store.insert(&r).await.unwrap();
        let loaded = store.get(&r.id).await.unwrap().unwrap();
        assert_eq!(loaded, r);
        assert_eq!(loaded.source, RecipeSource::Internal);

        assert!(store.get("missing").await.unwrap().is_none());
        assert!(store.insert(&r).await.is_err());
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        let titles = ["Zucchini Fritters", "Apple Pie", "Miso Soup"];
        for t in titles {
            store.insert(&recipe(t)).await.unwrap();
        }
        let listed: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(listed, titles);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        let mut r = recipe("Bibimbap");
        store.insert(&r).await.unwrap();

        r.tags = vec!["spicy".to_string()];
        r.updated_at = Utc::now();
        assert!(store.update(&r).await.unwrap());
        assert_eq!(store.get(&r.id).await.unwrap().unwrap().tags, vec!["spicy"]);

        assert!(store.delete(&r.id).await.unwrap());
        assert!(!store.delete(&r.id).await.unwrap());
        assert!(!store.update(&r).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_uses_shared_predicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        store.insert(&recipe("Bibimbap")).await.unwrap();
        store.insert(&recipe("Kimchi Stew")).await.unwrap();

        assert_eq!(store.search("KOREAN").await.unwrap().len(), 2);
        assert_eq!(store.search("kimchi").await.unwrap().len(), 1);
        assert_eq!(store.search("quick").await.unwrap().len(), 2);
        assert!(store.search("lasagne").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_catalog_creates_store_one_row() {
        use recipe_catalog_core::catalog::{sample_draft, LocalCatalog};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let catalog = LocalCatalog::new(Arc::new(store_in(&dir).await));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = catalog.clone();
                tokio::spawn(async move { catalog.create(sample_draft()).await })
            })
            .collect();
        let outcomes = futures::future::join_all(handles).await;
        let created = outcomes
            .into_iter()
            .filter(|outcome| matches!(outcome, Ok(Ok(_))))
            .count();

        assert_eq!(created, 1);
        assert_eq!(catalog.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_data_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let r = recipe("Bibimbap");
        {
            let store = store_in(&dir).await;
            store.insert(&r).await.unwrap();
            store.pool().close().await;
        }
        let store = store_in(&dir).await;
        assert_eq!(store.get(&r.id).await.unwrap(), Some(r));
    }
}
