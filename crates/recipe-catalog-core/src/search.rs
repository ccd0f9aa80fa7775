//! Combined search across the local catalog and the remote provider.
//!
//! # Algorithm
//!
//! 1. Run the internal search ([`LocalCatalog::search`]) and the external
//!    search ([`RecipeProvider::search`]) concurrently with `futures::join!`.
//!    Both are awaited to completion.
//! 2. Fold each branch into a [`BranchOutcome`]. A failed branch is logged
//!    and contributes nothing; it never reaches the caller.
//! 3. Concatenate internal then external results, stable within each source.
//! 4. Truncate the merged list to `limit`. Per-source counts stay uncapped.
//!
//! The query is expected to be trimmed and validated by the caller.

use std::sync::Arc;

use futures::join;
use tracing::{error, info};

use crate::catalog::LocalCatalog;
use crate::models::{Recipe, SearchResult};
use crate::provider::RecipeProvider;

/// Result cap applied when the caller does not choose one.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Which side of the fan-out a branch queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Internal,
    External,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Internal => "internal",
            Branch::External => "external",
        }
    }
}

/// What one branch of a search produced.
#[derive(Debug)]
pub enum BranchOutcome {
    Hit(Vec<Recipe>),
    Failed(anyhow::Error),
}

impl BranchOutcome {
    fn from_result(result: anyhow::Result<Vec<Recipe>>) -> Self {
        match result {
            Ok(recipes) => BranchOutcome::Hit(recipes),
            Err(e) => BranchOutcome::Failed(e),
        }
    }

    /// The branch's contribution; failures log and become empty.
    pub fn into_recipes(self, branch: Branch, query: &str) -> Vec<Recipe> {
        match self {
            BranchOutcome::Hit(recipes) => recipes,
            BranchOutcome::Failed(e) => {
                error!(
                    branch = branch.as_str(),
                    query,
                    error = %e,
                    "search branch failed, continuing without it"
                );
                Vec::new()
            }
        }
    }
}

/// Fans searches out to the local catalog and the remote provider.
#[derive(Clone)]
pub struct SearchAggregator {
    catalog: LocalCatalog,
    provider: Arc<dyn RecipeProvider>,
}

impl SearchAggregator {
    pub fn new(catalog: LocalCatalog, provider: Arc<dyn RecipeProvider>) -> Self {
        Self { catalog, provider }
    }

    async fn search_catalog(&self, query: &str) -> anyhow::Result<Vec<Recipe>> {
        Ok(self.catalog.search(query).await?)
    }

    /// Searches both sources concurrently and merges internal-first.
    ///
    /// Never fails: a branch error becomes an empty contribution, and both
    /// failing yields [`SearchResult::empty`]. `limit` is raised to 1 if 0.
    pub async fn combined_search(&self, query: &str, limit: usize) -> SearchResult {
        let (internal, external) = join!(
            self.search_catalog(query),
            self.provider.search(query)
        );

        let internal = BranchOutcome::from_result(internal).into_recipes(Branch::Internal, query);
        let external = BranchOutcome::from_result(external).into_recipes(Branch::External, query);

        let result = merge(query, internal, external, limit.max(1));
        info!(
            query,
            internal = result.internal_count,
            external = result.external_count,
            returned = result.total_count,
            "combined search"
        );
        result
    }

    /// Local-only search with the same failure absorption.
    pub async fn internal_search(&self, query: &str) -> Vec<Recipe> {
        BranchOutcome::from_result(self.search_catalog(query).await)
            .into_recipes(Branch::Internal, query)
    }

    /// Provider-only search with the same failure absorption.
    pub async fn external_search(&self, query: &str) -> Vec<Recipe> {
        BranchOutcome::from_result(self.provider.search(query).await)
            .into_recipes(Branch::External, query)
    }
}

/// Concatenates `internal ++ external` and caps the result at `limit`.
pub fn merge(
    query: &str,
    internal: Vec<Recipe>,
    external: Vec<Recipe>,
    limit: usize,
) -> SearchResult {
    let internal_count = internal.len();
    let external_count = external.len();

    let mut recipes = internal;
    recipes.extend(external);
    recipes.truncate(limit);

    SearchResult {
        total_count: recipes.len(),
        recipes,
        internal_count,
        external_count,
        query: query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecipeDraft, RecipeSource};
    use crate::normalize::external_id;
    use crate::store::memory::InMemoryStore;
    use crate::store::RecipeStore;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn over(store: impl RecipeStore + 'static) -> LocalCatalog {
        LocalCatalog::new(Arc::new(store))
    }

    fn internal(title: &str) -> Recipe {
        Recipe::from_draft(
            RecipeDraft {
                title: title.to_string(),
                description: "house recipe".to_string(),
                ingredients: vec!["pasta".to_string()],
                instructions: vec!["cook".to_string()],
                tags: vec![],
                cuisine: "Italian".to_string(),
            },
            Utc::now(),
        )
    }

    fn external(native: &str, title: &str) -> Recipe {
        let mut r = internal(title);
        r.id = external_id(native);
        r.source = RecipeSource::External;
        r
    }

    struct FixedProvider(Vec<Recipe>);

    #[async_trait]
    impl RecipeProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn search(&self, _term: &str) -> Result<Vec<Recipe>> {
            Ok(self.0.clone())
        }
        async fn get_by_id(&self, _id: &str) -> Result<Option<Recipe>> {
            Ok(None)
        }
        async fn get_random(&self, _count: usize) -> Result<Vec<Recipe>> {
            Ok(Vec::new())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl RecipeProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }
        async fn search(&self, _term: &str) -> Result<Vec<Recipe>> {
            bail!("connection reset")
        }
        async fn get_by_id(&self, _id: &str) -> Result<Option<Recipe>> {
            bail!("connection reset")
        }
        async fn get_random(&self, _count: usize) -> Result<Vec<Recipe>> {
            bail!("connection reset")
        }
    }

    /// Answers after a delay, long after the local branch has finished.
    struct SlowProvider(Vec<Recipe>);

    #[async_trait]
    impl RecipeProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }
        async fn search(&self, _term: &str) -> Result<Vec<Recipe>> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(self.0.clone())
        }
        async fn get_by_id(&self, _id: &str) -> Result<Option<Recipe>> {
            Ok(None)
        }
        async fn get_random(&self, _count: usize) -> Result<Vec<Recipe>> {
            Ok(Vec::new())
        }
    }

    /// Store and provider that each wait for the other inside `search`.
    /// Neither returns unless both branches are in flight at once.
    struct Rendezvous(Arc<Barrier>, Vec<Recipe>);

    #[async_trait]
    impl RecipeStore for Rendezvous {
        async fn list(&self) -> Result<Vec<Recipe>> {
            self.0.wait().await;
            Ok(self.1.clone())
        }
        async fn get(&self, _id: &str) -> Result<Option<Recipe>> {
            Ok(None)
        }
        async fn insert(&self, _recipe: &Recipe) -> Result<()> {
            Ok(())
        }
        async fn update(&self, _recipe: &Recipe) -> Result<bool> {
            Ok(false)
        }
        async fn delete(&self, _id: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl RecipeProvider for Rendezvous {
        fn name(&self) -> &str {
            "rendezvous"
        }
        async fn search(&self, _term: &str) -> Result<Vec<Recipe>> {
            self.0.wait().await;
            Ok(self.1.clone())
        }
        async fn get_by_id(&self, _id: &str) -> Result<Option<Recipe>> {
            Ok(None)
        }
        async fn get_random(&self, _count: usize) -> Result<Vec<Recipe>> {
            Ok(Vec::new())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl RecipeStore for FailingStore {
        async fn list(&self) -> Result<Vec<Recipe>> {
            bail!("disk unavailable")
        }
        async fn get(&self, _id: &str) -> Result<Option<Recipe>> {
            bail!("disk unavailable")
        }
        async fn insert(&self, _recipe: &Recipe) -> Result<()> {
            bail!("disk unavailable")
        }
        async fn update(&self, _recipe: &Recipe) -> Result<bool> {
            bail!("disk unavailable")
        }
        async fn delete(&self, _id: &str) -> Result<bool> {
            bail!("disk unavailable")
        }
    }

    fn ids(recipes: &[Recipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_pasta_scenario() {
        let local = internal("Pasta Bake");
        let store = InMemoryStore::with_recipes(vec![local.clone(), internal("Risotto")]);
        let remote = vec![external("1", "Pasta One"), external("2", "Pasta Two")];
        let agg = SearchAggregator::new(over(store), Arc::new(FixedProvider(remote)));

        let result = agg.combined_search("pasta", 10).await;
        // "Risotto" also lists pasta as an ingredient.
        assert_eq!(result.internal_count, 2);

        let only_bake = InMemoryStore::with_recipes(vec![local.clone()]);
        let agg = SearchAggregator::new(
            over(only_bake),
            Arc::new(FixedProvider(vec![external("1", "Pasta One"), external("2", "Pasta Two")])),
        );
        let result = agg.combined_search("pasta", 10).await;
        assert_eq!(result.total_count, 3);
        assert_eq!(result.internal_count, 1);
        assert_eq!(result.external_count, 2);
        assert_eq!(ids(&result.recipes), vec![local.id.as_str(), "ext_1", "ext_2"]);
        assert_eq!(result.query, "pasta");
    }

    #[tokio::test]
    async fn test_cap_truncates_merged_list_but_not_counts() {
        let locals: Vec<Recipe> = (0..3).map(|i| internal(&format!("Pasta {}", i))).collect();
        let remotes: Vec<Recipe> = (0..4)
            .map(|i| external(&i.to_string(), &format!("Remote Pasta {}", i)))
            .collect();

        let mut expected = locals.clone();
        expected.extend(remotes.clone());

        for limit in 1..=9 {
            let agg = SearchAggregator::new(
                over(InMemoryStore::with_recipes(locals.clone())),
                Arc::new(FixedProvider(remotes.clone())),
            );
            let result = agg.combined_search("pasta", limit).await;

            assert_eq!(result.internal_count, 3);
            assert_eq!(result.external_count, 4);
            assert_eq!(result.total_count, limit.min(7));
            assert_eq!(result.recipes.len(), result.total_count);
            assert!(result.internal_count + result.external_count >= result.total_count);
            assert_eq!(ids(&result.recipes), ids(&expected[..limit.min(7)]));
        }
    }

    #[tokio::test]
    async fn test_external_failure_keeps_internal_results() {
        let local = internal("Pasta Bake");
        let agg = SearchAggregator::new(
            over(InMemoryStore::with_recipes(vec![local.clone()])),
            Arc::new(FailingProvider),
        );

        let result = agg.combined_search("pasta", 20).await;
        assert_eq!(result.external_count, 0);
        assert_eq!(result.internal_count, 1);
        assert_eq!(result.total_count, 1);
        assert_eq!(ids(&result.recipes), vec![local.id.as_str()]);
    }

    #[tokio::test]
    async fn test_internal_failure_keeps_external_results() {
        let agg = SearchAggregator::new(
            over(FailingStore),
            Arc::new(FixedProvider(vec![external("7", "Remote Pasta")])),
        );

        let result = agg.combined_search("pasta", 20).await;
        assert_eq!(result.internal_count, 0);
        assert_eq!(result.external_count, 1);
        assert_eq!(ids(&result.recipes), vec!["ext_7"]);
    }

    #[tokio::test]
    async fn test_total_failure_is_empty_not_error() {
        let agg = SearchAggregator::new(over(FailingStore), Arc::new(FailingProvider));
        let result = agg.combined_search("pasta", 20).await;
        assert_eq!(result, SearchResult::empty("pasta"));
    }

    #[tokio::test]
    async fn test_slow_external_branch_does_not_reorder_merge() {
        let local = internal("Pasta Bake");
        let agg = SearchAggregator::new(
            over(InMemoryStore::with_recipes(vec![local.clone()])),
            Arc::new(SlowProvider(vec![external("3", "Slow Pasta")])),
        );
        let result = agg.combined_search("pasta", 20).await;
        assert_eq!(ids(&result.recipes), vec![local.id.as_str(), "ext_3"]);
    }

    #[tokio::test]
    async fn test_branches_are_in_flight_together() {
        let barrier = Arc::new(Barrier::new(2));
        let local = internal("Pasta Bake");
        let agg = SearchAggregator::new(
            over(Rendezvous(barrier.clone(), vec![local.clone()])),
            Arc::new(Rendezvous(barrier, vec![external("4", "Remote Pasta")])),
        );

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            agg.combined_search("pasta", 20),
        )
        .await
        .expect("branches waited on each other sequentially");
        assert_eq!(ids(&result.recipes), vec![local.id.as_str(), "ext_4"]);
    }

    #[tokio::test]
    async fn test_zero_limit_is_raised_to_one() {
        let agg = SearchAggregator::new(
            over(InMemoryStore::new()),
            Arc::new(FixedProvider(vec![external("1", "A"), external("2", "B")])),
        );
        let result = agg.combined_search("pasta", 0).await;
        assert_eq!(result.total_count, 1);
        assert_eq!(result.external_count, 2);
    }

    #[tokio::test]
    async fn test_scoped_searches_absorb_failures() {
        let agg = SearchAggregator::new(over(FailingStore), Arc::new(FailingProvider));
        assert!(agg.internal_search("pasta").await.is_empty());
        assert!(agg.external_search("pasta").await.is_empty());
    }
}
