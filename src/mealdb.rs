//! TheMealDB client.
//!
//! [`MealDbClient`] implements [`RecipeProvider`] on top of a
//! [`MealDbTransport`]. The production transport, [`HttpTransport`], issues
//! `GET {base_url}/{endpoint}` requests through a shared `reqwest::Client`
//! with a per-request timeout. Tests swap in fake transports to inject
//! failures.
//!
//! Every fetch failure (timeout, connection error, non-2xx status,
//! undecodable body) is logged and turned into an empty result or
//! not-found. Callers never see transport errors.
//!
//! # Endpoints
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | search | `search.php?s={term}` |
//! | lookup | `lookup.php?i={native id}` |
//! | random | `random.php` (one request per recipe) |

use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use recipe_catalog_core::models::Recipe;
use recipe_catalog_core::normalize::{native_id, normalize_value, MealsEnvelope};
use recipe_catalog_core::provider::RecipeProvider;

use crate::config::ProviderConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {0} timed out")]
    Timeout(String),
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("could not decode response body: {0}")]
    Decode(String),
}

impl FetchError {
    fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(endpoint.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err)
        }
    }
}

/// One GET against the provider, decoded into the `{"meals": ...}` envelope.
#[async_trait]
pub trait MealDbTransport: Send + Sync {
    async fn fetch(&self, endpoint: &str, query: &[(&str, &str)])
        -> Result<MealsEnvelope, FetchError>;

    /// Drops pooled connections. The next fetch reconnects.
    async fn close(&self) {}
}

/// `reqwest`-backed transport.
///
/// The client is built lazily on first use and discarded by [`close`]; a
/// fetch after close builds a fresh one.
///
/// [`close`]: MealDbTransport::close
pub struct HttpTransport {
    base_url: String,
    timeout: Duration,
    client: Mutex<Option<reqwest::Client>>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client: Mutex::new(None),
        }
    }

    fn client(&self) -> Result<reqwest::Client, FetchError> {
        let mut slot = self
            .client
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(FetchError::Transport)?;
        *slot = Some(client.clone());
        Ok(client)
    }

    pub fn is_open(&self) -> bool {
        self.client
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

#[async_trait]
impl MealDbTransport for HttpTransport {
    async fn fetch(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<MealsEnvelope, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, ?query, "requesting TheMealDB");

        let response = self
            .client()?
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<MealsEnvelope>()
            .await
            .map_err(|e| FetchError::from_reqwest(endpoint, e))
    }

    async fn close(&self) {
        let dropped = self
            .client
            .lock()
            .map(|mut slot| slot.take().is_some())
            .unwrap_or(false);
        if dropped {
            info!("TheMealDB client closed");
        }
    }
}

/// [`RecipeProvider`] over TheMealDB.
pub struct MealDbClient<T: MealDbTransport = HttpTransport> {
    transport: T,
}

impl MealDbClient<HttpTransport> {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::with_transport(HttpTransport::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }
}

impl<T: MealDbTransport> MealDbClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches and logs failures; `None` means the request produced nothing.
    async fn fetch_meals(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Option<Vec<serde_json::Value>> {
        match self.transport.fetch(endpoint, query).await {
            Ok(envelope) => Some(envelope.into_meals()),
            Err(e) => {
                warn!(endpoint, error = %e, "TheMealDB request failed");
                None
            }
        }
    }

    /// Normalizes records, skipping (and logging) the ones that fail.
    fn normalize_all(meals: Vec<serde_json::Value>) -> Vec<Recipe> {
        let now = Utc::now();
        meals
            .into_iter()
            .filter_map(|meal| match normalize_value(meal, now) {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    warn!(error = %e, "skipping TheMealDB record");
                    None
                }
            })
            .collect()
    }

    fn first_normalized(meals: Vec<serde_json::Value>) -> Option<Recipe> {
        let meal = meals.into_iter().next()?;
        match normalize_value(meal, Utc::now()) {
            Ok(recipe) => Some(recipe),
            Err(e) => {
                warn!(error = %e, "skipping TheMealDB record");
                None
            }
        }
    }
}

#[async_trait]
impl<T: MealDbTransport + 'static> RecipeProvider for MealDbClient<T> {
    fn name(&self) -> &str {
        "themealdb"
    }

    async fn search(&self, term: &str) -> Result<Vec<Recipe>> {
        let Some(meals) = self.fetch_meals("search.php", &[("s", term)]).await else {
            return Ok(Vec::new());
        };
        let recipes = Self::normalize_all(meals);
        info!(term, count = recipes.len(), "TheMealDB search");
        Ok(recipes)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Recipe>> {
        let native = native_id(id.trim());
        if native.is_empty() {
            return Ok(None);
        }
        let recipe = self
            .fetch_meals("lookup.php", &[("i", native)])
            .await
            .and_then(Self::first_normalized);
        if recipe.is_none() {
            info!(id = native, "no TheMealDB meal for id");
        }
        Ok(recipe)
    }

    async fn get_random(&self, count: usize) -> Result<Vec<Recipe>> {
        let requests = (0..count).map(|_| self.fetch_meals("random.php", &[]));
        let recipes: Vec<Recipe> = join_all(requests)
            .await
            .into_iter()
            .flatten()
            .filter_map(Self::first_normalized)
            .collect();
        info!(requested = count, count = recipes.len(), "TheMealDB random batch");
        Ok(recipes)
    }

    async fn close(&self) {
        self.transport.close().await;
    }
}
