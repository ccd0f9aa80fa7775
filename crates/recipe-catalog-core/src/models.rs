//! Core data models shared by the catalog, the provider client and the
//! search aggregator.
//!
//! [`Recipe`] is the single canonical shape every source is normalized into.
//! Its `source` and `id` always agree: external ids carry
//! [`EXTERNAL_ID_PREFIX`], internal ids never do.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix marking recipes derived from the remote provider.
pub const EXTERNAL_ID_PREFIX: &str = "ext_";

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_CUISINE_LENGTH: usize = 100;
pub const MAX_INGREDIENTS: usize = 50;
pub const MAX_INGREDIENT_LENGTH: usize = 200;
pub const MAX_INSTRUCTIONS: usize = 50;
pub const MAX_INSTRUCTION_LENGTH: usize = 500;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LENGTH: usize = 50;

/// Provenance of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    Internal,
    External,
}

impl RecipeSource {
    /// Infers provenance from an id alone.
    pub fn from_id(id: &str) -> Self {
        if id.starts_with(EXTERNAL_ID_PREFIX) {
            RecipeSource::External
        } else {
            RecipeSource::Internal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeSource::Internal => "internal",
            RecipeSource::External => "external",
        }
    }
}

/// Canonical recipe record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub tags: Vec<String>,
    pub cuisine: String,
    pub source: RecipeSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_category: Option<String>,
}

impl Recipe {
    /// Builds a new internal recipe from validated user input.
    pub fn from_draft(draft: RecipeDraft, now: DateTime<Utc>) -> Self {
        let draft = draft.normalized();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            ingredients: draft.ingredients,
            instructions: draft.instructions,
            tags: draft.tags,
            cuisine: draft.cuisine,
            source: RecipeSource::Internal,
            created_at: now,
            updated_at: now,
            image_url: None,
            video_url: None,
            external_area: None,
            external_category: None,
        }
    }

    /// Overwrites the editable fields and advances `updated_at`.
    ///
    /// `id`, `source` and `created_at` never change. `updated_at` moves
    /// forward by at least a microsecond even if the clock has not.
    pub fn apply(&mut self, draft: RecipeDraft, now: DateTime<Utc>) {
        let draft = draft.normalized();
        self.title = draft.title;
        self.description = draft.description;
        self.ingredients = draft.ingredients;
        self.instructions = draft.instructions;
        self.tags = draft.tags;
        self.cuisine = draft.cuisine;
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }

    pub fn is_external(&self) -> bool {
        self.source == RecipeSource::External
    }

    /// Case-insensitive substring match over title, description,
    /// ingredients, tags and cuisine. `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .ingredients
                .iter()
                .any(|i| i.to_lowercase().contains(needle))
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
            || self.cuisine.to_lowercase().contains(needle)
    }

    /// Checks the stored record against the schema limits.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.as_draft().check();
        if RecipeSource::from_id(&self.id) != self.source {
            errors.push("id", "id prefix does not match recipe source");
        }
        errors.into_result()
    }

    fn as_draft(&self) -> RecipeDraft {
        RecipeDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            ingredients: self.ingredients.clone(),
            instructions: self.instructions.clone(),
            tags: self.tags.clone(),
            cuisine: self.cuisine.clone(),
        }
    }
}

/// User-supplied fields for creating or replacing an internal recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cuisine: String,
}

impl RecipeDraft {
    /// Validates every field, collecting all failures keyed by field path.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.check().into_result()
    }

    fn check(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();

        check_text(&mut errors, "title", &self.title, MAX_TITLE_LENGTH);
        check_text(
            &mut errors,
            "description",
            &self.description,
            MAX_DESCRIPTION_LENGTH,
        );
        check_text(&mut errors, "cuisine", &self.cuisine, MAX_CUISINE_LENGTH);
        check_list(
            &mut errors,
            "ingredients",
            &self.ingredients,
            MAX_INGREDIENTS,
            MAX_INGREDIENT_LENGTH,
        );
        check_list(
            &mut errors,
            "instructions",
            &self.instructions,
            MAX_INSTRUCTIONS,
            MAX_INSTRUCTION_LENGTH,
        );

        if self.tags.len() > MAX_TAGS {
            errors.push("tags", format!("at most {} tags are allowed", MAX_TAGS));
        }
        for (i, tag) in self.tags.iter().enumerate() {
            if tag.chars().count() > MAX_TAG_LENGTH {
                errors.push(
                    format!("tags -> {}", i),
                    format!("must be at most {} characters", MAX_TAG_LENGTH),
                );
            }
        }

        errors
    }

    /// Trims text fields and normalizes tags.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            ingredients: self
                .ingredients
                .iter()
                .map(|s| s.trim().to_string())
                .collect(),
            instructions: self
                .instructions
                .iter()
                .map(|s| s.trim().to_string())
                .collect(),
            tags: normalize_tags(self.tags),
            cuisine: self.cuisine.trim().to_string(),
        }
    }
}

fn check_text(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, "must not be empty");
    } else if trimmed.chars().count() > max {
        errors.push(field, format!("must be at most {} characters", max));
    }
}

fn check_list(
    errors: &mut ValidationErrors,
    field: &str,
    values: &[String],
    max_items: usize,
    max_len: usize,
) {
    if values.is_empty() {
        errors.push(field, "at least one entry is required");
        return;
    }
    if values.len() > max_items {
        errors.push(field, format!("at most {} entries are allowed", max_items));
    }
    for (i, value) in values.iter().enumerate() {
        check_text(errors, &format!("{} -> {}", field, i), value, max_len);
    }
}

/// Field-level validation failures, keyed by field path (`"ingredients -> 2"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, thiserror::Error)]
#[error("validation failed for {} field(s)", .fields.len())]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Normalizes a tag list: lowercase, punctuation stripped, whitespace
/// collapsed, blanks dropped, duplicates removed (first occurrence wins),
/// each tag cut to [`MAX_TAG_LENGTH`] characters.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for tag in tags {
        let cleaned: String = tag
            .as_ref()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
            .collect();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        let bounded: String = collapsed.chars().take(MAX_TAG_LENGTH).collect();
        let bounded = bounded.trim().to_string();

        if bounded.is_empty() {
            continue;
        }
        if seen.insert(bounded.clone()) {
            out.push(bounded);
        }
    }

    out
}

/// Result of one combined search. Built once per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub recipes: Vec<Recipe>,
    /// Length of `recipes` after the cap.
    pub total_count: usize,
    /// Matches produced by the local catalog, before the cap.
    pub internal_count: usize,
    /// Matches produced by the remote provider, before the cap.
    pub external_count: usize,
    pub query: String,
}

impl SearchResult {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            recipes: Vec::new(),
            total_count: 0,
            internal_count: 0,
            external_count: 0,
            query: query.into(),
        }
    }
}
