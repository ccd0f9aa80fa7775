//! Provider record normalization.
//!
//! Maps a TheMealDB meal record into the canonical [`Recipe`]. Every field of
//! the raw record is optional; missing values are defaulted here so the rest
//! of the system only ever sees well-formed recipes.
//!
//! | Provider field | Recipe field |
//! |----------------|--------------|
//! | `idMeal` | `id` (prefixed with `ext_`) |
//! | `strMeal` | `title` |
//! | `strArea` | `cuisine`, `external_area` |
//! | `strCategory`, `strTags` | `tags` |
//! | `strInstructions` | `instructions` (see [`crate::instructions`]) |
//! | `strIngredientN` / `strMeasureN` | `ingredients` |
//! | `strMealThumb`, `strYoutube` | `image_url`, `video_url` |

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::instructions::split_instructions;
use crate::models::{
    normalize_tags, Recipe, RecipeSource, EXTERNAL_ID_PREFIX, MAX_CUISINE_LENGTH,
    MAX_DESCRIPTION_LENGTH, MAX_INGREDIENTS, MAX_INGREDIENT_LENGTH, MAX_TAGS, MAX_TITLE_LENGTH,
};

/// Number of (ingredient, measure) slot pairs in a provider record.
pub const INGREDIENT_SLOTS: usize = 20;

const DEFAULT_TITLE: &str = "Unknown Recipe";
const DEFAULT_CUISINE: &str = "International";

/// Response envelope of every provider endpoint. `meals` is `null` when
/// nothing matched. Meals stay untyped here so one malformed record does not
/// discard the whole response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MealsEnvelope {
    #[serde(default)]
    pub meals: Option<Vec<serde_json::Value>>,
}

impl MealsEnvelope {
    pub fn into_meals(self) -> Vec<serde_json::Value> {
        self.meals.unwrap_or_default()
    }
}

/// A single provider meal record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMeal {
    #[serde(rename = "idMeal", default)]
    pub id: Option<String>,
    #[serde(rename = "strMeal", default)]
    pub name: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "strArea", default)]
    pub area: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(rename = "strTags", default)]
    pub tags: Option<String>,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "strYoutube", default)]
    pub youtube: Option<String>,
    /// Everything else, including the numbered ingredient/measure slots.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl RawMeal {
    pub fn from_value(value: serde_json::Value) -> Result<Self, NormalizeError> {
        serde_json::from_value(value).map_err(NormalizeError::Malformed)
    }

    /// The (ingredient, measure) pairs in slot order, `None` where absent.
    pub fn ingredient_slots(&self) -> Vec<(Option<&str>, Option<&str>)> {
        (1..=INGREDIENT_SLOTS)
            .map(|i| {
                (
                    self.slot(&format!("strIngredient{}", i)),
                    self.slot(&format!("strMeasure{}", i)),
                )
            })
            .collect()
    }

    fn slot(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("malformed meal record: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("meal record has no id")]
    MissingId,
    #[error("meal {0} has no ingredients")]
    NoIngredients(String),
}

/// Builds the external recipe id for a provider-native id.
pub fn external_id(native_id: &str) -> String {
    format!("{}{}", EXTERNAL_ID_PREFIX, native_id)
}

/// Strips the external prefix, if present, yielding the provider-native id.
pub fn native_id(id: &str) -> &str {
    id.strip_prefix(EXTERNAL_ID_PREFIX).unwrap_or(id)
}

/// Combines ingredient slots into display strings.
///
/// Blank ingredients are skipped; a non-blank measure is prepended as
/// `"{measure} {ingredient}"`. Slot order is preserved.
pub fn extract_ingredients<'a, I>(slots: I) -> Vec<String>
where
    I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
{
    slots
        .into_iter()
        .filter_map(|(ingredient, measure)| {
            let ingredient = ingredient.map(str::trim).filter(|s| !s.is_empty())?;
            match measure.map(str::trim).filter(|s| !s.is_empty()) {
                Some(measure) => Some(format!("{} {}", measure, ingredient)),
                None => Some(ingredient.to_string()),
            }
        })
        .collect()
}

/// Category first, then each non-blank piece of the comma-separated tag list.
pub fn extract_tags(category: Option<&str>, tags: Option<&str>) -> Vec<String> {
    let mut raw: Vec<&str> = Vec::new();
    if let Some(category) = category.map(str::trim).filter(|s| !s.is_empty()) {
        raw.push(category);
    }
    if let Some(tags) = tags {
        raw.extend(tags.split(',').map(str::trim).filter(|s| !s.is_empty()));
    }
    normalize_tags(raw)
}

/// Normalizes one provider record into an external [`Recipe`].
pub fn normalize_meal(meal: &RawMeal, now: DateTime<Utc>) -> Result<Recipe, NormalizeError> {
    let native = non_blank(meal.id.as_deref()).ok_or(NormalizeError::MissingId)?;

    let ingredients: Vec<String> = extract_ingredients(meal.ingredient_slots())
        .into_iter()
        .take(MAX_INGREDIENTS)
        .map(|i| clip(&i, MAX_INGREDIENT_LENGTH))
        .collect();
    if ingredients.is_empty() {
        return Err(NormalizeError::NoIngredients(native.to_string()));
    }

    let name = non_blank(meal.name.as_deref());
    let area = non_blank(meal.area.as_deref());
    let category = non_blank(meal.category.as_deref());

    let description = format!(
        "Delicious {} from {} cuisine.",
        name.unwrap_or("recipe"),
        area.unwrap_or("Unknown")
    );

    let mut tags = extract_tags(category, meal.tags.as_deref());
    tags.truncate(MAX_TAGS);

    Ok(Recipe {
        id: external_id(native),
        title: clip(name.unwrap_or(DEFAULT_TITLE), MAX_TITLE_LENGTH),
        description: clip(&description, MAX_DESCRIPTION_LENGTH),
        ingredients,
        instructions: split_instructions(meal.instructions.as_deref().unwrap_or_default()),
        tags,
        cuisine: clip(area.unwrap_or(DEFAULT_CUISINE), MAX_CUISINE_LENGTH),
        source: RecipeSource::External,
        created_at: now,
        updated_at: now,
        image_url: non_blank(meal.thumbnail.as_deref()).map(str::to_string),
        video_url: non_blank(meal.youtube.as_deref()).map(str::to_string),
        external_area: area.map(str::to_string),
        external_category: category.map(str::to_string),
    })
}

/// Parses and normalizes an untyped record.
pub fn normalize_value(
    value: serde_json::Value,
    now: DateTime<Utc>,
) -> Result<Recipe, NormalizeError> {
    normalize_meal(&RawMeal::from_value(value)?, now)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn clip(value: &str, max: usize) -> String {
    value.chars().take(max).collect::<String>().trim().to_string()
}
