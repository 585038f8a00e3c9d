use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealType {
    #[default]
    #[serde(rename = "早餐")]
    Breakfast,
    #[serde(rename = "午餐")]
    Lunch,
    #[serde(rename = "晚餐")]
    Dinner,
    #[serde(rename = "加餐")]
    Snack,
}

pub const MEAL_TYPES: &[MealType] = &[
    MealType::Breakfast,
    MealType::Lunch,
    MealType::Dinner,
    MealType::Snack,
];

impl MealType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    /// The label stored on disk and shown on meal cards.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            MealType::Breakfast => "早餐",
            MealType::Lunch => "午餐",
            MealType::Dinner => "晚餐",
            MealType::Snack => "加餐",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();
        MEAL_TYPES
            .iter()
            .copied()
            .find(|m| m.name() == lower || m.label() == trimmed)
            .ok_or_else(|| {
                let names: Vec<&str> = MEAL_TYPES.iter().map(|m| m.name()).collect();
                anyhow::anyhow!(
                    "Invalid meal type '{s}'. Must be one of: {}",
                    names.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub meal_type: MealType,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Self-contained `data:` URL, empty when no photo was attached.
    #[serde(default)]
    pub photo_data_url: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Meal {
    /// Build a meal from form input. Title and notes are trimmed; an empty
    /// title is rejected.
    pub fn create(new: NewMeal, created_at: i64) -> Result<Self> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            bail!("Meal title must not be empty");
        }
        Ok(Self {
            id: new_id(),
            meal_type: new.meal_type,
            title,
            notes: new.notes.trim().to_string(),
            tags: parse_tags(&new.tags),
            photo_data_url: new.photo_data_url.unwrap_or_default(),
            created_at,
        })
    }

    #[must_use]
    pub fn has_photo(&self) -> bool {
        !self.photo_data_url.is_empty()
    }
}

/// Meal form input before an id and timestamp are assigned.
#[derive(Debug, Clone, Default)]
pub struct NewMeal {
    pub meal_type: MealType,
    pub title: String,
    pub notes: String,
    /// Raw comma-separated tag text as typed by the user.
    pub tags: String,
    pub photo_data_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    /// Cover image URL, empty when the page had none.
    #[serde(default)]
    pub cover: String,
    pub source_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Recipe {
    #[must_use]
    pub fn new(title: String, cover: String, source_url: String) -> Self {
        Self {
            id: new_id(),
            title,
            cover,
            source_url,
            tags: Vec::new(),
        }
    }
}

#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Split comma-separated tag text. Empty pieces are dropped; order and
/// duplicates are kept.
#[must_use]
pub fn parse_tags(text: &str) -> Vec<String> {
    text.split([',', '，'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

pub fn validate_meal(meal: &Meal) -> Result<()> {
    if meal.id.trim().is_empty() {
        bail!("Meal id must not be empty");
    }
    if meal.title.trim().is_empty() {
        bail!("Meal '{}' has an empty title", meal.id);
    }
    validate_tags(&meal.id, &meal.tags)
}

pub fn validate_recipe(recipe: &Recipe) -> Result<()> {
    if recipe.id.trim().is_empty() {
        bail!("Recipe id must not be empty");
    }
    if recipe.title.trim().is_empty() {
        bail!("Recipe '{}' has an empty title", recipe.id);
    }
    validate_tags(&recipe.id, &recipe.tags)
}

fn validate_tags(id: &str, tags: &[String]) -> Result<()> {
    if tags.iter().any(|t| t.trim().is_empty()) {
        bail!("Record '{id}' has an empty tag");
    }
    Ok(())
}

/// Reject a collection in which two records share an id.
pub fn ensure_unique_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            bail!("Duplicate record id '{id}'");
        }
    }
    Ok(())
}
