//! Recipes

use serde::{Deserialize, Serialize};

use super::{de_list_or_empty, de_opt_number, require_trimmed, trimmed_opt, Record};
use crate::error::Error;

/// How demanding a recipe is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeDifficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// A recipe with ordered ingredients and instructions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(rename = "yield", deserialize_with = "de_opt_number")]
    pub yield_amount: Option<f64>,
    #[serde(deserialize_with = "de_opt_number")]
    pub prep_time: Option<f64>,
    #[serde(deserialize_with = "de_opt_number")]
    pub cook_time: Option<f64>,
    #[serde(deserialize_with = "de_opt_number")]
    pub total_time: Option<f64>,
    pub difficulty: RecipeDifficulty,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub company_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Wire shape of a recipe row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRow {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_list_or_empty")]
    pub ingredients: Vec<String>,
    #[serde(default, deserialize_with = "de_list_or_empty")]
    pub instructions: Vec<String>,
    #[serde(rename = "yield", skip_serializing_if = "Option::is_none")]
    pub yield_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(default)]
    pub difficulty: RecipeDifficulty,
    #[serde(default, deserialize_with = "de_list_or_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Recipe {
    const TABLE: &'static str = "recipes";

    type Row = RecipeRow;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn to_row(&self) -> Result<RecipeRow, Error> {
        let positive = |n: &Option<f64>| n.filter(|v| v.is_finite() && *v >= 0.0);
        Ok(RecipeRow {
            id: Some(require_trimmed("id", &self.id)?),
            name: Some(require_trimmed("name", &self.name)?),
            ingredients: self.ingredients.clone(),
            instructions: self.instructions.clone(),
            yield_amount: positive(&self.yield_amount),
            prep_time: positive(&self.prep_time),
            cook_time: positive(&self.cook_time),
            total_time: positive(&self.total_time),
            difficulty: self.difficulty,
            tags: self.tags.clone(),
            notes: trimmed_opt(&self.notes),
            image_url: trimmed_opt(&self.image_url),
            user_id: None,
            company_id: trimmed_opt(&self.company_id),
            created_at: None,
            updated_at: None,
        })
    }

    fn from_row(row: RecipeRow) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            ingredients: row.ingredients,
            instructions: row.instructions,
            yield_amount: row.yield_amount,
            prep_time: row.prep_time,
            cook_time: row.cook_time,
            total_time: row.total_time,
            difficulty: row.difficulty,
            tags: row.tags,
            notes: row.notes,
            image_url: row.image_url,
            company_id: row.company_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn row_is_valid(row: &RecipeRow) -> bool {
        row.id.as_deref().is_some_and(|v| !v.is_empty())
            && row.name.as_deref().is_some_and(|v| !v.is_empty())
    }

    fn set_owner(row: &mut RecipeRow, user_id: &str) {
        row.user_id = Some(user_id.to_string());
    }
}
