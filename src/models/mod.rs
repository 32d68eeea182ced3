//! Domain entities, wire rows, and the mapping between them
//!
//! Each entity has a domain struct (what callers work with) and a wire row
//! (the storage shape: snake_case columns, nullable fields, arrays stored as
//! JSON). `to_row` trims and validates required fields before any remote
//! call; `from_row` defaults missing arrays to empty and keeps nulls as
//! absent options.

mod container;
mod event;
mod method;
mod prep_list;
mod recipe;
mod user_profile;

pub use container::{Container, ContainerRow};
pub use event::{Event, EventRow, EventStatus};
pub use method::{Method, MethodRow, SkillLevel};
pub use prep_list::{PrepItem, PrepList, PrepListRow};
pub use recipe::{Recipe, RecipeRow, RecipeDifficulty};
pub use user_profile::{ProfileRole, UserProfile, UserProfileRow};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// The fixed table list this layer fronts.
pub const TABLES: [&str; 6] = [
    "prep_lists",
    "events",
    "recipes",
    "methods",
    "containers",
    "user_profiles",
];

/// A persistable record with a stable id and a storage table.
pub trait Record: Sized + Send + Sync + 'static {
    /// The backing table name
    const TABLE: &'static str;

    /// Column used to order `load_all` results, newest first
    const ORDER_COLUMN: &'static str = "created_at";

    /// The wire row shape for this record
    type Row: Serialize + DeserializeOwned + Send + 'static;

    /// The record's natural identity
    fn id(&self) -> &str;

    /// The record's display name, used as the content fingerprint in
    /// operation keys
    fn name(&self) -> &str;

    /// Map to the wire shape, trimming and validating required fields
    fn to_row(&self) -> Result<Self::Row, Error>;

    /// Map from the wire shape, defaulting absent optionals
    fn from_row(row: Self::Row) -> Self;

    /// Whether a fetched row carries the required identity fields.
    /// Rows failing this are dropped from batch reads.
    fn row_is_valid(row: &Self::Row) -> bool;

    /// Stamp the owner reference before a write
    fn set_owner(row: &mut Self::Row, user_id: &str);
}

/// Trim a required string field, rejecting empty results.
pub(crate) fn require_trimmed(field: &str, value: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional string field, mapping blank to absent.
pub(crate) fn trimmed_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Deserialize an array field, coercing absent or wrong-typed values to an
/// empty list instead of failing the whole row.
pub(crate) fn de_list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Deserialize a non-negative integer, accepting numeric strings.
/// Unparseable input coerces to zero.
pub(crate) fn de_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

/// Deserialize an optional non-negative number, accepting numeric strings.
/// Unparseable or negative input coerces to absent.
pub(crate) fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

pub(crate) fn coerce_count(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0).min(u32::MAX as u64) as u32,
        serde_json::Value::String(s) => s.trim().parse::<u32>().unwrap_or(0),
        _ => 0,
    }
}

pub(crate) fn coerce_number(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite() && *n >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_trimmed_rejects_whitespace() {
        assert!(require_trimmed("name", "   ").is_err());
        assert_eq!(require_trimmed("name", "  Gala  ").unwrap(), "Gala");
    }

    #[test]
    fn trimmed_opt_maps_blank_to_absent() {
        assert_eq!(trimmed_opt(&Some("  ".to_string())), None);
        assert_eq!(
            trimmed_opt(&Some(" co-1 ".to_string())).as_deref(),
            Some("co-1")
        );
        assert_eq!(trimmed_opt(&None), None);
    }

    #[test]
    fn coerce_count_accepts_numeric_strings() {
        assert_eq!(coerce_count(&json!("50")), 50);
        assert_eq!(coerce_count(&json!(12)), 12);
        assert_eq!(coerce_count(&json!("not a number")), 0);
        assert_eq!(coerce_count(&json!(null)), 0);
    }

    #[test]
    fn coerce_number_drops_negatives_and_garbage() {
        assert_eq!(coerce_number(&json!("2.5")), Some(2.5));
        assert_eq!(coerce_number(&json!(-1)), None);
        assert_eq!(coerce_number(&json!({})), None);
    }
}
