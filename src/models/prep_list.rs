//! Prep lists: ordered collections of prep items

use serde::{Deserialize, Serialize};

use super::{de_list_or_empty, require_trimmed, trimmed_opt, Record};
use crate::error::Error;

/// A single line item on a prep list.
///
/// Items are embedded in the parent row as a JSON array; keys follow the
/// stored camelCase convention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrepItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// An ordered collection of prep items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepList {
    pub id: String,
    pub name: String,
    pub items: Vec<PrepItem>,
    pub company_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Wire shape of a prep list row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepListRow {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_list_or_empty")]
    pub items: Vec<PrepItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for PrepList {
    const TABLE: &'static str = "prep_lists";

    type Row = PrepListRow;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn to_row(&self) -> Result<PrepListRow, Error> {
        Ok(PrepListRow {
            id: Some(require_trimmed("id", &self.id)?),
            name: Some(require_trimmed("name", &self.name)?),
            items: self.items.clone(),
            user_id: None,
            company_id: trimmed_opt(&self.company_id),
            created_at: None,
            updated_at: None,
        })
    }

    fn from_row(row: PrepListRow) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            items: row.items,
            company_id: row.company_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn row_is_valid(row: &PrepListRow) -> bool {
        row.id.as_deref().is_some_and(|v| !v.is_empty())
            && row.name.as_deref().is_some_and(|v| !v.is_empty())
    }

    fn set_owner(row: &mut PrepListRow, user_id: &str) {
        row.user_id = Some(user_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_through_the_wire_shape() {
        let list = PrepList {
            id: "p1".into(),
            name: "Dinner Prep".into(),
            items: vec![PrepItem {
                id: "i1".into(),
                name: "Dice onions".into(),
                quantity: 2.0,
                unit: "kg".into(),
                category: Some("veg".into()),
                completed: false,
                assigned_to: None,
                notes: None,
            }],
            company_id: Some("co-1".into()),
            created_at: None,
            updated_at: None,
        };

        let row = list.to_row().unwrap();
        assert_eq!(PrepList::from_row(row), list);
    }

    #[test]
    fn trims_name_and_rejects_blank() {
        let mut list = PrepList {
            id: "p1".into(),
            name: "  Dinner Prep  ".into(),
            ..Default::default()
        };
        assert_eq!(list.to_row().unwrap().name.as_deref(), Some("Dinner Prep"));

        list.name = "   ".into();
        assert!(matches!(list.to_row(), Err(Error::Validation(_))));

        list.name = "Dinner Prep".into();
        list.id = "".into();
        assert!(matches!(list.to_row(), Err(Error::Validation(_))));
    }

    #[test]
    fn null_items_deserialize_to_empty_list() {
        let row: PrepListRow = serde_json::from_value(json!({
            "id": "p1",
            "name": "Dinner Prep",
            "items": null
        }))
        .unwrap();
        assert!(row.items.is_empty());

        let malformed: PrepListRow = serde_json::from_value(json!({
            "id": "p1",
            "name": "Dinner Prep",
            "items": "oops"
        }))
        .unwrap();
        assert!(malformed.items.is_empty());
    }

    #[test]
    fn item_keys_follow_storage_convention() {
        let item = PrepItem {
            id: "i1".into(),
            name: "Stock".into(),
            quantity: 1.0,
            unit: "l".into(),
            category: None,
            completed: true,
            assigned_to: Some("sam".into()),
            notes: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["assignedTo"], "sam");
        assert!(value.get("assigned_to").is_none());
    }
}
