//! Catering events with embedded prep items

use serde::{Deserialize, Serialize};

use super::{coerce_count, de_count, de_list_or_empty, require_trimmed, trimmed_opt, Record};
use super::prep_list::PrepItem;
use crate::error::Error;

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Planning,
    Prep,
    Active,
    Complete,
}

/// A catering event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub date: String,
    pub invoice_number: Option<String>,
    pub items: Vec<PrepItem>,
    pub status: EventStatus,
    /// Accepts numeric strings on input; unparseable values coerce to zero.
    #[serde(deserialize_with = "de_count")]
    pub total_servings: u32,
    pub company_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Wire shape of an event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "de_list_or_empty")]
    pub items: Vec<PrepItem>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub total_servings: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Event {
    const TABLE: &'static str = "events";

    /// Events sort by their domain date, not the insert time.
    const ORDER_COLUMN: &'static str = "date";

    type Row = EventRow;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn to_row(&self) -> Result<EventRow, Error> {
        Ok(EventRow {
            id: Some(require_trimmed("id", &self.id)?),
            name: Some(require_trimmed("name", &self.name)?),
            date: Some(require_trimmed("date", &self.date)?),
            invoice_number: trimmed_opt(&self.invoice_number),
            items: self.items.clone(),
            status: self.status,
            total_servings: serde_json::Value::from(self.total_servings),
            user_id: None,
            company_id: trimmed_opt(&self.company_id),
            created_at: None,
            updated_at: None,
        })
    }

    fn from_row(row: EventRow) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            date: row.date.unwrap_or_default(),
            invoice_number: row.invoice_number,
            items: row.items,
            status: row.status,
            total_servings: coerce_count(&row.total_servings),
            company_id: row.company_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn row_is_valid(row: &EventRow) -> bool {
        row.id.as_deref().is_some_and(|v| !v.is_empty())
            && row.name.as_deref().is_some_and(|v| !v.is_empty())
    }

    fn set_owner(row: &mut EventRow, user_id: &str) {
        row.user_id = Some(user_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_servings_coerce_to_integer() {
        let event: Event = serde_json::from_value(json!({
            "id": "e1",
            "name": "Gala",
            "date": "2025-01-01",
            "totalServings": "50"
        }))
        .unwrap();
        assert_eq!(event.total_servings, 50);

        let row = event.to_row().unwrap();
        assert_eq!(row.total_servings, json!(50));
    }

    #[test]
    fn round_trips_with_status_and_items() {
        let event = Event {
            id: "e1".into(),
            name: "Gala".into(),
            date: "2025-01-01".into(),
            invoice_number: Some("INV-7".into()),
            items: vec![PrepItem {
                id: "i1".into(),
                name: "Canapes".into(),
                quantity: 200.0,
                unit: "pcs".into(),
                ..Default::default()
            }],
            status: EventStatus::Prep,
            total_servings: 50,
            company_id: None,
            created_at: None,
            updated_at: None,
        };

        let row = event.to_row().unwrap();
        assert_eq!(Event::from_row(row), event);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(EventStatus::Planning).unwrap(),
            json!("planning")
        );
        let status: EventStatus = serde_json::from_value(json!("complete")).unwrap();
        assert_eq!(status, EventStatus::Complete);
    }

    #[test]
    fn blank_date_is_rejected() {
        let event = Event {
            id: "e1".into(),
            name: "Gala".into(),
            date: " ".into(),
            ..Default::default()
        };
        assert!(matches!(event.to_row(), Err(Error::Validation(_))));
    }
}
