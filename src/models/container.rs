//! Storage containers

use serde::{Deserialize, Serialize};

use super::{require_trimmed, trimmed_opt, Record};
use crate::error::Error;

/// A physical storage container.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub container_type: String,
    pub size: Option<String>,
    pub description: Option<String>,
    pub company_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Wire shape of a container row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRow {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub container_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Container {
    const TABLE: &'static str = "containers";

    type Row = ContainerRow;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn to_row(&self) -> Result<ContainerRow, Error> {
        Ok(ContainerRow {
            id: Some(require_trimmed("id", &self.id)?),
            name: Some(require_trimmed("name", &self.name)?),
            container_type: Some(self.container_type.trim().to_string()),
            size: trimmed_opt(&self.size),
            description: trimmed_opt(&self.description),
            user_id: None,
            company_id: trimmed_opt(&self.company_id),
            created_at: None,
            updated_at: None,
        })
    }

    fn from_row(row: ContainerRow) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            container_type: row.container_type.unwrap_or_default(),
            size: row.size,
            description: row.description,
            company_id: row.company_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn row_is_valid(row: &ContainerRow) -> bool {
        row.id.as_deref().is_some_and(|v| !v.is_empty())
            && row.name.as_deref().is_some_and(|v| !v.is_empty())
    }

    fn set_owner(row: &mut ContainerRow, user_id: &str) {
        row.user_id = Some(user_id.to_string());
    }
}
