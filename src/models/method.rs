//! Kitchen methods (techniques)

use serde::{Deserialize, Serialize};

use super::{de_list_or_empty, de_opt_number, require_trimmed, trimmed_opt, Record};
use crate::error::Error;

/// Skill required to execute a method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// A documented kitchen technique.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Method {
    pub id: String,
    pub name: String,
    pub instructions: Vec<String>,
    pub category: Option<String>,
    pub video_url: Option<String>,
    /// Minutes; accepts numeric strings on input
    #[serde(deserialize_with = "de_opt_number")]
    pub estimated_time: Option<f64>,
    pub difficulty_level: SkillLevel,
    pub tags: Vec<String>,
    pub equipment: Vec<String>,
    pub tips: Vec<String>,
    pub company_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Wire shape of a method row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRow {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_list_or_empty")]
    pub instructions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<f64>,
    #[serde(default)]
    pub difficulty_level: SkillLevel,
    #[serde(default, deserialize_with = "de_list_or_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "de_list_or_empty")]
    pub equipment: Vec<String>,
    #[serde(default, deserialize_with = "de_list_or_empty")]
    pub tips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Method {
    const TABLE: &'static str = "methods";

    type Row = MethodRow;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn to_row(&self) -> Result<MethodRow, Error> {
        Ok(MethodRow {
            id: Some(require_trimmed("id", &self.id)?),
            name: Some(require_trimmed("name", &self.name)?),
            instructions: self.instructions.clone(),
            category: trimmed_opt(&self.category),
            video_url: trimmed_opt(&self.video_url),
            estimated_time: self.estimated_time.filter(|v| v.is_finite() && *v >= 0.0),
            difficulty_level: self.difficulty_level,
            tags: self.tags.clone(),
            equipment: self.equipment.clone(),
            tips: self.tips.clone(),
            user_id: None,
            company_id: trimmed_opt(&self.company_id),
            created_at: None,
            updated_at: None,
        })
    }

    fn from_row(row: MethodRow) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            instructions: row.instructions,
            category: row.category,
            video_url: row.video_url,
            estimated_time: row.estimated_time,
            difficulty_level: row.difficulty_level,
            tags: row.tags,
            equipment: row.equipment,
            tips: row.tips,
            company_id: row.company_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn row_is_valid(row: &MethodRow) -> bool {
        row.id.as_deref().is_some_and(|v| !v.is_empty())
            && row.name.as_deref().is_some_and(|v| !v.is_empty())
    }

    fn set_owner(row: &mut MethodRow, user_id: &str) {
        row.user_id = Some(user_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_through_the_wire_shape() {
        let method = Method {
            id: "m1".into(),
            name: "Brunoise".into(),
            instructions: vec!["square off".into(), "slice".into(), "dice".into()],
            category: Some("knife work".into()),
            video_url: None,
            estimated_time: Some(5.0),
            difficulty_level: SkillLevel::Intermediate,
            tags: vec!["knife".into()],
            equipment: vec!["chef's knife".into()],
            tips: vec!["keep the tip down".into()],
            company_id: None,
            created_at: None,
            updated_at: None,
        };

        let row = method.to_row().unwrap();
        assert_eq!(Method::from_row(row), method);
    }

    #[test]
    fn missing_list_columns_default_to_empty() {
        let row: MethodRow = serde_json::from_value(json!({
            "id": "m1",
            "name": "Brunoise"
        }))
        .unwrap();
        let method = Method::from_row(row);
        assert!(method.instructions.is_empty());
        assert!(method.equipment.is_empty());
        assert!(method.tips.is_empty());
    }

    #[test]
    fn skill_level_uses_capitalized_literals() {
        assert_eq!(
            serde_json::to_value(SkillLevel::Advanced).unwrap(),
            json!("Advanced")
        );
    }
}
