//! User profiles

use serde::{Deserialize, Serialize};

use super::{require_trimmed, trimmed_opt, Record};
use crate::auth::Identity;
use crate::error::Error;

/// Access role within a company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    #[default]
    User,
    Admin,
    Owner,
}

/// A user's profile record. The id matches the auth identity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub company_id: Option<String>,
    pub avatar_url: Option<String>,
    pub role: ProfileRole,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl UserProfile {
    /// Build the default profile for a fresh identity.
    pub fn defaults_for(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone().unwrap_or_default(),
            full_name: identity.display_name(),
            company_id: None,
            avatar_url: None,
            role: ProfileRole::User,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Wire shape of a profile row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileRow {
    pub id: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: ProfileRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for UserProfile {
    const TABLE: &'static str = "user_profiles";

    type Row = UserProfileRow;

    fn id(&self) -> &str {
        &self.id
    }

    /// Profiles carry no display name of their own; the email stands in as
    /// the required name field and the operation-key fingerprint.
    fn name(&self) -> &str {
        &self.email
    }

    fn to_row(&self) -> Result<UserProfileRow, Error> {
        Ok(UserProfileRow {
            id: Some(require_trimmed("id", &self.id)?),
            email: Some(require_trimmed("email", &self.email)?),
            full_name: trimmed_opt(&self.full_name),
            company_id: trimmed_opt(&self.company_id),
            avatar_url: trimmed_opt(&self.avatar_url),
            role: self.role,
            created_at: None,
            updated_at: None,
        })
    }

    fn from_row(row: UserProfileRow) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            full_name: row.full_name,
            company_id: row.company_id,
            avatar_url: row.avatar_url,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn row_is_valid(row: &UserProfileRow) -> bool {
        row.id.as_deref().is_some_and(|v| !v.is_empty())
            && row.email.as_deref().is_some_and(|v| !v.is_empty())
    }

    // Profile rows are keyed by the identity itself; there is no separate
    // owner column to stamp.
    fn set_owner(_row: &mut UserProfileRow, _user_id: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn defaults_derive_from_identity() {
        let mut metadata = HashMap::new();
        metadata.insert("full_name".to_string(), json!("Sam Chef"));
        let identity = Identity {
            id: "u1".into(),
            email: Some("sam@example.com".into()),
            user_metadata: metadata,
        };

        let profile = UserProfile::defaults_for(&identity);
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.email, "sam@example.com");
        assert_eq!(profile.full_name.as_deref(), Some("Sam Chef"));
        assert_eq!(profile.role, ProfileRole::User);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ProfileRole::Admin).unwrap(),
            json!("admin")
        );
    }

    #[test]
    fn missing_email_fails_validation() {
        let profile = UserProfile {
            id: "u1".into(),
            email: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(profile.to_row(), Err(Error::Validation(_))));
    }
}
