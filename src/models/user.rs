//! User identity and profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::FieldErrors;

/// Account identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider uid (also used as the profile document ID)
    pub id: String,
    /// Email address the account was registered with
    pub email: String,
    /// Display name, if the provider has one (federated accounts do)
    pub display_name: Option<String>,
}

/// Profile document stored at `users/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Provider uid, echoed into the document
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    /// Set on password sign-up; federated first-run profiles omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Profile written when a password account is registered.
    pub fn for_sign_up(
        identity: &Identity,
        fields: &ProfileFields,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: identity.id.clone(),
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            email: identity.email.clone(),
            address: Some(fields.address.clone()),
            mobile: Some(fields.mobile.clone()),
            created_at: Some(created_at),
        }
    }

    /// First-run profile for a federated account, splitting the
    /// provider's display name on its first space.
    pub fn from_display_name(identity: &Identity) -> Self {
        let name = identity.display_name.as_deref().unwrap_or("");
        let mut parts = name.split(' ');
        Self {
            uid: identity.id.clone(),
            first_name: parts.next().unwrap_or("").to_string(),
            last_name: parts.next().unwrap_or("").to_string(),
            email: identity.email.clone(),
            address: None,
            mobile: None,
            created_at: None,
        }
    }

    /// Serialize as a document field map.
    pub fn to_fields(&self) -> serde_json::Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(fields) => Ok(fields),
            _ => Err(serde::ser::Error::custom(
                "profile did not serialize to an object",
            )),
        }
    }

    /// Rebuild a profile from a stored field map. Every field defaults,
    /// so documents written by older clients still decode.
    pub fn from_fields(
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::Value::Object(fields))
    }
}

/// Fields collected by the registration form.
///
/// Email and password are not here: the auth provider enforces those
/// and its errors come back as `AuthError`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ProfileFields {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 10, message = "Mobile number must be at least 10 digits"))]
    pub mobile: String,
}

impl ProfileFields {
    /// Validate the form, with the messages it shows inline.
    pub fn check(&self) -> Result<(), FieldErrors> {
        self.validate().map_err(FieldErrors::from)?;
        Ok(())
    }
}

/// The signed-in user: provider identity merged with whatever profile
/// fields exist for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub mobile: Option<String>,
}

impl CurrentUser {
    /// User carrying only what the provider knows.
    pub fn from_identity(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            display_name: identity.display_name,
            ..Self::default()
        }
    }

    /// Fill in profile fields. The identity's email stays authoritative;
    /// empty strings in the document count as absent.
    pub fn with_profile(mut self, profile: &UserProfile) -> Self {
        if !profile.first_name.is_empty() {
            self.first_name = Some(profile.first_name.clone());
        }
        if !profile.last_name.is_empty() {
            self.last_name = Some(profile.last_name.clone());
        }
        if let Some(address) = &profile.address {
            self.address = Some(address.clone());
        }
        if let Some(mobile) = &profile.mobile {
            self.mobile = Some(mobile.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: "uid-1".to_string(),
            email: "ada@example.com".to_string(),
            display_name: Some("Ada Lovelace".to_string()),
        }
    }

    #[test]
    fn test_display_name_split() {
        let profile = UserProfile::from_display_name(&identity());
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.last_name, "Lovelace");
        assert_eq!(profile.email, "ada@example.com");
        assert!(profile.created_at.is_none());
    }

    #[test]
    fn test_display_name_single_token() {
        let mut id = identity();
        id.display_name = Some("Cher".to_string());
        let profile = UserProfile::from_display_name(&id);
        assert_eq!(profile.first_name, "Cher");
        assert_eq!(profile.last_name, "");

        id.display_name = None;
        let profile = UserProfile::from_display_name(&id);
        assert_eq!(profile.first_name, "");
    }

    #[test]
    fn test_profile_wire_field_names() {
        let fields = ProfileFields {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            address: "1 Navy Way".to_string(),
            mobile: "4155550100".to_string(),
        };
        let created = "2026-01-05T09:30:00Z".parse::<DateTime<Utc>>().unwrap();
        let map = UserProfile::for_sign_up(&identity(), &fields, created)
            .to_fields()
            .unwrap();

        assert_eq!(map["firstName"], serde_json::json!("Grace"));
        assert_eq!(map["lastName"], serde_json::json!("Hopper"));
        assert_eq!(map["mobile"], serde_json::json!("4155550100"));
        assert_eq!(map["uid"], serde_json::json!("uid-1"));
        assert!(map.contains_key("createdAt"));
    }

    #[test]
    fn test_federated_profile_omits_optional_fields() {
        let map = UserProfile::from_display_name(&identity())
            .to_fields()
            .unwrap();
        assert!(!map.contains_key("createdAt"));
        assert!(!map.contains_key("address"));
        assert!(!map.contains_key("mobile"));
    }

    #[test]
    fn test_profile_decodes_with_missing_fields() {
        let mut map = serde_json::Map::new();
        map.insert("firstName".to_string(), serde_json::json!("Ada"));
        let profile = UserProfile::from_fields(map).unwrap();
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.last_name, "");
        assert!(profile.address.is_none());
    }

    #[test]
    fn test_profile_fields_messages() {
        let errors = ProfileFields::default().check().unwrap_err();
        assert_eq!(
            errors.message_for("first_name"),
            Some("First name is required")
        );
        assert_eq!(
            errors.message_for("last_name"),
            Some("Last name is required")
        );
        assert_eq!(errors.message_for("address"), Some("Address is required"));
        assert_eq!(
            errors.message_for("mobile"),
            Some("Mobile number must be at least 10 digits")
        );

        let errors = ProfileFields {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            address: "1 Navy Way".to_string(),
            mobile: "555".to_string(),
        }
        .check()
        .unwrap_err();
        assert_eq!(
            errors.message_for("mobile"),
            Some("Mobile number must be at least 10 digits")
        );
        assert!(errors.message_for("first_name").is_none());
    }

    #[test]
    fn test_current_user_merge() {
        let user = CurrentUser::from_identity(identity());
        assert!(user.first_name.is_none());

        let profile = UserProfile {
            first_name: "Ada".to_string(),
            last_name: String::new(),
            address: Some("12 Analytical Row".to_string()),
            ..UserProfile::default()
        };
        let user = user.with_profile(&profile);
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert!(user.last_name.is_none());
        assert_eq!(user.address.as_deref(), Some("12 Analytical Row"));
        assert_eq!(user.email, "ada@example.com");
    }
}
