//! Authenticated user identity for request-scoped authorization.

use crate::types::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of a legacy user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    Email,
    Phone,
}

/// Legacy contact identifier attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentifier {
    #[serde(rename = "type")]
    pub kind: IdentifierType,
    pub value: String,
}

/// Legacy group membership attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub name: String,
}

/// User resolved by the `authenticate_user` hook.
///
/// Produced per request and owned by the handler invocation that created it;
/// it is never persisted. `identifiers`, `groups` and `role` are kept for
/// applications still on the older JWT payload format. `attributes` is
/// accepted from those applications but never signed into a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<Vec<UserIdentifier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<UserGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

impl AuthenticatedUser {
    /// Create a user with only an id.
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            user_email: None,
            name: None,
            avatar_url: None,
            admin_scopes: None,
            identifiers: None,
            groups: None,
            role: None,
            attributes: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn with_admin_scopes(mut self, scopes: Vec<String>) -> Self {
        self.admin_scopes = Some(scopes);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_groups(mut self, groups: Vec<UserGroup>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn with_identifiers(mut self, identifiers: Vec<UserIdentifier>) -> Self {
        self.identifiers = Some(identifiers);
        self
    }

    /// Whether the user holds the given admin scope.
    pub fn has_admin_scope(&self, scope: &str) -> bool {
        self.admin_scopes
            .as_ref()
            .is_some_and(|scopes| scopes.iter().any(|s| s == scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_builder() {
        let user = AuthenticatedUser::new("u1")
            .with_email("u1@example.com")
            .with_name("User One")
            .with_admin_scopes(vec!["autojoin".to_string()]);

        assert_eq!(user.user_id.as_str(), "u1");
        assert_eq!(user.user_email.as_deref(), Some("u1@example.com"));
        assert!(user.has_admin_scope("autojoin"));
        assert!(!user.has_admin_scope("billing"));
    }

    #[test]
    fn test_user_serializes_camel_case_without_empty_fields() {
        let user = AuthenticatedUser::new("u1").with_avatar_url("https://cdn/x.png");
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({"userId": "u1", "avatarUrl": "https://cdn/x.png"})
        );
    }

    #[test]
    fn test_legacy_fields_deserialize() {
        let user: AuthenticatedUser = serde_json::from_value(json!({
            "userId": "u2",
            "identifiers": [{"type": "email", "value": "u2@example.com"}],
            "groups": [{"type": "organization", "groupId": "acme", "name": "Acme"}],
            "role": "admin"
        }))
        .unwrap();

        let identifiers = user.identifiers.unwrap();
        assert_eq!(identifiers[0].kind, IdentifierType::Email);
        let groups = user.groups.unwrap();
        assert_eq!(groups[0].group_id.as_deref(), Some("acme"));
        assert_eq!(groups[0].id, None);
        assert_eq!(user.role.as_deref(), Some("admin"));
    }
}
