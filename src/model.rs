use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::types::InvitationId;

// An invitation as returned by the Vortex API.
//
// Only the id is interpreted here; every other field is passed through to the
// caller unchanged so the adapter never drops data the API adds later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Invitation {
    pub fn new(id: impl Into<InvitationId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// How an invitation target is addressed.
///
/// Lookups by target accept `email`, `username` and `phoneNumber`; the legacy
/// accept body additionally accepts `sms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetType {
    Email,
    Username,
    PhoneNumber,
    Sms,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Username => "username",
            Self::PhoneNumber => "phoneNumber",
            Self::Sms => "sms",
        }
    }

    /// Parse a target type usable for listing invitations by target.
    pub fn parse_lookup(value: &str) -> Option<Self> {
        match value {
            "email" => Some(Self::Email),
            "username" => Some(Self::Username),
            "phoneNumber" => Some(Self::PhoneNumber),
            _ => None,
        }
    }

    /// Parse a target type usable in a legacy accept body.
    pub fn parse_accept(value: &str) -> Option<Self> {
        match value {
            "sms" => Some(Self::Sms),
            other => Self::parse_lookup(other),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the person accepting invitations (current body format).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Legacy `{type, value}` accept target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTarget {
    #[serde(rename = "type")]
    pub kind: TargetType,
    pub value: String,
}

/// Who accepts a set of invitations, resolved once from the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AcceptTarget {
    User(AcceptUser),
    Legacy(LegacyTarget),
}

// A domain whose users automatically join a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutojoinDomain {
    pub id: String,
    pub domain: String,
}

// Autojoin configuration of a scope plus the invitation backing it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutojoinDomains {
    #[serde(default)]
    pub autojoin_domains: Vec<AutojoinDomain>,
    #[serde(default)]
    pub invitation: Option<Invitation>,
}

/// Request to sync the autojoin domains of a scope.
///
/// Domains missing from `domains` are removed; an empty list deactivates
/// autojoin for the scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureAutojoinRequest {
    pub scope: String,
    pub scope_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_name: Option<String>,
    pub domains: Vec<String>,
    pub widget_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invitation_keeps_unknown_fields() {
        let raw = json!({"id": "inv_1", "status": "queued", "groups": [{"type": "team"}]});
        let invitation: Invitation = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(invitation.id.as_str(), "inv_1");
        assert_eq!(invitation.fields.get("status"), Some(&json!("queued")));
        assert_eq!(serde_json::to_value(&invitation).unwrap(), raw);
    }

    #[test]
    fn target_type_parsing_depends_on_surface() {
        assert_eq!(TargetType::parse_lookup("phoneNumber"), Some(TargetType::PhoneNumber));
        assert_eq!(TargetType::parse_lookup("sms"), None);
        assert_eq!(TargetType::parse_accept("sms"), Some(TargetType::Sms));
        assert_eq!(TargetType::parse_accept("carrier-pigeon"), None);
        assert_eq!(serde_json::to_value(TargetType::PhoneNumber).unwrap(), json!("phoneNumber"));
    }

    #[test]
    fn accept_target_serializes_without_tag() {
        let user = AcceptTarget::User(AcceptUser {
            email: Some("a@b.com".to_string()),
            ..Default::default()
        });
        assert_eq!(serde_json::to_value(&user).unwrap(), json!({"email": "a@b.com"}));

        let legacy = AcceptTarget::Legacy(LegacyTarget {
            kind: TargetType::Sms,
            value: "+15550100".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&legacy).unwrap(),
            json!({"type": "sms", "value": "+15550100"})
        );
    }

    #[test]
    fn autojoin_request_uses_camel_case() {
        let request: ConfigureAutojoinRequest = serde_json::from_value(json!({
            "scope": "acme-org",
            "scopeType": "organization",
            "domains": ["acme.com"],
            "widgetId": "widget-123"
        }))
        .unwrap();

        assert_eq!(request.scope_type, "organization");
        assert_eq!(request.scope_name, None);
        assert_eq!(request.widget_id, "widget-123");
    }
}
