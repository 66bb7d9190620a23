//! JWT payload assembly and signing for the widget-facing token endpoint.

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::context::{AuthenticatedUser, UserGroup, UserIdentifier};
use crate::types::UserId;

/// Lifetime of generated tokens in seconds (1 hour).
pub const JWT_TTL_SECONDS: i64 = 3600;

/// Optional context sent by the client when requesting a token.
///
/// Forwarded to the `generate_jwt_attributes` hook so it can tailor the
/// attributes to the widget and scope being rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_type: Option<String>,
}

/// Attributes produced by the `generate_jwt_attributes` hook.
pub type JwtAttributes = Map<String, Value>;

/// Payload of a Vortex JWT: the user's identity plus generated attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtPayload {
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
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: JwtAttributes,
}

impl JwtPayload {
    /// Build the payload for a user.
    ///
    /// Only hook-generated attributes are signed; the user's own
    /// `attributes` field is not copied into the token.
    pub fn for_user(user: &AuthenticatedUser, attributes: JwtAttributes) -> Self {
        Self {
            user_id: user.user_id.clone(),
            user_email: user.user_email.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            admin_scopes: user.admin_scopes.clone(),
            identifiers: user.identifiers.clone(),
            groups: user.groups.clone(),
            role: user.role.clone(),
            attributes,
        }
    }
}

/// Registered claims added around the payload when signing.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(flatten)]
    pub payload: JwtPayload,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token id
    pub jti: String,
}

/// Sign a payload with HS256 using the API key as the shared secret.
pub fn sign_jwt(api_key: &str, payload: &JwtPayload) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        payload: payload.clone(),
        iat: now,
        exp: now + JWT_TTL_SECONDS,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(api_key.as_bytes()),
    )
    .context("Failed to sign Vortex JWT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};
    use serde_json::json;

    fn attributes(value: Value) -> JwtAttributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_payload_signs_only_generated_attributes() {
        let mut user = AuthenticatedUser::new("u1")
            .with_email("u1@example.com")
            .with_role("member");
        user.attributes = Some(attributes(json!({"plan": "free", "team": "a"})));

        let payload = JwtPayload::for_user(&user, attributes(json!({"plan": "pro"})));

        assert_eq!(payload.user_id.as_str(), "u1");
        assert_eq!(payload.role.as_deref(), Some("member"));
        assert_eq!(payload.attributes, attributes(json!({"plan": "pro"})));
        assert_eq!(payload.attributes.get("team"), None);
    }

    #[test]
    fn test_payload_omits_empty_attributes() {
        let payload = JwtPayload::for_user(&AuthenticatedUser::new("u1"), JwtAttributes::new());
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({"userId": "u1"}));
    }

    #[test]
    fn test_signed_token_verifies_with_api_key() {
        let payload = JwtPayload::for_user(
            &AuthenticatedUser::new("u1").with_email("u1@example.com"),
            attributes(json!({"passthrough": "abc"})),
        );
        let token = sign_jwt("secret-key", &payload).unwrap();

        let decoded = decode::<JwtClaims>(
            &token,
            &DecodingKey::from_secret(b"secret-key"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();

        assert_eq!(decoded.claims.payload, payload);
        assert_eq!(decoded.claims.exp - decoded.claims.iat, JWT_TTL_SECONDS);

        let wrong_key = decode::<JwtClaims>(
            &token,
            &DecodingKey::from_secret(b"other-key"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(wrong_key.is_err());
    }

    #[test]
    fn test_jwt_context_deserialization() {
        let context: JwtContext =
            serde_json::from_value(json!({"componentId": "c1", "scopeType": "team"})).unwrap();
        assert_eq!(context.component_id.as_deref(), Some("c1"));
        assert_eq!(context.scope, None);
        assert_eq!(context.scope_type.as_deref(), Some("team"));
    }
}
