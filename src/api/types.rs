use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::access::InvitationTargetResource;
use crate::auth::{JwtContext, RequestContext};
use crate::error::{VortexError, VortexResult};
use crate::model::{AcceptTarget, AcceptUser, Invitation, LegacyTarget, TargetType};
use crate::sanitize::sanitize;
use crate::types::InvitationId;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationsResponse {
    pub invitations: Vec<Invitation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtResponse {
    pub jwt: String,
}

/// Optional body of `POST /jwt`.
#[derive(Debug, Default, Deserialize)]
pub struct JwtRequest {
    #[serde(default)]
    pub context: Option<JwtContext>,
}

impl JwtRequest {
    /// Parse leniently: an empty or malformed body means "no context".
    pub fn parse(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }
}

/// `targetType` / `targetValue` query of `GET /invitations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetQuery {
    pub target_type: TargetType,
    pub target_value: String,
}

impl TargetQuery {
    pub fn from_request(request: &RequestContext) -> VortexResult<Self> {
        let target_type = sanitize(request.query_param("targetType").as_deref());
        let target_value = sanitize(request.query_param("targetValue").as_deref());

        let (Some(target_type), Some(target_value)) = (target_type, target_value) else {
            return Err(VortexError::validation(
                "targetType and targetValue query parameters are required",
            ));
        };

        let target_type = TargetType::parse_lookup(&target_type).ok_or_else(|| {
            VortexError::validation("targetType must be email, username, or phoneNumber")
        })?;

        Ok(Self {
            target_type,
            target_value,
        })
    }
}

/// A validated `POST /invitations/accept` body.
///
/// Accepts the current `{invitationIds, user: {email?, phone?, name?}}`
/// format and the legacy `{invitationIds, target: {type, value}}` format.
/// When both are present `user` wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptInvitationsRequest {
    pub invitation_ids: Vec<InvitationId>,
    pub target: AcceptTarget,
}

impl AcceptInvitationsRequest {
    pub fn parse(bytes: &[u8]) -> VortexResult<Self> {
        let body: Value = serde_json::from_slice(bytes)
            .map_err(|_| VortexError::validation("Invalid JSON in request body"))?;

        let invitation_ids = match body.get("invitationIds") {
            Some(Value::Array(ids)) if !ids.is_empty() => ids,
            _ => {
                return Err(VortexError::validation(
                    "invitationIds must be a non-empty array",
                ));
            }
        };

        let invitation_ids = invitation_ids
            .iter()
            .map(|id| id.as_str().and_then(InvitationId::sanitized))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| VortexError::validation("Invalid invitation IDs provided"))?;

        let user = body.get("user").filter(|v| !v.is_null());
        let target = body.get("target").filter(|v| !v.is_null());

        let target = match (user, target) {
            (Some(user), _) => AcceptTarget::User(parse_user(user)?),
            (None, Some(target)) => AcceptTarget::Legacy(parse_legacy_target(target)?),
            (None, None) => {
                return Err(VortexError::validation(
                    "Either user or target must be provided",
                ));
            }
        };

        Ok(Self {
            invitation_ids,
            target,
        })
    }

    /// Descriptor handed to the `can_accept_invitations` hook.
    pub fn resource(&self) -> InvitationTargetResource {
        let (user, target) = match &self.target {
            AcceptTarget::User(user) => (Some(user.clone()), None),
            AcceptTarget::Legacy(target) => (None, Some(target.clone())),
        };

        InvitationTargetResource {
            invitation_ids: self.invitation_ids.clone(),
            target,
            user,
        }
    }
}

fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn parse_user(user: &Value) -> VortexResult<AcceptUser> {
    let user = AcceptUser {
        email: sanitize(string_field(user, "email")),
        phone: sanitize(string_field(user, "phone")),
        name: sanitize(string_field(user, "name")),
    };

    if user.email.is_none() && user.phone.is_none() {
        return Err(VortexError::validation(
            "user must have either email or phone",
        ));
    }

    Ok(user)
}

fn parse_legacy_target(target: &Value) -> VortexResult<LegacyTarget> {
    let missing = || VortexError::validation("target must have type and value properties");

    let kind = string_field(target, "type")
        .filter(|kind| !kind.is_empty())
        .ok_or_else(missing)?;
    let value = string_field(target, "value")
        .filter(|value| !value.is_empty())
        .ok_or_else(missing)?;

    let kind = TargetType::parse_accept(kind).ok_or_else(|| {
        VortexError::validation("target.type must be email, username, phoneNumber, or sms")
    })?;
    let value = sanitize(Some(value)).ok_or_else(missing)?;

    Ok(LegacyTarget { kind, value })
}
