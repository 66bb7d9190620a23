//! Invitation endpoints.
//!
//! Every handler validates its input first, then passes the access gate, then
//! makes exactly one Vortex API call. Nothing reaches the API for a request
//! that fails validation or is denied.

use std::sync::Arc;

use anyhow::Context;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use serde_json::Value;

use crate::access::{GroupResource, InvitationResource, Protected};
use crate::api::state::VortexState;
use crate::api::types::{AcceptInvitationsRequest, InvitationsResponse, SuccessResponse, TargetQuery};
use crate::auth::RequestContext;
use crate::error::{VortexError, VortexResult};
use crate::model::Invitation;
use crate::types::{GroupId, GroupType, InvitationId};

fn invitation_resource(path: Result<Path<String>, PathRejection>) -> VortexResult<InvitationResource> {
    path.ok()
        .and_then(|Path(id)| InvitationId::sanitized(&id))
        .map(|invitation_id| InvitationResource { invitation_id })
        .ok_or_else(|| VortexError::validation("Invalid invitation ID"))
}

fn group_resource(
    path: Result<Path<(String, String)>, PathRejection>,
) -> VortexResult<GroupResource> {
    let invalid = || VortexError::validation("Invalid group parameters");
    let Path((group_type, group_id)) = path.map_err(|_| invalid())?;

    match (GroupType::sanitized(&group_type), GroupId::sanitized(&group_id)) {
        (Some(group_type), Some(group_id)) => Ok(GroupResource {
            group_type,
            group_id,
        }),
        _ => Err(invalid()),
    }
}

/// `GET /invitations?targetType=&targetValue=`
pub async fn get_invitations_by_target(
    State(state): State<VortexState>,
    request: RequestContext,
) -> VortexResult<Json<InvitationsResponse>> {
    let query = TargetQuery::from_request(&request)?;

    let request = Arc::new(request);
    let guarded = state.guard(&request, Protected::InvitationsByTarget).await?;

    let invitations = guarded
        .client
        .get_invitations_by_target(query.target_type, query.target_value)
        .await
        .context("Error in get_invitations_by_target")?;

    Ok(Json(InvitationsResponse { invitations }))
}

/// `GET /invitations/{invitationId}`
pub async fn get_invitation(
    State(state): State<VortexState>,
    request: RequestContext,
    path: Result<Path<String>, PathRejection>,
) -> VortexResult<Json<Invitation>> {
    let resource = invitation_resource(path)?;
    let invitation_id = resource.invitation_id.clone();

    let request = Arc::new(request);
    let guarded = state.guard(&request, Protected::Invitation(resource)).await?;

    let invitation = guarded
        .client
        .get_invitation(invitation_id)
        .await
        .context("Error in get_invitation")?;

    Ok(Json(invitation))
}

/// `DELETE /invitations/{invitationId}`
pub async fn revoke_invitation(
    State(state): State<VortexState>,
    request: RequestContext,
    path: Result<Path<String>, PathRejection>,
) -> VortexResult<Json<SuccessResponse>> {
    let resource = invitation_resource(path)?;
    let invitation_id = resource.invitation_id.clone();

    let request = Arc::new(request);
    let guarded = state
        .guard(&request, Protected::DeleteInvitation(resource))
        .await?;

    guarded
        .client
        .revoke_invitation(invitation_id)
        .await
        .context("Error in revoke_invitation")?;

    Ok(Json(SuccessResponse::ok()))
}

/// `POST /invitations/accept`
pub async fn accept_invitations(
    State(state): State<VortexState>,
    request: RequestContext,
    body: Bytes,
) -> VortexResult<Json<Value>> {
    let accept = AcceptInvitationsRequest::parse(&body)?;

    let request = Arc::new(request);
    let guarded = state
        .guard(&request, Protected::AcceptInvitations(accept.resource()))
        .await?;

    let result = guarded
        .client
        .accept_invitations(accept.invitation_ids, accept.target)
        .await
        .context("Error in accept_invitations")?;

    Ok(Json(result))
}

/// `GET /invitations/by-group/{groupType}/{groupId}`
pub async fn get_invitations_by_group(
    State(state): State<VortexState>,
    request: RequestContext,
    path: Result<Path<(String, String)>, PathRejection>,
) -> VortexResult<Json<InvitationsResponse>> {
    let group = group_resource(path)?;
    let GroupResource {
        group_type,
        group_id,
    } = group.clone();

    let request = Arc::new(request);
    let guarded = state
        .guard(&request, Protected::InvitationsByGroup(group))
        .await?;

    let invitations = guarded
        .client
        .get_invitations_by_group(group_type, group_id)
        .await
        .context("Error in get_invitations_by_group")?;

    Ok(Json(InvitationsResponse { invitations }))
}

/// `DELETE /invitations/by-group/{groupType}/{groupId}`
pub async fn delete_invitations_by_group(
    State(state): State<VortexState>,
    request: RequestContext,
    path: Result<Path<(String, String)>, PathRejection>,
) -> VortexResult<Json<SuccessResponse>> {
    let group = group_resource(path)?;
    let GroupResource {
        group_type,
        group_id,
    } = group.clone();

    let request = Arc::new(request);
    let guarded = state
        .guard(&request, Protected::DeleteInvitationsByGroup(group))
        .await?;

    guarded
        .client
        .delete_invitations_by_group(group_type, group_id)
        .await
        .context("Error in delete_invitations_by_group")?;

    Ok(Json(SuccessResponse::ok()))
}

/// `POST /invitations/{invitationId}/reinvite`
pub async fn reinvite(
    State(state): State<VortexState>,
    request: RequestContext,
    path: Result<Path<String>, PathRejection>,
) -> VortexResult<Json<Invitation>> {
    let resource = invitation_resource(path)?;
    let invitation_id = resource.invitation_id.clone();

    let request = Arc::new(request);
    let guarded = state.guard(&request, Protected::Reinvite(resource)).await?;

    let invitation = guarded
        .client
        .reinvite(invitation_id)
        .await
        .context("Error in reinvite")?;

    Ok(Json(invitation))
}
