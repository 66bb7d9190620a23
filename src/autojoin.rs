//! Server-side autojoin actions.
//!
//! Autojoin lets everyone with an email address on a given domain join a
//! scope (organization, team, ...) without an individual invitation. These
//! are plain async functions for the application's own admin surfaces; they
//! are not mounted as routes and do not consult the access policy, so the
//! caller is responsible for checking that the current user may administer
//! the scope.

use anyhow::Context;

use crate::api::VortexState;
use crate::error::{VortexError, VortexResult};
use crate::model::{AutojoinDomains, ConfigureAutojoinRequest};

/// Autojoin domains configured for a scope, plus the invitation backing them.
pub async fn get_autojoin_domains(
    state: &VortexState,
    scope_type: &str,
    scope: &str,
) -> VortexResult<AutojoinDomains> {
    let config = state.config().await?;
    let client = state.client(&config)?;

    Ok(client
        .get_autojoin_domains(scope_type.to_string(), scope.to_string())
        .await
        .context("Error in get_autojoin_domains")?)
}

/// Sync the autojoin domains of a scope.
///
/// Domains not listed are removed; an empty list deactivates autojoin for
/// the scope.
pub async fn configure_autojoin(
    state: &VortexState,
    request: ConfigureAutojoinRequest,
) -> VortexResult<AutojoinDomains> {
    if request.scope.is_empty() || request.scope_type.is_empty() {
        return Err(VortexError::validation("scope and scopeType are required"));
    }
    if request.widget_id.is_empty() {
        return Err(VortexError::validation("widgetId is required"));
    }

    let config = state.config().await?;
    let client = state.client(&config)?;

    Ok(client
        .configure_autojoin(request)
        .await
        .context("Error in configure_autojoin")?)
}
