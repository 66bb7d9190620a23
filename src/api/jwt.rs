use std::sync::Arc;

use anyhow::Context;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use tracing::debug;

use crate::api::state::VortexState;
use crate::api::types::{JwtRequest, JwtResponse};
use crate::auth::{JwtAttributes, JwtPayload, RequestContext};
use crate::error::{VortexError, VortexResult};

/// `POST /jwt`: sign a token for the current user.
///
/// Unlike the invitation endpoints this one talks to the `authenticate_user`
/// hook directly. A missing hook is a configuration error, a missing user is
/// a 401, and a failing hook is an internal error.
pub async fn generate_jwt(
    State(state): State<VortexState>,
    request: RequestContext,
    body: Bytes,
) -> VortexResult<Json<JwtResponse>> {
    let config = state.config().await?;

    let Some(authenticate_user) = config.authenticate_user.clone() else {
        return Err(VortexError::Configuration(
            "JWT generation requires authentication configuration. Please configure authenticateUser hook."
                .to_string(),
        ));
    };

    let request = Arc::new(request);
    let user = authenticate_user(request.clone())
        .await
        .context("Error in generate_jwt: authenticate_user hook failed")?
        .ok_or(VortexError::Unauthorized)?;

    let context = JwtRequest::parse(&body).context;
    debug!(
        "Generating Vortex JWT for {} (context: {})",
        user.user_id,
        context.is_some()
    );

    let attributes = match &config.generate_jwt_attributes {
        Some(hook) => hook(request.clone(), context)
            .await
            .context("Error in generate_jwt: generate_jwt_attributes hook failed")?,
        None => JwtAttributes::new(),
    };
    if !attributes.is_empty() {
        debug!("JWT attributes: {:?}", attributes.keys().collect::<Vec<_>>());
    }

    let client = state.client(&config)?;
    let jwt = client
        .generate_jwt(&JwtPayload::for_user(&user, attributes))
        .context("Error in generate_jwt")?;

    Ok(Json(JwtResponse { jwt }))
}
