//! HTTP surface of the adapter.
//!
//! The six routes are declared once in [`VortexRoute`] and mounted either one
//! at a time through the route factories or all together with
//! [`vortex_router`]. Paths are relative; nest the router under whatever
//! prefix the frontend provider is configured with (usually `/api/vortex`).

mod error;
mod handlers;
mod jwt;
mod state;
mod types;


use axum::Router;
use axum::routing::{MethodRouter, get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use error::method_not_allowed;
pub use handlers::{
    accept_invitations, delete_invitations_by_group, get_invitation, get_invitations_by_group,
    get_invitations_by_target, reinvite, revoke_invitation,
};
pub use jwt::generate_jwt;
pub use state::{Guarded, VortexState};
pub use types::{
    AcceptInvitationsRequest, ErrorBody, InvitationsResponse, JwtRequest, JwtResponse,
    SuccessResponse, TargetQuery,
};

/// Route paths the frontend provider calls, relative to the mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VortexRoute {
    Jwt,
    Invitations,
    Invitation,
    InvitationsAccept,
    InvitationsByGroup,
    InvitationReinvite,
}

impl VortexRoute {
    pub const ALL: [VortexRoute; 6] = [
        VortexRoute::Jwt,
        VortexRoute::Invitations,
        VortexRoute::Invitation,
        VortexRoute::InvitationsAccept,
        VortexRoute::InvitationsByGroup,
        VortexRoute::InvitationReinvite,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Jwt => "/jwt",
            Self::Invitations => "/invitations",
            Self::Invitation => "/invitations/{invitationId}",
            Self::InvitationsAccept => "/invitations/accept",
            Self::InvitationsByGroup => "/invitations/by-group/{groupType}/{groupId}",
            Self::InvitationReinvite => "/invitations/{invitationId}/reinvite",
        }
    }

    /// HTTP methods served on this path.
    pub fn methods(self) -> &'static [&'static str] {
        match self {
            Self::Jwt | Self::InvitationsAccept | Self::InvitationReinvite => &["POST"],
            Self::Invitations => &["GET"],
            Self::Invitation | Self::InvitationsByGroup => &["GET", "DELETE"],
        }
    }

    pub fn method_router(self) -> MethodRouter<VortexState> {
        match self {
            Self::Jwt => jwt_route(),
            Self::Invitations => invitations_route(),
            Self::Invitation => invitation_route(),
            Self::InvitationsAccept => invitations_accept_route(),
            Self::InvitationsByGroup => invitations_by_group_route(),
            Self::InvitationReinvite => reinvite_route(),
        }
    }
}

/// Join a base URL with a route template, dropping one trailing slash.
pub fn api_path(base_url: &str, route: VortexRoute) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{}{}", base, route.path())
}

pub fn jwt_route() -> MethodRouter<VortexState> {
    post(generate_jwt).fallback(method_not_allowed)
}

pub fn invitations_route() -> MethodRouter<VortexState> {
    get(get_invitations_by_target)
        .head(method_not_allowed)
        .fallback(method_not_allowed)
}

pub fn invitation_route() -> MethodRouter<VortexState> {
    get(get_invitation)
        .head(method_not_allowed)
        .delete(revoke_invitation)
        .fallback(method_not_allowed)
}

pub fn invitations_accept_route() -> MethodRouter<VortexState> {
    post(accept_invitations).fallback(method_not_allowed)
}

pub fn invitations_by_group_route() -> MethodRouter<VortexState> {
    get(get_invitations_by_group)
        .head(method_not_allowed)
        .delete(delete_invitations_by_group)
        .fallback(method_not_allowed)
}

pub fn reinvite_route() -> MethodRouter<VortexState> {
    post(reinvite).fallback(method_not_allowed)
}

/// All routes, still waiting for their state.
pub fn vortex_routes() -> Router<VortexState> {
    VortexRoute::ALL
        .into_iter()
        .fold(Router::new(), |router, route| {
            router.route(route.path(), route.method_router())
        })
}

pub fn vortex_router(state: VortexState) -> Router {
    vortex_routes()
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_path() {
        assert_eq!(
            api_path("https://app.test/api/vortex/", VortexRoute::Jwt),
            "https://app.test/api/vortex/jwt"
        );
        assert_eq!(
            api_path("/api/vortex", VortexRoute::InvitationsByGroup),
            "/api/vortex/invitations/by-group/{groupType}/{groupId}"
        );
    }

    #[test]
    fn test_route_paths_are_unique() {
        let mut paths: Vec<_> = VortexRoute::ALL.iter().map(|r| r.path()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), VortexRoute::ALL.len());
    }
}
