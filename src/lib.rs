// Core modules
mod config;
mod error;
mod model;
mod sanitize;
mod store;
mod types;

pub mod access;
pub mod api;
pub mod auth;
pub mod autojoin;
pub mod client;

#[cfg(test)]
mod testing;

// Re-export key types and functions
pub use access::{AccessDecision, AccessPolicy, Protected};
pub use api::{VortexRoute, VortexState, api_path, vortex_router, vortex_routes};
pub use auth::{AuthenticatedUser, JwtContext, RequestContext, authenticate_request};
pub use autojoin::{configure_autojoin, get_autojoin_domains};
pub use client::{ClientFactory, VortexApi, VortexClient};
pub use config::{
    API_BASE_URL_ENV, API_KEY_ENV, AuthenticateHook, DEFAULT_API_BASE_URL, HookFuture,
    JwtAttributesHook, ResolvedConfig, SETTINGS_PATH_ENV, VortexConfig, VortexSettings,
    resolve_settings_path,
};
pub use error::{GENERIC_ERROR_MESSAGE, VortexError, VortexResult};
pub use model::{
    AcceptTarget, AcceptUser, AutojoinDomain, AutojoinDomains, ConfigureAutojoinRequest,
    Invitation, LegacyTarget, TargetType,
};
pub use sanitize::{MAX_INPUT_LENGTH, sanitize};
pub use store::{
    AsyncConfig, ConfigError, ConfigFuture, ConfigStore, configure_vortex, configure_vortex_async,
    configure_vortex_lazy, get_vortex_config, global_store,
};
pub use types::{GroupId, GroupType, InvitationId, UserId};
