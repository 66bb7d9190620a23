//! Authentication and user context module.
//!
//! The adapter never authenticates anyone itself. The application registers
//! an `authenticate_user` hook that maps a request (session cookie, bearer
//! token, ...) to an [`AuthenticatedUser`]; this module captures the request,
//! runs the hook, and assembles the JWTs handed to the Vortex widgets.
//!
//! ## Security Model
//!
//! - Identity is resolved per request and never cached
//! - A failing hook is logged and treated as "no user", never as an error
//! - Generated JWTs are signed with the Vortex API key and expire after an hour
//!
//! ## Usage
//!
//! ```ignore
//! let config = VortexConfig::new(api_key).authenticate_user(|req| async move {
//!     Ok(sessions.lookup(req.bearer_token()).await?.map(|s| AuthenticatedUser::new(s.user_id)))
//! });
//! ```

mod context;
mod extractor;
pub mod jwt;

pub use context::{AuthenticatedUser, IdentifierType, UserGroup, UserIdentifier};
pub use extractor::{RequestContext, authenticate, authenticate_request};
pub use jwt::{JwtAttributes, JwtContext, JwtPayload, sign_jwt};
