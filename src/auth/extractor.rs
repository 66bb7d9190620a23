//! Request capture and user resolution for incoming HTTP requests.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};
use tracing::warn;

use crate::auth::context::AuthenticatedUser;
use crate::config::ResolvedConfig;
use crate::store::{ConfigError, ConfigStore};

/// The parts of an incoming request that hooks get to inspect.
///
/// Captured once per request and shared with every hook invocation through
/// an `Arc`, so hooks can hold on to it across await points.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl RequestContext {
    /// Create a request context from its components.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// Capture a request context from HTTP request parts.
    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(parts.method.clone(), parts.uri.clone(), parts.headers.clone())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the token of an `Authorization: Bearer <token>` header.
    pub fn bearer_token(&self) -> Option<&str> {
        self.header("authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Get the first value of a query parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Resolve the user of a request with an already resolved configuration.
///
/// Returns `None` when no `authenticate_user` hook is registered, when the
/// hook finds no user, and when the hook fails. Identity resolution is
/// best-effort: a failing hook denies identity but never fails the request.
pub async fn authenticate(
    config: &ResolvedConfig,
    request: &Arc<RequestContext>,
) -> Option<AuthenticatedUser> {
    let hook = config.authenticate_user.as_ref()?;

    match hook(request.clone()).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Authentication error: {:#}", e);
            None
        }
    }
}

/// Resolve the user of a request against the store's current configuration.
pub async fn authenticate_request(
    store: &ConfigStore,
    request: &Arc<RequestContext>,
) -> Result<Option<AuthenticatedUser>, ConfigError> {
    let config = store.get_config().await?;
    Ok(authenticate(&config, request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VortexConfig;

    fn request(uri: &str) -> Arc<RequestContext> {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer session-123".parse().unwrap());
        Arc::new(RequestContext::new(Method::GET, uri.parse().unwrap(), headers))
    }

    fn store_with(config: VortexConfig) -> ConfigStore {
        let store = ConfigStore::with_env(|_| None);
        store.configure(config).unwrap();
        store
    }

    #[test]
    fn test_query_param_decoding() {
        let req = request("/invitations?targetType=email&targetValue=a%40b.com&targetValue=other");
        assert_eq!(req.query_param("targetType").as_deref(), Some("email"));
        assert_eq!(req.query_param("targetValue").as_deref(), Some("a@b.com"));
        assert_eq!(req.query_param("missing"), None);
        assert_eq!(request("/invitations").query_param("targetType"), None);
    }

    #[test]
    fn test_bearer_token() {
        let req = request("/jwt");
        assert_eq!(req.bearer_token(), Some("session-123"));

        let bare = RequestContext::new(Method::POST, "/jwt".parse().unwrap(), HeaderMap::new());
        assert_eq!(bare.bearer_token(), None);
    }

    #[tokio::test]
    async fn test_no_hook_means_no_user() {
        let store = store_with(VortexConfig::new("key"));
        let user = authenticate_request(&store, &request("/")).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_hook_sees_request() {
        let store = store_with(VortexConfig::new("key").authenticate_user(|req| async move {
            Ok(req
                .bearer_token()
                .map(|token| AuthenticatedUser::new(format!("user-for-{}", token))))
        }));

        let user = authenticate_request(&store, &request("/")).await.unwrap();
        assert_eq!(user.unwrap().user_id.as_str(), "user-for-session-123");
    }

    #[tokio::test]
    async fn test_hook_failure_degrades_to_no_user() {
        let store = store_with(
            VortexConfig::new("key")
                .authenticate_user(|_req| async { Err(anyhow::anyhow!("session store down")) }),
        );

        let user = authenticate_request(&store, &request("/")).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_store_fails() {
        let store = ConfigStore::with_env(|_| None);
        let result = authenticate_request(&store, &request("/")).await;
        assert!(matches!(result, Err(ConfigError::NotConfigured)));
    }
}
