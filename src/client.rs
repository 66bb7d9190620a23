//! Client for the hosted Vortex API.
//!
//! Handlers talk to the API through the [`VortexApi`] trait so tests can swap
//! in a stub. [`VortexClient`] is the real implementation: JSON over HTTPS
//! under `/api/v1/`, authenticated with the `x-api-key` header.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::auth::{JwtPayload, sign_jwt};
use crate::config::ResolvedConfig;
use crate::model::{
    AcceptTarget, AutojoinDomains, ConfigureAutojoinRequest, Invitation, TargetType,
};
use crate::types::{GroupId, GroupType, InvitationId};

/// Request timeout of the default HTTP client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const API_KEY_HEADER: &str = "x-api-key";

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Operations of the Vortex API used by the adapter.
pub trait VortexApi: Send + Sync {
    fn get_invitations_by_target(
        &self,
        target_type: TargetType,
        target_value: String,
    ) -> ApiFuture<'_, Vec<Invitation>>;

    fn get_invitation(&self, invitation_id: InvitationId) -> ApiFuture<'_, Invitation>;

    fn revoke_invitation(&self, invitation_id: InvitationId) -> ApiFuture<'_, ()>;

    /// Accept invitations on behalf of a user. The result is returned as-is.
    fn accept_invitations(
        &self,
        invitation_ids: Vec<InvitationId>,
        target: AcceptTarget,
    ) -> ApiFuture<'_, Value>;

    fn get_invitations_by_group(
        &self,
        group_type: GroupType,
        group_id: GroupId,
    ) -> ApiFuture<'_, Vec<Invitation>>;

    fn delete_invitations_by_group(
        &self,
        group_type: GroupType,
        group_id: GroupId,
    ) -> ApiFuture<'_, ()>;

    fn reinvite(&self, invitation_id: InvitationId) -> ApiFuture<'_, Invitation>;

    /// Sign a widget JWT. Local operation, no network call.
    fn generate_jwt(&self, payload: &JwtPayload) -> Result<String>;

    fn get_autojoin_domains(&self, scope_type: String, scope: String)
    -> ApiFuture<'_, AutojoinDomains>;

    fn configure_autojoin(&self, request: ConfigureAutojoinRequest)
    -> ApiFuture<'_, AutojoinDomains>;
}

/// Builds an API client for a resolved configuration.
pub type ClientFactory = Arc<dyn Fn(&ResolvedConfig) -> Result<Arc<dyn VortexApi>> + Send + Sync>;

#[derive(Deserialize)]
struct InvitationList {
    #[serde(default)]
    invitations: Vec<Invitation>,
}

/// HTTP implementation of [`VortexApi`].
#[derive(Clone)]
pub struct VortexClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl VortexClient {
    /// Create a client with its own HTTP connection pool.
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        Self::with_http(build_http_client()?, api_key, base_url)
    }

    /// Create a client on top of an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid Vortex API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("Invalid Vortex API base URL: {}", base_url);
        }

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Factory creating one client per request while sharing a single
    /// connection pool.
    pub fn factory() -> Result<ClientFactory> {
        let http = build_http_client()?;
        Ok(Arc::new(
            move |config: &ResolvedConfig| -> Result<Arc<dyn VortexApi>> {
                let client =
                    VortexClient::with_http(http.clone(), config.api_key.clone(), config.base_url())?;
                Ok(Arc::new(client))
            },
        ))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid Vortex API base URL: {}", self.base_url))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("Vortex API {} {}", method, url.path());
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.context("Vortex API request failed")?;
        let status = response.status();

        if !status.is_success() {
            let url = response.url().path().to_string();
            let body = response.text().await.unwrap_or_default();
            bail!("Vortex API {} returned {}: {}", url, status, body);
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .context("Invalid response from Vortex API")
    }
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

impl VortexApi for VortexClient {
    fn get_invitations_by_target(
        &self,
        target_type: TargetType,
        target_value: String,
    ) -> ApiFuture<'_, Vec<Invitation>> {
        Box::pin(async move {
            let mut url = self.endpoint(&["invitations"])?;
            url.query_pairs_mut()
                .append_pair("targetType", target_type.as_str())
                .append_pair("targetValue", &target_value);

            let list: InvitationList = self.send_json(self.request(Method::GET, url)).await?;
            Ok(list.invitations)
        })
    }

    fn get_invitation(&self, invitation_id: InvitationId) -> ApiFuture<'_, Invitation> {
        Box::pin(async move {
            let url = self.endpoint(&["invitations", invitation_id.as_str()])?;
            self.send_json(self.request(Method::GET, url)).await
        })
    }

    fn revoke_invitation(&self, invitation_id: InvitationId) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["invitations", invitation_id.as_str()])?;
            self.send(self.request(Method::DELETE, url)).await?;
            Ok(())
        })
    }

    fn accept_invitations(
        &self,
        invitation_ids: Vec<InvitationId>,
        target: AcceptTarget,
    ) -> ApiFuture<'_, Value> {
        Box::pin(async move {
            let url = self.endpoint(&["invitations", "accept"])?;
            let body = match &target {
                AcceptTarget::User(user) => json!({"invitationIds": invitation_ids, "user": user}),
                AcceptTarget::Legacy(legacy) => {
                    json!({"invitationIds": invitation_ids, "target": legacy})
                }
            };
            self.send_json(self.request(Method::POST, url).json(&body)).await
        })
    }

    fn get_invitations_by_group(
        &self,
        group_type: GroupType,
        group_id: GroupId,
    ) -> ApiFuture<'_, Vec<Invitation>> {
        Box::pin(async move {
            let url = self.endpoint(&[
                "invitations",
                "by-group",
                group_type.as_str(),
                group_id.as_str(),
            ])?;
            let list: InvitationList = self.send_json(self.request(Method::GET, url)).await?;
            Ok(list.invitations)
        })
    }

    fn delete_invitations_by_group(
        &self,
        group_type: GroupType,
        group_id: GroupId,
    ) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            let url = self.endpoint(&[
                "invitations",
                "by-group",
                group_type.as_str(),
                group_id.as_str(),
            ])?;
            self.send(self.request(Method::DELETE, url)).await?;
            Ok(())
        })
    }

    fn reinvite(&self, invitation_id: InvitationId) -> ApiFuture<'_, Invitation> {
        Box::pin(async move {
            let url = self.endpoint(&["invitations", invitation_id.as_str(), "reinvite"])?;
            self.send_json(self.request(Method::POST, url)).await
        })
    }

    fn generate_jwt(&self, payload: &JwtPayload) -> Result<String> {
        sign_jwt(&self.api_key, payload)
    }

    fn get_autojoin_domains(
        &self,
        scope_type: String,
        scope: String,
    ) -> ApiFuture<'_, AutojoinDomains> {
        Box::pin(async move {
            let url = self.endpoint(&["autojoin", scope_type.as_str(), scope.as_str()])?;
            self.send_json(self.request(Method::GET, url)).await
        })
    }

    fn configure_autojoin(
        &self,
        request: ConfigureAutojoinRequest,
    ) -> ApiFuture<'_, AutojoinDomains> {
        Box::pin(async move {
            let url = self.endpoint(&["autojoin"])?;
            self.send_json(self.request(Method::POST, url).json(&request))
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};

    #[test]
    fn test_endpoint_joins_base_path() {
        let client = VortexClient::new("k", "https://api.vortex.test").unwrap();
        assert_eq!(
            client.endpoint(&["invitations", "inv_1"]).unwrap().as_str(),
            "https://api.vortex.test/api/v1/invitations/inv_1"
        );

        let prefixed = VortexClient::new("k", "https://gateway.test/vortex/").unwrap();
        assert_eq!(
            prefixed.endpoint(&["invitations"]).unwrap().as_str(),
            "https://gateway.test/vortex/api/v1/invitations"
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = VortexClient::new("k", "https://api.vortex.test").unwrap();
        let url = client
            .endpoint(&["invitations", "by-group", "team space", "a/b"])
            .unwrap();
        assert_eq!(url.path(), "/api/v1/invitations/by-group/team%20space/a%2Fb");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(VortexClient::new("k", "not a url").is_err());
        assert!(VortexClient::new("k", "mailto:team@vortex.test").is_err());
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_client_sends_api_key_and_parses_invitation() {
        let router = Router::new().route(
            "/api/v1/invitations/{id}",
            get(|Path(id): Path<String>, headers: HeaderMap| async move {
                if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("secret") {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Ok(Json(json!({"id": id, "status": "delivered"})))
            }),
        );
        let base = serve(router).await;

        let client = VortexClient::new("secret", &base).unwrap();
        let invitation = client.get_invitation(InvitationId::new("inv_7")).await.unwrap();
        assert_eq!(invitation.id.as_str(), "inv_7");
        assert_eq!(invitation.fields.get("status"), Some(&json!("delivered")));

        let wrong_key = VortexClient::new("other", &base).unwrap();
        let err = wrong_key.get_invitation(InvitationId::new("inv_7")).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_client_queries_by_target() {
        let router = Router::new().route(
            "/api/v1/invitations",
            get(|uri: axum::http::Uri| async move {
                Json(json!({"invitations": [{"id": "inv_1", "query": uri.query()}]}))
            }),
        );
        let base = serve(router).await;

        let client = VortexClient::new("k", &base).unwrap();
        let invitations = client
            .get_invitations_by_target(TargetType::Email, "a@b.com".to_string())
            .await
            .unwrap();

        assert_eq!(invitations.len(), 1);
        assert_eq!(
            invitations[0].fields.get("query"),
            Some(&json!("targetType=email&targetValue=a%40b.com"))
        );
    }
}
