use std::sync::Arc;

use anyhow::Context;

use crate::access::{AccessDecision, Protected, authorize};
use crate::auth::{AuthenticatedUser, RequestContext, authenticate};
use crate::client::{ClientFactory, VortexApi, VortexClient};
use crate::config::ResolvedConfig;
use crate::error::{VortexError, VortexResult};
use crate::store::{ConfigStore, global_store};

/// Shared state of the Vortex routes: where configuration comes from and how
/// API clients are built.
#[derive(Clone)]
pub struct VortexState {
    pub store: Arc<ConfigStore>,
    pub clients: ClientFactory,
}

/// Everything a handler needs once a request has passed the gate.
pub struct Guarded {
    pub config: ResolvedConfig,
    pub user: Option<AuthenticatedUser>,
    pub client: Arc<dyn VortexApi>,
}

impl VortexState {
    /// State over `store` talking to the real Vortex API.
    pub fn new(store: Arc<ConfigStore>) -> anyhow::Result<Self> {
        Ok(Self::with_client_factory(store, VortexClient::factory()?))
    }

    pub fn with_client_factory(store: Arc<ConfigStore>, clients: ClientFactory) -> Self {
        Self { store, clients }
    }

    /// State over the process-wide store.
    pub fn global() -> anyhow::Result<Self> {
        Self::new(global_store())
    }

    pub async fn config(&self) -> VortexResult<ResolvedConfig> {
        Ok(self.store.get_config().await?)
    }

    pub fn client(&self, config: &ResolvedConfig) -> VortexResult<Arc<dyn VortexApi>> {
        Ok((self.clients)(config).context("Failed to create Vortex client")?)
    }

    /// Resolve configuration and user, then run the access gate for `operation`.
    pub async fn guard(
        &self,
        request: &Arc<RequestContext>,
        operation: Protected,
    ) -> VortexResult<Guarded> {
        let config = self.config().await?;
        let user = authenticate(&config, request).await;

        let hook = operation.hook_name();
        let decision = authorize(&config.access, request.clone(), user.as_ref(), operation)
            .await
            .with_context(|| format!("Access hook {} failed", hook))?;

        match decision {
            AccessDecision::Granted => {}
            AccessDecision::Denied => return Err(VortexError::access_denied()),
            AccessDecision::MissingUser => return Err(VortexError::access_requires_user()),
        }

        let client = self.client(&config)?;
        Ok(Guarded {
            config,
            user,
            client,
        })
    }
}
