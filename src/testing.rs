// Test doubles shared by the unit and router tests.

use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use serde_json::{Value, json};

use crate::api::VortexState;
use crate::auth::JwtPayload;
use crate::client::{ApiFuture, ClientFactory, VortexApi};
use crate::config::ResolvedConfig;
use crate::model::{
    AcceptTarget, AutojoinDomain, AutojoinDomains, ConfigureAutojoinRequest, Invitation,
    TargetType,
};
use crate::store::ConfigStore;
use crate::types::{GroupId, GroupType, InvitationId};

/// In-memory `VortexApi` that records every call and answers with canned data.
#[derive(Default)]
pub struct StubVortex {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl StubVortex {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A stub whose network operations all fail.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            bail!("upstream returned 502 Bad Gateway");
        }
        Ok(())
    }

    /// Client factory that always hands out this stub.
    pub fn factory(self: &Arc<Self>) -> ClientFactory {
        let stub = self.clone();
        Arc::new(move |_config: &ResolvedConfig| -> Result<Arc<dyn VortexApi>> {
            Ok(stub.clone())
        })
    }
}

/// Router state over an isolated store, with no environment fallback.
pub fn stub_state(stub: &Arc<StubVortex>) -> (Arc<ConfigStore>, VortexState) {
    let store = Arc::new(ConfigStore::with_env(|_| None));
    let state = VortexState::with_client_factory(store.clone(), stub.factory());
    (store, state)
}

impl VortexApi for StubVortex {
    fn get_invitations_by_target(
        &self,
        target_type: TargetType,
        target_value: String,
    ) -> ApiFuture<'_, Vec<Invitation>> {
        Box::pin(async move {
            self.record(format!("get_invitations_by_target:{}:{}", target_type, target_value))?;
            Ok(vec![
                Invitation::new("inv_1")
                    .with_field("target", json!({"type": target_type, "value": target_value})),
            ])
        })
    }

    fn get_invitation(&self, invitation_id: InvitationId) -> ApiFuture<'_, Invitation> {
        Box::pin(async move {
            self.record(format!("get_invitation:{}", invitation_id))?;
            Ok(Invitation::new(invitation_id).with_field("status", json!("delivered")))
        })
    }

    fn revoke_invitation(&self, invitation_id: InvitationId) -> ApiFuture<'_, ()> {
        Box::pin(async move { self.record(format!("revoke_invitation:{}", invitation_id)) })
    }

    fn accept_invitations(
        &self,
        invitation_ids: Vec<InvitationId>,
        target: AcceptTarget,
    ) -> ApiFuture<'_, Value> {
        Box::pin(async move {
            let ids: Vec<&str> = invitation_ids.iter().map(InvitationId::as_str).collect();
            self.record(format!("accept_invitations:{}", ids.join(",")))?;
            Ok(json!({"accepted": ids, "target": target}))
        })
    }

    fn get_invitations_by_group(
        &self,
        group_type: GroupType,
        group_id: GroupId,
    ) -> ApiFuture<'_, Vec<Invitation>> {
        Box::pin(async move {
            self.record(format!("get_invitations_by_group:{}:{}", group_type, group_id))?;
            Ok(vec![Invitation::new("inv_g1"), Invitation::new("inv_g2")])
        })
    }

    fn delete_invitations_by_group(
        &self,
        group_type: GroupType,
        group_id: GroupId,
    ) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            self.record(format!("delete_invitations_by_group:{}:{}", group_type, group_id))
        })
    }

    fn reinvite(&self, invitation_id: InvitationId) -> ApiFuture<'_, Invitation> {
        Box::pin(async move {
            self.record(format!("reinvite:{}", invitation_id))?;
            Ok(Invitation::new(invitation_id).with_field("status", json!("queued")))
        })
    }

    fn generate_jwt(&self, payload: &JwtPayload) -> Result<String> {
        self.record(format!("generate_jwt:{}", payload.user_id))?;
        Ok(format!(
            "jwt-for-{}:{}",
            payload.user_id,
            serde_json::to_string(&payload.attributes)?
        ))
    }

    fn get_autojoin_domains(
        &self,
        scope_type: String,
        scope: String,
    ) -> ApiFuture<'_, AutojoinDomains> {
        Box::pin(async move {
            self.record(format!("get_autojoin_domains:{}:{}", scope_type, scope))?;
            Ok(AutojoinDomains {
                autojoin_domains: vec![AutojoinDomain {
                    id: "ad_1".to_string(),
                    domain: "acme.com".to_string(),
                }],
                invitation: None,
            })
        })
    }

    fn configure_autojoin(
        &self,
        request: ConfigureAutojoinRequest,
    ) -> ApiFuture<'_, AutojoinDomains> {
        Box::pin(async move {
            self.record(format!(
                "configure_autojoin:{}:{}:{}",
                request.scope_type,
                request.scope,
                request.domains.join(",")
            ))?;
            Ok(AutojoinDomains {
                autojoin_domains: request
                    .domains
                    .iter()
                    .enumerate()
                    .map(|(i, domain)| AutojoinDomain {
                        id: format!("ad_{}", i + 1),
                        domain: domain.clone(),
                    })
                    .collect(),
                invitation: None,
            })
        })
    }
}
