//! Access-control gate consulted before every invitation operation.
//!
//! An [`AccessPolicy`] holds one optional hook per protected surface. All
//! handlers go through [`authorize`], which applies the same rule everywhere:
//!
//! - a registered hook decides (`false` denies, an error propagates)
//! - without a hook, any authenticated user is let through
//!
//! The fallback is a permissive default meant for getting started; real
//! deployments should register hooks for the surfaces they expose.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::auth::{AuthenticatedUser, RequestContext};
use crate::config::HookFuture;
use crate::model::{AcceptUser, LegacyTarget};
use crate::types::{GroupId, GroupType, InvitationId};

/// Single invitation addressed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResource {
    pub invitation_id: InvitationId,
}

/// Invitations being accepted and who accepts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationTargetResource {
    pub invitation_ids: Vec<InvitationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<LegacyTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AcceptUser>,
}

/// Group scoping a set of invitations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResource {
    pub group_type: GroupType,
    pub group_id: GroupId,
}

/// Access hook for a resource type `R`.
pub type AccessHook<R> =
    Arc<dyn Fn(Arc<RequestContext>, Option<AuthenticatedUser>, R) -> HookFuture<bool> + Send + Sync>;

fn boxed_hook<R, F, Fut>(hook: F) -> AccessHook<R>
where
    R: 'static,
    F: Fn(Arc<RequestContext>, Option<AuthenticatedUser>, R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool>> + Send + 'static,
{
    Arc::new(move |request, user, resource| -> HookFuture<bool> {
        Box::pin(hook(request, user, resource))
    })
}

/// An operation guarded by the gate, together with its resource descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protected {
    InvitationsByTarget,
    Invitation(InvitationResource),
    DeleteInvitation(InvitationResource),
    AcceptInvitations(InvitationTargetResource),
    InvitationsByGroup(GroupResource),
    DeleteInvitationsByGroup(GroupResource),
    Reinvite(InvitationResource),
}

impl Protected {
    /// Name of the hook that guards this operation.
    pub fn hook_name(&self) -> &'static str {
        match self {
            Self::InvitationsByTarget => "can_access_invitations_by_target",
            Self::Invitation(_) => "can_access_invitation",
            Self::DeleteInvitation(_) => "can_delete_invitation",
            Self::AcceptInvitations(_) => "can_accept_invitations",
            Self::InvitationsByGroup(_) => "can_access_invitations_by_group",
            Self::DeleteInvitationsByGroup(_) => "can_delete_invitations_by_group",
            Self::Reinvite(_) => "can_reinvite",
        }
    }
}

/// Outcome of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The hook allowed the request, or no hook is registered and a user was
    /// resolved.
    Granted,
    /// The registered hook returned `false`.
    Denied,
    /// No hook is registered and no user was resolved.
    MissingUser,
}

/// Per-surface access hooks. Every hook is optional.
#[derive(Clone, Default)]
pub struct AccessPolicy {
    invitations_by_target: Option<AccessHook<()>>,
    invitation: Option<AccessHook<InvitationResource>>,
    delete_invitation: Option<AccessHook<InvitationResource>>,
    accept_invitations: Option<AccessHook<InvitationTargetResource>>,
    invitations_by_group: Option<AccessHook<GroupResource>>,
    delete_invitations_by_group: Option<AccessHook<GroupResource>>,
    reinvite: Option<AccessHook<InvitationResource>>,
}

impl AccessPolicy {
    /// A policy with no hooks: every surface requires an authenticated user.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy whose hooks allow every operation.
    ///
    /// Useful for demos, development, or when authorization happens
    /// elsewhere (e.g. in a middleware in front of the router).
    pub fn allow_all() -> Self {
        Self::new()
            .can_access_invitations_by_target(|_, _| async { Ok(true) })
            .can_access_invitation(|_, _, _| async { Ok(true) })
            .can_delete_invitation(|_, _, _| async { Ok(true) })
            .can_accept_invitations(|_, _, _| async { Ok(true) })
            .can_access_invitations_by_group(|_, _, _| async { Ok(true) })
            .can_delete_invitations_by_group(|_, _, _| async { Ok(true) })
            .can_reinvite(|_, _, _| async { Ok(true) })
    }

    pub fn can_access_invitations_by_target<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Option<AuthenticatedUser>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.invitations_by_target = Some(boxed_hook(move |request, user, ()| hook(request, user)));
        self
    }

    pub fn can_access_invitation<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Option<AuthenticatedUser>, InvitationResource) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.invitation = Some(boxed_hook(hook));
        self
    }

    pub fn can_delete_invitation<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Option<AuthenticatedUser>, InvitationResource) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.delete_invitation = Some(boxed_hook(hook));
        self
    }

    pub fn can_accept_invitations<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Option<AuthenticatedUser>, InvitationTargetResource) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.accept_invitations = Some(boxed_hook(hook));
        self
    }

    pub fn can_access_invitations_by_group<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Option<AuthenticatedUser>, GroupResource) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.invitations_by_group = Some(boxed_hook(hook));
        self
    }

    pub fn can_delete_invitations_by_group<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Option<AuthenticatedUser>, GroupResource) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.delete_invitations_by_group = Some(boxed_hook(hook));
        self
    }

    pub fn can_reinvite<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<RequestContext>, Option<AuthenticatedUser>, InvitationResource) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.reinvite = Some(boxed_hook(hook));
        self
    }

    /// Number of registered hooks.
    pub fn hook_count(&self) -> usize {
        [
            self.invitations_by_target.is_some(),
            self.invitation.is_some(),
            self.delete_invitation.is_some(),
            self.accept_invitations.is_some(),
            self.invitations_by_group.is_some(),
            self.delete_invitations_by_group.is_some(),
            self.reinvite.is_some(),
        ]
        .into_iter()
        .filter(|registered| *registered)
        .count()
    }

    /// Start the registered hook for an operation, if any.
    fn check(
        &self,
        request: Arc<RequestContext>,
        user: Option<AuthenticatedUser>,
        operation: Protected,
    ) -> Option<HookFuture<bool>> {
        match operation {
            Protected::InvitationsByTarget => self
                .invitations_by_target
                .as_ref()
                .map(|hook| hook(request, user, ())),
            Protected::Invitation(resource) => {
                self.invitation.as_ref().map(|hook| hook(request, user, resource))
            }
            Protected::DeleteInvitation(resource) => self
                .delete_invitation
                .as_ref()
                .map(|hook| hook(request, user, resource)),
            Protected::AcceptInvitations(resource) => self
                .accept_invitations
                .as_ref()
                .map(|hook| hook(request, user, resource)),
            Protected::InvitationsByGroup(resource) => self
                .invitations_by_group
                .as_ref()
                .map(|hook| hook(request, user, resource)),
            Protected::DeleteInvitationsByGroup(resource) => self
                .delete_invitations_by_group
                .as_ref()
                .map(|hook| hook(request, user, resource)),
            Protected::Reinvite(resource) => {
                self.reinvite.as_ref().map(|hook| hook(request, user, resource))
            }
        }
    }
}

impl fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPolicy")
            .field("hooks", &self.hook_count())
            .finish()
    }
}

/// Decide whether a request may perform an operation.
///
/// Hook errors are returned as errors rather than treated as a denial, so a
/// broken policy surfaces as a server error instead of a silent 403.
pub async fn authorize(
    policy: &AccessPolicy,
    request: Arc<RequestContext>,
    user: Option<&AuthenticatedUser>,
    operation: Protected,
) -> Result<AccessDecision> {
    let hook_name = operation.hook_name();

    match policy.check(request, user.cloned(), operation) {
        Some(hook) => {
            let allowed = hook.await?;
            debug!("Access hook {} returned {}", hook_name, allowed);
            Ok(if allowed {
                AccessDecision::Granted
            } else {
                AccessDecision::Denied
            })
        }
        None if user.is_some() => Ok(AccessDecision::Granted),
        None => Ok(AccessDecision::MissingUser),
    }
}
