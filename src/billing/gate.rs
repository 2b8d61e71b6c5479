//! Paid-member access check.
//!
//! Gated operations call [`require_paid_member`] first and receive a
//! [`PaidMember`] token; services that perform paid-only work take that token
//! instead of a bare user id, so they cannot be reached without the check.

use tracing::{debug, warn};
use uuid::Uuid;

use super::{repo::SubscriptionStore, repo_types::Subscription};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("This feature is available to paid members only.")]
    NoSubscription,
    #[error("This feature is available to paid members only.")]
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaidMember {
    user_id: Uuid,
}

impl PaidMember {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

/// The decision itself. An active row never expires on its own.
pub fn check(subscription: Option<&Subscription>) -> Result<PaidMember, AccessDenied> {
    match subscription {
        None => Err(AccessDenied::NoSubscription),
        Some(s) if !s.active => Err(AccessDenied::Inactive),
        Some(s) => Ok(PaidMember { user_id: s.user_id }),
    }
}

pub async fn require_paid_member<S>(store: &S, user_id: Uuid) -> Result<PaidMember, AppError>
where
    S: SubscriptionStore + ?Sized,
{
    let subscription = store.find_by_user(user_id).await?;
    match check(subscription.as_ref()) {
        Ok(member) => {
            debug!(%user_id, "paid member check passed");
            Ok(member)
        }
        Err(denied) => {
            warn!(%user_id, reason = ?denied, "paid-only action refused");
            Err(denied.into())
        }
    }
}
