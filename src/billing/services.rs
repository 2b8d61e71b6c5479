use tracing::{info, warn};
use uuid::Uuid;

use super::{
    gate,
    provider::{CheckoutLink, PaymentProvider, ProviderError},
    repo::SubscriptionStore,
    repo_types::Subscription,
};
use crate::{config::AppConfig, error::AppError};

pub const CHECKOUT_SUCCESS_PATH: &str = "/api/v1/subscription/success";
pub const CHECKOUT_CANCEL_PATH: &str = "/api/v1/subscription/cancel";

/// Open a subscription-mode checkout session on the provider.
pub async fn start_checkout(
    provider: &dyn PaymentProvider,
    config: &AppConfig,
    customer_email: Option<&str>,
) -> Result<CheckoutLink, ProviderError> {
    let success_url = config.absolute_url(CHECKOUT_SUCCESS_PATH);
    let cancel_url = config.absolute_url(CHECKOUT_CANCEL_PATH);
    provider
        .create_checkout_session(customer_email, &success_url, &cancel_url)
        .await
}

/// Register a card with the provider and activate the local record.
///
/// Nothing is written locally unless both provider calls succeed.
pub async fn subscribe<S>(
    store: &S,
    provider: &dyn PaymentProvider,
    user_id: Uuid,
    email: &str,
    card_token: Option<&str>,
    cardholder_name: Option<&str>,
) -> Result<Subscription, AppError>
where
    S: SubscriptionStore + ?Sized,
{
    let token = card_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::validation("Stripe token not provided"))?;

    let existing = store.find_by_user(user_id).await?;
    if gate::check(existing.as_ref()).is_ok() {
        return Err(AppError::Conflict("You already have an active subscription".into()));
    }

    let customer_id = provider
        .create_customer(email, token, cardholder_name)
        .await?;
    let subscription_id = provider.create_subscription(&customer_id).await?;

    let subscription = store
        .activate(user_id, &customer_id, &subscription_id)
        .await?;
    info!(%user_id, %customer_id, %subscription_id, "subscription activated");
    Ok(subscription)
}

/// Cancel at the provider, then deactivate locally. The row and its ids are
/// kept. On any provider failure the local record is left as it was.
pub async fn cancel<S>(
    store: &S,
    provider: &dyn PaymentProvider,
    user_id: Uuid,
) -> Result<Subscription, AppError>
where
    S: SubscriptionStore + ?Sized,
{
    let subscription = store
        .find_by_user(user_id)
        .await?
        .ok_or(AppError::NotFound("subscription"))?;

    if !subscription.has_provider_subscription() {
        return Err(AppError::validation("You have no active subscription to cancel"));
    }
    if !subscription.active {
        return Err(AppError::validation("Your paid membership is already cancelled"));
    }

    if let Err(e) = provider
        .cancel_subscription(&subscription.stripe_subscription_id)
        .await
    {
        warn!(%user_id, error = %e, "provider refused cancellation; local record unchanged");
        return Err(e.into());
    }

    let subscription = store.deactivate(user_id).await?;
    info!(%user_id, subscription_id = %subscription.stripe_subscription_id, "subscription cancelled");
    Ok(subscription)
}
