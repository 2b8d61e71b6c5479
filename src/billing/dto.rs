use serde::{Deserialize, Serialize};

use super::repo_types::Subscription;

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    pub active: bool,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
}

impl From<Subscription> for SubscriptionView {
    fn from(s: Subscription) -> Self {
        Self {
            active: s.active,
            stripe_customer_id: s.stripe_customer_id,
            stripe_subscription_id: s.stripe_subscription_id,
        }
    }
}

/// Subscription and payment-method pages share this shape.
#[derive(Debug, Serialize)]
pub struct SubscriptionPage {
    pub subscription: Option<SubscriptionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
    pub stripe_publishable_key: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionChanged {
    pub status: &'static str,
    pub notice: &'static str,
    pub subscription: SubscriptionView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub public_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Notice {
    pub notice: &'static str,
}
