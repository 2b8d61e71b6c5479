use std::str::FromStr;

use async_trait::async_trait;
use stripe::{
    CancelSubscription, CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCustomer, CreateSubscription, CreateSubscriptionItems,
    Customer, CustomerId, ErrorType, PaymentSourceParams, StripeError, Subscription,
    SubscriptionId, TokenId,
};
use tracing::{debug, instrument};

use crate::config::StripeConfig;

/// Failure classes the rest of the app distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider understood the request and refused it.
    #[error("{0}")]
    Rejected(String),
    /// Transport failures, malformed responses and anything else.
    #[error("unexpected payment provider failure: {0}")]
    Unexpected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLink {
    pub session_id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_customer(
        &self,
        email: &str,
        card_token: &str,
        name: Option<&str>,
    ) -> Result<String, ProviderError>;
    /// Subscribes the customer to the configured price.
    async fn create_subscription(&self, customer_id: &str) -> Result<String, ProviderError>;
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), ProviderError>;
    async fn create_checkout_session(
        &self,
        customer_email: Option<&str>,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutLink, ProviderError>;
}

impl From<StripeError> for ProviderError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::Stripe(req)
                if matches!(req.error_type, ErrorType::InvalidRequest | ErrorType::Card) =>
            {
                let msg = req
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("request rejected ({})", req.http_status));
                ProviderError::Rejected(msg)
            }
            other => ProviderError::Unexpected(other.to_string()),
        }
    }
}

pub struct StripeProvider {
    client: Client,
    price_id: String,
}

impl StripeProvider {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(config.secret_key.clone()),
            price_id: config.price_id.clone(),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self, card_token))]
    async fn create_customer(
        &self,
        email: &str,
        card_token: &str,
        name: Option<&str>,
    ) -> Result<String, ProviderError> {
        let token = TokenId::from_str(card_token)
            .map_err(|_| ProviderError::Rejected("Invalid card token".into()))?;
        let mut params = CreateCustomer::new();
        params.email = Some(email);
        params.name = name;
        params.source = Some(PaymentSourceParams::Token(token));
        let customer = Customer::create(&self.client, params).await?;
        debug!(customer_id = %customer.id, "stripe customer created");
        Ok(customer.id.to_string())
    }

    #[instrument(skip(self))]
    async fn create_subscription(&self, customer_id: &str) -> Result<String, ProviderError> {
        let customer = CustomerId::from_str(customer_id)
            .map_err(|_| ProviderError::Unexpected(format!("malformed customer id {customer_id}")))?;
        let mut params = CreateSubscription::new(customer);
        params.items = Some(vec![CreateSubscriptionItems {
            price: Some(self.price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]);
        let subscription = Subscription::create(&self.client, params).await?;
        debug!(subscription_id = %subscription.id, "stripe subscription created");
        Ok(subscription.id.to_string())
    }

    #[instrument(skip(self))]
    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        let id = SubscriptionId::from_str(subscription_id)
            .map_err(|_| ProviderError::Rejected(format!("No such subscription: '{subscription_id}'")))?;
        Subscription::cancel(&self.client, &id, CancelSubscription::default()).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_checkout_session(
        &self,
        customer_email: Option<&str>,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutLink, ProviderError> {
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Subscription);
        params.customer_email = customer_email;
        params.success_url = Some(success_url);
        params.cancel_url = Some(cancel_url);
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(self.price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]);
        let session = CheckoutSession::create(&self.client, params).await?;
        Ok(CheckoutLink {
            session_id: session.id.to_string(),
            url: session.url,
        })
    }
}
