use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Local mirror of a user's paid membership at the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: i64,
    pub user_id: Uuid,
    pub stripe_customer_id: String,     // empty until the user subscribes
    pub stripe_subscription_id: String, // empty until the user subscribes
    pub active: bool,
}

impl Subscription {
    pub fn has_provider_subscription(&self) -> bool {
        !self.stripe_subscription_id.is_empty()
    }
}
