//! In-memory stand-ins for the database and the payment provider.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use anyhow::anyhow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::AccountStore,
        repo_types::{NewAccount, User},
    },
    billing::{
        provider::{CheckoutLink, PaymentProvider, ProviderError},
        repo::SubscriptionStore,
        repo_types::Subscription,
    },
    favorites::{repo::FavoriteStore, repo_types::Favorite},
    reservations::{repo::ReservationStore, repo_types::Reservation},
    reviews::{repo::ReviewStore, repo_types::Review},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    profiles: HashSet<Uuid>,
    shops: HashSet<i64>,
    subscriptions: Vec<Subscription>,
    reviews: Vec<Review>,
    favorites: Vec<Favorite>,
    reservations: Vec<Reservation>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn set_paid(&mut self, user_id: Uuid, paid: bool) {
        if let Some(user) = self.users.iter_mut().find(|u| u.id == user_id) {
            user.is_paid_member = paid;
            user.paid_member_since = paid.then(OffsetDateTime::now_utc);
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    /// Same row signup writes: no provider ids, inactive.
    pub fn insert_placeholder(&self, user_id: Uuid) {
        let mut t = self.lock();
        let id = t.next_id();
        t.subscriptions.push(Subscription {
            id,
            user_id,
            stripe_customer_id: String::new(),
            stripe_subscription_id: String::new(),
            active: false,
        });
    }

    pub fn insert_shop(&self, shop_id: i64) {
        self.lock().shops.insert(shop_id);
    }

    pub fn has_profile(&self, user_id: Uuid) -> bool {
        self.lock().profiles.contains(&user_id)
    }

    pub fn is_paid_member(&self, user_id: Uuid) -> bool {
        self.lock()
            .users
            .iter()
            .any(|u| u.id == user_id && u.is_paid_member)
    }

    pub fn review_count(&self) -> usize {
        self.lock().reviews.len()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_account(&self, account: &NewAccount) -> anyhow::Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: account.email.clone(),
            username: account.username.clone(),
            password_hash: account.password_hash.clone(),
            is_paid_member: false,
            paid_member_since: None,
            created_at: OffsetDateTime::now_utc(),
        };
        {
            let mut t = self.lock();
            if t
                .users
                .iter()
                .any(|u| u.email == user.email || u.username == user.username)
            {
                return Err(anyhow!("duplicate account"));
            }
            t.users.push(user.clone());
            t.profiles.insert(user.id);
        }
        self.insert_placeholder(user.id);
        Ok(user)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Subscription>> {
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn activate(
        &self,
        user_id: Uuid,
        customer_id: &str,
        subscription_id: &str,
    ) -> anyhow::Result<Subscription> {
        let mut t = self.lock();
        let row = match t.subscriptions.iter().position(|s| s.user_id == user_id) {
            Some(i) => {
                let s = &mut t.subscriptions[i];
                s.stripe_customer_id = customer_id.into();
                s.stripe_subscription_id = subscription_id.into();
                s.active = true;
                s.clone()
            }
            None => {
                let s = Subscription {
                    id: t.next_id(),
                    user_id,
                    stripe_customer_id: customer_id.into(),
                    stripe_subscription_id: subscription_id.into(),
                    active: true,
                };
                t.subscriptions.push(s.clone());
                s
            }
        };
        t.set_paid(user_id, true);
        Ok(row)
    }

    async fn deactivate(&self, user_id: Uuid) -> anyhow::Result<Subscription> {
        let mut t = self.lock();
        let s = t
            .subscriptions
            .iter_mut()
            .find(|s| s.user_id == user_id)
            .ok_or_else(|| anyhow!("no subscription row"))?;
        s.active = false;
        let row = s.clone();
        t.set_paid(user_id, false);
        Ok(row)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn find_review(&self, id: i64) -> anyhow::Result<Option<Review>> {
        Ok(self.lock().reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn find_review_by_author(
        &self,
        shop_id: i64,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Review>> {
        Ok(self
            .lock()
            .reviews
            .iter()
            .find(|r| r.shop_id == shop_id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_review(
        &self,
        shop_id: i64,
        user_id: Uuid,
        score: i32,
        comment: &str,
    ) -> anyhow::Result<Review> {
        let mut t = self.lock();
        if t
            .reviews
            .iter()
            .any(|r| r.shop_id == shop_id && r.user_id == user_id)
        {
            return Err(anyhow!("duplicate review"));
        }
        let now = OffsetDateTime::now_utc();
        let review = Review {
            id: t.next_id(),
            shop_id,
            user_id,
            score,
            comment: comment.into(),
            created_at: now,
            updated_at: now,
        };
        t.reviews.push(review.clone());
        Ok(review)
    }

    async fn update_review(&self, id: i64, score: i32, comment: &str) -> anyhow::Result<Review> {
        let mut t = self.lock();
        let review = t
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow!("no review {id}"))?;
        review.score = score;
        review.comment = comment.into();
        review.updated_at = OffsetDateTime::now_utc();
        Ok(review.clone())
    }

    async fn delete_review(&self, id: i64) -> anyhow::Result<()> {
        self.lock().reviews.retain(|r| r.id != id);
        Ok(())
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn add_favorite(&self, shop_id: i64, user_id: Uuid) -> anyhow::Result<Favorite> {
        let mut t = self.lock();
        let favorite = Favorite {
            id: t.next_id(),
            shop_id,
            user_id,
        };
        t.favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn remove_favorite(&self, shop_id: i64, user_id: Uuid) -> anyhow::Result<u64> {
        let mut t = self.lock();
        let before = t.favorites.len();
        t.favorites
            .retain(|f| !(f.shop_id == shop_id && f.user_id == user_id));
        Ok((before - t.favorites.len()) as u64)
    }

    async fn is_favorite(&self, shop_id: i64, user_id: Uuid) -> anyhow::Result<bool> {
        Ok(self
            .lock()
            .favorites
            .iter()
            .any(|f| f.shop_id == shop_id && f.user_id == user_id))
    }

    async fn shop_exists(&self, shop_id: i64) -> anyhow::Result<bool> {
        Ok(self.lock().shops.contains(&shop_id))
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn insert_reservation(
        &self,
        shop_id: i64,
        user_id: Uuid,
        date_time: OffsetDateTime,
        num_people: i32,
    ) -> anyhow::Result<Reservation> {
        let mut t = self.lock();
        let reservation = Reservation {
            id: t.next_id(),
            shop_id,
            user_id,
            date_time,
            num_people,
        };
        t.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn find_reservation(&self, id: i64) -> anyhow::Result<Option<Reservation>> {
        Ok(self.lock().reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn delete_reservation(&self, id: i64) -> anyhow::Result<()> {
        self.lock().reservations.retain(|r| r.id != id);
        Ok(())
    }
}

/// Records every call. With `failing`, every call returns that error.
#[derive(Default)]
pub struct FakeProvider {
    fail_with: Option<ProviderError>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn failing(err: ProviderError) -> Self {
        Self {
            fail_with: Some(err),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(call);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_customer(
        &self,
        email: &str,
        _card_token: &str,
        _name: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.record(format!("create_customer:{email}"))?;
        Ok("cus_1".into())
    }

    async fn create_subscription(&self, customer_id: &str) -> Result<String, ProviderError> {
        self.record(format!("create_subscription:{customer_id}"))?;
        Ok("sub_1".into())
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), ProviderError> {
        self.record(format!("cancel_subscription:{subscription_id}"))
    }

    async fn create_checkout_session(
        &self,
        _customer_email: Option<&str>,
        _success_url: &str,
        _cancel_url: &str,
    ) -> Result<CheckoutLink, ProviderError> {
        self.record("create_checkout_session".into())?;
        Ok(CheckoutLink {
            session_id: "cs_test_1".into(),
            url: Some("https://checkout.stripe.test/c/pay/cs_test_1".into()),
        })
    }
}
