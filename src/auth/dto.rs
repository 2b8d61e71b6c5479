use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Profile, User};
use crate::billing::dto::SubscriptionView;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Request body for login. `login` is a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Signup response: tokens plus where to complete payment.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    #[serde(flatten)]
    pub auth: AuthResponse,
    pub checkout_url: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub is_paid_member: bool,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            is_paid_member: u.is_paid_member,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MyPageResponse {
    pub user: PublicUser,
    pub subscription: Option<SubscriptionView>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_paid_member: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub paid_member_since: Option<OffsetDateTime>,
    pub username_kana: String,
    pub postal_code: String,
    pub address: String,
    pub phone_number: String,
    pub birthday: Option<Date>,
    pub job: String,
}

impl ProfileResponse {
    pub fn new(user: User, profile: Profile) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_paid_member: user.is_paid_member,
            paid_member_since: user.paid_member_since,
            username_kana: profile.username_kana,
            postal_code: profile.postal_code,
            address: profile.address,
            phone_number: profile.phone_number,
            birthday: profile.birthday,
            job: profile.job,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileEditRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub username_kana: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub birthday: Option<Date>,
    #[serde(default)]
    pub job: String,
}
