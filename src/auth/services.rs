use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{AuthResponse, ProfileEditRequest, SignupRequest},
    jwt::JwtKeys,
    password::{check_new_password, hash_password, verify_password},
    repo::AccountStore,
    repo_types::{NewAccount, User},
};
use crate::{
    billing::{provider::PaymentProvider, services::start_checkout},
    config::AppConfig,
    error::{is_unique_violation, AppError},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= 254 && EMAIL_RE.is_match(email)
}

/// Letters, digits and `@ . + - _`, at most 150 characters.
pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]{1,150}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

fn validate_identity(username: &str, email: &str) -> Result<(), AppError> {
    if !is_valid_username(username) {
        return Err(AppError::validation("Invalid username"));
    }
    if !is_valid_email(email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(())
}

pub fn issue_tokens(keys: &JwtKeys, user: User) -> anyhow::Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: user.into(),
    })
}

/// Register a user, then start a checkout session for the paid plan.
///
/// The account, its profile and an inactive subscription placeholder are
/// written atomically. Checkout is best effort: if the provider call fails the
/// account still exists and no checkout URL is returned.
pub async fn signup<S>(
    store: &S,
    provider: &dyn PaymentProvider,
    config: &AppConfig,
    mut req: SignupRequest,
) -> Result<(User, Option<String>), AppError>
where
    S: AccountStore + ?Sized,
{
    req.email = req.email.trim().to_lowercase();
    req.username = req.username.trim().to_string();

    validate_identity(&req.username, &req.email)?;
    check_new_password(&req.password1, &req.password2)?;

    if store.find_user_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }
    if store.find_user_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let account = NewAccount {
        email: req.email,
        username: req.username,
        password_hash: hash_password(&req.password1)?,
    };
    let user = match store.create_account(&account).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict("Email or username already registered".into()))
        }
        Err(e) => return Err(e.into()),
    };
    info!(user_id = %user.id, username = %user.username, "user signed up");

    let checkout_url = match start_checkout(provider, config, Some(&user.email)).await {
        Ok(link) => link.url,
        Err(e) => {
            warn!(error = %e, user_id = %user.id, "checkout session after signup failed");
            None
        }
    };

    Ok((user, checkout_url))
}

/// Authenticate by username or email.
pub async fn login<S>(store: &S, login: &str, password: &str) -> Result<User, AppError>
where
    S: AccountStore + ?Sized,
{
    let login = login.trim();
    let user = if login.contains('@') {
        store.find_user_by_email(&login.to_lowercase()).await?
    } else {
        store.find_user_by_username(login).await?
    };

    let Some(user) = user else {
        warn!(login = %login, "login unknown user");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

/// Normalise and validate a profile edit in place.
pub fn validate_profile_edit(req: &mut ProfileEditRequest) -> Result<(), AppError> {
    req.email = req.email.trim().to_lowercase();
    req.username = req.username.trim().to_string();
    validate_identity(&req.username, &req.email)?;

    let limits = [
        ("username_kana", &req.username_kana, 20),
        ("postal_code", &req.postal_code, 10),
        ("address", &req.address, 255),
        ("phone_number", &req.phone_number, 15),
        ("job", &req.job, 50),
    ];
    for (field, value, max) in limits {
        if value.chars().count() > max {
            return Err(AppError::validation(format!(
                "{field} must be at most {max} characters"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        billing::{provider::ProviderError, repo::SubscriptionStore},
        state::AppState,
        testing::{FakeProvider, MemoryStore},
    };

    fn signup_request(username: &str, email: &str) -> SignupRequest {
        SignupRequest {
            username: username.into(),
            email: email.into(),
            password1: "miso-nikomi".into(),
            password2: "miso-nikomi".into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("taro@example.jp"));
        assert!(!is_valid_email("taro@example"));
        assert!(!is_valid_email("taro example.jp"));
    }

    #[test]
    fn username_validation() {
        assert!(is_valid_username("taro.yamada+1"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("taro yamada"));
        assert!(!is_valid_username(&"a".repeat(151)));
    }

    #[tokio::test]
    async fn signup_creates_inactive_placeholder_and_checkout() {
        let store = MemoryStore::default();
        let provider = FakeProvider::default();
        let state = AppState::fake();

        let (user, checkout_url) = signup(
            &store,
            &provider,
            &state.config,
            signup_request(" taro ", "Taro@Example.JP"),
        )
        .await
        .unwrap();

        assert_eq!(user.username, "taro");
        assert_eq!(user.email, "taro@example.jp");
        assert!(checkout_url.is_some());

        let sub = store.find_by_user(user.id).await.unwrap().unwrap();
        assert!(!sub.active);
        assert!(sub.stripe_customer_id.is_empty());
        assert!(sub.stripe_subscription_id.is_empty());
        assert!(store.has_profile(user.id));
    }

    #[tokio::test]
    async fn signup_survives_checkout_failure() {
        let store = MemoryStore::default();
        let provider = FakeProvider::failing(ProviderError::Unexpected("timeout".into()));
        let state = AppState::fake();

        let (user, checkout_url) =
            signup(&store, &provider, &state.config, signup_request("hanako", "hanako@example.jp"))
                .await
                .unwrap();
        assert!(checkout_url.is_none());
        assert!(store.find_user(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn signup_rejects_duplicates_and_bad_input() {
        let store = MemoryStore::default();
        let provider = FakeProvider::default();
        let config = AppState::fake().config;

        signup(&store, &provider, &config, signup_request("jiro", "jiro@example.jp"))
            .await
            .unwrap();

        let err = signup(&store, &provider, &config, signup_request("other", "JIRO@example.jp"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = signup(&store, &provider, &config, signup_request("jiro", "new@example.jp"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut mismatch = signup_request("saburo", "saburo@example.jp");
        mismatch.password2 = "something-else".into();
        let err = signup(&store, &provider, &config, mismatch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut short = signup_request("shiro", "shiro@example.jp");
        short.password1 = "short".into();
        short.password2 = "short".into();
        let err = signup(&store, &provider, &config, short).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn login_by_username_or_email() {
        let store = MemoryStore::default();
        let provider = FakeProvider::default();
        let config = AppState::fake().config;
        let (user, _) = signup(&store, &provider, &config, signup_request("goro", "goro@example.jp"))
            .await
            .unwrap();

        let by_name = login(&store, "goro", "miso-nikomi").await.unwrap();
        assert_eq!(by_name.id, user.id);
        let by_email = login(&store, "GORO@example.jp", "miso-nikomi").await.unwrap();
        assert_eq!(by_email.id, user.id);

        let err = login(&store, "goro", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = login(&store, "nobody", "miso-nikomi").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn profile_edit_limits() {
        let mut req = ProfileEditRequest {
            username: "taro".into(),
            email: "TARO@example.jp".into(),
            username_kana: "タロウ".into(),
            postal_code: "460-0008".into(),
            address: "名古屋市中区栄".into(),
            phone_number: "052-000-0000".into(),
            birthday: None,
            job: "engineer".into(),
        };
        validate_profile_edit(&mut req).unwrap();
        assert_eq!(req.email, "taro@example.jp");

        req.postal_code = "12345678901".into();
        let err = validate_profile_edit(&mut req).unwrap_err();
        assert!(err.to_string().contains("postal_code"));
    }
}
