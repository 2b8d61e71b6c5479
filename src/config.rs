use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub publishable_key: String,
    pub price_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub stripe: StripeConfig,
    /// Absolute origin used to build checkout success/cancel URLs.
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nagoyameshi".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nagoyameshi-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let stripe = StripeConfig {
            secret_key: std::env::var("STRIPE_SECRET_KEY")?,
            publishable_key: std::env::var("STRIPE_PUBLISHABLE_KEY")?,
            price_id: std::env::var("STRIPE_PRICE_ID")?,
        };
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".into())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            database_url,
            jwt,
            stripe,
            public_base_url,
        })
    }

    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.public_base_url, path)
    }
}
