//! Environment-backed configuration.

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub nats_url: Option<String>,
    /// Host that payment-proof URLs must point at (receipt uploads live on
    /// the store's media account, not arbitrary hosts).
    pub trusted_media_host: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8083".to_string())
            .parse()
            .context("PORT is not a valid port number")?;
        let nats_url = std::env::var("NATS_URL").ok();
        let trusted_media_host =
            std::env::var("TRUSTED_MEDIA_HOST").unwrap_or_else(|_| "cloudinary.com".to_string());

        Ok(Self { database_url, port, nats_url, trusted_media_host })
    }
}
