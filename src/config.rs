use crate::types::{GlamrError, Result};
use std::env;

/// Runtime configuration, built once from the environment in `main` and
/// passed into each component at construction. Nothing reads the environment
/// after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub user_agent: String,
    /// The directory's own fediverse account, substituted into webfinger
    /// subscribe templates, e.g. `glamr@ausglam.space`.
    pub service_account: String,
    pub from_email: String,
    pub status_api: Option<StatusApiConfig>,
}

#[derive(Debug, Clone)]
pub struct StatusApiConfig {
    pub base_url: String,
    pub access_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| GlamrError::Config("DATABASE_URL is not set".to_string()))?;

        let user_agent =
            env::var("GLAMR_USER_AGENT").unwrap_or_else(|_| "glamr-ingest/0.1".to_string());
        let service_account =
            env::var("GLAMR_SERVICE_ACCOUNT").unwrap_or_else(|_| "glamr@ausglam.space".to_string());
        let from_email =
            env::var("GLAMR_FROM_EMAIL").unwrap_or_else(|_| "noreply@ausglam.space".to_string());

        let status_api = match (env::var("STATUS_API_URL"), env::var("STATUS_ACCESS_TOKEN")) {
            (Ok(base_url), Ok(access_token)) => Some(StatusApiConfig {
                base_url,
                access_token,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            user_agent,
            service_account,
            from_email,
            status_api,
        })
    }

    /// The status API config, or a fatal configuration error for invocations
    /// that cannot run without it.
    pub fn require_status_api(&self) -> Result<&StatusApiConfig> {
        self.status_api.as_ref().ok_or_else(|| {
            GlamrError::Config(
                "STATUS_API_URL and STATUS_ACCESS_TOKEN must be set to publish announcements"
                    .to_string(),
            )
        })
    }
}
