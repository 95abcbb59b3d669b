// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub accounts_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1".to_string(),
            accounts_url: "https://accounts.spotify.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub credentials: CredentialsConfig,
    pub api: ApiConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Client id and secret, or an error naming whichever is missing.
    pub fn credentials(&self) -> Result<(String, String)> {
        let id = non_empty(self.credentials.client_id.as_deref());
        let secret = non_empty(self.credentials.client_secret.as_deref());

        match (id, secret) {
            (Some(id), Some(secret)) => Ok((id.to_string(), secret.to_string())),
            (None, _) => bail!("missing client id (set CLIENT_ID or AUDIGO_CREDENTIALS__CLIENT_ID)"),
            (_, None) => bail!(
                "missing client secret (set CLIENT_SECRET or AUDIGO_CREDENTIALS__CLIENT_SECRET)"
            ),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Load configuration from defaults, optional TOML file, environment overrides
/// (prefix: AUDIGO_), and finally the plain CLIENT_ID / CLIENT_SECRET variables.
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config: AppConfig = figment(config_path).extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}

fn figment(config_path: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(Env::prefixed("AUDIGO_").split("__"))
        .merge(
            Env::raw()
                .only(&["CLIENT_ID", "CLIENT_SECRET"])
                .map(|key| format!("credentials.{}", key.as_str()).into()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.api.base_url, "https://api.spotify.com/v1");
            assert_eq!(config.api.accounts_url, "https://accounts.spotify.com");
            assert_eq!(config.api.timeout(), Duration::from_secs(30));
            assert_eq!(config.telemetry.log_level, "info");
            assert!(config.credentials().is_err());
            Ok(())
        });
    }

    #[test]
    fn test_plain_client_env_vars() {
        Jail::expect_with(|jail| {
            jail.set_env("CLIENT_ID", "id-from-env");
            jail.set_env("CLIENT_SECRET", "secret-from-env");

            let config = load(None).map_err(|e| e.to_string())?;
            let (id, secret) = config.credentials().map_err(|e| e.to_string())?;
            assert_eq!(id, "id-from-env");
            assert_eq!(secret, "secret-from-env");
            Ok(())
        });
    }

    #[test]
    fn test_toml_then_prefixed_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "audigo.toml",
                r#"
                [credentials]
                client_id = "toml-id"
                client_secret = "toml-secret"

                [api]
                timeout_secs = 5
                "#,
            )?;
            jail.set_env("AUDIGO_TELEMETRY__LOG_LEVEL", "debug");
            jail.set_env("AUDIGO_API__BASE_URL", "http://localhost:9000/v1");

            let config = load(Some(Path::new("audigo.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.api.timeout_secs, 5);
            assert_eq!(config.api.base_url, "http://localhost:9000/v1");
            assert_eq!(config.telemetry.log_level, "debug");
            assert_eq!(config.credentials.client_id.as_deref(), Some("toml-id"));
            Ok(())
        });
    }

    #[test]
    fn test_empty_secret_rejected() {
        let config = AppConfig {
            credentials: CredentialsConfig {
                client_id: Some("id".to_string()),
                client_secret: Some("  ".to_string()),
            },
            ..AppConfig::default()
        };

        let err = config.credentials().unwrap_err();
        assert!(err.to_string().contains("client secret"));
    }
}
