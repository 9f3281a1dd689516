use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Operator inbox every notification goes to.
    pub to_email: String,
    pub from_name: String,
    /// Fallback for the `noreply@` sender domain when a request has no usable `Host`.
    pub site_host: String,
    /// Browser origin allowed to read relay responses with its session cookie.
    /// Unset allows any origin, without credentials.
    pub allowed_origin: Option<HeaderValue>,
    pub max_submissions: usize,
    pub window: Duration,
    pub redis_url: Option<String>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            to_email: "owner@example.com".to_string(),
            from_name: "Portfolio Website".to_string(),
            site_host: "localhost".to_string(),
            allowed_origin: None,
            max_submissions: 3,
            window: Duration::from_secs(60 * 60),
            redis_url: None,
            smtp: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: try_load("SMTP_PORT", "25")?,
                user: var("SMTP_USER"),
                password: read_secret("SMTP_PASSWORD"),
            }),
            None => {
                info!("SMTP_HOST not set, delivering through sendmail");
                None
            }
        };

        let allowed_origin = var("CONTACT_ALLOWED_ORIGIN")
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| {
                        format!("Environment misconfigured: CONTACT_ALLOWED_ORIGIN={origin}")
                    })
            })
            .transpose()?;

        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            to_email: try_load("CONTACT_TO_EMAIL", "owner@example.com")?,
            from_name: try_load("CONTACT_FROM_NAME", "Portfolio Website")?,
            site_host: try_load("CONTACT_SITE_HOST", "localhost")?,
            allowed_origin,
            max_submissions: try_load("RATE_LIMIT_MAX", "3")?,
            window: Duration::from_secs(try_load("RATE_LIMIT_WINDOW_SECS", "3600")?),
            redis_url: var("REDIS_URL"),
            smtp,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("Environment misconfigured: {key}={raw}: {e}")
    })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .with_context(|| format!("reading {path}"))
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e:#}");
        })
        .ok()
}
