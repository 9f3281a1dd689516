use axum::{
    body::Bytes,
    http::{
        HeaderMap, HeaderValue,
        header::{CONTENT_TYPE, COOKIE, HOST},
    },
};
use contact::ContactSubmission;
use lettre::Address;
use uuid::Uuid;

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "portfolio_session";

/// The visitor session a submission counts against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Minted for this request, so the response must carry the cookie.
    pub is_new: bool,
}

impl Session {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match session_cookie(headers) {
            Some(id) => Self { id, is_new: false },
            None => Self {
                id: Uuid::new_v4().to_string(),
                is_new: true,
            },
        }
    }

    pub fn set_cookie(&self) -> Option<HeaderValue> {
        if !self.is_new {
            return None;
        }

        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.id
        ))
        .ok()
    }
}

/// Only well-formed UUIDs are honoured, anything else is treated as no session.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

/// JSON bodies are decoded as JSON, everything else as an urlencoded form post.
pub fn get_submission_from_body(
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<ContactSubmission, AppError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_slice(body).map_err(|_| AppError::MalformedPayload)
    } else {
        serde_urlencoded::from_bytes(body).map_err(|_| AppError::MalformedPayload)
    }
}

/// `Host` header without a port, if it is present and readable.
pub fn request_host(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(HOST)?.to_str().ok()?.trim();

    let host = match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    };

    (!host.is_empty()).then(|| host.to_string())
}

/// Domain for the `noreply@` sender. A `Host` that would not make a valid
/// address falls back to the configured site host.
pub fn sender_domain(headers: &HeaderMap, fallback: &str) -> String {
    request_host(headers)
        .filter(|host| Address::new("noreply", host).is_ok())
        .unwrap_or_else(|| fallback.to_string())
}
