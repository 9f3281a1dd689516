use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State as AxumState, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use contact::{
    RelayResponse, is_spam, messages,
    ruleset::{self, Ruleset},
};
use tracing::{error, info};

use crate::{
    error::AppError,
    limiter::Decision,
    mail::OutboundMail,
    sanitize::sanitize_submission,
    state::State,
    template,
    utils::{Session, get_submission_from_body, sender_domain},
};

pub async fn contact_handler(
    AxumState(state): AxumState<Arc<State>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let session = Session::from_headers(&headers);

    let mut response = match relay(&state, &session, &headers, body).await {
        Ok(sent) => (StatusCode::OK, Json(sent)).into_response(),
        Err(e) => e.into_response(),
    };

    if let Some(cookie) = session.set_cookie() {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }

    response
}

async fn relay(
    state: &State,
    session: &Session,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<RelayResponse, AppError> {
    let now = state.clock.now();

    let slot = match state.limiter.reserve(&session.id, now).await {
        Decision::Allowed { slot, .. } => slot,
        Decision::Denied { retry_after } => {
            info!(
                session = %session.id,
                retry_after_secs = retry_after.as_secs(),
                "Submission quota exceeded"
            );
            return Err(AppError::QuotaExceeded { retry_after });
        }
    };

    let outcome = deliver(state, session, headers, body, now).await;

    // Only delivered mail keeps its slot.
    if let (Err(_), Some(slot)) = (&outcome, &slot) {
        state.limiter.release(&session.id, slot).await;
    }

    outcome
}

async fn deliver(
    state: &State,
    session: &Session,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
    now: DateTime<Utc>,
) -> Result<RelayResponse, AppError> {
    let body = body.map_err(|e| {
        info!(session = %session.id, status = %e.status(), "Unreadable submission body: {e}");
        AppError::MalformedPayload
    })?;

    let submission = sanitize_submission(&get_submission_from_body(headers, &body)?);

    let violations = ruleset::violations(&submission);
    if !violations.is_empty() {
        let reasons: Vec<&str> = violations.iter().map(|rule| rule.message).collect();
        info!(session = %session.id, failed = violations.len(), "Submission failed validation");
        return Err(AppError::InvalidInput(reasons.join(" ")));
    }

    if is_spam(&submission) {
        info!(session = %session.id, "Submission rejected as spam");
        return Err(AppError::SpamRejected);
    }

    // OutboundMail wipes itself on drop, like the submission it was built from.
    let mail = OutboundMail {
        to: state.config.to_email.clone(),
        from_name: state.config.from_name.clone(),
        from_domain: sender_domain(headers, &state.config.site_host),
        reply_to: submission.email.clone(),
        subject: template::subject_line(&submission),
        html: template::render(&submission, now),
    };

    if let Err(e) = state.mailer.send(&mail).await {
        error!(
            email = %submission.email,
            transport = state.mailer.transport_tag(),
            "Failed to send contact email: {e}"
        );
        return Err(e.into());
    }

    info!(session = %session.id, "Contact email sent");

    Ok(RelayResponse::sent())
}

/// Anything but POST on the relay route.
pub async fn forbidden_handler() -> impl IntoResponse {
    (StatusCode::FORBIDDEN, messages::FORBIDDEN)
}

pub async fn rules_handler() -> Json<Ruleset> {
    Json(ruleset::ruleset())
}
