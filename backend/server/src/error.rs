use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use contact::{RelayResponse, messages};
use thiserror::Error;

use crate::mail::MailError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Submission quota exceeded")]
    QuotaExceeded { retry_after: Duration },

    #[error("Spam content rejected")]
    SpamRejected,

    #[error("Mail dispatch failed: {0}")]
    Dispatch(#[from] MailError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload | AppError::InvalidInput(_) | AppError::SpamRejected => {
                StatusCode::BAD_REQUEST
            }
            AppError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the submitter sees. Never names a spam keyword or a transport detail.
    pub fn public_message(&self) -> String {
        match self {
            AppError::MalformedPayload => messages::MALFORMED.to_string(),
            AppError::InvalidInput(reasons) => reasons.clone(),
            AppError::QuotaExceeded { .. } => messages::QUOTA_EXCEEDED.to_string(),
            AppError::SpamRejected => messages::SPAM_REJECTED.to_string(),
            AppError::Dispatch(_) => messages::DISPATCH_FAILED.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status(),
            Json(RelayResponse::failure(self.public_message())),
        )
            .into_response();

        if let AppError::QuotaExceeded { retry_after } = self {
            let seconds = retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}
