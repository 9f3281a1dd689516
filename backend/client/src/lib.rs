//! # Contact client
//!
//! Gate-keeps and submits one contact form, trusting nothing the relay does.
//!
//! ## Flow
//!
//! 1. Read the four fields and trim them.
//! 2. Check the shared ruleset in order; the first failure is shown and nothing is sent.
//! 3. Disable the submit control, POST the payload as JSON.
//! 4. Map the outcome to one banner:
//!    - 2xx: form cleared, success banner
//!    - other status: the server's text if it gave any, a generic failure otherwise
//!    - no response: a connectivity message
//! 5. Re-enable the submit control whatever happened.
//!
//! There is no retry and no cancellation. A failed submission needs a new submit.
use contact::{ContactSubmission, OutgoingPayload, RelayResponse, Rule, messages, ruleset};
use reqwest::{Client, StatusCode, header::ACCEPT};
use thiserror::Error;
use tracing::{debug, warn};

pub mod models;
pub mod ui;
pub mod utils;

use ui::{Banner, ContactForm};
use utils::failure_message;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid {:?}: {}", .0.field, .0.message)]
    Invalid(&'static Rule),

    #[error("Relay answered {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct ContactController {
    http: Client,
    endpoint: String,
}

impl ContactController {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Trims every field, then checks it. On failure exactly one error banner is shown.
    pub fn validate<F: ContactForm>(&self, submission: &ContactSubmission, form: &mut F) -> bool {
        check(&submission.trimmed(), form).is_ok()
    }

    pub async fn submit<F: ContactForm>(&self, form: &mut F) -> Result<RelayResponse, ClientError> {
        let submission = form.fields().trimmed();

        check(&submission, form).map_err(ClientError::Invalid)?;

        form.set_submitting(true);
        let outcome = self.send(&submission).await;
        form.set_submitting(false);

        match &outcome {
            Ok(sent) => {
                form.reset();
                form.show_message(Banner::success(sent.message.clone()));
            }
            Err(ClientError::Rejected { message, .. }) => {
                form.show_message(Banner::error(message.clone()));
            }
            Err(ClientError::Transport(e)) => {
                warn!("Form submit error: {e}");
                form.show_message(Banner::error(messages::CONNECTION_FAILED));
            }
            Err(ClientError::Invalid(_)) => {}
        }

        outcome
    }

    async fn send(&self, submission: &ContactSubmission) -> Result<RelayResponse, ClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(&OutgoingPayload::new(submission))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%status, "Relay answered");

        if status.is_success() {
            Ok(RelayResponse::sent())
        } else {
            Err(ClientError::Rejected {
                status,
                message: failure_message(&body),
            })
        }
    }
}

fn check<F: ContactForm>(submission: &ContactSubmission, form: &mut F) -> Result<(), &'static Rule> {
    match ruleset::first_violation(submission) {
        Some(rule) => {
            form.show_message(Banner::error(rule.message));
            Err(rule)
        }
        None => Ok(()),
    }
}
