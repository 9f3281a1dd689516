//! # Contact
//!
//! Data shared between the contact relay and anything that submits to it.
//!
//! ## Payloads
//!
//! - [`ContactSubmission`]: the four form fields, ephemeral, wiped on drop
//! - [`OutgoingPayload`]: what a client posts, the submission plus reply-to and subject hints
//! - [`RelayResponse`]: `{ success, message }`, always JSON
//!
//! ## Ruleset
//!
//! Both sides validate independently but read the same [`ruleset::RULES`] table.
//! Clients stop at the first violation, the relay collects all of them.
//!
//! The table is versioned by [`ruleset::RULESET_VERSION`] and serializes to JSON,
//! so a browser script can consume the exact same rules from `GET /rules`.
//!
//! ## Messages
//!
//! User facing text is Spanish, matching the site.

pub mod messages;
pub mod payloads;
pub mod ruleset;

pub use payloads::{ContactSubmission, OutgoingPayload, RelayResponse};
pub use ruleset::{Field, Rule, RULES, RULESET_VERSION};

/// Terms that reject a submission outright when found in the name, subject or message.
pub const SPAM_KEYWORDS: [&str; 6] = [
    "viagra",
    "casino",
    "lottery",
    "prize",
    "winner",
    "click here",
];

/// Case-insensitive substring screen over name, subject and message.
///
/// The email field is not screened.
pub fn is_spam(submission: &ContactSubmission) -> bool {
    let content = format!(
        "{} {} {}",
        submission.name, submission.subject, submission.message
    )
    .to_lowercase();

    SPAM_KEYWORDS.iter().any(|keyword| content.contains(keyword))
}
