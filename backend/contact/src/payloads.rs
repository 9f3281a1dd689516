use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::messages;

/// One contact form, exactly as typed or as decoded from a request.
///
/// Missing fields decode as empty strings so they fail validation instead of
/// failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactSubmission {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        self.map_fields(|field| field.trim().to_string())
    }

    pub fn map_fields(&self, mut f: impl FnMut(&str) -> String) -> Self {
        Self {
            name: f(&self.name),
            email: f(&self.email),
            subject: f(&self.subject),
            message: f(&self.message),
        }
    }
}

/// JSON body a client posts.
///
/// `_replyto` and `_subject` are hints for form relays that forward mail
/// themselves; the portfolio relay ignores them.
#[derive(Debug, Serialize)]
pub struct OutgoingPayload<'a> {
    #[serde(flatten)]
    pub submission: &'a ContactSubmission,
    #[serde(rename = "_replyto")]
    pub reply_to: &'a str,
    #[serde(rename = "_subject")]
    pub subject_line: String,
}

impl<'a> OutgoingPayload<'a> {
    pub fn new(submission: &'a ContactSubmission) -> Self {
        Self {
            submission,
            reply_to: &submission.email,
            subject_line: format!("Nuevo mensaje de: {}", submission.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    pub message: String,
}

impl RelayResponse {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: messages::SUCCESS.to_string(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_missing_fields_default_empty() {
        let s: ContactSubmission = serde_json::from_value(json!({ "name": "Jo" })).unwrap();

        assert_eq!(s.name, "Jo");
        assert!(s.email.is_empty());
        assert!(s.subject.is_empty());
        assert!(s.message.is_empty());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let s: ContactSubmission = serde_json::from_value(json!({
            "name": "Jo",
            "email": "jo@x.com",
            "subject": "Hi!",
            "message": "Loved your portfolio work",
            "_replyto": "jo@x.com",
            "_subject": "Nuevo mensaje de: Jo"
        }))
        .unwrap();

        assert_eq!(s.email, "jo@x.com");
    }

    #[test]
    fn test_trimmed() {
        let s = ContactSubmission::new("  Jo ", "\tjo@x.com\n", " Hi! ", " Loved it a lot ");
        let t = s.trimmed();

        assert_eq!(t, ContactSubmission::new("Jo", "jo@x.com", "Hi!", "Loved it a lot"));
    }

    #[test]
    fn test_outgoing_payload_shape() {
        let s = ContactSubmission::new("Jo", "jo@x.com", "Hi!", "Loved your portfolio work");
        let value: Value = serde_json::to_value(OutgoingPayload::new(&s)).unwrap();

        assert_eq!(value["name"], "Jo");
        assert_eq!(value["email"], "jo@x.com");
        assert_eq!(value["subject"], "Hi!");
        assert_eq!(value["message"], "Loved your portfolio work");
        assert_eq!(value["_replyto"], "jo@x.com");
        assert_eq!(value["_subject"], "Nuevo mensaje de: Jo");
    }
}
