use contact::messages;

use crate::models::ErrorBody;

/// Text to show for a non-2xx answer: the server's own words when it sent any.
pub fn failure_message(body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    if !parsed.errors.is_empty() {
        return parsed
            .errors
            .iter()
            .map(|entry| entry.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
    }

    match parsed.message {
        Some(message) if !message.trim().is_empty() => message,
        _ => messages::SEND_FAILED.to_string(),
    }
}
