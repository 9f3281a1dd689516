//! Input neutralization before anything is embedded in the notification.
//!
//! Trim, drop backslash escapes, then entity-encode the HTML-significant
//! characters. Existing entities are left alone, so running it twice changes
//! nothing.

use std::sync::LazyLock;

use contact::ContactSubmission;
use regex::Regex;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);")
        .expect("entity pattern is a valid regex")
});

pub fn sanitize_submission(submission: &ContactSubmission) -> ContactSubmission {
    submission.map_fields(sanitize)
}

pub fn sanitize(input: &str) -> String {
    let stripped = strip_slashes(input.trim());

    encode_html(stripped.trim())
}

/// `\x` becomes `x`, `\\` becomes `\`, a trailing lone backslash disappears.
fn strip_slashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }

    out
}

fn encode_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for (i, c) in input.char_indices() {
        match c {
            '&' if ENTITY.is_match(&input[i..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            // A backslash surviving strip_slashes would be eaten by a second pass.
            '\\' => out.push_str("&#92;"),
            _ => out.push(c),
        }
    }

    out
}
