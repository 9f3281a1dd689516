//! Validation rules as data.
//!
//! Each rule pairs a field with one check and the message shown when it fails.
//! Order matters: clients report only the first failing rule.

use std::sync::LazyLock;

use email_address::EmailAddress;
use regex::Regex;
use serde::Serialize;

use crate::payloads::ContactSubmission;

/// Bumped whenever a rule, its order or its message changes.
pub const RULESET_VERSION: u32 = 1;

pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    pub fn value<'a>(&self, submission: &'a ContactSubmission) -> &'a str {
        match self {
            Field::Name => &submission.name,
            Field::Email => &submission.email,
            Field::Subject => &submission.subject,
            Field::Message => &submission.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Present and at least `min` characters long.
    MinLength { min: usize },
    /// Present, `local@domain.tld` shaped and a syntactically valid address.
    Email { pattern: &'static str },
}

impl Check {
    pub fn passes(&self, value: &str) -> bool {
        match self {
            Check::MinLength { min } => !value.is_empty() && value.chars().count() >= *min,
            Check::Email { .. } => {
                !value.is_empty() && EMAIL_SHAPE.is_match(value) && EmailAddress::is_valid(value)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub field: Field,
    pub check: Check,
    pub message: &'static str,
}

impl Rule {
    pub fn passes(&self, submission: &ContactSubmission) -> bool {
        self.check.passes(self.field.value(submission))
    }
}

pub static RULES: [Rule; 4] = [
    Rule {
        field: Field::Name,
        check: Check::MinLength { min: 2 },
        message: "Nombre inválido (mínimo 2 caracteres).",
    },
    Rule {
        field: Field::Email,
        check: Check::Email {
            pattern: EMAIL_PATTERN,
        },
        message: "Email inválido.",
    },
    Rule {
        field: Field::Subject,
        check: Check::MinLength { min: 3 },
        message: "Asunto inválido (mínimo 3 caracteres).",
    },
    Rule {
        field: Field::Message,
        check: Check::MinLength { min: 10 },
        message: "Mensaje muy corto (mínimo 10 caracteres).",
    },
];

/// Serialized form of the whole table, for `GET /rules`.
#[derive(Debug, Serialize)]
pub struct Ruleset {
    pub version: u32,
    pub rules: &'static [Rule],
}

pub fn ruleset() -> Ruleset {
    Ruleset {
        version: RULESET_VERSION,
        rules: &RULES,
    }
}

pub fn first_violation(submission: &ContactSubmission) -> Option<&'static Rule> {
    RULES.iter().find(|rule| !rule.passes(submission))
}

pub fn violations(submission: &ContactSubmission) -> Vec<&'static Rule> {
    RULES.iter().filter(|rule| !rule.passes(submission)).collect()
}
