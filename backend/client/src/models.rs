use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:1111/send";

/// Error body of a rejected submission.
///
/// The portfolio relay answers `{ success, message }`; hosted form relays
/// answer `{ errors: [{ message }] }`. Both are read.
#[derive(Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
pub struct ErrorEntry {
    pub message: String,
}
