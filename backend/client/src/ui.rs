//! What the controller needs from whatever renders the form.

use std::time::Duration;

use contact::ContactSubmission;

pub const BANNER_DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    pub kind: BannerKind,
    /// The sink hides the banner once this has passed.
    pub dismiss_after: Duration,
}

impl Banner {
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, BannerKind::Success)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, BannerKind::Error)
    }

    fn new(text: impl Into<String>, kind: BannerKind) -> Self {
        Self {
            text: text.into(),
            kind,
            dismiss_after: BANNER_DISMISS_AFTER,
        }
    }
}

/// A rendered contact form.
pub trait ContactForm {
    /// Current field values, untrimmed.
    fn fields(&self) -> ContactSubmission;

    /// Clears every field.
    fn reset(&mut self);

    /// `true` disables the submit control and swaps its label for a loader.
    fn set_submitting(&mut self, submitting: bool);

    /// Shows the banner, scrolls it into view and hides it after `dismiss_after`.
    /// A new banner replaces the current one.
    fn show_message(&mut self, banner: Banner);
}
