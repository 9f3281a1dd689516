//! Per-session submission quota.
//!
//! A session may have at most `max_submissions` accepted submissions inside a
//! trailing `window`. The relay reserves a slot before doing any work; the
//! reservation is atomic in the store, so parallel requests of one session
//! queue up behind the limit instead of racing past it. A slot whose mail
//! never left is released, so only delivered mail counts.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use crate::database::{Reservation, Slot, SubmissionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub max_submissions: usize,
    pub window: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// `slot` is `None` when the store was unreachable and the submission
    /// went through uncounted.
    Allowed { slot: Option<Slot>, remaining: usize },
    Denied { retry_after: Duration },
}

pub struct RateLimiter {
    store: Arc<dyn SubmissionStore>,
    policy: QuotaPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn SubmissionStore>, policy: QuotaPolicy) -> Self {
        Self { store, policy }
    }

    /// Purges entries that left the window, then takes a slot if one is free.
    ///
    /// A store failure is logged and the submission is let through.
    pub async fn reserve(&self, session: &str, now: DateTime<Utc>) -> Decision {
        let window = self.window();
        let cutoff = now
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let slot = Slot::new(now);

        let reservation = self
            .store
            .reserve(
                session,
                cutoff,
                self.policy.max_submissions,
                &slot,
                self.policy.window,
            )
            .await;

        let recent = match reservation {
            Ok(Reservation::Granted { in_window }) => {
                return Decision::Allowed {
                    slot: Some(slot),
                    remaining: self.policy.max_submissions.saturating_sub(in_window),
                };
            }
            Ok(Reservation::Full(recent)) => recent,
            Err(e) => {
                warn!(
                    backend = self.store.backend_tag(),
                    "Quota check failed, allowing submission: {e}"
                );
                return Decision::Allowed {
                    slot: None,
                    remaining: self.policy.max_submissions,
                };
            }
        };

        // The oldest entry that still counts decides when a slot frees up.
        let retry_after = recent
            .len()
            .checked_sub(self.policy.max_submissions)
            .and_then(|index| recent.get(index))
            .and_then(|oldest| oldest.checked_add_signed(window))
            .map(|frees_at| (frees_at - now).to_std().unwrap_or(Duration::ZERO))
            .unwrap_or(self.policy.window);

        Decision::Denied { retry_after }
    }

    /// Gives back a slot whose submission was not delivered.
    pub async fn release(&self, session: &str, slot: &Slot) {
        if let Err(e) = self.store.release(session, slot).await {
            warn!(
                backend = self.store.backend_tag(),
                "Failed to release submission slot: {e}"
            );
        }
    }

    fn window(&self) -> TimeDelta {
        TimeDelta::from_std(self.policy.window).unwrap_or(TimeDelta::MAX)
    }
}
