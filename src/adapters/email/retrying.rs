//! Bounded retry with dead-lettering for confirmation delivery.
//!
//! Retryable failures are retried with exponential backoff up to
//! `max_attempts`. Whatever still fails is recorded as a dead letter and
//! logged at error level; the error is then returned to the caller, which
//! reports `email_sent = false` without failing the signup.
//!
//! Only the newest `DEAD_LETTER_CAPACITY` letters are kept in memory. An
//! evicted letter is logged again so its access code stays in the logs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::membership::MembershipConfirmation;
use crate::ports::{MembershipNotifier, NotificationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// Delay before retry number `retry` (0-based), doubling each time.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(200), Duration::from_secs(5))
    }
}

pub const DEAD_LETTER_CAPACITY: usize = 500;

/// A confirmation that could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub confirmation: MembershipConfirmation,
    pub error: NotificationError,
    pub attempts: u32,
    pub failed_at: Timestamp,
}

pub struct RetryingNotifier {
    inner: Arc<dyn MembershipNotifier>,
    policy: RetryPolicy,
    dead_letters: Mutex<VecDeque<DeadLetter>>,
    capacity: usize,
}

impl RetryingNotifier {
    pub fn new(inner: Arc<dyn MembershipNotifier>, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            dead_letters: Mutex::new(VecDeque::new()),
            capacity: DEAD_LETTER_CAPACITY,
        }
    }

    pub fn with_dead_letter_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    fn letters(&self) -> MutexGuard<'_, VecDeque<DeadLetter>> {
        self.dead_letters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Oldest first.
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.letters().iter().cloned().collect()
    }

    fn dead_letter(&self, confirmation: &MembershipConfirmation, error: &NotificationError, attempts: u32) {
        tracing::error!(
            email = %confirmation.email,
            access_code = %confirmation.access_code,
            attempts,
            error = %error,
            "Membership confirmation dead-lettered"
        );
        let mut letters = self.letters();
        while letters.len() >= self.capacity {
            if let Some(evicted) = letters.pop_front() {
                tracing::error!(
                    email = %evicted.confirmation.email,
                    access_code = %evicted.confirmation.access_code,
                    failed_at = %evicted.failed_at.to_rfc3339(),
                    "Dead letter evicted; confirmation was never delivered"
                );
            }
        }
        letters.push_back(DeadLetter {
            confirmation: confirmation.clone(),
            error: error.clone(),
            attempts,
            failed_at: Timestamp::now(),
        });
    }
}

#[async_trait]
impl MembershipNotifier for RetryingNotifier {
    async fn send_confirmation(
        &self,
        confirmation: &MembershipConfirmation,
    ) -> Result<(), NotificationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.inner.send_confirmation(confirmation).await {
                Ok(()) => return Ok(()),
                Err(error) if error.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for(attempt - 1);
                    tracing::warn!(
                        email = %confirmation.email,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Confirmation delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    self.dead_letter(confirmation, &error, attempt);
                    return Err(error);
                }
            }
        }
    }
}
