//! Attempt state machine and the backoff between attempts.
//!
//! A sync run is a sequence of whole-tree attempts. Each attempt reports an
//! [`AttemptOutcome`]; [`RetryState::next`] turns that into the next state:
//!
//! ```text
//! Attempting(n) --Succeeded--------------------> Done
//! Attempting(n) --FailedRetryable (n < max)----> Attempting(n + 1)
//! Attempting(n) --FailedRetryable (n == max)---> Exhausted
//! Attempting(n) --FailedFatal------------------> Exhausted
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// Default number of attempts per invocation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay before the second attempt (1 second).
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay cap (30 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Maximum jitter added to delays (250ms).
const MAX_JITTER: Duration = Duration::from_millis(250);

/// How one attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The whole tree was walked without a single failure.
    Succeeded,
    /// Something failed; another attempt may fix it.
    FailedRetryable,
    /// Retrying cannot help (e.g. the credentials were rejected).
    FailedFatal,
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Running attempt `n` (1-indexed).
    Attempting(u32),
    /// An attempt succeeded.
    Done,
    /// No attempts left, or a fatal failure.
    Exhausted,
}

impl RetryState {
    /// The state every run starts in.
    #[must_use]
    pub fn initial() -> Self {
        Self::Attempting(1)
    }

    /// Whether the machine has stopped.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Exhausted)
    }

    /// Applies `outcome` to the current state.
    ///
    /// Terminal states absorb every outcome.
    #[must_use]
    pub fn next(self, outcome: AttemptOutcome, max_attempts: u32) -> Self {
        let Self::Attempting(attempt) = self else {
            return self;
        };
        match outcome {
            AttemptOutcome::Succeeded => Self::Done,
            AttemptOutcome::FailedFatal => Self::Exhausted,
            AttemptOutcome::FailedRetryable if attempt >= max_attempts => Self::Exhausted,
            AttemptOutcome::FailedRetryable => Self::Attempting(attempt + 1),
        }
    }
}

/// Exponential backoff with jitter between attempts.
///
/// # Delay Calculation
///
/// ```text
/// delay = min(base_delay * multiplier^(attempt - 1), max_delay) + jitter
/// ```
///
/// A zero base delay disables waiting entirely (no jitter either).
#[derive(Debug, Clone)]
pub struct AttemptBackoff {
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl Default for AttemptBackoff {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl AttemptBackoff {
    /// Creates a backoff with a custom base delay and default cap/multiplier.
    #[must_use]
    pub fn with_base_delay(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Self::default()
        }
    }

    /// Backoff that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::with_base_delay(Duration::ZERO)
    }

    /// Delay to wait after `failed_attempt` (1-indexed) before the next one.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as f64;
        let exponent = f64::from(failed_attempt.saturating_sub(1));
        let delay_ms = base_ms * self.backoff_multiplier.powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        let delay = Duration::from_millis(capped_ms as u64) + jitter();
        debug!(failed_attempt, delay_ms = delay.as_millis(), "backing off before next attempt");
        delay
    }
}

/// Random jitter between 0 and `MAX_JITTER`.
#[allow(clippy::cast_possible_truncation)]
fn jitter() -> Duration {
    let mut rng = rand::thread_rng();
    Duration::from_millis(rng.gen_range(0..=MAX_JITTER.as_millis() as u64))
}
