//! Sync runs: tree walk, attempt state machine and orchestration.
//!
//! [`Orchestrator::run`] repeats whole-tree attempts. Each attempt loads the
//! ledger, authenticates with a fresh client and lets a [`TreeWalker`] mirror
//! every top-level folder. The walker's [`WalkReport`] decides whether the
//! attempt succeeded; [`RetryState`] decides what happens next.

mod error;
mod orchestrator;
mod progress;
mod retry;
mod walker;

pub use error::SyncError;
pub use orchestrator::{FinalState, Orchestrator, ProcessExit};
pub use progress::Console;
pub use retry::{
    AttemptBackoff, AttemptOutcome, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryState,
};
pub use walker::{TreeWalker, WalkReport};
