//! First-of {operation, timeout} combinator.
//!
//! Location resolution races device and network operations against fixed
//! budgets. The combinator returns a tagged result instead of an error so
//! callers pattern-match to pick a fallback; a late result is simply ignored,
//! never cancelled mid-flight.

use std::future::Future;
use std::time::Duration;

/// Outcome of racing an operation against a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Raced<T> {
    /// The operation finished within the budget.
    Completed(T),
    /// The budget elapsed first.
    TimedOut,
}

impl<T> Raced<T> {
    /// Returns the completed value, or `None` on timeout.
    pub fn completed(self) -> Option<T> {
        match self {
            Raced::Completed(value) => Some(value),
            Raced::TimedOut => None,
        }
    }
}

/// Runs `operation`, returning `Raced::TimedOut` if it does not finish
/// within `budget`.
pub async fn first_of<F>(budget: Duration, operation: F) -> Raced<F::Output>
where
    F: Future,
{
    match tokio::time::timeout(budget, operation).await {
        Ok(value) => Raced::Completed(value),
        Err(_) => Raced::TimedOut,
    }
}
