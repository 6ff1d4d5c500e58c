//! Per-request deadlines for storage calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// The deadline elapsed before the wrapped future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline exceeded after {budget:?}")]
pub struct DeadlineExceeded {
    /// Time that was available when the call started.
    pub budget: Duration,
}

/// A point in time by which a unit of work must finish.
///
/// Created once per inbound request and passed by reference to every storage
/// call, so the check and the mutation of a check-then-act sequence share one
/// budget. Dropping the future handed to [`Deadline::run`] cancels it; sqlx
/// returns the pooled connection on drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// The earlier of this deadline and `limit` from now.
    pub fn capped(&self, limit: Duration) -> Self {
        Self {
            at: self.at.min(Instant::now() + limit),
        }
    }

    /// Drive `future` to completion or fail once the deadline passes.
    pub async fn run<F, T>(&self, future: F) -> Result<T, DeadlineExceeded>
    where
        F: Future<Output = T>,
    {
        let budget = self.remaining();
        if budget.is_zero() {
            return Err(DeadlineExceeded { budget });
        }
        tokio::time::timeout_at(self.at, future)
            .await
            .map_err(|_| DeadlineExceeded { budget })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn completes_within_budget() {
        let deadline = Deadline::after(Duration::from_secs(2));
        let value = deadline
            .run(async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                7
            })
            .await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_future_is_cut_off() {
        let deadline = Deadline::after(Duration::from_secs(2));
        let result = deadline
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert_eq!(
            result,
            Err(DeadlineExceeded {
                budget: Duration::from_secs(2)
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn capped_never_extends_the_deadline() {
        let deadline = Deadline::after(Duration::from_secs(1));
        assert_eq!(deadline.capped(Duration::from_secs(5)), deadline);

        let tighter = deadline.capped(Duration::from_millis(100));
        assert!(tighter.instant() < deadline.instant());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_fails_immediately() {
        let deadline = Deadline::after(Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;

        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
        assert!(deadline.run(async { 1 }).await.is_err());
    }
}
