//! Discarding responses that arrive after a newer request was issued.
//!
//! A dashboard that re-submits a form before the previous call returned must
//! not let the older response overwrite the newer one. Each submission takes a
//! [`Ticket`]; only the ticket from the latest submission stays current.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::debug;

/// Returned when a result was produced for a submission that is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("result of submission {generation} was superseded by a newer submission")]
pub struct Superseded {
    /// Generation of the stale submission.
    pub generation: u64,
}

/// Hands out generation tickets for one logical request slot.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct SupersedeGuard {
    latest: Arc<AtomicU64>,
}

impl SupersedeGuard {
    /// Creates a guard with no submissions yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new submission and invalidates every earlier ticket.
    #[must_use]
    pub fn begin(&self) -> Ticket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Invalidates every outstanding ticket without starting a submission.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Takes a ticket for `fut` now and drops its result if a newer
    /// submission began before it completed.
    ///
    /// The ticket is issued when `run` is called, not when the returned
    /// future is first polled, so submission order decides which result is
    /// current. The future always runs to completion; only the delivery is
    /// suppressed.
    ///
    /// # Errors
    ///
    /// The returned future resolves to [`Superseded`] when the result is stale.
    pub fn run<F, T>(&self, fut: F) -> impl Future<Output = Result<T, Superseded>> + use<F, T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin();
        async move {
            let output = fut.await;
            ticket.accept(output)
        }
    }
}

/// Proof of one submission.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl Ticket {
    /// Generation number of this submission.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer submission has begun since this ticket was issued.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    /// Passes `value` through if the ticket is still current.
    ///
    /// # Errors
    ///
    /// Returns [`Superseded`] when a newer submission has begun.
    pub fn accept<T>(&self, value: T) -> Result<T, Superseded> {
        if self.is_current() {
            Ok(value)
        } else {
            debug!(generation = self.generation, "discarding superseded result");
            Err(Superseded {
                generation: self.generation,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let guard = SupersedeGuard::new();
        let first = guard.begin();
        assert!(first.is_current());

        let second = guard.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(first.accept(1), Err(Superseded { generation: 1 }));
        assert_eq!(second.accept(2), Ok(2));
    }

    #[test]
    fn invalidate_expires_outstanding_tickets() {
        let guard = SupersedeGuard::new();
        let ticket = guard.begin();
        guard.invalidate();
        assert!(!ticket.is_current());
    }

    #[test]
    fn clones_share_generations() {
        let guard = SupersedeGuard::new();
        let ticket = guard.begin();
        let _ = guard.clone().begin();
        assert!(!ticket.is_current());
    }

    #[tokio::test]
    async fn slow_result_is_discarded_when_resubmitted() {
        let guard = SupersedeGuard::new();

        let slow = guard.run(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            "slow"
        });
        let fast = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            guard.run(async { "fast" }).await
        };

        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(slow, Err(Superseded { generation: 1 }));
        assert_eq!(fast, Ok("fast"));
    }

    #[tokio::test]
    async fn ticket_is_taken_at_submission() {
        let guard = SupersedeGuard::new();
        let older = guard.run(async { "older" });
        let newer = guard.run(async { "newer" });

        assert_eq!(newer.await, Ok("newer"));
        assert_eq!(older.await, Err(Superseded { generation: 1 }));
    }
}
