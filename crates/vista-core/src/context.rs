//! Per-call deadline and cancellation.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation signal for one embed call.
///
/// Every network hop (identity provider, report lookup, token generation)
/// runs through [`CallContext::run`], so the budget covers the whole call
/// rather than each request separately.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<(Instant, Duration)>,
    cancel: CancellationToken,
}

impl CallContext {
    /// No deadline, never cancelled unless [`cancellation`](Self::cancellation) is triggered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some((Instant::now() + timeout, timeout)),
            cancel: CancellationToken::new(),
        }
    }

    /// Tie this call to an external cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|(deadline, _)| deadline.saturating_duration_since(Instant::now()))
    }

    /// Run one hop under the deadline and the cancellation token.
    pub async fn run<T, F>(&self, hop: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let bounded = async {
            match self.deadline {
                Some((deadline, budget)) => match tokio::time::timeout_at(deadline, hop).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(budget)),
                },
                None => hop.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = bounded => result,
        }
    }
}
