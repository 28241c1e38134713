//! Caller-supplied deadline and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SearchError;

/// Bounds on how long a search may run.
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl SearchControl {
    /// No deadline, not cancellable.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drive `fut` to completion unless the deadline passes or the token
    /// fires first. An already-cancelled token wins immediately.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, SearchError>
    where
        F: Future<Output = Result<T, SearchError>>,
    {
        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| SearchError::Timeout)?,
                None => fut.await,
            }
        };

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(SearchError::Cancelled),
                    result = bounded => result,
                }
            }
            None => bounded.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unbounded_passes_through() {
        let result = SearchControl::unbounded().run(async { Ok(5) }).await;
        assert_eq!(result, Ok(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let control = SearchControl::unbounded().with_timeout(Duration::from_millis(50));
        let result: Result<(), _> = control
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(SearchError::Timeout));
    }

    #[tokio::test]
    async fn test_precancelled_token() {
        let token = CancellationToken::new();
        token.cancel();
        let control = SearchControl::unbounded().with_cancellation(token);

        let result = control.run(async { Ok(1) }).await;
        assert_eq!(result, Err(SearchError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_flight() {
        let token = CancellationToken::new();
        let control = SearchControl::unbounded().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let result: Result<(), _> = control
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        canceller.await.unwrap();

        assert_eq!(result, Err(SearchError::Cancelled));
    }
}
