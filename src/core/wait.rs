use crate::utils::error::Result;
use std::future::Future;
use std::time::{Duration, Instant};

/// How long verifications keep retrying before they give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Runs `probe` until it yields `Some`, or returns `None` once the timeout has passed.
    /// The probe always runs at least once; driver errors abort immediately.
    pub async fn poll<T, F, Fut>(&self, mut probe: F) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let start = Instant::now();
        loop {
            if let Some(value) = probe().await? {
                return Ok(Some(value));
            }
            if start.elapsed() >= self.timeout {
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Boolean form of [`WaitPolicy::poll`].
    pub async fn until<F, Fut>(&self, mut condition: F) -> Result<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let outcome = self
            .poll(|| {
                let check = condition();
                async move { check.await.map(|met| met.then_some(())) }
            })
            .await?;
        Ok(outcome.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick() -> WaitPolicy {
        WaitPolicy::new(Duration::from_millis(50), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_poll_returns_first_success() {
        let calls = AtomicUsize::new(0);
        let value = quick()
            .poll(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok((n >= 2).then_some(n)) }
            })
            .await
            .unwrap();

        assert_eq!(value, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_until_gives_up_after_timeout() {
        let started = Instant::now();
        let met = quick().until(|| async { Ok(false) }).await.unwrap();

        assert!(!met);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_zero_timeout_still_probes_once() {
        let policy = WaitPolicy::new(Duration::ZERO, Duration::from_millis(5));
        assert!(policy.until(|| async { Ok(true) }).await.unwrap());
    }
}
