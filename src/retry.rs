use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::captions::CaptionSource;
use crate::{CaptionTrack, Result, Snippet};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(2);
pub const BACKOFF_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff: BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// The sleeps taken between attempts when every attempt is throttled
    pub fn delays(&self) -> Vec<Duration> {
        let mut delay = self.initial_delay;
        (1..self.attempts())
            .map(|_| {
                let current = delay;
                delay = delay.mul_f64(self.backoff);
                current
            })
            .collect()
    }
}

/// A backoff about to happen, reported before the sleep starts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryNotice {
    pub reason: String,
    pub delay: Duration,
    pub attempt: u32,
    pub max_attempts: u32,
}

impl std::fmt::Display for RetryNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}; retrying in {:.1}s (attempt {}/{})",
            self.reason,
            self.delay.as_secs_f64(),
            self.attempt,
            self.max_attempts
        )
    }
}

/// Retry an async operation with exponential backoff, but only while it reports throttling
pub async fn retry_blocked<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_blocked_with(policy, |_| {}, operation).await
}

/// Like [`retry_blocked`], calling `on_retry` before every backoff sleep
pub async fn retry_blocked_with<F, Fut, T>(
    policy: &RetryPolicy,
    on_retry: impl Fn(&RetryNotice),
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.attempts();
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let notice = RetryNotice {
                    reason: e.to_string(),
                    delay,
                    attempt,
                    max_attempts,
                };
                warn!("{notice}");
                on_retry(&notice);
                tokio::time::sleep(delay).await;
                delay = delay.mul_f64(policy.backoff);
                attempt += 1;
            }
            Err(e) => {
                debug!("Giving up after attempt {attempt}/{max_attempts}: {e}");
                return Err(e);
            }
        }
    }
}

/// A [`CaptionSource`] whose calls back off and retry when the backend throttles
pub struct Retrying<S> {
    inner: S,
    policy: RetryPolicy,
    on_retry: Option<Box<dyn Fn(&RetryNotice) + Send + Sync>>,
}

impl<S> Retrying<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            on_retry: None,
        }
    }

    /// Also hand every backoff notice to `f`, e.g. to show it to the user
    pub fn on_retry(mut self, f: impl Fn(&RetryNotice) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Box::new(f));
        self
    }

    fn notify(&self, notice: &RetryNotice) {
        if let Some(f) = &self.on_retry {
            f(notice);
        }
    }
}

impl<S: CaptionSource> CaptionSource for Retrying<S> {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        retry_blocked_with(&self.policy, |n| self.notify(n), || self.inner.list_tracks(video_id)).await
    }

    async fn fetch_snippets(&self, track: &CaptionTrack, translate_to: Option<&str>) -> Result<Vec<Snippet>> {
        retry_blocked_with(
            &self.policy,
            |n| self.notify(n),
            || self.inner.fetch_snippets(track, translate_to),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NotesError;
    use std::cell::{Cell, RefCell};
    use tokio::time::Instant;

    fn blocked() -> NotesError {
        NotesError::ServiceUnavailable {
            subject: "video vid".to_string(),
            reason: "HTTP 429".to_string(),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy {
            max_attempts: 4,
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.delays(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(3),
                Duration::from_millis(4500),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert!(policy.delays().is_empty());

        let calls = Cell::new(0);
        let result: Result<()> = retry_blocked(&policy, || {
            calls.set(calls.get() + 1);
            async { Err(blocked()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_throttling() {
        let calls = Cell::new(0);
        let start = Instant::now();

        let result = retry_blocked(&RetryPolicy::default(), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n < 3 { Err(blocked()) } else { Ok("tracks") } }
        })
        .await;

        assert_eq!(result.unwrap(), "tracks");
        assert_eq!(calls.get(), 3);
        // 2s before the second attempt, 3s before the third
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(5010), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_returns_service_unavailable() {
        let calls = Cell::new(0);

        let result: Result<()> = retry_blocked(&RetryPolicy::default(), || {
            calls.set(calls.get() + 1);
            async { Err(blocked()) }
        })
        .await;

        assert!(matches!(result, Err(NotesError::ServiceUnavailable { .. })));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_throttling_error_is_not_retried() {
        let calls = Cell::new(0);
        let start = Instant::now();

        let result: Result<()> = retry_blocked(&RetryPolicy::default(), || {
            calls.set(calls.get() + 1);
            async {
                Err(NotesError::NotFound {
                    video_id: "vid".to_string(),
                    reason: "no captions".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(NotesError::NotFound { .. })));
        assert_eq!(calls.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_notices_reported_before_each_sleep() {
        let notices = RefCell::new(Vec::new());
        let calls = Cell::new(0);

        let result: Result<()> = retry_blocked_with(
            &RetryPolicy::default(),
            |n| notices.borrow_mut().push(n.to_string()),
            || {
                calls.set(calls.get() + 1);
                async { Err(blocked()) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(
            notices.into_inner(),
            vec![
                "YouTube blocked the request for video vid: HTTP 429; retrying in 2.0s (attempt 1/3)",
                "YouTube blocked the request for video vid: HTTP 429; retrying in 3.0s (attempt 2/3)",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_notice_without_backoff() {
        let notices = RefCell::new(Vec::<RetryNotice>::new());
        let result = retry_blocked_with(
            &RetryPolicy::default(),
            |n| notices.borrow_mut().push(n.clone()),
            || async { Ok(7) },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert!(notices.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_sleep() {
        let start = Instant::now();
        let result = retry_blocked(&RetryPolicy::default(), || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
