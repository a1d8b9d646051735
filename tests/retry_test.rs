use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mimir::{MimirError, Result, RetryExecutor, RetryPolicy};
use tokio::time::Instant;

/// Scripted upstream: fails the first `failures` calls, then answers.
struct FailThenSucceed {
    failures: u32,
    fail_with: fn() -> MimirError,
    calls: AtomicU32,
    started: Mutex<Vec<Instant>>,
}

impl FailThenSucceed {
    fn new(failures: u32, fail_with: fn() -> MimirError) -> Arc<Self> {
        Arc::new(Self {
            failures,
            fail_with,
            calls: AtomicU32::new(0),
            started: Mutex::new(Vec::new()),
        })
    }

    async fn call(&self) -> Result<String> {
        self.started.lock().unwrap().push(Instant::now());
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err((self.fail_with)())
        } else {
            Ok("What is your biggest strength?".to_string())
        }
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn gaps(&self) -> Vec<Duration> {
        let started = self.started.lock().unwrap();
        started.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

fn throttled() -> MimirError {
    MimirError::RateLimited { retry_after: None }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new()
        .base_delay(Duration::from_millis(10))
        .jitter(Duration::ZERO)
}

#[tokio::test(start_paused = true)]
async fn retries_on_transient_error_then_succeeds() {
    let upstream = FailThenSucceed::new(2, throttled);
    let executor = RetryExecutor::new(fast_policy());

    let raw = executor
        .execute("mock", || upstream.call())
        .await
        .expect("third attempt succeeds");

    assert_eq!(raw.text, "What is your biggest strength?");
    assert_eq!(raw.provider_name, "mock");
    assert_eq!(upstream.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn fatal_error_aborts_immediately() {
    let upstream = FailThenSucceed::new(10, || MimirError::AuthenticationFailed);
    let executor = RetryExecutor::new(fast_policy());

    let err = executor.execute("mock", || upstream.call()).await.unwrap_err();

    assert!(matches!(err, MimirError::AuthenticationFailed));
    assert_eq!(upstream.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_api_status_aborts() {
    let upstream = FailThenSucceed::new(10, || MimirError::Api {
        status: 400,
        message: "bad request".into(),
    });
    let executor = RetryExecutor::new(fast_policy());

    let err = executor.execute("mock", || upstream.call()).await.unwrap_err();

    assert!(matches!(err, MimirError::Api { status: 400, .. }));
    assert_eq!(upstream.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhaustion_carries_the_last_error() {
    let upstream = FailThenSucceed::new(10, || MimirError::Api {
        status: 503,
        message: "unavailable".into(),
    });
    let executor = RetryExecutor::new(fast_policy().max_attempts(3));

    let err = executor.execute("mock", || upstream.call()).await.unwrap_err();

    assert_eq!(upstream.call_count(), 3);
    match err {
        MimirError::Exhausted {
            provider,
            attempts,
            last_error,
        } => {
            assert_eq!(provider, "mock");
            assert_eq!(attempts, 3);
            assert!(matches!(*last_error, MimirError::Api { status: 503, .. }));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn backoff_follows_schedule_within_jitter_bound() {
    let upstream = FailThenSucceed::new(10, throttled);
    let policy = RetryPolicy::new()
        .max_attempts(5)
        .base_delay(Duration::from_secs(1))
        .max_delay(Duration::from_secs(60))
        .jitter(Duration::from_millis(1_000));
    let executor = RetryExecutor::new(policy.clone());

    let err = executor.execute("mock", || upstream.call()).await.unwrap_err();
    assert!(err.is_exhausted());

    let gaps = upstream.gaps();
    assert_eq!(gaps.len(), 4);
    for (i, gap) in gaps.iter().enumerate() {
        let scheduled = policy.scheduled_delay(i as u32 + 1);
        assert!(
            *gap >= scheduled && *gap <= scheduled + Duration::from_millis(1_000),
            "gap {i} = {gap:?}, scheduled {scheduled:?}"
        );
    }

    // Scheduled delays never shrink.
    for attempt in 1..4 {
        assert!(policy.scheduled_delay(attempt) <= policy.scheduled_delay(attempt + 1));
    }
}

#[tokio::test(start_paused = true)]
async fn retry_after_hint_overrides_backoff() {
    let upstream = FailThenSucceed::new(1, || MimirError::RateLimited {
        retry_after: Some(Duration::from_secs(3)),
    });
    let executor = RetryExecutor::new(
        RetryPolicy::new()
            .base_delay(Duration::from_millis(100))
            .jitter(Duration::ZERO),
    );

    executor
        .execute("mock", || upstream.call())
        .await
        .expect("second attempt succeeds");

    assert_eq!(upstream.gaps(), vec![Duration::from_secs(3)]);
}

#[tokio::test(start_paused = true)]
async fn attempt_timeout_counts_as_retryable() {
    let calls = Arc::new(AtomicU32::new(0));
    let executor = RetryExecutor::new(
        fast_policy()
            .max_attempts(2)
            .attempt_timeout(Duration::from_secs(1)),
    );

    let err = executor
        .execute("slow", || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, MimirError>("too late".to_string())
            }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    match err {
        MimirError::Exhausted { last_error, .. } => {
            assert!(matches!(*last_error, MimirError::Timeout(_)));
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn blank_completion_is_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let executor = RetryExecutor::new(fast_policy());

    let raw = executor
        .execute("mock", || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, MimirError>(if n == 0 { "  \n".into() } else { "ok".into() })
            }
        })
        .await
        .unwrap();

    assert_eq!(raw.text, "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn single_attempt_policy_does_not_retry() {
    let upstream = FailThenSucceed::new(1, throttled);
    let executor = RetryExecutor::new(RetryPolicy::disabled());

    let err = executor.execute("mock", || upstream.call()).await.unwrap_err();

    assert!(matches!(err, MimirError::Exhausted { attempts: 1, .. }));
    assert_eq!(upstream.call_count(), 1);
}
