//! Polling waits

use quest_common::{Error, ErrorKind, Result};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

/// Poll `check` until it yields a value or `timeout` elapses.
///
/// Lookup-style failures (`NotFound`, `StaleElement`) count as "not yet"; any
/// other error ends the wait immediately.
pub async fn wait_until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    poll: Duration,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    loop {
        match check().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::StaleElement) => {}
            Err(e) => return Err(e),
        }

        if start.elapsed() >= timeout {
            return Err(Error::Timeout {
                what: what.to_string(),
                millis: timeout.as_millis() as u64,
            });
        }
        sleep(poll.min(timeout.saturating_sub(start.elapsed()))).await;
    }
}

/// Like [`wait_until`] but a timeout is not a failure.
///
/// Used before direct lookups: the lookup that follows runs regardless of
/// whether the wait succeeded.
pub async fn best_effort<T, F, Fut>(
    what: &str,
    timeout: Duration,
    poll: Duration,
    check: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    match wait_until(what, timeout, poll, check).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == ErrorKind::Timeout => {
            debug!("Wait for {} gave up after {:?}", what, timeout);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_wait_until_returns_when_ready() {
        let calls = AtomicUsize::new(0);
        let value = wait_until("third poll", Duration::from_secs(1), Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(if n >= 2 { Some(n) } else { None }) }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_wait_until_times_out() {
        let err = wait_until::<(), _, _>("never", Duration::from_millis(20), Duration::from_millis(5), || async {
            Err(Error::not_found("never"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_best_effort_swallows_timeout_only() {
        let gave_up = best_effort::<(), _, _>("never", Duration::from_millis(10), Duration::from_millis(2), || async {
            Ok(None)
        })
        .await
        .unwrap();
        assert!(gave_up.is_none());

        let failed = best_effort::<(), _, _>("broken", Duration::from_millis(10), Duration::from_millis(2), || async {
            Err(Error::IllegalState("no browser".into()))
        })
        .await;
        assert!(failed.is_err());
    }
}
