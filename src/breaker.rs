//! Circuit breaker guarding a downstream callable: closed/open/half-open.
//!
//! State transitions serialize under a single lock; `call` executes the
//! wrapped future outside the lock so a slow downstream call never blocks
//! other callers from observing breaker state.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStatus {
    Closed,
    Open,
    HalfOpen,
}

struct State {
    status: BreakerStatus,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    /// Whether the single half-open probe has already been admitted for
    /// this open window.
    probe_admitted: bool,
}

pub struct CircuitBreaker {
    name: String,
    max_failures: u32,
    reset_timeout: Duration,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, max_failures: u32, reset_timeout: Duration) -> Self {
        CircuitBreaker {
            name: name.into(),
            max_failures,
            reset_timeout,
            state: Mutex::new(State {
                status: BreakerStatus::Closed,
                consecutive_failures: 0,
                last_failure: None,
                probe_admitted: false,
            }),
        }
    }

    pub fn status(&self) -> BreakerStatus {
        self.state.lock().unwrap().status
    }

    /// Decides, under the lock, whether this call may proceed. Returns
    /// `None` when the breaker is open and no probe may be admitted.
    fn admit(&self) -> Option<bool> {
        let mut state = self.state.lock().unwrap();
        match state.status {
            BreakerStatus::Closed => Some(false),
            BreakerStatus::HalfOpen => {
                if state.probe_admitted {
                    None
                } else {
                    state.probe_admitted = true;
                    Some(true)
                }
            }
            BreakerStatus::Open => {
                let elapsed = state.last_failure.map(|t| t.elapsed()).unwrap_or(Duration::MAX);
                if elapsed >= self.reset_timeout {
                    state.status = BreakerStatus::HalfOpen;
                    state.probe_admitted = true;
                    Some(true)
                } else {
                    None
                }
            }
        }
    }

    fn record_success(&self, was_probe: bool) {
        let mut state = self.state.lock().unwrap();
        if was_probe || state.status == BreakerStatus::HalfOpen {
            state.status = BreakerStatus::Closed;
        }
        state.consecutive_failures = 0;
        state.probe_admitted = false;
        state.last_failure = None;
    }

    fn record_failure(&self) {
        let mut state = self.state.lock().unwrap();
        state.last_failure = Some(Instant::now());
        state.probe_admitted = false;
        match state.status {
            BreakerStatus::HalfOpen => {
                state.status = BreakerStatus::Open;
            }
            BreakerStatus::Closed => {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= self.max_failures {
                    state.status = BreakerStatus::Open;
                }
            }
            BreakerStatus::Open => {}
        }
    }

    /// Executes `fn` when the state is closed, or when half-open and this is
    /// the first admitted probe; otherwise fails immediately with
    /// `breaker-open`, never invoking `f`.
    pub async fn call<F, Fut, T>(&self, f: F) -> Result<T, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, GatewayError>>,
    {
        let was_probe = match self.admit() {
            Some(was_probe) => was_probe,
            None => return Err(GatewayError::BreakerOpen(self.name.clone())),
        };

        match f().await {
            Ok(value) => {
                self.record_success(was_probe);
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_after_max_consecutive_failures() {
        let breaker = CircuitBreaker::new("test", 5, Duration::from_millis(50));
        for _ in 0..5 {
            let result = breaker
                .call(|| async { Err::<(), _>(GatewayError::UpstreamUnavailable("down".into())) })
                .await;
            assert!(result.is_err());
        }
        assert_eq!(breaker.status(), BreakerStatus::Open);

        let result = breaker.call(|| async { Ok(()) }).await;
        assert!(matches!(result, Err(GatewayError::BreakerOpen(_))));
    }

    #[tokio::test]
    async fn half_open_probe_success_closes_breaker() {
        let breaker = CircuitBreaker::new("test", 1, Duration::from_millis(20));
        let _ = breaker
            .call(|| async { Err::<(), _>(GatewayError::UpstreamUnavailable("down".into())) })
            .await;
        assert_eq!(breaker.status(), BreakerStatus::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;

        let result = breaker.call(|| async { Ok(()) }).await;
        assert!(result.is_ok());
        assert_eq!(breaker.status(), BreakerStatus::Closed);
    }

    #[tokio::test]
    async fn half_open_probe_failure_reopens_with_timer_reset() {
        let breaker = CircuitBreaker::new("test", 1, Duration::from_millis(20));
        let _ = breaker
            .call(|| async { Err::<(), _>(GatewayError::UpstreamUnavailable("down".into())) })
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let result = breaker
            .call(|| async { Err::<(), _>(GatewayError::UpstreamUnavailable("still down".into())) })
            .await;
        assert!(result.is_err());
        assert_eq!(breaker.status(), BreakerStatus::Open);

        // Immediately after the failed probe, the breaker must still refuse.
        let result = breaker.call(|| async { Ok(()) }).await;
        assert!(matches!(result, Err(GatewayError::BreakerOpen(_))));
    }

    #[tokio::test]
    async fn only_one_probe_admitted_per_half_open_window() {
        let breaker = CircuitBreaker::new("test", 1, Duration::from_millis(10));
        let _ = breaker
            .call(|| async { Err::<(), _>(GatewayError::UpstreamUnavailable("down".into())) })
            .await;
        tokio::time::sleep(Duration::from_millis(15)).await;

        // First admitted call becomes the probe and hangs deliberately long
        // enough for a second concurrent call to observe half-open-but-busy.
        let breaker = std::sync::Arc::new(breaker);
        let b2 = std::sync::Arc::clone(&breaker);
        let probe = tokio::spawn(async move {
            b2.call(|| async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok::<_, GatewayError>(())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = breaker.call(|| async { Ok(()) }).await;
        assert!(matches!(second, Err(GatewayError::BreakerOpen(_))));
        probe.await.unwrap().unwrap();
    }
}
