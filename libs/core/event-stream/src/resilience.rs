//! Circuit guard: bounded retry inside a circuit breaker, with a fallback.
//!
//! ## States
//!
//! ```text
//! ┌─────────┐  failures >= threshold  ┌────────┐
//! │ CLOSED  │ ──────────────────────> │  OPEN  │ ──> fallback, operation skipped
//! └─────────┘                         └────────┘
//!      ^                                   │
//!      │                                   │ cooldown elapsed (checked on next call)
//!      │                                   v
//!      │      probe succeeds       ┌─────────────┐
//!      └────────────────────────── │ HALF-OPEN   │  one probe, no retry
//!                                  └─────────────┘
//!                                        │ probe fails
//!                                        └──────────> OPEN (cooldown restarts)
//! ```
//!
//! While CLOSED, each call runs the operation up to `retry.max_attempts`
//! times with exponential backoff. Only an exhausted retry counts as a
//! failure, and any success clears the failure counter.
//!
//! ## Example
//!
//! ```rust,ignore
//! let guard = CircuitGuard::new("event-publish", CircuitBreakerConfig::default());
//!
//! let id = guard
//!     .call(
//!         || async { send().await },
//!         |err| async move {
//!             tracing::warn!(error = %err, "falling back");
//!             None
//!         },
//!     )
//!     .await;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow to the operation.
    Closed,
    /// Calls go straight to the fallback until the cooldown elapses.
    Open,
    /// A single probe call decides between CLOSED and OPEN.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        })
    }
}

/// Retry applied to each guarded call while the circuit is closed.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// First sleep, never longer than `max_backoff`.
    pub fn first_backoff(&self) -> Duration {
        self.initial_backoff.min(self.max_backoff)
    }

    fn next_backoff(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Configuration for the circuit guard.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed calls (after retry) that open the circuit.
    pub failure_threshold: u32,
    /// Time spent OPEN before a probe is allowed.
    pub cooldown: Duration,
    pub retry: RetryPolicy,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Why a guarded call did not produce a value.
#[derive(Debug, Error)]
pub enum GuardError<E> {
    /// The circuit rejected the call without running the operation.
    #[error("circuit '{0}' is open")]
    Open(String),

    /// The operation ran and failed; carries the last error.
    #[error("{0}")]
    Failed(E),
}

impl<E> GuardError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, GuardError::Open(_))
    }

    /// The operation's error, if it ran.
    pub fn into_inner(self) -> Option<E> {
        match self {
            GuardError::Failed(e) => Some(e),
            GuardError::Open(_) => None,
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    changed_at: Instant,
    probe_in_flight: bool,
}

enum Admission {
    Closed,
    Probe,
    Rejected,
}

/// Thread-safe circuit guard for one logical channel.
#[derive(Debug)]
pub struct CircuitGuard {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitGuard {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failures: 0,
                changed_at: Instant::now(),
                probe_in_flight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. OPEN moves to HALF_OPEN lazily, on the next call after
    /// the cooldown, so this can report OPEN past the cooldown.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failures
    }

    /// Force the circuit CLOSED and clear the failure counter.
    pub fn reset(&self) {
        let mut s = self.lock();
        self.transition(&mut s, CircuitState::Closed);
    }

    /// Run `operation` under the guard, handing any failure to `fallback`.
    ///
    /// The fallback receives [`GuardError::Open`] when the circuit short-circuits
    /// and [`GuardError::Failed`] with the triggering error otherwise. Its output
    /// becomes the result of the call.
    pub async fn call<T, E, F, Fut, FB, FbFut>(&self, operation: F, fallback: FB) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        FB: FnOnce(GuardError<E>) -> FbFut,
        FbFut: Future<Output = T>,
    {
        match self.try_call(operation).await {
            Ok(value) => value,
            Err(err) => fallback(err).await,
        }
    }

    /// Run `operation` under the guard without a fallback.
    pub async fn try_call<T, E, F, Fut>(&self, mut operation: F) -> Result<T, GuardError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        match self.admit() {
            Admission::Rejected => {
                debug!(circuit = %self.name, "Circuit open, skipping operation");
                Err(GuardError::Open(self.name.clone()))
            }
            Admission::Probe => {
                let mut ticket = ProbeTicket {
                    guard: self,
                    settled: false,
                };
                let result = operation().await;
                ticket.settled = true;
                self.settle(result)
            }
            Admission::Closed => {
                let result = self.run_with_retry(&mut operation).await;
                self.settle(result)
            }
        }
    }

    fn settle<T, E: fmt::Display>(&self, result: Result<T, E>) -> Result<T, GuardError<E>> {
        match result {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure(&e);
                Err(GuardError::Failed(e))
            }
        }
    }

    async fn run_with_retry<T, E, F, Fut>(&self, operation: &mut F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let policy = &self.config.retry;
        let max_attempts = policy.max_attempts.max(1);
        let mut backoff = policy.first_backoff();
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    debug!(
                        circuit = %self.name,
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Guarded operation failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = policy.next_backoff(backoff);
                    attempt += 1;
                }
            }
        }
    }

    fn admit(&self) -> Admission {
        let mut s = self.lock();
        match s.state {
            CircuitState::Closed => Admission::Closed,
            CircuitState::Open if s.changed_at.elapsed() >= self.config.cooldown => {
                self.transition(&mut s, CircuitState::HalfOpen);
                s.probe_in_flight = true;
                Admission::Probe
            }
            CircuitState::Open => Admission::Rejected,
            CircuitState::HalfOpen if s.probe_in_flight => Admission::Rejected,
            CircuitState::HalfOpen => {
                s.probe_in_flight = true;
                Admission::Probe
            }
        }
    }

    fn record_success(&self) {
        let mut s = self.lock();
        match s.state {
            CircuitState::Closed => s.failures = 0,
            CircuitState::HalfOpen => self.transition(&mut s, CircuitState::Closed),
            // A call admitted before the circuit opened; the cooldown still decides.
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self, error: &dyn fmt::Display) {
        let mut s = self.lock();
        match s.state {
            CircuitState::Closed => {
                s.failures += 1;
                debug!(
                    circuit = %self.name,
                    failures = s.failures,
                    threshold = self.config.failure_threshold,
                    error = %error,
                    "Guarded call failed"
                );
                if s.failures >= self.config.failure_threshold {
                    self.transition(&mut s, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                warn!(circuit = %self.name, error = %error, "Half-open probe failed");
                self.transition(&mut s, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    fn transition(&self, s: &mut BreakerState, to: CircuitState) {
        let from = s.state;
        s.state = to;
        s.changed_at = Instant::now();
        s.probe_in_flight = false;

        match to {
            CircuitState::Open => warn!(
                circuit = %self.name,
                %from,
                failures = s.failures,
                cooldown_secs = self.config.cooldown.as_secs(),
                "Circuit breaker OPENED"
            ),
            CircuitState::HalfOpen => {
                info!(circuit = %self.name, %from, "Circuit breaker HALF-OPEN (probing)")
            }
            CircuitState::Closed => {
                s.failures = 0;
                info!(circuit = %self.name, %from, "Circuit breaker CLOSED")
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Frees the half-open probe slot if the probe future is dropped mid-flight.
struct ProbeTicket<'a> {
    guard: &'a CircuitGuard,
    settled: bool,
}

impl Drop for ProbeTicket<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut s = self.guard.lock();
            if s.state == CircuitState::HalfOpen {
                s.probe_in_flight = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    fn guard(threshold: u32, retry: RetryPolicy) -> CircuitGuard {
        CircuitGuard::new(
            "test-channel",
            CircuitBreakerConfig::new()
                .with_failure_threshold(threshold)
                .with_cooldown(Duration::from_secs(30))
                .with_retry(retry),
        )
    }

    async fn fail(guard: &CircuitGuard) -> Result<(), GuardError<String>> {
        guard
            .try_call(|| async { Err::<(), _>("broker down".to_string()) })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_passes_through_and_clears_failures() {
        let guard = guard(3, RetryPolicy::none());
        fail(&guard).await.unwrap_err();
        assert_eq!(guard.failure_count(), 1);

        let value = guard.try_call(|| async { Ok::<_, String>(7) }).await.unwrap();

        assert_eq!(value, 7);
        assert_eq!(guard.failure_count(), 0);
        assert_eq!(guard.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_inside_circuit_counts_as_one_failure() {
        let guard = guard(5, RetryPolicy::default());
        let calls = AtomicU32::new(0);

        let result = guard
            .try_call(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("timeout".to_string())
            })
            .await;

        assert!(matches!(result, Err(GuardError::Failed(ref e)) if e == "timeout"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(guard.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_before_counting_a_failure() {
        let guard = guard(5, RetryPolicy::default());
        let calls = AtomicU32::new(0);

        let result = guard
            .try_call(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("flaky".to_string())
                } else {
                    Ok("0-1")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "0-1");
        assert_eq!(guard.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_at_threshold_and_short_circuits() {
        let guard = guard(2, RetryPolicy::none());
        fail(&guard).await.unwrap_err();
        assert_eq!(guard.state(), CircuitState::Closed);
        fail(&guard).await.unwrap_err();
        assert_eq!(guard.state(), CircuitState::Open);

        let calls = AtomicU32::new(0);
        let outcome = guard
            .call(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>("sent")
                },
                |err| async move {
                    assert!(err.is_open());
                    "parked"
                },
            )
            .await;

        assert_eq!(outcome, "parked");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_receives_triggering_error() {
        let guard = guard(5, RetryPolicy::none());

        let seen = guard
            .call(
                || async { Err::<String, _>("serialization failed".to_string()) },
                |err| async move { err.into_inner().unwrap_or_default() },
            )
            .await;

        assert_eq!(seen, "serialization failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_probe_success_closes() {
        let guard = guard(1, RetryPolicy::default());
        fail(&guard).await.unwrap_err();
        assert_eq!(guard.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(fail(&guard).await.unwrap_err().is_open());

        tokio::time::advance(Duration::from_secs(1)).await;
        guard.try_call(|| async { Ok::<_, String>(()) }).await.unwrap();

        assert_eq!(guard.state(), CircuitState::Closed);
        assert_eq!(guard.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_probe_is_single_attempt_and_failure_reopens() {
        let guard = guard(1, RetryPolicy::default());
        fail(&guard).await.unwrap_err();
        tokio::time::advance(Duration::from_secs(30)).await;

        let calls = AtomicU32::new(0);
        let result = guard
            .try_call(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("still down".to_string())
            })
            .await;

        assert!(matches!(result, Err(GuardError::Failed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(guard.state(), CircuitState::Open);

        // cooldown restarted at the failed probe
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(fail(&guard).await.unwrap_err().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_rejected_while_probe_in_flight() {
        let guard = guard(1, RetryPolicy::none());
        fail(&guard).await.unwrap_err();
        tokio::time::advance(Duration::from_secs(30)).await;

        let release = Notify::new();
        let (probe, other) = tokio::join!(
            guard.try_call(|| async {
                release.notified().await;
                Ok::<_, String>("probe")
            }),
            async {
                let r = guard.try_call(|| async { Ok::<_, String>("other") }).await;
                release.notify_one();
                r
            }
        );

        assert_eq!(probe.unwrap(), "probe");
        assert!(other.unwrap_err().is_open());
        assert_eq!(guard.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_probe_frees_the_slot() {
        let guard = guard(1, RetryPolicy::none());
        fail(&guard).await.unwrap_err();
        tokio::time::advance(Duration::from_secs(30)).await;

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            guard.try_call(|| std::future::pending::<Result<(), String>>()),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(guard.state(), CircuitState::HalfOpen);

        guard.try_call(|| async { Ok::<_, String>(()) }).await.unwrap();
        assert_eq!(guard.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_forces_closed() {
        let guard = guard(1, RetryPolicy::none());
        fail(&guard).await.unwrap_err();
        assert_eq!(guard.state(), CircuitState::Open);

        guard.reset();

        assert_eq!(guard.state(), CircuitState::Closed);
        assert_eq!(guard.failure_count(), 0);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        let mut backoff = policy.initial_backoff;
        for _ in 0..10 {
            backoff = policy.next_backoff(backoff);
        }
        assert_eq!(backoff, policy.max_backoff);
    }

    #[test]
    fn test_oversized_backoff_is_clamped() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_secs(60),
            multiplier: f64::MAX,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.first_backoff(), Duration::from_secs(2));
        assert_eq!(policy.next_backoff(Duration::MAX), Duration::from_secs(2));
        assert_eq!(policy.next_backoff(Duration::from_millis(500)), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_sleep_respects_max_backoff() {
        let guard = CircuitGuard::new(
            "slow-start",
            CircuitBreakerConfig::new().with_retry(RetryPolicy {
                max_attempts: 2,
                initial_backoff: Duration::from_secs(60),
                ..RetryPolicy::default()
            }),
        );
        let started = tokio::time::Instant::now();

        let result = guard.try_call(|| async { Err::<(), _>("down") }).await;

        assert!(result.is_err());
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
