use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::config::BreakerConfig;
use crate::error::CercaError;

/// Mutable breaker state, guarded by one mutex so failure counting and
/// open/close transitions cannot race across concurrent requests.
#[derive(Debug)]
struct BreakerState {
    consecutive_blocked: u32,
    open_until: Option<Instant>,
}

/// Per-source circuit breaker.
///
/// Counts *consecutive access-denied* outcomes only: upstream sources that
/// penalize scraping block the caller's network identity, so after
/// `failure_threshold` denials the breaker opens and rejects calls for the
/// cooldown window, giving the source time to forget the caller. Transient
/// network failures never move the counter.
///
/// The breaker does not poll. Once the cooldown elapses, the next `check`
/// admits exactly one probe and restarts the window; the probe's outcome
/// (reported via `record_success`/`record_blocked`) decides whether the
/// breaker closes or stays open.
pub struct CircuitBreaker {
    name: String,
    cfg: BreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Build a breaker for the named logical source.
    pub fn new(name: impl Into<String>, cfg: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            cfg,
            state: Mutex::new(BreakerState {
                consecutive_blocked: 0,
                open_until: None,
            }),
        }
    }

    /// The logical source this breaker guards.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> Result<MutexGuard<'_, BreakerState>, CercaError> {
        self.state
            .lock()
            .map_err(|_| CercaError::internal(format!("breaker state poisoned for {}", self.name)))
    }

    /// Gate an upstream call.
    ///
    /// # Errors
    /// `SourceUnavailable` with the remaining cooldown while open;
    /// `Internal` if the state mutex is poisoned.
    pub fn check(&self) -> Result<(), CercaError> {
        let mut st = self.lock()?;
        if let Some(until) = st.open_until {
            let now = Instant::now();
            if now < until {
                return Err(CercaError::SourceUnavailable {
                    source: self.name.clone(),
                    reset_in_ms: millis_until(now, until),
                });
            }
            // Cooldown elapsed: admit this caller as the single half-open
            // probe and restart the window so concurrent callers stay out
            // until the probe's outcome is known.
            st.open_until = Some(now + self.cfg.cooldown);
        }
        Ok(())
    }

    /// Report a call that reached the source and got an answer (including a
    /// benign "no data"). Closes the breaker and resets the counter.
    ///
    /// # Errors
    /// `Internal` if the state mutex is poisoned.
    pub fn record_success(&self) -> Result<(), CercaError> {
        let mut st = self.lock()?;
        st.consecutive_blocked = 0;
        st.open_until = None;
        Ok(())
    }

    /// Report an access-denied outcome. At the configured threshold the
    /// breaker opens; a denial during a half-open probe re-opens it and
    /// restarts the cooldown.
    ///
    /// # Errors
    /// `Internal` if the state mutex is poisoned.
    pub fn record_blocked(&self) -> Result<(), CercaError> {
        let mut st = self.lock()?;
        st.consecutive_blocked = st.consecutive_blocked.saturating_add(1);
        if st.consecutive_blocked >= self.cfg.failure_threshold {
            let until = Instant::now() + self.cfg.cooldown;
            st.open_until = Some(until);
            tracing::warn!(
                source = %self.name,
                failures = st.consecutive_blocked,
                cooldown_ms = self.cfg.cooldown.as_millis() as u64,
                "circuit breaker opened"
            );
        }
        Ok(())
    }

    /// Whether calls are currently rejected.
    ///
    /// # Errors
    /// `Internal` if the state mutex is poisoned.
    pub fn is_open(&self) -> Result<bool, CercaError> {
        let st = self.lock()?;
        Ok(st
            .open_until
            .is_some_and(|until| Instant::now() < until))
    }
}

fn millis_until(now: Instant, until: Instant) -> u64 {
    u64::try_from(until.duration_since(now).as_millis()).unwrap_or(u64::MAX)
}
