//! Bounded retry with a fixed jitter window.
//!
//! `Idle -> Requesting -> {Succeeded, Retrying -> Requesting, Failed}`.
//! Every failure is treated alike. The delay between attempts is drawn
//! uniformly from [`JITTER_MIN_MS`]`..=`[`JITTER_MAX_MS`] and never grows.

use std::time::Duration;

use rand::Rng;

use crate::error::TransportError;

/// Total attempts per fetch, the first one included.
pub const MAX_ATTEMPTS: u32 = 6;
pub const JITTER_MIN_MS: u64 = 15;
pub const JITTER_MAX_MS: u64 = 20;

/// Bookkeeping for one fetch call. Never outlives it.
#[derive(Debug, Default)]
pub struct RetryState {
    attempt: u32,
    last_error: Option<String>,
    next_delay: Option<Duration>,
}

impl RetryState {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn next_delay(&self) -> Option<Duration> {
        self.next_delay
    }

    pub fn has_remaining(&self) -> bool {
        self.attempt < MAX_ATTEMPTS
    }

    fn begin(&mut self) -> u32 {
        self.attempt += 1;
        self.next_delay = None;
        self.attempt
    }

    fn schedule(&mut self, err: &TransportError) -> Duration {
        let delay = jitter_delay();
        self.last_error = Some(err.to_string());
        self.next_delay = Some(delay);
        delay
    }
}

pub fn jitter_delay() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(JITTER_MIN_MS..=JITTER_MAX_MS))
}

/// Drive `attempt` until it succeeds or [`MAX_ATTEMPTS`] are used.
///
/// Returns the value with the number of attempts it took, or the last
/// failure untouched. `sleep` runs between attempts only, never after the
/// final one.
pub(crate) fn run<T>(
    req_id: &str,
    mut attempt: impl FnMut(u32) -> Result<T, TransportError>,
    sleep: &dyn Fn(Duration),
) -> Result<(T, u32), TransportError> {
    let mut state = RetryState::default();
    loop {
        let n = state.begin();
        let err = match attempt(n) {
            Ok(value) => return Ok((value, n)),
            Err(err) => err,
        };

        if !state.has_remaining() {
            tracing::warn!(
                req_id,
                attempt = n,
                max_attempts = MAX_ATTEMPTS,
                error = %err,
                "http.error"
            );
            return Err(err);
        }

        let delay = state.schedule(&err);
        tracing::warn!(
            req_id,
            attempt = state.attempt(),
            max_attempts = MAX_ATTEMPTS,
            backoff_ms = delay.as_millis() as u64,
            error = state.last_error().unwrap_or_default(),
            "http.retrying"
        );
        sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;

    fn refused() -> TransportError {
        TransportError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
    }

    #[test]
    fn jitter_stays_in_window() {
        for _ in 0..500 {
            let ms = jitter_delay().as_millis() as u64;
            assert!((JITTER_MIN_MS..=JITTER_MAX_MS).contains(&ms), "{ms}ms");
        }
    }

    #[test]
    fn success_on_first_attempt_does_not_sleep() {
        let slept = RefCell::new(Vec::new());
        let got = run("t", |_| Ok::<_, TransportError>("page"), &|d| {
            slept.borrow_mut().push(d)
        })
        .unwrap();
        assert_eq!(got, ("page", 1));
        assert!(slept.borrow().is_empty());
    }

    #[test]
    fn exhaustion_returns_last_error_after_six_attempts() {
        let slept = RefCell::new(Vec::new());
        let mut seen = Vec::new();
        let err = run(
            "t",
            |n| -> Result<(), _> {
                seen.push(n);
                Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("attempt {n}"),
                )))
            },
            &|d| slept.borrow_mut().push(d),
        )
        .unwrap_err();

        assert_eq!(seen, [1, 2, 3, 4, 5, 6]);
        assert_eq!(slept.borrow().len(), 5);
        assert!(err.to_string().contains("attempt 6"));
    }

    #[test]
    fn recovers_mid_way() {
        let got = run(
            "t",
            |n| if n < 3 { Err(refused()) } else { Ok(n * 10) },
            &|_| {},
        )
        .unwrap();
        assert_eq!(got, (30, 3));
    }

    #[test]
    fn state_tracks_progress() {
        let mut state = RetryState::default();
        assert_eq!(state.begin(), 1);
        let delay = state.schedule(&refused());
        assert_eq!(state.next_delay(), Some(delay));
        assert!(state.last_error().unwrap().contains("refused"));
        for _ in 2..=MAX_ATTEMPTS {
            state.begin();
        }
        assert!(!state.has_remaining());
        assert_eq!(state.next_delay(), None);
    }
}
