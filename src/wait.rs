use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{ComfyError, Result};

/// Bookkeeping for one "poll `/history` until it is non-empty" loop.
///
/// The clients own the actual sleeping and HTTP calls; this only decides how
/// long to sleep next and whether to keep going.
#[derive(Debug)]
pub(crate) struct PollWait<'a> {
    prompt_id: &'a str,
    interval: Duration,
    max_wait: Option<Duration>,
    cancel: Option<&'a AtomicBool>,
    started: Instant,
    attempts: u32,
}

impl<'a> PollWait<'a> {
    pub(crate) fn new(
        prompt_id: &'a str,
        interval: Duration,
        max_wait: Option<Duration>,
        cancel: Option<&'a AtomicBool>,
    ) -> Self {
        Self {
            prompt_id,
            interval,
            max_wait,
            cancel,
            started: Instant::now(),
            attempts: 0,
        }
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if let Some(cancel) = self.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(ComfyError::Cancelled {
                    prompt_id: self.prompt_id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// How long to sleep before the next poll, never past the deadline.
    pub(crate) fn next_delay(&self) -> Result<Duration> {
        self.check_cancelled()?;
        let Some(max_wait) = self.max_wait else {
            return Ok(self.interval);
        };
        let waited = self.started.elapsed();
        if waited >= max_wait {
            return Err(ComfyError::Timeout {
                prompt_id: self.prompt_id.to_string(),
                waited,
                attempts: self.attempts,
            });
        }
        Ok(self.interval.min(max_wait - waited))
    }

    pub(crate) fn record_poll(&mut self) {
        self.attempts += 1;
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_wait_uses_interval() {
        let wait = PollWait::new("p", Duration::from_secs(3), None, None);
        assert_eq!(wait.next_delay().unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn test_delay_is_clipped_to_deadline() {
        let wait = PollWait::new(
            "p",
            Duration::from_secs(5),
            Some(Duration::from_millis(200)),
            None,
        );
        assert!(wait.next_delay().unwrap() <= Duration::from_millis(200));
    }

    #[test]
    fn test_deadline_exceeded() {
        let mut wait = PollWait::new("p", Duration::from_millis(1), Some(Duration::ZERO), None);
        wait.record_poll();
        match wait.next_delay() {
            Err(ComfyError::Timeout {
                prompt_id,
                attempts,
                ..
            }) => {
                assert_eq!(prompt_id, "p");
                assert_eq!(attempts, 1);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_cancellation() {
        let flag = AtomicBool::new(false);
        let wait = PollWait::new("p", Duration::from_millis(1), None, Some(&flag));
        assert!(wait.next_delay().is_ok());

        flag.store(true, Ordering::Relaxed);
        assert!(matches!(
            wait.next_delay(),
            Err(ComfyError::Cancelled { .. })
        ));
        assert!(wait.check_cancelled().is_err());
    }

    #[test]
    fn test_attempt_counter() {
        let mut wait = PollWait::new("p", Duration::from_millis(1), None, None);
        assert_eq!(wait.attempts(), 0);
        wait.record_poll();
        wait.record_poll();
        assert_eq!(wait.attempts(), 2);
    }
}
