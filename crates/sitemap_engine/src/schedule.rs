use std::time::Duration;

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(400);

/// How status polls are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSchedule {
    /// Wall-clock ticks. A slow response does not delay the next tick, so
    /// requests may overlap.
    Fixed { period: Duration },
    /// Self-pacing: wait for each response, then sleep. The delay grows by
    /// `factor` while nothing changes and snaps back to `initial` on progress.
    Backoff {
        initial: Duration,
        max: Duration,
        factor: u32,
    },
}

impl Default for PollSchedule {
    fn default() -> Self {
        PollSchedule::Fixed {
            period: DEFAULT_POLL_PERIOD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    factor: u32,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, factor: u32) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            factor: factor.max(1),
            current: initial,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// Delay to wait after a response, given whether it showed progress.
    pub fn next_delay(&mut self, progressed: bool) -> Duration {
        self.current = if progressed {
            self.initial
        } else {
            self.current.saturating_mul(self.factor).min(self.max)
        };
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fixed_400ms() {
        assert_eq!(
            PollSchedule::default(),
            PollSchedule::Fixed {
                period: Duration::from_millis(400)
            }
        );
    }

    #[test]
    fn backoff_grows_until_capped_and_resets_on_progress() {
        let mut backoff =
            Backoff::new(Duration::from_millis(400), Duration::from_millis(2000), 2);
        assert_eq!(backoff.next_delay(false), Duration::from_millis(800));
        assert_eq!(backoff.next_delay(false), Duration::from_millis(1600));
        assert_eq!(backoff.next_delay(false), Duration::from_millis(2000));
        assert_eq!(backoff.next_delay(false), Duration::from_millis(2000));
        assert_eq!(backoff.next_delay(true), Duration::from_millis(400));
    }

    #[test]
    fn backoff_sanitizes_inputs() {
        let mut backoff = Backoff::new(Duration::from_millis(500), Duration::from_millis(100), 0);
        assert_eq!(backoff.next_delay(false), Duration::from_millis(500));
        assert_eq!(backoff.current(), Duration::from_millis(500));
    }
}
