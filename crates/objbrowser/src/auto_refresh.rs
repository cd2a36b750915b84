//! Periodic refresh driven by the host's event loop

use std::time::{Duration, Instant};

use anyhow::{ensure, Result};
use log::{debug, trace};

/// Decides when the next automatic refresh is due.
///
/// The timer does not run anything by itself: the host polls it with the
/// current time, and a due tick runs one refresh synchronously through
/// [`tick`](Self::tick). A tick that arrives while a refresh is still in
/// flight is skipped, never run alongside it.
#[derive(Debug, Clone)]
pub struct RefreshTimer {
    interval: Duration,
    enabled: bool,
    next_due: Option<Instant>,
    in_flight: bool,
    skipped: u64,
}

impl RefreshTimer {
    /// A disabled timer with the given interval, which must be non-zero
    pub fn new(interval: Duration) -> Result<Self> {
        ensure!(!interval.is_zero(), "refresh interval must be > 0");
        Ok(Self {
            interval,
            enabled: false,
            next_due: None,
            in_flight: false,
            skipped: 0,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration, now: Instant) -> Result<()> {
        ensure!(!interval.is_zero(), "refresh interval must be > 0");
        self.interval = interval;
        if self.enabled {
            self.next_due = now.checked_add(interval);
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start or stop the timer; starting schedules the first tick one interval out
    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        debug!("auto refresh {}", if enabled { "on" } else { "off" });
        self.enabled = enabled;
        self.next_due = enabled.then(|| now.checked_add(self.interval)).flatten();
    }

    /// Time left until the next tick, if the timer runs.
    ///
    /// An interval too long to schedule never comes due.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Ticks dropped because a refresh was still running
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Returns true if a tick is due at `now`, and schedules the next one.
    ///
    /// A due tick that finds a refresh in flight is counted as skipped.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        self.next_due = now.checked_add(self.interval);
        if self.in_flight {
            self.skipped += 1;
            debug!("skipping refresh tick, previous refresh still running");
            return false;
        }
        true
    }

    /// Mark a refresh as started
    pub fn begin(&mut self) {
        self.in_flight = true;
    }

    /// Mark the running refresh as done
    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    /// Run `refresh` if a tick is due at `now`
    pub fn tick<R>(&mut self, now: Instant, refresh: impl FnOnce() -> R) -> Option<R> {
        if !self.poll(now) {
            return None;
        }
        trace!("refresh tick");
        self.begin();
        let result = refresh();
        self.finish();
        Some(result)
    }
}

impl Default for RefreshTimer {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            enabled: false,
            next_due: None,
            in_flight: false,
            skipped: 0,
        }
    }
}
