//! Software timer
//!
//! A stopwatch on top of a [`TickSource`]. Elapsed time is measured from
//! the tick count sampled at [`SoftwareTimer::start`], so one counter wrap
//! between start and query is handled. More than one wrap cannot be seen
//! from two samples and reads as a shorter interval.
//!
//! # Starvation
//!
//! When an invocation limit is set, every [`SoftwareTimer::elapsed`] call
//! compares the raw tick count with the one seen on the previous call.
//! If the count has not moved for more than `limit` consecutive calls the
//! tick source is considered stalled and the query fails with
//! [`TimerError::Starving`].
//!
//! Detection is compiled in by the `starvation` cargo feature (on by
//! default). Without it the limit is still stored but never acted on.

use core::fmt;

use super::base::TickSource;

const US_PER_MS: u64 = 1_000;
const US_PER_S: u64 = 1_000_000;

/// Unit for elapsed time queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeUnit {
    /// Raw timer ticks
    Ticks,
    /// Microseconds
    Micros,
    /// Milliseconds
    Millis,
    /// Seconds
    Seconds,
}

/// Errors from software timer queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// The tick source stopped advancing
    Starving,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starving => f.write_str("tick source is not advancing"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct StarvationTracker {
    /// Zero disables detection
    invocation_limit: u32,
    invocation_count: u32,
    last_tick_count: u32,
}

impl StarvationTracker {
    fn reset(&mut self, tick_count: u32) {
        self.last_tick_count = tick_count;
        self.invocation_count = 0;
    }

    fn is_enabled(&self) -> bool {
        cfg!(feature = "starvation") && self.invocation_limit != 0
    }

    fn is_starving(&mut self, tick_count: u32) -> bool {
        if !self.is_enabled() {
            return false;
        }

        if tick_count == self.last_tick_count {
            self.invocation_count = self.invocation_count.saturating_add(1);
        } else {
            self.invocation_count = 0;
            self.last_tick_count = tick_count;
        }

        self.invocation_count > self.invocation_limit
    }
}

/// Stopwatch bound to one tick source
///
/// Tick duration and mask are copied from the source when the timer is
/// created and are not re-read afterwards.
pub struct SoftwareTimer<'a> {
    base: &'a dyn TickSource,
    startup_sample: u32,
    tick_duration_us: u32,
    timer_mask: u32,
    starvation: StarvationTracker,
}

impl<'a> SoftwareTimer<'a> {
    /// Bind a new timer to `base`
    ///
    /// Starvation detection starts out disabled.
    pub fn new(base: &'a dyn TickSource) -> Self {
        Self {
            base,
            startup_sample: 0,
            tick_duration_us: base.tick_duration_us(),
            timer_mask: base.timer_mask(),
            starvation: StarvationTracker::default(),
        }
    }

    /// Configure starvation detection
    ///
    /// `limit` is the number of consecutive stalled queries tolerated.
    /// Zero disables detection.
    pub fn set_invocation_limit(&mut self, limit: u32) {
        self.starvation.invocation_limit = limit;
    }

    /// Currently configured invocation limit
    pub fn invocation_limit(&self) -> u32 {
        self.starvation.invocation_limit
    }

    /// Check if starvation detection is active
    pub fn is_starvation_detection_enabled(&self) -> bool {
        self.starvation.is_enabled()
    }

    /// Restart the stopwatch from the current tick count
    pub fn start(&mut self) {
        self.startup_sample = self.base.tick_count();
        self.starvation.reset(self.startup_sample);
    }

    /// Time elapsed since the last [`start`](Self::start)
    ///
    /// Conversions use integer arithmetic and truncate. Results that do not
    /// fit in a `u32` saturate.
    pub fn elapsed(&mut self, unit: TimeUnit) -> Result<u32, TimerError> {
        let raw = self.base.tick_count();
        let ticks = elapsed_ticks(self.timer_mask, self.startup_sample, raw);

        if self.starvation.is_starving(raw) {
            warn!(
                "software timer starving: tick count stuck at {=u32} for {=u32} queries",
                raw, self.starvation.invocation_count
            );
            return Err(TimerError::Starving);
        }

        Ok(convert_ticks(ticks, self.tick_duration_us, unit))
    }
}

/// Ticks between `startup` and `now`, allowing for one counter wrap
fn elapsed_ticks(timer_mask: u32, startup: u32, now: u32) -> u32 {
    if startup <= now {
        now - startup
    } else {
        timer_mask.wrapping_sub(startup).wrapping_add(now).wrapping_add(1)
    }
}

fn convert_ticks(ticks: u32, tick_duration_us: u32, unit: TimeUnit) -> u32 {
    let us = u64::from(ticks) * u64::from(tick_duration_us);
    let value = match unit {
        TimeUnit::Ticks => return ticks,
        TimeUnit::Micros => us,
        TimeUnit::Millis => us / US_PER_MS,
        TimeUnit::Seconds => us / US_PER_S,
    };
    u32::try_from(value).unwrap_or(u32::MAX)
}
