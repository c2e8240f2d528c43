//! Timer base
//!
//! Supports two deployment models behind one query interface:
//!
//! - Polling: a [`TimerDriver`] is attached and its hardware counter is
//!   read on every query. [`TimerBase::tick`] is not needed.
//! - Software counting: no driver; an interrupt handler (or a test) calls
//!   [`TimerBase::tick`] to advance the counter.
//!
//! The counter wraps at `timer_mask + 1`, emulating a hardware counter of
//! the configured width.

use core::sync::atomic::{AtomicU32, Ordering};

use ticklink_hal::{NoTimerDriver, TimerDriver};

/// Narrowest supported counter
pub const MIN_WIDTH_BITS: u8 = 1;
/// Widest supported counter
pub const MAX_WIDTH_BITS: u8 = 32;

/// Mask for a counter `width_bits` wide (`2^width - 1`)
pub const fn timer_mask_for_width(width_bits: u8) -> u32 {
    if width_bits >= MAX_WIDTH_BITS {
        u32::MAX
    } else {
        (1u32 << width_bits) - 1
    }
}

/// Source of the current tick count
///
/// Implemented by [`TimerBase`]; software timers only see this trait so
/// that tests can substitute their own clock.
pub trait TickSource {
    /// Current counter value, always `<= timer_mask()`
    fn tick_count(&self) -> u32;

    /// Duration of one tick in microseconds
    fn tick_duration_us(&self) -> u32;

    /// Wrap-around mask of the counter
    fn timer_mask(&self) -> u32;
}

/// Shared tick source for software timers
///
/// The software counter is atomic, so a ticked base can live in a `static`
/// and be advanced from an interrupt handler while timers in the main
/// context hold shared references to it:
///
/// ```
/// use ticklink_core::TimerBase;
///
/// static BASE: TimerBase = TimerBase::ticked(1000, 24);
///
/// fn systick_handler() {
///     BASE.tick(1);
/// }
/// # systick_handler();
/// # assert_eq!(BASE.tick_count(), 1);
/// ```
///
/// [`tick`](Self::tick) must only be called from one context at a time.
pub struct TimerBase<D = NoTimerDriver> {
    tick_counter: AtomicU32,
    tick_duration_us: u32,
    timer_mask: u32,
    driver: Option<D>,
}

impl TimerBase<NoTimerDriver> {
    /// Create a timer base advanced only by [`tick`](Self::tick)
    ///
    /// # Panics
    /// If `tick_duration_us` is zero or `width_bits` is outside `1..=32`.
    /// In a `static` initializer this is a compile error instead.
    pub const fn ticked(tick_duration_us: u32, width_bits: u8) -> Self {
        check_parameters(tick_duration_us, width_bits);
        Self {
            tick_counter: AtomicU32::new(0),
            tick_duration_us,
            timer_mask: timer_mask_for_width(width_bits),
            driver: None,
        }
    }
}

impl<D: TimerDriver> TimerBase<D> {
    /// Create a timer base that polls `driver` for the current count
    ///
    /// The driver is initialized without an event handler.
    ///
    /// # Panics
    /// If `tick_duration_us` is zero or `width_bits` is outside `1..=32`.
    pub fn with_driver(tick_duration_us: u32, width_bits: u8, mut driver: D) -> Result<Self, D::Error> {
        check_parameters(tick_duration_us, width_bits);
        driver.init(None)?;

        let timer_mask = timer_mask_for_width(width_bits);
        debug!(
            "timer base: {=u32} us/tick, mask {=u32:#x}, polling driver",
            tick_duration_us, timer_mask
        );

        Ok(Self {
            tick_counter: AtomicU32::new(0),
            tick_duration_us,
            timer_mask,
            driver: Some(driver),
        })
    }

    /// Uninitialize the attached driver, if any
    pub fn uninit(&mut self) -> Result<(), D::Error> {
        if let Some(driver) = self.driver.as_mut() {
            trace!("timer base: uninit driver");
            driver.uninit()?;
        }
        Ok(())
    }

    /// Consume the base and hand back the driver
    pub fn release(self) -> Option<D> {
        self.driver
    }

    /// Advance the software counter by `count` ticks, wrapping at the mask
    ///
    /// Has no visible effect while a driver is attached, since queries then
    /// read the hardware counter.
    ///
    /// # Panics
    /// If `count` is zero.
    pub fn tick(&self, count: u32) {
        assert!(count > 0, "tick count must be non-zero");
        // Single writer: readers only ever see the old or the new value
        let current = self.tick_counter.load(Ordering::Relaxed);
        let next = current.wrapping_add(count) & self.timer_mask;
        self.tick_counter.store(next, Ordering::Relaxed);
    }

    /// Current tick count
    ///
    /// Reads the hardware counter when a driver is attached, otherwise the
    /// software counter. Either way the value is masked to the configured
    /// width.
    pub fn tick_count(&self) -> u32 {
        match &self.driver {
            Some(driver) => driver.count() & self.timer_mask,
            None => self.tick_counter.load(Ordering::Relaxed),
        }
    }

    /// Duration of one tick in microseconds
    pub fn tick_duration_us(&self) -> u32 {
        self.tick_duration_us
    }

    /// Wrap-around mask of the counter
    pub fn timer_mask(&self) -> u32 {
        self.timer_mask
    }

    /// Get access to the attached driver
    pub fn driver(&self) -> Option<&D> {
        self.driver.as_ref()
    }

    /// Get mutable access to the attached driver
    pub fn driver_mut(&mut self) -> Option<&mut D> {
        self.driver.as_mut()
    }
}

impl<D: TimerDriver> TickSource for TimerBase<D> {
    fn tick_count(&self) -> u32 {
        TimerBase::tick_count(self)
    }

    fn tick_duration_us(&self) -> u32 {
        self.tick_duration_us
    }

    fn timer_mask(&self) -> u32 {
        self.timer_mask
    }
}

const fn check_parameters(tick_duration_us: u32, width_bits: u8) {
    assert!(tick_duration_us > 0, "tick duration must be non-zero");
    assert!(
        width_bits >= MIN_WIDTH_BITS && width_bits <= MAX_WIDTH_BITS,
        "timer width must be within 1..=32 bits"
    );
}
