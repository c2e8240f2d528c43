//! Hardware timer abstractions
//!
//! A timer driver exposes a free-running counter. The counter width is not
//! part of the contract; the timer base that consumes the driver is told
//! the width separately and masks accordingly.

/// Timer event handler
///
/// Called by interrupt-driven drivers with the current counter value.
/// Polling users register no handler.
pub type TimerEventHandler = fn(counter: u32);

/// Hardware timer driver
pub trait TimerDriver {
    /// Error type for driver operations
    type Error;

    /// Initialize the timer hardware
    ///
    /// # Arguments
    /// * `event_handler` - Handler for timer events, `None` for pure polling
    fn init(&mut self, event_handler: Option<TimerEventHandler>) -> Result<(), Self::Error>;

    /// Release the timer hardware
    fn uninit(&mut self) -> Result<(), Self::Error>;

    /// Start counting
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Stop counting
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Reset the counter to zero
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Current counter value in ticks
    fn count(&self) -> u32;

    /// Check if the timer is counting
    fn is_running(&self) -> bool;
}

impl<T: TimerDriver + ?Sized> TimerDriver for &mut T {
    type Error = T::Error;

    fn init(&mut self, event_handler: Option<TimerEventHandler>) -> Result<(), Self::Error> {
        T::init(self, event_handler)
    }

    fn uninit(&mut self) -> Result<(), Self::Error> {
        T::uninit(self)
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        T::start(self)
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        T::stop(self)
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        T::reset(self)
    }

    fn count(&self) -> u32 {
        T::count(self)
    }

    fn is_running(&self) -> bool {
        T::is_running(self)
    }
}

/// Placeholder driver for timer bases that are ticked from software
///
/// This type has no values, so a timer base parameterized with it can
/// never hold a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoTimerDriver {}

impl TimerDriver for NoTimerDriver {
    type Error = core::convert::Infallible;

    fn init(&mut self, _event_handler: Option<TimerEventHandler>) -> Result<(), Self::Error> {
        match *self {}
    }

    fn uninit(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        match *self {}
    }

    fn count(&self) -> u32 {
        match *self {}
    }

    fn is_running(&self) -> bool {
        match *self {}
    }
}
