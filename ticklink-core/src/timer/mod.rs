//! Timer base and software timers
//!
//! A [`TimerBase`] owns the only notion of "now". Any number of
//! [`SoftwareTimer`]s borrow it to measure elapsed time.

pub mod base;
pub mod software;

pub use base::{timer_mask_for_width, TickSource, TimerBase, MAX_WIDTH_BITS, MIN_WIDTH_BITS};
pub use software::{SoftwareTimer, TimeUnit, TimerError};
