//! Board-agnostic timing and serial transfer logic
//!
//! This crate contains the software components built on top of the
//! `ticklink-hal` driver traits:
//!
//! - Timer base: one tick source shared by many software timers
//! - Software timers with wrap-around handling and starvation detection
//! - Serial port transfer engine with synchronous and polled transfers
//!
//! Everything runs in a single execution context. Asynchronous progress
//! only happens when the owner calls [`serial::SerialPort::run`].

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod serial;
pub mod timer;

pub use serial::{Completion, CompletionCallback, SerialError, SerialPort};
pub use timer::{SoftwareTimer, TickSource, TimeUnit, TimerBase, TimerError};
