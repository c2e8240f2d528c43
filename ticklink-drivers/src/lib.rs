//! Serial driver implementations
//!
//! Concrete [`SerialDriver`](ticklink_hal::SerialDriver) implementations:
//!
//! - In-memory loopback with fixed-capacity queues, for host tests and
//!   bring-up without hardware
//! - Adapter for any non-blocking `embedded-io` reader/writer

#![no_std]
#![deny(unsafe_code)]

pub mod io;
pub mod loopback;

pub use io::IoSerial;
pub use loopback::LoopbackSerial;
