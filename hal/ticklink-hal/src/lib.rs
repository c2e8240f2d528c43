//! ticklink Hardware Abstraction Layer
//!
//! This crate defines the driver contracts that the ticklink software
//! components are built on. Chip-specific code implements these traits;
//! `ticklink-core` only ever talks to hardware through them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application                            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ticklink-core (timer base, sw timers,  │
//! │                 serial transfer engine) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ticklink-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │   ticklink-   │       │  chip HALs    │
//! │    drivers    │       │               │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`timer::TimerDriver`] - Free-running hardware counter
//! - [`serial::SerialDriver`] - Byte-oriented serial port

#![no_std]
#![deny(unsafe_code)]

pub mod serial;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use serial::{
    ConfigStatus, DataBits, DriverError, FlowControl, Parity, SerialConfig, SerialDriver,
    StopBits,
};
pub use timer::{NoTimerDriver, TimerDriver, TimerEventHandler};
