//! Serial port with synchronous and polled asynchronous transfers
//!
//! A transfer runs synchronously (the call blocks until the transfer
//! completes) when the direction has no completion callback or when the
//! timeout is zero. Otherwise the call performs one step and returns;
//! further steps happen in [`SerialPort::run`].

pub mod port;
pub mod transfer;

use core::fmt;

pub use port::SerialPort;
pub use transfer::{Completion, CompletionCallback};

/// Serial port errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// A transfer in this direction is already running
    TransferInProgress,
    /// Receiver buffer empty
    ///
    /// Reserved. Transfers treat an empty receiver as a step without
    /// progress and run into [`Timeout`](Self::Timeout) instead.
    RxBufferEmpty,
    /// Transmitter buffer full
    ///
    /// Reserved, see [`RxBufferEmpty`](Self::RxBufferEmpty).
    TxBufferFull,
    /// Transfer cancelled by closing the port
    Cancelled,
    /// Hardware or transmission line failure
    TransferFailed,
    /// No progress within the transfer timeout
    Timeout,
    /// The timeout timer's tick source stopped advancing
    TimerStarving,
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferInProgress => f.write_str("transfer already in progress"),
            Self::RxBufferEmpty => f.write_str("receive buffer empty"),
            Self::TxBufferFull => f.write_str("transmit buffer full"),
            Self::Cancelled => f.write_str("transfer cancelled"),
            Self::TransferFailed => f.write_str("transfer failed"),
            Self::Timeout => f.write_str("transfer timed out"),
            Self::TimerStarving => f.write_str("timeout timer is starving"),
        }
    }
}
