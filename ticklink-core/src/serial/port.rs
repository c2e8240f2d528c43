//! Serial port transfer engine
//!
//! Wraps a [`SerialDriver`] with one transfer record per direction. The
//! caller's buffers are borrowed for the lifetime of the port and handed
//! back with [`SerialPort::take_rx_buffer`] / [`SerialPort::take_tx_buffer`]
//! once the transfer is over.

use ticklink_hal::{ConfigStatus, SerialConfig, SerialDriver};

use super::transfer::{AsyncTransfer, CompletionCallback};
use super::SerialError;
use crate::timer::TickSource;

/// Serial port
///
/// `run` services RX before TX. The two directions are independent and may
/// both be in progress at the same time.
pub struct SerialPort<'a, D> {
    driver: D,
    configuration: SerialConfig,
    rx: AsyncTransfer<'a>,
    tx: AsyncTransfer<'a>,
    rx_buffer: Option<&'a mut [u8]>,
    tx_buffer: Option<&'a [u8]>,
    is_open: bool,
}

impl<'a, D: SerialDriver> SerialPort<'a, D> {
    /// Create a closed port using the default configuration
    ///
    /// # Arguments
    /// - `tick_source`: Time base for transfer timeouts
    /// - `rx_callback`, `tx_callback`: Completion callbacks. A direction
    ///   without a callback only performs synchronous transfers.
    pub fn new(
        driver: D,
        tick_source: &'a dyn TickSource,
        rx_callback: Option<CompletionCallback<'a>>,
        tx_callback: Option<CompletionCallback<'a>>,
    ) -> Self {
        Self {
            driver,
            configuration: SerialConfig::DEFAULT,
            rx: AsyncTransfer::new(tick_source, rx_callback),
            tx: AsyncTransfer::new(tick_source, tx_callback),
            rx_buffer: None,
            tx_buffer: None,
            is_open: false,
        }
    }

    /// Last successfully applied configuration
    pub fn configuration(&self) -> SerialConfig {
        self.configuration
    }

    /// Open the port with `config`
    ///
    /// On rejection the previous configuration and open state are kept and
    /// the driver's status is returned as the error.
    pub fn open(&mut self, config: SerialConfig) -> Result<(), ConfigStatus> {
        let status = self.driver.init(&config);
        if !status.is_ok() {
            warn!("serial open rejected: {=u8:#b}", status.bits());
            return Err(status);
        }

        debug!("serial open at {=u32} baud", config.baudrate);
        self.configuration = config;
        self.is_open = true;
        Ok(())
    }

    /// Cancel running transfers and release the driver
    ///
    /// Each cancelled transfer reports [`SerialError::Cancelled`] to its
    /// callback before the driver is uninitialized.
    pub fn close(&mut self) {
        self.rx.cancel();
        self.tx.cancel();
        self.driver.uninit();
        self.is_open = false;
    }

    /// Check if the port is open
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Receive `data.len()` bytes
    ///
    /// `timeout_ms` bounds the time without progress; zero waits forever.
    /// Blocks until completion unless the RX callback is set and
    /// `timeout_ms` is non-zero, in which case one step is taken and the
    /// rest happens in [`run`](Self::run).
    ///
    /// A synchronous read with a timeout needs a tick source that advances
    /// on its own, such as a [`TimerBase`](crate::TimerBase) ticked from an
    /// interrupt or one polling a hardware driver.
    ///
    /// Fails with [`SerialError::TransferInProgress`] while a read is
    /// running. The running read and its buffer are left alone, but `data`
    /// is not kept, so check [`is_reading`](Self::is_reading) first when the
    /// borrow matters.
    ///
    /// # Panics
    /// If `data` is empty.
    pub fn read(&mut self, data: &'a mut [u8], timeout_ms: u32) -> Result<(), SerialError> {
        assert!(!data.is_empty(), "read buffer must not be empty");
        self.rx.begin(data.len(), timeout_ms)?;
        self.rx_buffer = Some(data);
        let blocking = self.rx.is_synchronous();
        self.service_rx(blocking)
    }

    /// Transmit all of `data`
    ///
    /// Same timeout, mode and rejection rules as [`read`](Self::read).
    ///
    /// # Panics
    /// If `data` is empty.
    pub fn write(&mut self, data: &'a [u8], timeout_ms: u32) -> Result<(), SerialError> {
        assert!(!data.is_empty(), "write buffer must not be empty");
        self.tx.begin(data.len(), timeout_ms)?;
        self.tx_buffer = Some(data);
        let blocking = self.tx.is_synchronous();
        self.service_tx(blocking)
    }

    /// Receive one byte, blocking without timeout
    pub fn getchar(&mut self) -> Result<u8, SerialError> {
        let mut byte = [0u8; 1];
        self.rx.begin(byte.len(), 0)?;

        let Self { driver, rx, .. } = self;
        rx.run_to_completion(|left| {
            let start = byte.len().saturating_sub(*left);
            driver.read(left, &mut byte[start..])
        })?;

        Ok(byte[0])
    }

    /// Transmit one byte, blocking without timeout
    pub fn putchar(&mut self, data: u8) -> Result<(), SerialError> {
        let byte = [data];
        self.tx.begin(byte.len(), 0)?;

        let Self { driver, tx, .. } = self;
        tx.run_to_completion(|left| {
            let start = byte.len().saturating_sub(*left);
            driver.write(left, &byte[start..])
        })
    }

    /// Advance asynchronous transfers by one step each, RX first
    ///
    /// Must be called periodically for asynchronous transfers to make
    /// progress. Outcomes are delivered through the callbacks.
    pub fn run(&mut self) {
        let _ = self.service_rx(false);
        let _ = self.service_tx(false);
    }

    /// Check if a read is in progress
    pub fn is_reading(&self) -> bool {
        self.rx.is_active()
    }

    /// Check if a write is in progress
    pub fn is_writing(&self) -> bool {
        self.tx.is_active()
    }

    /// Bytes received by the most recent read
    ///
    /// Zero while the read is in progress.
    pub fn bytes_read(&self) -> usize {
        self.rx.transferred()
    }

    /// Bytes sent by the most recent write
    ///
    /// Zero while the write is in progress.
    pub fn bytes_written(&self) -> usize {
        self.tx.transferred()
    }

    /// Hand back the buffer of the last [`read`](Self::read)
    ///
    /// Returns `None` while the read is still in progress.
    pub fn take_rx_buffer(&mut self) -> Option<&'a mut [u8]> {
        if self.rx.is_active() {
            return None;
        }
        self.rx_buffer.take()
    }

    /// Hand back the buffer of the last [`write`](Self::write)
    ///
    /// Returns `None` while the write is still in progress.
    pub fn take_tx_buffer(&mut self) -> Option<&'a [u8]> {
        if self.tx.is_active() {
            return None;
        }
        self.tx_buffer.take()
    }

    /// Enable starvation detection on both timeout timers
    ///
    /// A transfer whose timer starves completes with
    /// [`SerialError::TimerStarving`]. Zero disables detection.
    pub fn set_timer_invocation_limit(&mut self, limit: u32) {
        self.rx.set_invocation_limit(limit);
        self.tx.set_invocation_limit(limit);
    }

    /// Get access to the underlying driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get mutable access to the underlying driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn service_rx(&mut self, blocking: bool) -> Result<(), SerialError> {
        let Self {
            driver,
            rx,
            rx_buffer,
            ..
        } = self;
        let Some(buffer) = rx_buffer.as_deref_mut() else {
            return Ok(());
        };

        let transfer = |left: &mut usize| {
            let start = buffer.len().saturating_sub(*left);
            driver.read(left, &mut buffer[start..])
        };
        if blocking {
            rx.run_to_completion(transfer)
        } else {
            rx.step(transfer)
        }
    }

    fn service_tx(&mut self, blocking: bool) -> Result<(), SerialError> {
        let Self {
            driver,
            tx,
            tx_buffer,
            ..
        } = self;
        let Some(buffer) = tx_buffer.as_deref() else {
            return Ok(());
        };

        let transfer = |left: &mut usize| {
            let start = buffer.len().saturating_sub(*left);
            driver.write(left, &buffer[start..])
        };
        if blocking {
            tx.run_to_completion(transfer)
        } else {
            tx.step(transfer)
        }
    }
}
