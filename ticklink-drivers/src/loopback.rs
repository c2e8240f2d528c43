//! In-memory serial driver
//!
//! Both directions are fixed-capacity byte queues. The port side moves
//! bytes through [`SerialDriver`]; the wire side feeds the receive queue
//! with [`LoopbackSerial::inject`] and collects transmitted bytes with
//! [`LoopbackSerial::drain`].

use heapless::{Deque, Vec};
use ticklink_hal::{ConfigStatus, DriverError, SerialConfig, SerialDriver};

/// Loopback serial driver with `N` bytes of queue per direction
pub struct LoopbackSerial<const N: usize> {
    rx: Deque<u8, N>,
    tx: Deque<u8, N>,
    max_baudrate: u32,
    config: Option<SerialConfig>,
    fail_next: bool,
}

impl<const N: usize> LoopbackSerial<N> {
    /// Fastest rate accepted by [`new`](Self::new)
    pub const DEFAULT_MAX_BAUDRATE: u32 = 921_600;

    /// Create a driver accepting rates up to [`Self::DEFAULT_MAX_BAUDRATE`]
    pub fn new() -> Self {
        Self::with_max_baudrate(Self::DEFAULT_MAX_BAUDRATE)
    }

    /// Create a driver accepting rates up to `max_baudrate`
    pub fn with_max_baudrate(max_baudrate: u32) -> Self {
        Self {
            rx: Deque::new(),
            tx: Deque::new(),
            max_baudrate,
            config: None,
            fail_next: false,
        }
    }

    /// Configuration applied by the last successful `init`
    ///
    /// `None` before `init` and after `uninit`.
    pub fn config(&self) -> Option<SerialConfig> {
        self.config
    }

    /// Queue bytes for the port to receive
    ///
    /// Returns how many bytes fit.
    pub fn inject(&mut self, data: &[u8]) -> usize {
        push_all(&mut self.rx, data)
    }

    /// Take every byte the port has transmitted so far
    pub fn drain(&mut self) -> Vec<u8, N> {
        let mut out = Vec::new();
        while let Some(byte) = self.tx.pop_front() {
            // Same capacity as the queue
            let _ = out.push(byte);
        }
        out
    }

    /// Move transmitted bytes to the receive queue, as a wired loopback does
    ///
    /// Bytes that do not fit stay in the transmit queue.
    pub fn echo(&mut self) -> usize {
        let mut moved = 0;
        while !self.rx.is_full() {
            let Some(byte) = self.tx.pop_front() else {
                break;
            };
            let _ = self.rx.push_back(byte);
            moved += 1;
        }
        moved
    }

    /// Bytes waiting to be received by the port
    pub fn rx_pending(&self) -> usize {
        self.rx.len()
    }

    /// Bytes transmitted by the port and not yet drained
    pub fn tx_pending(&self) -> usize {
        self.tx.len()
    }

    /// Make the next transfer call fail with [`DriverError::HardwareFailure`]
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    fn take_failure(&mut self) -> Result<(), DriverError> {
        if core::mem::take(&mut self.fail_next) {
            #[cfg(feature = "defmt")]
            defmt::warn!("loopback: injected hardware failure");
            return Err(DriverError::HardwareFailure);
        }
        Ok(())
    }
}

impl<const N: usize> Default for LoopbackSerial<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SerialDriver for LoopbackSerial<N> {
    fn init(&mut self, config: &SerialConfig) -> ConfigStatus {
        let limits = ConfigStatus {
            invalid_baudrate: config.baudrate > self.max_baudrate,
            ..ConfigStatus::OK
        };
        let status = config.validate().merge(limits);

        if status.is_ok() {
            self.config = Some(*config);
        }
        status
    }

    fn uninit(&mut self) {
        self.config = None;
    }

    fn read(&mut self, data_left: &mut usize, data: &mut [u8]) -> Result<(), DriverError> {
        self.take_failure()?;
        if self.rx.is_empty() {
            return Err(DriverError::RxBufferEmpty);
        }

        let wanted = (*data_left).min(data.len());
        let mut moved = 0;
        for slot in &mut data[..wanted] {
            let Some(byte) = self.rx.pop_front() else {
                break;
            };
            *slot = byte;
            moved += 1;
        }
        *data_left -= moved;
        Ok(())
    }

    fn write(&mut self, data_left: &mut usize, data: &[u8]) -> Result<(), DriverError> {
        self.take_failure()?;
        if self.tx.is_full() {
            return Err(DriverError::TxBufferFull);
        }

        let wanted = (*data_left).min(data.len());
        *data_left -= push_all(&mut self.tx, &data[..wanted]);
        Ok(())
    }
}

fn push_all<const N: usize>(queue: &mut Deque<u8, N>, data: &[u8]) -> usize {
    let mut pushed = 0;
    for &byte in data {
        if queue.push_back(byte).is_err() {
            break;
        }
        pushed += 1;
    }
    pushed
}
