//! `embedded-io` serial adapter
//!
//! Drives any reader/writer implementing the `embedded-io` traits as a
//! [`SerialDriver`]. Each call checks readiness first so that a transfer
//! step never blocks.

use embedded_io::{Error, Read, ReadReady, Write, WriteReady};
use ticklink_hal::{ConfigStatus, DriverError, SerialConfig, SerialDriver};

/// Serial driver over an `embedded-io` stream
///
/// The stream is expected to be configured by its owner (baud rate, framing)
/// before it is handed over; `init` only checks the driver-independent
/// fields.
pub struct IoSerial<T> {
    io: T,
    config: Option<SerialConfig>,
}

impl<T> IoSerial<T> {
    /// Wrap `io`
    pub fn new(io: T) -> Self {
        Self { io, config: None }
    }

    /// Configuration applied by the last successful `init`
    pub fn config(&self) -> Option<SerialConfig> {
        self.config
    }

    /// Get access to the wrapped stream
    pub fn io(&self) -> &T {
        &self.io
    }

    /// Get mutable access to the wrapped stream
    pub fn io_mut(&mut self) -> &mut T {
        &mut self.io
    }

    /// Unwrap the stream
    pub fn release(self) -> T {
        self.io
    }
}

impl<T> SerialDriver for IoSerial<T>
where
    T: Read + ReadReady + Write + WriteReady,
{
    fn init(&mut self, config: &SerialConfig) -> ConfigStatus {
        let status = config.validate();
        if status.is_ok() {
            self.config = Some(*config);
        }
        status
    }

    fn uninit(&mut self) {
        self.config = None;
    }

    fn read(&mut self, data_left: &mut usize, data: &mut [u8]) -> Result<(), DriverError> {
        if !self.io.read_ready().map_err(hardware_failure)? {
            return Err(DriverError::RxBufferEmpty);
        }

        let wanted = (*data_left).min(data.len());
        if wanted == 0 {
            return Ok(());
        }
        let n = self.io.read(&mut data[..wanted]).map_err(hardware_failure)?;
        *data_left -= n.min(wanted);
        Ok(())
    }

    fn write(&mut self, data_left: &mut usize, data: &[u8]) -> Result<(), DriverError> {
        if !self.io.write_ready().map_err(hardware_failure)? {
            return Err(DriverError::TxBufferFull);
        }

        let wanted = (*data_left).min(data.len());
        if wanted == 0 {
            return Ok(());
        }
        let n = self.io.write(&data[..wanted]).map_err(hardware_failure)?;
        *data_left -= n.min(wanted);
        Ok(())
    }
}

fn hardware_failure<E: Error>(error: E) -> DriverError {
    #[cfg(feature = "defmt")]
    defmt::warn!("serial io error: {}", defmt::Debug2Format(&error.kind()));
    #[cfg(not(feature = "defmt"))]
    let _ = error;
    DriverError::HardwareFailure
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{ErrorKind, ErrorType};
    use heapless::{Deque, Vec};

    /// Stream with a bounded transmit window per call
    #[derive(Default)]
    struct MockIo {
        incoming: Deque<u8, 16>,
        sent: Vec<u8, 16>,
        tx_room: usize,
        fail: bool,
        reads: usize,
        writes: usize,
    }

    impl ErrorType for MockIo {
        type Error = ErrorKind;
    }

    impl Read for MockIo {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
            self.reads += 1;
            if self.fail {
                return Err(ErrorKind::Other);
            }
            let mut n = 0;
            for slot in buf.iter_mut() {
                let Some(byte) = self.incoming.pop_front() else {
                    break;
                };
                *slot = byte;
                n += 1;
            }
            Ok(n)
        }
    }

    impl ReadReady for MockIo {
        fn read_ready(&mut self) -> Result<bool, ErrorKind> {
            Ok(!self.incoming.is_empty())
        }
    }

    impl Write for MockIo {
        fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
            self.writes += 1;
            if self.fail {
                return Err(ErrorKind::BrokenPipe);
            }
            let n = buf.len().min(self.tx_room);
            let _ = self.sent.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), ErrorKind> {
            Ok(())
        }
    }

    impl WriteReady for MockIo {
        fn write_ready(&mut self) -> Result<bool, ErrorKind> {
            Ok(self.tx_room > 0)
        }
    }

    #[test]
    fn test_init_checks_config() {
        let mut serial = IoSerial::new(MockIo::default());
        assert!(serial.init(&SerialConfig::DEFAULT).is_ok());
        assert_eq!(serial.config(), Some(SerialConfig::DEFAULT));

        let zero = SerialConfig {
            baudrate: 0,
            ..SerialConfig::DEFAULT
        };
        assert!(serial.init(&zero).invalid_baudrate);
        assert_eq!(serial.config(), Some(SerialConfig::DEFAULT));

        serial.uninit();
        assert!(serial.config().is_none());
    }

    #[test]
    fn test_read_only_when_ready() {
        let mut serial = IoSerial::new(MockIo::default());
        let mut buf = [0u8; 4];
        let mut left = 4;

        assert_eq!(
            serial.read(&mut left, &mut buf),
            Err(DriverError::RxBufferEmpty)
        );
        assert_eq!(serial.io().reads, 0);

        for &byte in b"hi" {
            serial.io_mut().incoming.push_back(byte).unwrap();
        }
        serial.read(&mut left, &mut buf).unwrap();
        assert_eq!(left, 2);
        assert_eq!(&buf[..2], b"hi");
    }

    #[test]
    fn test_write_bounded_by_stream() {
        let mut serial = IoSerial::new(MockIo {
            tx_room: 3,
            ..Default::default()
        });
        let data = b"hello";
        let mut left = data.len();

        serial.write(&mut left, data).unwrap();
        assert_eq!(left, 2);
        serial.write(&mut left, &data[3..]).unwrap();
        assert_eq!(left, 0);
        assert_eq!(&serial.io().sent[..], data);

        serial.io_mut().tx_room = 0;
        let mut left = 1;
        assert_eq!(serial.write(&mut left, b"!"), Err(DriverError::TxBufferFull));
        assert_eq!(serial.release().writes, 2);
    }

    #[test]
    fn test_io_errors_are_hardware_failures() {
        let mut io = MockIo {
            tx_room: 4,
            fail: true,
            ..Default::default()
        };
        io.incoming.push_back(b'x').unwrap();
        let mut serial = IoSerial::new(io);

        let mut buf = [0u8; 1];
        let mut left = 1;
        assert_eq!(
            serial.read(&mut left, &mut buf),
            Err(DriverError::HardwareFailure)
        );
        assert_eq!(
            serial.write(&mut left, b"y"),
            Err(DriverError::HardwareFailure)
        );
        assert_eq!(left, 1);
    }
}
