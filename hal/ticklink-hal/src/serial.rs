//! Serial port abstractions
//!
//! A serial driver moves bytes between a caller buffer and the hardware
//! without blocking. Each call transfers whatever the hardware can take or
//! give right now and reports progress by decrementing `data_left`.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Byte transfer driver
///
/// The `data` slice passed to [`read`](SerialDriver::read) and
/// [`write`](SerialDriver::write) is the untransferred tail of the caller
/// buffer, so `data.len() == *data_left` on entry. Implementations move bytes
/// from/to the front of `data` and subtract the number moved from
/// `data_left`. Moving nothing is not an error.
pub trait SerialDriver {
    /// Initialize the hardware with the given configuration
    ///
    /// Returns [`ConfigStatus::OK`] when every field was accepted.
    fn init(&mut self, config: &SerialConfig) -> ConfigStatus;

    /// Release the hardware
    fn uninit(&mut self);

    /// Receive into the front of `data`
    fn read(&mut self, data_left: &mut usize, data: &mut [u8]) -> Result<(), DriverError>;

    /// Transmit from the front of `data`
    fn write(&mut self, data_left: &mut usize, data: &[u8]) -> Result<(), DriverError>;
}

impl<T: SerialDriver + ?Sized> SerialDriver for &mut T {
    fn init(&mut self, config: &SerialConfig) -> ConfigStatus {
        T::init(self, config)
    }

    fn uninit(&mut self) {
        T::uninit(self)
    }

    fn read(&mut self, data_left: &mut usize, data: &mut [u8]) -> Result<(), DriverError> {
        T::read(self, data_left, data)
    }

    fn write(&mut self, data_left: &mut usize, data: &[u8]) -> Result<(), DriverError> {
        T::write(self, data_left, data)
    }
}

/// Errors reported by a serial driver transfer call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Hardware or transmission line failure
    HardwareFailure,
    /// Nothing to receive
    RxBufferEmpty,
    /// No room to transmit
    TxBufferFull,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareFailure => f.write_str("hardware failure"),
            Self::RxBufferEmpty => f.write_str("receive buffer empty"),
            Self::TxBufferFull => f.write_str("transmit buffer full"),
        }
    }
}

/// Serial port configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits per character
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Flow control
    pub flow_control: FlowControl,
}

impl SerialConfig {
    /// 9600 baud, 8 data bits, no parity, 1 stop bit, no flow control
    pub const DEFAULT: Self = Self {
        baudrate: 9600,
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::One,
        flow_control: FlowControl::None,
    };

    /// Check the fields that can be judged without knowing the hardware
    ///
    /// Every enum value is representable, so only the baud rate can be
    /// rejected here. Drivers merge this with their own limits.
    pub fn validate(&self) -> ConfigStatus {
        ConfigStatus {
            invalid_baudrate: self.baudrate == 0,
            ..ConfigStatus::OK
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
    Nine,
}

impl DataBits {
    /// Number of bits as an integer
    pub fn bits(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
    /// Parity bit always 1 (stick-1)
    Mark,
    /// Parity bit always 0 (stick-0)
    Space,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    One,
    OneAndHalf,
    Two,
}

/// Flow control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlowControl {
    None,
    /// Software flow control with XON/XOFF characters
    XonXoff,
    /// RTS/CTS or DSR/DTR signalling
    Hardware,
}

/// Result of applying a configuration
///
/// One flag per rejected field. All flags clear means the configuration
/// was accepted as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigStatus {
    pub invalid_baudrate: bool,
    pub invalid_data_bits: bool,
    pub invalid_parity: bool,
    pub invalid_stop_bits: bool,
    pub invalid_flow_control: bool,
}

impl ConfigStatus {
    /// Every field accepted
    pub const OK: Self = Self {
        invalid_baudrate: false,
        invalid_data_bits: false,
        invalid_parity: false,
        invalid_stop_bits: false,
        invalid_flow_control: false,
    };

    const BAUDRATE: u8 = 1 << 0;
    const DATA_BITS: u8 = 1 << 1;
    const PARITY: u8 = 1 << 2;
    const STOP_BITS: u8 = 1 << 3;
    const FLOW_CONTROL: u8 = 1 << 4;

    /// Check if every field was accepted
    pub fn is_ok(&self) -> bool {
        *self == Self::OK
    }

    /// Packed flag byte, bit 0 = baud rate through bit 4 = flow control
    ///
    /// Bits 5..=7 are reserved and always zero.
    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.invalid_baudrate {
            bits |= Self::BAUDRATE;
        }
        if self.invalid_data_bits {
            bits |= Self::DATA_BITS;
        }
        if self.invalid_parity {
            bits |= Self::PARITY;
        }
        if self.invalid_stop_bits {
            bits |= Self::STOP_BITS;
        }
        if self.invalid_flow_control {
            bits |= Self::FLOW_CONTROL;
        }
        bits
    }

    /// Unpack a flag byte; reserved bits are ignored
    pub fn from_bits(bits: u8) -> Self {
        Self {
            invalid_baudrate: bits & Self::BAUDRATE != 0,
            invalid_data_bits: bits & Self::DATA_BITS != 0,
            invalid_parity: bits & Self::PARITY != 0,
            invalid_stop_bits: bits & Self::STOP_BITS != 0,
            invalid_flow_control: bits & Self::FLOW_CONTROL != 0,
        }
    }

    /// Combine two statuses, keeping every rejected flag
    pub fn merge(self, other: Self) -> Self {
        Self::from_bits(self.bits() | other.bits())
    }
}

impl fmt::Display for ConfigStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return f.write_str("configuration accepted");
        }
        f.write_str("invalid")?;
        let fields = [
            (self.invalid_baudrate, " baudrate"),
            (self.invalid_data_bits, " data-bits"),
            (self.invalid_parity, " parity"),
            (self.invalid_stop_bits, " stop-bits"),
            (self.invalid_flow_control, " flow-control"),
        ];
        for (set, name) in fields {
            if set {
                f.write_str(name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SerialConfig::default();
        assert_eq!(config.baudrate, 9600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.flow_control, FlowControl::None);
    }

    #[test]
    fn test_validate_rejects_zero_baudrate() {
        let config = SerialConfig {
            baudrate: 0,
            ..SerialConfig::DEFAULT
        };
        let status = config.validate();
        assert!(!status.is_ok());
        assert!(status.invalid_baudrate);
        assert!(SerialConfig::DEFAULT.validate().is_ok());
    }

    #[test]
    fn test_status_bits() {
        assert_eq!(ConfigStatus::OK.bits(), 0);

        let status = ConfigStatus {
            invalid_parity: true,
            invalid_flow_control: true,
            ..ConfigStatus::OK
        };
        assert_eq!(status.bits(), 0b1_0100);
        assert_eq!(ConfigStatus::from_bits(0b1_0100), status);
    }

    #[test]
    fn test_reserved_bits_ignored() {
        let status = ConfigStatus::from_bits(0b1110_0000);
        assert!(status.is_ok());
        assert_eq!(status.bits(), 0);
    }

    #[test]
    fn test_merge_keeps_all_flags() {
        let a = ConfigStatus {
            invalid_baudrate: true,
            ..ConfigStatus::OK
        };
        let b = ConfigStatus {
            invalid_stop_bits: true,
            ..ConfigStatus::OK
        };
        let merged = a.merge(b);
        assert!(merged.invalid_baudrate);
        assert!(merged.invalid_stop_bits);
        assert!(!merged.invalid_parity);
    }

    #[test]
    fn test_data_bits_width() {
        assert_eq!(DataBits::Five.bits(), 5);
        assert_eq!(DataBits::Nine.bits(), 9);
    }
}
