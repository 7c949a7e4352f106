//! Raw byte transfers against the converter's bus address.

use std::io;

use embedded_hal::blocking::i2c;

/// Highest valid 7-bit address.
pub const MAX_ADDRESS: u16 = 0x7F;

// errno values the Linux I2C core reports for bus-level faults.
const ENXIO: i32 = 6;
const EAGAIN: i32 = 11;
const ETIMEDOUT: i32 = 110;
const EREMOTEIO: i32 = 121;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("no acknowledgment from device")]
    Nack,

    #[error("bus arbitration lost")]
    ArbitrationLost,

    #[error("bus timeout")]
    Timeout,

    #[error("incomplete transfer: {sent} of {expected} bytes")]
    Incomplete { sent: usize, expected: usize },

    #[error("invalid 7-bit address 0x{0:02x}")]
    InvalidAddress(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<io::Error> for BusError {
    fn from(e: io::Error) -> Self {
        match e.raw_os_error() {
            Some(ENXIO) | Some(EREMOTEIO) => BusError::Nack,
            Some(EAGAIN) => BusError::ArbitrationLost,
            Some(ETIMEDOUT) => BusError::Timeout,
            _ => match e.kind() {
                io::ErrorKind::TimedOut => BusError::Timeout,
                io::ErrorKind::WouldBlock => BusError::ArbitrationLost,
                _ => BusError::Transport(e.to_string()),
            },
        }
    }
}

impl From<rppal::i2c::Error> for BusError {
    fn from(e: rppal::i2c::Error) -> Self {
        match e {
            rppal::i2c::Error::Io(e) => e.into(),
            rppal::i2c::Error::InvalidSlaveAddress(address) => BusError::InvalidAddress(address),
            e => BusError::Transport(e.to_string()),
        }
    }
}

/// A converter reachable at one fixed bus address.
///
/// Each call is a single bus transaction. Implementations keep no state
/// between calls.
pub trait BusDevice {
    fn address(&self) -> u8;

    /// Writes `bytes` as one transaction and returns how many were sent.
    fn send(&mut self, bytes: &[u8]) -> Result<usize, BusError>;

    /// Fills `buf` completely in one transaction.
    fn receive(&mut self, buf: &mut [u8]) -> Result<(), BusError>;

    /// Gives the bus binding back when the driver detaches.
    fn release(&mut self) -> Result<(), BusError> {
        Ok(())
    }
}

/// [`BusDevice`] over any embedded-hal blocking I2C bus, such as
/// `rppal::i2c::I2c`.
pub struct I2cBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cBus<I2C> {
    pub fn new(i2c: I2C, address: u16) -> Result<I2cBus<I2C>, BusError> {
        if address > MAX_ADDRESS {
            return Err(BusError::InvalidAddress(address));
        }

        Ok(I2cBus {
            i2c,
            address: address as u8,
        })
    }

    pub fn into_inner(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> BusDevice for I2cBus<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::Read<Error = E>,
    E: Into<BusError>,
{
    fn address(&self) -> u8 {
        self.address
    }

    fn send(&mut self, bytes: &[u8]) -> Result<usize, BusError> {
        self.i2c.write(self.address, bytes).map_err(Into::into)?;

        Ok(bytes.len())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c.read(self.address, buf).map_err(Into::into)
    }
}

#[cfg(test)]
impl From<embedded_hal_mock::MockError> for BusError {
    fn from(e: embedded_hal_mock::MockError) -> Self {
        match e {
            embedded_hal_mock::MockError::Io(kind) => io::Error::from(kind).into(),
        }
    }
}
