//! Single-shot acquisition protocol.
//!
//! Every acquisition runs the same four bus-facing steps and then decodes:
//!
//! 1. write the configuration register, which starts a conversion
//! 2. sleep for [`SETTLE_MS`]
//! 3. point the register pointer at the conversion register
//! 4. read the two result bytes
//!
//! A failed step ends the acquisition. Nothing is carried over to the next
//! one, so a later call always starts from a fresh configuration write.

use std::fmt::{self, Write};

use embedded_hal::blocking::delay::DelayMs;
use log::{trace, warn};

use crate::bus::{BusDevice, BusError};
use crate::config::{decode, ConversionConfig, REG_CONVERSION};
use crate::Error;

/// Fixed wait between triggering a conversion and reading it back. Covers
/// one conversion at 128 SPS; the ready bit is not polled.
pub const SETTLE_MS: u8 = 10;

// Longest rendering is "-32768\n".
const TEXT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Configuring,
    Settling,
    SelectingRegister,
    Reading,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Configuring => "configuring",
            Step::Settling => "settling",
            Step::SelectingRegister => "selecting register",
            Step::Reading => "reading",
        };

        f.write_str(name)
    }
}

/// Runs acquisitions against a borrowed bus device.
///
/// The session does no locking of its own; callers must not run two
/// sessions on the same bus at once.
pub struct ConverterSession<'a, B, D> {
    bus: &'a mut B,
    delay: &'a mut D,
}

impl<'a, B, D> ConverterSession<'a, B, D>
where
    B: BusDevice,
    D: DelayMs<u8>,
{
    pub fn new(bus: &'a mut B, delay: &'a mut D) -> ConverterSession<'a, B, D> {
        ConverterSession { bus, delay }
    }

    /// Triggers one conversion and returns its raw signed code.
    pub fn acquire(&mut self) -> Result<i16, Error> {
        let result = self.run();

        if let Err(e) = &result {
            if let Some(step) = e.step() {
                warn!("acquisition at 0x{:02x} failed while {}: {}", self.bus.address(), step, e);
            }
        }

        result
    }

    /// Acquires one value and writes it into `buf` as decimal text followed
    /// by a newline. Returns the number of bytes written.
    pub fn acquire_as_text(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let value = self.acquire()?;

        render(value, buf)
    }

    fn run(&mut self) -> Result<i16, Error> {
        trace!("{}", Step::Configuring);
        send_all(self.bus, &ConversionConfig::SINGLE_SHOT_AIN0.write_frame())
            .map_err(Error::ConfigurationWriteFailed)?;

        trace!("{}", Step::Settling);
        self.delay.delay_ms(SETTLE_MS);

        trace!("{}", Step::SelectingRegister);
        send_all(self.bus, &[REG_CONVERSION]).map_err(Error::RegisterSelectFailed)?;

        trace!("{}", Step::Reading);
        let mut raw = [0u8; 2];
        self.bus.receive(&mut raw).map_err(Error::ResultReadFailed)?;

        let value = decode(raw[0], raw[1]);
        trace!("decoded {} from {:02x?}", value, raw);

        Ok(value)
    }
}

fn send_all<B: BusDevice>(bus: &mut B, bytes: &[u8]) -> Result<(), BusError> {
    let sent = bus.send(bytes)?;
    if sent != bytes.len() {
        return Err(BusError::Incomplete {
            sent,
            expected: bytes.len(),
        });
    }

    Ok(())
}

/// Renders `value` as `"<decimal>\n"` into `buf`.
pub fn render(value: i16, buf: &mut [u8]) -> Result<usize, Error> {
    let mut text = TextBuf {
        bytes: [0; TEXT_CAPACITY],
        len: 0,
    };
    writeln!(text, "{}", value).map_err(|_| Error::EncodingFailed)?;

    let rendered = &text.bytes[..text.len];
    if rendered.len() > buf.len() {
        return Err(Error::BufferTooSmall {
            needed: rendered.len(),
            available: buf.len(),
        });
    }

    buf[..rendered.len()].copy_from_slice(rendered);

    Ok(rendered.len())
}

struct TextBuf {
    bytes: [u8; TEXT_CAPACITY],
    len: usize,
}

impl Write for TextBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > TEXT_CAPACITY {
            return Err(fmt::Error);
        }

        self.bytes[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;

        Ok(())
    }
}
