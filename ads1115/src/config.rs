//! Register map and fixed conversion settings.

/// Conversion register, holds the latest result.
pub const REG_CONVERSION: u8 = 0x00;
/// Configuration register, controls the next conversion.
pub const REG_CONFIG: u8 = 0x01;

/// Address with the ADDR pin tied to GND.
pub const DEFAULT_ADDRESS: u16 = 0x48;

/// The two configuration register bytes, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionConfig {
    msb: u8,
    lsb: u8,
}

impl ConversionConfig {
    /// Start a single conversion of AIN0 against GND at 128 SPS with the
    /// comparator disabled. These bytes are part of the device contract.
    pub const SINGLE_SHOT_AIN0: ConversionConfig = ConversionConfig {
        msb: 0xC2,
        lsb: 0x83,
    };

    pub const fn bytes(&self) -> [u8; 2] {
        [self.msb, self.lsb]
    }

    /// Register address followed by both config bytes, sent as one transaction.
    pub const fn write_frame(&self) -> [u8; 3] {
        [REG_CONFIG, self.msb, self.lsb]
    }
}

/// Rebuilds the two's-complement conversion code from the big-endian bytes.
pub fn decode(msb: u8, lsb: u8) -> i16 {
    i16::from_be_bytes([msb, lsb])
}
