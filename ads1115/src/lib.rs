//! Single-shot driver for ADS1115-class converters on a Linux I2C bus.
//!
//! The converter is bound once through [`Driver::attach`], opened through a
//! single [`Handle`] at a time, and released with [`Driver::detach`]. Each
//! read runs the full configure / settle / select / read protocol of
//! [`ConverterSession`] and yields the raw signed conversion code.

pub mod binding;
pub mod bus;
pub mod config;
mod error;
pub mod session;
mod teardown;

pub use binding::{Driver, Handle, Request};
pub use bus::{BusDevice, BusError, I2cBus};
pub use error::Error;
pub use session::{ConverterSession, Step};
