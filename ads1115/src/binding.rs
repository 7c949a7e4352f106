//! Binds one converter to one access point.
//!
//! [`Driver::attach`] takes ownership of an opened bus device and publishes
//! the access point. Callers reach the converter through a [`Handle`], of
//! which only one may be open at a time. All acquisitions are serialized on
//! the driver's lock. [`Driver::detach`] (or dropping the driver) withdraws
//! the access point and then releases the bus.

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use embedded_hal::blocking::delay::DelayMs;
use log::{info, warn};

use crate::bus::BusDevice;
use crate::session::ConverterSession;
use crate::teardown::Teardown;
use crate::Error;

/// Name the access point is published under.
pub const ACCESS_POINT: &str = "ads1115";

const IOC_READ: u32 = 2;
const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

const fn ior(kind: u8, nr: u8, size: usize) -> u32 {
    (IOC_READ << IOC_DIRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
        | ((kind as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

/// Structured commands accepted by [`Handle::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    ReadConversion,
}

impl Request {
    pub const MAGIC: u8 = b'a';

    /// Numeric code, laid out like a Linux `_IOR(MAGIC, nr, int)`.
    pub const fn code(self) -> u32 {
        match self {
            Request::ReadConversion => ior(Request::MAGIC, 1, mem::size_of::<i32>()),
        }
    }

    pub fn from_code(code: u32) -> Result<Request, Error> {
        if code == Request::ReadConversion.code() {
            Ok(Request::ReadConversion)
        } else {
            Err(Error::InvalidRequest(code))
        }
    }
}

struct Device<B, D> {
    bus: B,
    delay: D,
}

pub struct Driver<B: BusDevice, D> {
    device: Mutex<Device<B, D>>,
    address: u8,
    opened: AtomicBool,
    published: bool,
}

impl<B, D> Driver<B, D>
where
    B: BusDevice,
    D: DelayMs<u8>,
{
    pub fn attach(bus: B, delay: D) -> Driver<B, D> {
        let address = bus.address();

        info!("{}: driver installed at 0x{:02x}", ACCESS_POINT, address);

        Driver {
            device: Mutex::new(Device { bus, delay }),
            address,
            opened: AtomicBool::new(false),
            published: true,
        }
    }

    /// Opens the access point. Fails with [`Error::Busy`] while another
    /// handle is open.
    pub fn open(&self) -> Result<Handle<'_, B, D>, Error> {
        if self
            .opened
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::Busy);
        }

        info!("{}: device opened", ACCESS_POINT);

        Ok(Handle { driver: self })
    }

    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut ConverterSession<'_, B, D>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut device = self.device.lock().unwrap_or_else(|poisoned| {
            warn!("{}: recovering device lock after panic", ACCESS_POINT);
            poisoned.into_inner()
        });
        let Device { bus, delay } = &mut *device;

        f(&mut ConverterSession::new(bus, delay))
    }
}

impl<B: BusDevice, D> Driver<B, D> {
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Withdraws the access point and releases the bus device. Both steps
    /// run even if one fails; the first failure is returned.
    pub fn detach(mut self) -> Result<(), Error> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<(), Error> {
        if !self.published {
            return Ok(());
        }

        let device = self.device.get_mut().unwrap_or_else(PoisonError::into_inner);
        let published = &mut self.published;

        let mut teardown = Teardown::new();
        teardown.push("bus device", || device.bus.release().map_err(Error::Release));
        teardown.push("access point", || {
            *published = false;
            Ok(())
        });
        let result = teardown.run();

        info!("{}: driver removed", ACCESS_POINT);

        result
    }
}

impl<B: BusDevice, D> Drop for Driver<B, D> {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

/// An open access point. Dropping it closes the device again.
pub struct Handle<'a, B: BusDevice, D> {
    driver: &'a Driver<B, D>,
}

impl<'a, B, D> Handle<'a, B, D>
where
    B: BusDevice,
    D: DelayMs<u8>,
{
    pub fn read_conversion(&mut self) -> Result<i16, Error> {
        self.driver.with_session(|session| session.acquire())
    }

    /// Reads one conversion as `"<decimal>\n"` into `buf`.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.driver.with_session(|session| session.acquire_as_text(buf))
    }

    /// Runs the command named by `code`. Unknown codes never reach the bus.
    pub fn request(&mut self, code: u32) -> Result<i32, Error> {
        match Request::from_code(code)? {
            Request::ReadConversion => self.read_conversion().map(i32::from),
        }
    }
}

impl<'a, B: BusDevice, D> Drop for Handle<'a, B, D> {
    fn drop(&mut self) {
        self.driver.opened.store(false, Ordering::Release);

        info!("{}: device closed", ACCESS_POINT);
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;
    use std::rc::Rc;

    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use super::*;
    use crate::{BusError, I2cBus};

    fn acquisition(address: u8, reply: [u8; 2]) -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write(address, vec![0x01, 0xC2, 0x83]),
            I2cTransaction::write(address, vec![0x00]),
            I2cTransaction::read(address, reply.to_vec()),
        ]
    }

    #[test]
    fn request_code_matches_ior_layout() {
        assert_eq!(Request::ReadConversion.code(), 0x8004_6101);
        assert_eq!(
            Request::from_code(0x8004_6101),
            Ok(Request::ReadConversion)
        );
        assert_eq!(
            Request::from_code(0x8004_6102),
            Err(Error::InvalidRequest(0x8004_6102))
        );
    }

    #[test]
    fn handle_reads_through_bus() {
        let expectations: Vec<I2cTransaction> = acquisition(0x48, [0x30, 0x39])
            .into_iter()
            .chain(acquisition(0x48, [0xFF, 0x38]))
            .chain(acquisition(0x48, [0x00, 0x64]))
            .collect();
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let driver = Driver::attach(I2cBus::new(i2c, 0x48).unwrap(), MockNoop::new());
        let mut handle = driver.open().unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(handle.read(&mut buf), Ok(6));
        assert_eq!(&buf[..6], b"12345\n");

        assert_eq!(handle.read_conversion(), Ok(-200));
        assert_eq!(handle.request(Request::ReadConversion.code()), Ok(100));

        drop(handle);
        driver.detach().unwrap();
        i2c_clone.done();
    }

    #[test]
    fn unknown_request_touches_no_bus() {
        let i2c = I2cMock::new(&[]);
        let mut i2c_clone = i2c.clone();

        let driver = Driver::attach(I2cBus::new(i2c, 0x48).unwrap(), MockNoop::new());
        let mut handle = driver.open().unwrap();

        assert_eq!(handle.request(0x1234), Err(Error::InvalidRequest(0x1234)));

        drop(handle);
        i2c_clone.done();
    }

    #[test]
    fn single_open_at_a_time() {
        let i2c = I2cMock::new(&[]);
        let driver = Driver::attach(I2cBus::new(i2c, 0x48).unwrap(), MockNoop::new());

        let handle = driver.open().unwrap();
        assert!(matches!(driver.open(), Err(Error::Busy)));

        drop(handle);
        assert!(driver.open().is_ok());
    }

    #[test]
    fn bus_failure_is_not_fatal_to_the_handle() {
        let mut expectations = vec![I2cTransaction::write(0x48, vec![0x01, 0xC2, 0x83])
            .with_error(embedded_hal_mock::MockError::Io(std::io::ErrorKind::TimedOut))];
        expectations.extend(acquisition(0x48, [0x00, 0x05]));
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let driver = Driver::attach(I2cBus::new(i2c, 0x48).unwrap(), MockNoop::new());
        let mut handle = driver.open().unwrap();

        assert_eq!(
            handle.read_conversion(),
            Err(Error::ConfigurationWriteFailed(BusError::Timeout))
        );
        assert_eq!(handle.read_conversion(), Ok(5));

        drop(handle);
        i2c_clone.done();
    }

    struct ReleaseBus {
        releases: Rc<Cell<u32>>,
        fail: bool,
    }

    impl BusDevice for ReleaseBus {
        fn address(&self) -> u8 {
            0x48
        }

        fn send(&mut self, bytes: &[u8]) -> Result<usize, BusError> {
            Ok(bytes.len())
        }

        fn receive(&mut self, _buf: &mut [u8]) -> Result<(), BusError> {
            Ok(())
        }

        fn release(&mut self) -> Result<(), BusError> {
            self.releases.set(self.releases.get() + 1);
            if self.fail {
                Err(BusError::Nack)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn detach_reports_release_failure_once() {
        let releases = Rc::new(Cell::new(0));
        let bus = ReleaseBus {
            releases: releases.clone(),
            fail: true,
        };

        let driver = Driver::attach(bus, MockNoop::new());

        assert_eq!(driver.detach(), Err(Error::Release(BusError::Nack)));
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn drop_releases_bus() {
        let releases = Rc::new(Cell::new(0));
        let bus = ReleaseBus {
            releases: releases.clone(),
            fail: false,
        };

        {
            let driver = Driver::attach(bus, MockNoop::new());
            assert_eq!(driver.address(), 0x48);
        }

        assert_eq!(releases.get(), 1);
    }
}
