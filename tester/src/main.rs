use std::{error::Error, process, str, thread::sleep, time::Duration};

use ads1115::{Driver, Handle, I2cBus, Request};
use ads1115_tester::{
	logger,
	options::{Options, Output, ReadWith},
	report::Reading,
};
use rppal::{hal::Delay, i2c::I2c};

const TEXT_BUFFER_LEN: usize = 16;

type AdcHandle<'a> = Handle<'a, I2cBus<I2c>, Delay>;

fn sample(handle: &mut AdcHandle, read_with: ReadWith) -> Result<i16, Box<dyn Error>> {
	match read_with {
		ReadWith::Request => {
			let value = handle.request(Request::ReadConversion.code())?;

			Ok(i16::try_from(value)?)
		}
		ReadWith::Text => {
			let mut buf = [0u8; TEXT_BUFFER_LEN];
			let len = handle.read(&mut buf)?;

			Ok(str::from_utf8(&buf[..len])?.trim_end().parse()?)
		}
	}
}

fn run(options: &Options) -> Result<(), Box<dyn Error>> {
	let i2c = I2c::with_bus(options.bus)?;
	let bus = I2cBus::new(i2c, options.address)?;

	let driver = Driver::attach(bus, Delay::new());

	{
		let mut handle = driver.open()?;

		for n in 0..options.samples {
			if n > 0 {
				sleep(Duration::from_millis(options.interval_ms));
			}

			let started_at = chrono::Utc::now();
			let value = sample(&mut handle, options.read_with)?;
			let reading = Reading::new(value, options.read_with, started_at, chrono::Utc::now());

			match options.output {
				Output::Human => logger::success(&format!("ADS1115 Conversion Value: {}", reading.value)),
				Output::Json => println!("{}", serde_json::to_string(&reading)?),
			}
		}
	}

	driver.detach()?;

	Ok(())
}

fn main() {
	let options = Options::parse();

	if let Err(e) = logger::init(options.log_level) {
		eprintln!("Could not install logger: {}", e);
	}

	log::debug!(
		"reading {} sample(s) from 0x{:02x} on i2c-{}",
		options.samples,
		options.address,
		options.bus
	);

	if let Err(e) = run(&options) {
		logger::failure(&format!("Failed to read conversion value: {}", e));

		process::exit(1);
	}
}
