use std::env;

use log::LevelFilter;
use serde::Serialize;

/// Which access-point operation a sample goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadWith {
	Request,
	Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
	Human,
	Json,
}

#[derive(Debug, Clone)]
pub struct Options {
	pub bus: u8,
	pub address: u16,
	pub read_with: ReadWith,
	pub samples: u32,
	pub interval_ms: u64,
	pub output: Output,
	pub log_level: LevelFilter,
}

impl Options {
	pub fn parse() -> Self {
		let bus = env::var("ADS1115_I2C_BUS")
			.map(|v| v.parse::<u8>().expect("ADS1115_I2C_BUS must be a bus number"))
			.unwrap_or(1);

		let address = env::var("ADS1115_ADDRESS")
			.map(|v| parse_address(&v).expect("ADS1115_ADDRESS must be a hex (0x48) or decimal address"))
			.unwrap_or(ads1115::config::DEFAULT_ADDRESS);

		let read_with = env::var("ADS1115_READ")
			.map(|v| match v.as_ref() {
				"request" => ReadWith::Request,
				"text" => ReadWith::Text,
				_ => panic!("ADS1115_READ must be either 'request' or 'text'"),
			})
			.unwrap_or(ReadWith::Request);

		let samples = env::var("ADS1115_SAMPLES")
			.map(|v| v.parse::<u32>().expect("ADS1115_SAMPLES must be a number"))
			.unwrap_or(1);

		let interval_ms = env::var("ADS1115_INTERVAL_MS")
			.map(|v| v.parse::<u64>().expect("ADS1115_INTERVAL_MS must be a number"))
			.unwrap_or(1000);

		let output = env::var("ADS1115_OUTPUT")
			.map(|v| match v.as_ref() {
				"human" => Output::Human,
				"json" => Output::Json,
				_ => panic!("ADS1115_OUTPUT must be either 'human' or 'json'"),
			})
			.unwrap_or(Output::Human);

		let log_level = env::var("ADS1115_LOG")
			.map(|v| v.parse::<LevelFilter>().expect("ADS1115_LOG must be a log level"))
			.unwrap_or(LevelFilter::Info);

		Self {
			bus,
			address,
			read_with,
			samples,
			interval_ms,
			output,
			log_level,
		}
	}
}

pub fn parse_address(value: &str) -> Option<u16> {
	match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
		Some(hex) => u16::from_str_radix(hex, 16).ok(),
		None => value.parse().ok(),
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn parses_hex_and_decimal_addresses() {
		assert_eq!(parse_address("0x48"), Some(0x48));
		assert_eq!(parse_address("0X4B"), Some(0x4B));
		assert_eq!(parse_address("73"), Some(73));
		assert_eq!(parse_address("0xZZ"), None);
		assert_eq!(parse_address(""), None);
	}
}
