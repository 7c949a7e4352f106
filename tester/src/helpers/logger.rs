use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

struct Logger;

static LOGGER: Logger = Logger;

pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
	log::set_logger(&LOGGER)?;
	log::set_max_level(level);

	Ok(())
}

impl Log for Logger {
	fn enabled(&self, metadata: &Metadata) -> bool {
		metadata.level() <= log::max_level()
	}

	fn log(&self, record: &Record) {
		if !self.enabled(record.metadata()) {
			return;
		}

		let msg = record.args().to_string();
		let (level, msg) = match record.level() {
			Level::Error => ("ERROR".red(), msg.red()),
			Level::Warn => ("WARN".yellow(), msg.yellow()),
			Level::Info => ("INFO".green(), msg.bright_white()),
			Level::Debug => ("DEBUG".bright_black(), msg.bright_black()),
			Level::Trace => ("TRACE".bright_black(), msg.bright_yellow()),
		};

		let time = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
		let target = format!("[{}]", record.target()).bright_black();

		eprintln!("{} {: <5} {: <40} {}", time.bright_black(), level, msg, target);
	}

	fn flush(&self) {}
}

pub fn success(msg: &str) {
	println!("{}", format!("✓ {}", msg).green());
}

pub fn failure(msg: &str) {
	eprintln!("{}", format!("╳ {}", msg).red());
}
