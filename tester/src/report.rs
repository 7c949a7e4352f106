use serde::Serialize;

use crate::options::ReadWith;

#[derive(Debug, Clone, Serialize)]
pub struct Reading {
	pub value: i16,
	pub mode: ReadWith,
	#[serde(rename = "startedAt")]
	pub started_at: chrono::DateTime<chrono::Utc>,
	#[serde(rename = "endedAt")]
	pub ended_at: chrono::DateTime<chrono::Utc>,
}

impl Reading {
	pub fn new(
		value: i16,
		mode: ReadWith,
		started_at: chrono::DateTime<chrono::Utc>,
		ended_at: chrono::DateTime<chrono::Utc>,
	) -> Reading {
		Reading {
			value,
			mode,
			started_at,
			ended_at,
		}
	}
}
