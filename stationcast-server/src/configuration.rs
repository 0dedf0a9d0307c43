use serde::Deserialize;
use std::fs::read_to_string;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Configuration {
	#[serde(with = "socket_addr_deserializer")]
	pub address: SocketAddr,
	pub log_filters: String,
	pub catalog_file: PathBuf,
	/// How often a player recalculates its playback position.
	#[serde(with = "humantime_serde", default = "default_tick_interval")]
	pub tick_interval: Duration,
	/// How often a player synchronizes its clock with the server again.
	#[serde(with = "humantime_serde", default = "default_resync_interval")]
	pub resync_interval: Duration,
	#[serde(with = "humantime_serde", default = "default_probe_timeout")]
	pub probe_timeout: Duration,
	/// Duration used for videos whose real duration couldn't be measured.
	#[serde(with = "humantime_serde", default = "default_fallback_video_duration")]
	pub fallback_video_duration: Duration,
	#[serde(default = "default_ffprobe_program")]
	pub ffprobe_program: String,
}

fn default_tick_interval() -> Duration {
	Duration::from_secs(1)
}

fn default_resync_interval() -> Duration {
	Duration::from_secs(5 * 60)
}

fn default_probe_timeout() -> Duration {
	Duration::from_secs(10)
}

fn default_fallback_video_duration() -> Duration {
	Duration::from_secs(30)
}

fn default_ffprobe_program() -> String {
	"ffprobe".to_string()
}

impl Configuration {
	pub fn from_file(path: impl AsRef<Path>) -> Result<Configuration, ConfigurationError> {
		let text = read_to_string(path)?;

		Ok(Configuration::try_from(text.as_str())?)
	}
}

impl TryFrom<&str> for Configuration {
	type Error = toml::de::Error;

	fn try_from(text: &str) -> Result<Self, Self::Error> {
		toml::from_str(text)
	}
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
	#[error("Failed to deserialize with error: {0}")]
	DeserializationError(#[from] toml::de::Error),
	#[error("IO operation failed: {0}")]
	IoError(#[from] std::io::Error),
}

// See https://serde.rs/custom-date-format.html
mod socket_addr_deserializer {
	use serde::{self, Deserialize, Deserializer};
	use std::net::SocketAddr;
	use std::str::FromStr;

	pub fn deserialize<'deserializer, D>(deserializer: D) -> Result<SocketAddr, D::Error>
	where
		D: Deserializer<'deserializer>,
	{
		let string = String::deserialize(deserializer)?;
		SocketAddr::from_str(string.as_str()).map_err(serde::de::Error::custom)
	}
}
