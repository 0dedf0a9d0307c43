use crate::schedule::video::Video;
use tracing::info;

/// The thing that actually plays videos.
pub trait MediaElement: Send {
	/// Load `video` and start playing it `seek_to_seconds` into the video.
	fn load(&mut self, video: &Video, seek_to_seconds: u64);

	fn stop(&mut self);
}

/// Media element for headless players, only reports what it would play.
#[derive(Debug, Default)]
pub struct LoggingMediaElement {
	station_name: String,
}

impl LoggingMediaElement {
	pub fn new(station_name: impl Into<String>) -> Self {
		Self {
			station_name: station_name.into(),
		}
	}
}

impl MediaElement for LoggingMediaElement {
	fn load(&mut self, video: &Video, seek_to_seconds: u64) {
		info!(
			station = %self.station_name,
			video = %video.id,
			url = %video.url,
			seek_to_seconds,
			duration_seconds = video.duration_seconds,
			"Now playing."
		);
	}

	fn stop(&mut self) {
		info!(station = %self.station_name, "Off air.");
	}
}
