use crate::schedule::video::Video;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// The time span in which a station broadcasts its looping playlist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BroadcastWindow {
	started_at: DateTime<Utc>,
	ended_at: DateTime<Utc>,
	videos: Vec<Video>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BroadcastWindowError {
	#[error("Broadcast window must end after it started. (started at {started_at}, ended at {ended_at})")]
	EndNotAfterStart {
		started_at: DateTime<Utc>,
		ended_at: DateTime<Utc>,
	},
}

impl BroadcastWindow {
	pub fn new(
		started_at: DateTime<Utc>,
		ended_at: DateTime<Utc>,
		videos: Vec<Video>,
	) -> Result<Self, BroadcastWindowError> {
		if ended_at <= started_at {
			return Err(BroadcastWindowError::EndNotAfterStart { started_at, ended_at });
		}

		Ok(Self {
			started_at,
			ended_at,
			videos,
		})
	}

	pub fn started_at(&self) -> DateTime<Utc> {
		self.started_at
	}

	pub fn ended_at(&self) -> DateTime<Utc> {
		self.ended_at
	}

	pub fn videos(&self) -> &[Video] {
		&self.videos
	}

	/// Sum of all video durations in seconds. Saturates instead of overflowing.
	pub fn total_duration_seconds(&self) -> u64 {
		self.videos
			.iter()
			.fold(0u64, |total, video| total.saturating_add(video.duration_seconds))
	}

	/// Whether `instant` lies within `[started_at, ended_at]`, both ends inclusive.
	pub fn contains(&self, instant: DateTime<Utc>) -> bool {
		(self.started_at..=self.ended_at).contains(&instant)
	}

	#[must_use]
	pub fn with_videos(&self, videos: Vec<Video>) -> Self {
		Self {
			started_at: self.started_at,
			ended_at: self.ended_at,
			videos,
		}
	}
}
