use serde::{Deserialize, Serialize};

#[derive(
	derive_more::From,
	derive_more::Into,
	derive_more::Display,
	Clone,
	Copy,
	Debug,
	PartialEq,
	Eq,
	PartialOrd,
	Ord,
	Hash,
	Deserialize,
	Serialize,
)]
#[serde(transparent)]
pub struct VideoId(u64);

/// A playable video with its duration in whole seconds.
///
/// A duration of `0` means "unknown" and is never selected for playback.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Video {
	pub id: VideoId,
	pub url: String,
	#[serde(rename = "duration")]
	pub duration_seconds: u64,
}

impl Video {
	pub fn new(id: impl Into<VideoId>, url: impl Into<String>, duration_seconds: u64) -> Self {
		Self {
			id: id.into(),
			url: url.into(),
			duration_seconds,
		}
	}

	#[must_use]
	pub fn with_duration(self, duration_seconds: u64) -> Self {
		Self {
			duration_seconds,
			..self
		}
	}
}
