use crate::schedule::broadcast_window::{BroadcastWindow, BroadcastWindowError};
use crate::schedule::video::Video;
use chrono::{DateTime, Utc};
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
pub struct StationId(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Station {
	pub id: StationId,
	pub name: String,
	pub channel: String,
	pub window: BroadcastWindow,
}

/// A station as written in the catalog file.
#[derive(Debug, Deserialize)]
pub(super) struct StationDefinition {
	pub id: StationId,
	pub name: String,
	#[serde(default)]
	pub channel: String,
	pub started_at: DateTime<Utc>,
	pub ended_at: DateTime<Utc>,
	#[serde(default)]
	pub videos: Vec<Video>,
}

impl TryFrom<StationDefinition> for Station {
	type Error = BroadcastWindowError;

	fn try_from(definition: StationDefinition) -> Result<Self, Self::Error> {
		let StationDefinition {
			id,
			name,
			channel,
			started_at,
			ended_at,
			videos,
		} = definition;

		Ok(Self {
			id,
			name,
			channel,
			window: BroadcastWindow::new(started_at, ended_at, videos)?,
		})
	}
}
