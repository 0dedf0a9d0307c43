use crate::catalog::station::{Station, StationId};
use crate::schedule::broadcast_window::{BroadcastWindow, BroadcastWindowError};
use crate::schedule::position::PlaybackPosition;
use crate::schedule::video::Video;
use chrono::{DateTime, Utc};
use js_int::Int;
use serde::{Deserialize, Serialize};

/// Current server time, both human readable and as JavaScript safe epoch milliseconds.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerTimeResponse {
	pub iso: DateTime<Utc>,
	pub epoch_milliseconds: Int,
}

impl From<DateTime<Utc>> for ServerTimeResponse {
	fn from(now: DateTime<Utc>) -> Self {
		Self {
			iso: now,
			epoch_milliseconds: Int::new_saturating(now.timestamp_millis()),
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StationSummaryResponse {
	pub id: StationId,
	pub name: String,
	pub channel: String,
}

impl From<Station> for StationSummaryResponse {
	fn from(station: Station) -> Self {
		Self {
			id: station.id,
			name: station.name,
			channel: station.channel,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StationResponse {
	pub id: StationId,
	pub name: String,
	pub channel: String,
	pub started_at: DateTime<Utc>,
	pub ended_at: DateTime<Utc>,
	pub videos: Vec<Video>,
}

impl From<Station> for StationResponse {
	fn from(station: Station) -> Self {
		Self {
			id: station.id,
			name: station.name,
			channel: station.channel,
			started_at: station.window.started_at(),
			ended_at: station.window.ended_at(),
			videos: station.window.videos().to_vec(),
		}
	}
}

impl TryFrom<StationResponse> for BroadcastWindow {
	type Error = BroadcastWindowError;

	fn try_from(response: StationResponse) -> Result<Self, Self::Error> {
		BroadcastWindow::new(response.started_at, response.ended_at, response.videos)
	}
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PositionResponse {
	pub station_id: StationId,
	/// Server time the position was calculated for.
	pub at: DateTime<Utc>,
	#[serde(flatten)]
	pub position: PlaybackPosition,
	/// The video to play, absent while nothing is playing.
	pub video: Option<Video>,
}
