use crate::utils::aborting_join_handle::AbortingJoinHandle;
use crate::utils::time_source::TimeSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use static_assertions::assert_obj_safe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const RESYNC_TIMER: &str = "time sync resync";

/// Anything that can tell the current server time, usually the `/api/time` endpoint.
#[async_trait]
pub trait ServerTimeSource: Send + Sync {
	/// Server time in milliseconds since the unix epoch.
	async fn server_time_milliseconds(&self) -> Result<i64, TimeSyncError>;
}

assert_obj_safe!(ServerTimeSource);

#[derive(Error, Debug)]
pub enum TimeSyncError {
	#[error("Server time request failed: {0}")]
	Request(#[source] reqwest::Error),
	#[error("Server time endpoint responded with status {0}")]
	Status(reqwest::StatusCode),
	#[error("Server time response was malformed: {0}")]
	MalformedResponse(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeSyncState {
	/// `server time - client time`, corrected for the estimated one way latency.
	pub offset_milliseconds: i64,
	pub is_synced: bool,
	pub last_sync_at: Option<DateTime<Utc>>,
}

/// Keeps track of the offset between the local clock and the server clock.
///
/// Every player owns its own synchronizer, nothing is shared between instances.
pub struct TimeSynchronizer {
	server_time_source: Arc<dyn ServerTimeSource>,
	time_source: TimeSource,
	state: RwLock<TimeSyncState>,
}

impl TimeSynchronizer {
	pub fn new(server_time_source: Arc<dyn ServerTimeSource>, time_source: TimeSource) -> Self {
		Self {
			server_time_source,
			time_source,
			state: Default::default(),
		}
	}

	pub fn state(&self) -> TimeSyncState {
		*self.state.read()
	}

	/// Local time corrected by the last measured offset. Falls back to plain local time while
	/// not synchronized.
	pub fn corrected_now(&self) -> DateTime<Utc> {
		let offset_milliseconds = self.state.read().offset_milliseconds;
		self.time_source.now() + chrono::Duration::milliseconds(offset_milliseconds)
	}

	/// Measures the offset to the server clock once.
	///
	/// Failures are never returned. They reset the offset to zero and mark the state as not
	/// synchronized so playback can continue on local time.
	pub async fn sync(&self) -> TimeSyncState {
		let request_sent_at = self.time_source.now();
		let result = self.server_time_source.server_time_milliseconds().await;
		let response_received_at = self.time_source.now();

		let new_state = match result {
			Ok(server_time_milliseconds) => {
				let offset_milliseconds = offset_milliseconds(request_sent_at, response_received_at, server_time_milliseconds);
				debug!(
					offset_milliseconds,
					round_trip_milliseconds = (response_received_at - request_sent_at).num_milliseconds(),
					"Synchronized with server time."
				);
				TimeSyncState {
					offset_milliseconds,
					is_synced: true,
					last_sync_at: Some(response_received_at + chrono::Duration::milliseconds(offset_milliseconds)),
				}
			}
			Err(error) => {
				warn!(%error, "Time synchronization failed, falling back to local time.");
				TimeSyncState {
					offset_milliseconds: 0,
					is_synced: false,
					last_sync_at: self.state().last_sync_at,
				}
			}
		};

		*self.state.write() = new_state;
		new_state
	}

	pub async fn run_periodic_resync(&self, resync_interval: Duration) {
		let mut interval = self
			.time_source
			.interval_at(RESYNC_TIMER, resync_interval, resync_interval);
		loop {
			interval.tick().await;
			let state = self.sync().await;
			info!(
				offset_milliseconds = state.offset_milliseconds,
				is_synced = state.is_synced,
				"Resynchronized time."
			);
		}
	}

	/// Resynchronizes every `resync_interval` until the returned handle is dropped.
	pub fn spawn_periodic_resync(self: &Arc<Self>, resync_interval: Duration) -> AbortingJoinHandle<()> {
		let synchronizer = Arc::clone(self);
		AbortingJoinHandle::spawn(async move { synchronizer.run_periodic_resync(resync_interval).await })
	}
}

/// Offset between server and client clock.
///
/// Assumes the server took its timestamp halfway through the round trip.
pub fn offset_milliseconds(
	request_sent_at: DateTime<Utc>,
	response_received_at: DateTime<Utc>,
	server_time_milliseconds: i64,
) -> i64 {
	// a clock going backwards during the request must not produce negative latency
	let latency_milliseconds = ((response_received_at - request_sent_at).num_milliseconds() / 2).max(0);
	let adjusted_server_time = server_time_milliseconds.saturating_add(latency_milliseconds);
	adjusted_server_time.saturating_sub(response_received_at.timestamp_millis())
}
