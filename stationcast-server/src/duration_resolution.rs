use crate::schedule::broadcast_window::BroadcastWindow;
use crate::schedule::snapshot::{VersionedWindow, WindowSnapshot};
use crate::schedule::video::Video;
use crate::utils::time_source::TimeSource;
use async_trait::async_trait;
use futures_util::future::join_all;
use static_assertions::assert_obj_safe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod ffprobe;

pub const PROBE_TIMER: &str = "duration probe";

/// Measures how long a video really is.
#[async_trait]
pub trait DurationProbe: Send + Sync {
	async fn probe_seconds(&self, url: &str) -> Result<f64, ProbeError>;
}

assert_obj_safe!(DurationProbe);

#[derive(Error, Debug)]
pub enum ProbeError {
	#[error("Failed to start probe: {0}")]
	Spawn(#[source] std::io::Error),
	#[error("Probe failed: {0}")]
	Failed(String),
	#[error("Probe returned an invalid duration: '{0}'")]
	InvalidDuration(String),
}

/// Replaces placeholder durations of a playlist with measured ones.
///
/// Best effort: every video that can't be measured in time gets the fallback duration instead,
/// so the resulting playlist is always playable.
#[derive(Clone)]
pub struct DurationResolver {
	probe: Arc<dyn DurationProbe>,
	time_source: TimeSource,
	probe_timeout: Duration,
	fallback_duration_seconds: u64,
}

impl DurationResolver {
	pub fn new(
		probe: Arc<dyn DurationProbe>,
		time_source: TimeSource,
		probe_timeout: Duration,
		fallback_duration: Duration,
	) -> Self {
		Self {
			probe,
			time_source,
			probe_timeout,
			fallback_duration_seconds: fallback_duration.as_secs().max(1),
		}
	}

	/// Probes all videos concurrently and returns the window with their measured durations.
	pub async fn resolve(&self, window: &BroadcastWindow) -> BroadcastWindow {
		let videos = join_all(window.videos().iter().map(|video| self.resolve_video(video))).await;
		window.with_videos(videos)
	}

	/// Resolves the durations of the current window of `snapshot` and publishes the result,
	/// unless the snapshot was replaced in the meantime.
	pub async fn refine(&self, snapshot: &WindowSnapshot) -> Option<VersionedWindow> {
		let VersionedWindow { version, window } = snapshot.current();
		let refined_window = self.resolve(&window).await;

		let published = snapshot.publish_refined(refined_window, version);
		match &published {
			Some(published) => info!(
				version = published.version,
				total_duration_seconds = published.window.total_duration_seconds(),
				"Published playlist with resolved durations."
			),
			None => warn!(version, "Playlist changed while resolving durations, discarding the result."),
		}
		published
	}

	async fn resolve_video(&self, video: &Video) -> Video {
		let probe = self.probe.probe_seconds(&video.url);
		let duration_seconds = match self.time_source.timeout(PROBE_TIMER, self.probe_timeout, probe).await {
			Ok(Ok(seconds)) => match whole_seconds(seconds) {
				Some(duration_seconds) => {
					debug!(video = %video.id, duration_seconds, "Measured video duration.");
					duration_seconds
				}
				None => {
					warn!(video = %video.id, seconds, "Probe measured an unusable duration, using fallback.");
					self.fallback_duration_seconds
				}
			},
			Ok(Err(error)) => {
				warn!(video = %video.id, %error, "Failed to measure video duration, using fallback.");
				self.fallback_duration_seconds
			}
			Err(_elapsed) => {
				warn!(video = %video.id, timeout = ?self.probe_timeout, "Measuring video duration timed out, using fallback.");
				self.fallback_duration_seconds
			}
		};

		video.clone().with_duration(duration_seconds)
	}
}

/// Rounds to whole seconds, but never down to nothing.
fn whole_seconds(seconds: f64) -> Option<u64> {
	if !seconds.is_finite() || seconds <= 0.0 {
		return None;
	}

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	let rounded = seconds.round() as u64;
	Some(rounded.max(1))
}
