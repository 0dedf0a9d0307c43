use crate::schedule::broadcast_window::BroadcastWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which video of a broadcast window plays at a given instant, and where in it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlaybackPosition {
	pub video_index: usize,
	/// Seconds into the video at `video_index`.
	pub offset_into_video: u64,
	/// Seconds since the window started, not wrapped around the playlist length.
	pub total_elapsed_seconds: u64,
	pub is_within_window: bool,
}

impl PlaybackPosition {
	/// Nothing is playing, either because the instant is outside of the window or because the
	/// playlist has nothing to play.
	pub const fn idle() -> Self {
		Self {
			video_index: 0,
			offset_into_video: 0,
			total_elapsed_seconds: 0,
			is_within_window: false,
		}
	}

	pub fn is_idle(&self) -> bool {
		!self.is_within_window
	}
}

/// Maps an instant to the playback position of a broadcast window whose playlist loops
/// from `started_at` until `ended_at`.
///
/// A position exactly on the boundary between two videos selects the later one, videos without
/// a duration are never selected. Instants outside of the window as well as playlists without
/// any playable duration result in [`PlaybackPosition::idle`].
pub fn calculate_position(window: &BroadcastWindow, instant: DateTime<Utc>) -> PlaybackPosition {
	if !window.contains(instant) {
		return PlaybackPosition::idle();
	}

	let total_duration = window.total_duration_seconds();
	if total_duration == 0 {
		return PlaybackPosition::idle();
	}

	// instant >= started_at, so truncation is the same as flooring
	let elapsed_seconds = u64::try_from((instant - window.started_at()).num_seconds()).unwrap_or_default();
	let looped_elapsed = elapsed_seconds % total_duration;

	let mut cumulative_duration = 0u64;
	for (video_index, video) in window.videos().iter().enumerate() {
		if looped_elapsed < cumulative_duration.saturating_add(video.duration_seconds) {
			return PlaybackPosition {
				video_index,
				offset_into_video: looped_elapsed - cumulative_duration,
				total_elapsed_seconds: elapsed_seconds,
				is_within_window: true,
			};
		}
		cumulative_duration = cumulative_duration.saturating_add(video.duration_seconds);
	}

	warn!(
		looped_elapsed,
		total_duration,
		"No video matched the looped position, falling back to the last video."
	);
	PlaybackPosition {
		video_index: window.videos().len() - 1,
		offset_into_video: 0,
		total_elapsed_seconds: elapsed_seconds,
		is_within_window: true,
	}
}
