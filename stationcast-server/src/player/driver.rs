use crate::player::media_element::MediaElement;
use crate::schedule::position::PlaybackPosition;
use crate::schedule::snapshot::VersionedWindow;
use crate::schedule::video::VideoId;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverAction {
	Loaded { video_index: usize, seek_to_seconds: u64 },
	Stopped,
	/// Whatever is loaded keeps playing on its own.
	Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LoadedVideo {
	/// How often the playlist looped before this video started.
	playlist_loop: u64,
	video_index: usize,
	video_id: VideoId,
}

/// Turns playback positions into media element operations.
///
/// Only seeks when a different video has to be loaded, including the same video again once the
/// playlist looped. Once loaded, a video plays on without being corrected every tick.
pub struct PlayerDriver<Element> {
	element: Element,
	loaded: Option<LoadedVideo>,
}

impl<Element: MediaElement> PlayerDriver<Element> {
	pub fn new(element: Element) -> Self {
		Self { element, loaded: None }
	}

	pub fn apply(&mut self, versioned_window: &VersionedWindow, position: PlaybackPosition) -> DriverAction {
		if position.is_idle() {
			return self.stop();
		}

		let Some(video) = versioned_window.window.videos().get(position.video_index) else {
			warn!(
				video_index = position.video_index,
				version = versioned_window.version,
				"Position refers to a video that doesn't exist."
			);
			return self.stop();
		};

		let playlist_loop = position
			.total_elapsed_seconds
			.checked_div(versioned_window.window.total_duration_seconds())
			.unwrap_or_default();
		let wanted = LoadedVideo {
			playlist_loop,
			video_index: position.video_index,
			video_id: video.id,
		};
		if self.loaded == Some(wanted) {
			return DriverAction::Unchanged;
		}

		self.element.load(video, position.offset_into_video);
		self.loaded = Some(wanted);
		DriverAction::Loaded {
			video_index: position.video_index,
			seek_to_seconds: position.offset_into_video,
		}
	}

	fn stop(&mut self) -> DriverAction {
		if self.loaded.take().is_none() {
			return DriverAction::Unchanged;
		}

		self.element.stop();
		DriverAction::Stopped
	}
}
