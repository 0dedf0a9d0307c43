use crate::player::driver::{DriverAction, PlayerDriver};
use crate::player::media_element::MediaElement;
use crate::schedule::position::calculate_position;
use crate::schedule::snapshot::WindowSnapshot;
use crate::time_sync::TimeSynchronizer;
use crate::utils::aborting_join_handle::AbortingJoinHandle;
use crate::utils::time_source::TimeSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const TICK_TIMER: &str = "playback tick";

/// Recalculates the playback position on every tick and hands it to the player driver.
pub struct PlaybackScheduler;

/// Keeps the scheduler ticking. Stopping or dropping it stops the ticks.
#[must_use = "the scheduler stops as soon as its handle is dropped"]
pub struct SchedulerHandle {
	task: AbortingJoinHandle<()>,
}

impl SchedulerHandle {
	pub fn stop(self) {
		self.task.abort();
	}

	pub fn is_running(&self) -> bool {
		!self.task.is_finished()
	}
}

impl PlaybackScheduler {
	pub fn start<Element>(
		synchronizer: Arc<TimeSynchronizer>,
		snapshot: WindowSnapshot,
		mut driver: PlayerDriver<Element>,
		time_source: &TimeSource,
		tick_interval: Duration,
	) -> SchedulerHandle
	where
		Element: MediaElement + 'static,
	{
		let mut interval = time_source.interval_at(TICK_TIMER, Duration::ZERO, tick_interval);
		let task = AbortingJoinHandle::spawn(async move {
			loop {
				interval.tick().await;

				let versioned_window = snapshot.current();
				let position = calculate_position(&versioned_window.window, synchronizer.corrected_now());
				if let action @ (DriverAction::Loaded { .. } | DriverAction::Stopped) =
					driver.apply(&versioned_window, position)
				{
					debug!(?action, ?position, version = versioned_window.version, "Player changed.");
				}
			}
		});

		SchedulerHandle { task }
	}
}
