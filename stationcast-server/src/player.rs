use crate::configuration::Configuration;
use crate::duration_resolution::DurationResolver;
use crate::player::driver::PlayerDriver;
use crate::player::media_element::MediaElement;
use crate::player::scheduler::{PlaybackScheduler, SchedulerHandle};
use crate::schedule::broadcast_window::BroadcastWindow;
use crate::schedule::position::{PlaybackPosition, calculate_position};
use crate::schedule::snapshot::{VersionedWindow, WindowSnapshot};
use crate::time_sync::{ServerTimeSource, TimeSyncState, TimeSynchronizer};
use crate::utils::aborting_join_handle::AbortingJoinHandle;
use crate::utils::time_source::TimeSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

pub mod driver;
pub mod media_element;
pub mod scheduler;

#[derive(Clone, Copy, Debug, PartialEq, Eq, TypedBuilder)]
pub struct PlayerSettings {
	#[builder(default = Duration::from_secs(1))]
	pub tick_interval: Duration,
	#[builder(default = Duration::from_secs(5 * 60))]
	pub resync_interval: Duration,
}

impl From<&Configuration> for PlayerSettings {
	fn from(configuration: &Configuration) -> Self {
		Self::builder()
			.tick_interval(configuration.tick_interval)
			.resync_interval(configuration.resync_interval)
			.build()
	}
}

/// Virtual live player for a single station.
///
/// Owns its own time synchronizer and window snapshot. Dropping the player stops every task it
/// started.
pub struct Player {
	synchronizer: Arc<TimeSynchronizer>,
	snapshot: WindowSnapshot,
	scheduler: SchedulerHandle,
	resync: AbortingJoinHandle<()>,
	refinement: AbortingJoinHandle<()>,
}

impl Player {
	/// Starts playing `window` as soon as the clock is synchronized once. Durations are resolved
	/// in the background and picked up on a later tick.
	pub async fn start<Element>(
		window: BroadcastWindow,
		server_time_source: Arc<dyn ServerTimeSource>,
		resolver: DurationResolver,
		element: Element,
		time_source: TimeSource,
		settings: &PlayerSettings,
	) -> Self
	where
		Element: MediaElement + 'static,
	{
		let synchronizer = Arc::new(TimeSynchronizer::new(server_time_source, time_source.clone()));
		let state = synchronizer.sync().await;
		info!(
			offset_milliseconds = state.offset_milliseconds,
			is_synced = state.is_synced,
			"Initial time synchronization done."
		);
		let resync = synchronizer.spawn_periodic_resync(settings.resync_interval);

		let snapshot = WindowSnapshot::new(window);
		let refinement = {
			let snapshot = snapshot.clone();
			AbortingJoinHandle::spawn(async move {
				resolver.refine(&snapshot).await;
			})
		};

		let scheduler = PlaybackScheduler::start(
			Arc::clone(&synchronizer),
			snapshot.clone(),
			PlayerDriver::new(element),
			&time_source,
			settings.tick_interval,
		);

		Self {
			synchronizer,
			snapshot,
			scheduler,
			resync,
			refinement,
		}
	}

	pub fn time_sync_state(&self) -> TimeSyncState {
		self.synchronizer.state()
	}

	pub fn window_updates(&self) -> watch::Receiver<VersionedWindow> {
		self.snapshot.subscribe()
	}

	/// Where playback should be right now, on the synchronized clock.
	pub fn position(&self) -> PlaybackPosition {
		calculate_position(&self.snapshot.current().window, self.synchronizer.corrected_now())
	}

	pub fn stop(self) {
		let Self {
			scheduler,
			resync,
			refinement,
			..
		} = self;
		if !scheduler.is_running() {
			warn!("Playback scheduler had stopped on its own.");
		}
		scheduler.stop();
		resync.abort();
		refinement.abort();
		info!("Player stopped.");
	}
}
