use crate::schedule::broadcast_window::BroadcastWindow;
use tokio::sync::watch;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedWindow {
	pub version: u64,
	pub window: BroadcastWindow,
}

impl VersionedWindow {
	pub fn new(window: BroadcastWindow) -> Self {
		Self { version: 0, window }
	}

	#[must_use = "returns a `VersionedWindow` with new version that must be propagated"]
	fn replace(&mut self, window: BroadcastWindow, previous_version: u64) -> Option<VersionedWindow> {
		if self.version != previous_version {
			return None;
		}

		self.version += 1;
		self.window = window;
		Some(self.clone())
	}
}

/// The broadcast window a player currently works with.
///
/// Starts out with the approximate window that is available immediately and can later be
/// replaced as a whole by a refined one. Readers always see a complete window together with its
/// version, never a partially updated playlist.
#[derive(Clone)]
pub struct WindowSnapshot {
	sender: watch::Sender<VersionedWindow>,
}

impl WindowSnapshot {
	pub fn new(approximate_window: BroadcastWindow) -> Self {
		let (sender, _) = watch::channel(VersionedWindow::new(approximate_window));
		Self { sender }
	}

	pub fn current(&self) -> VersionedWindow {
		self.sender.borrow().clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<VersionedWindow> {
		self.sender.subscribe()
	}

	/// Replaces the window if nobody else replaced it since `previous_version` was read.
	pub fn publish_refined(&self, window: BroadcastWindow, previous_version: u64) -> Option<VersionedWindow> {
		let mut published = None;
		self.sender.send_if_modified(|current| {
			published = current.replace(window, previous_version);
			published.is_some()
		});
		published
	}
}
