use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use pin_project::pin_project;
use std::any::type_name;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{Notify, broadcast};
use tokio::time::{MissedTickBehavior, interval_at, timeout};
use tokio_stream::wrappers::BroadcastStream;

/// Source of wall-clock time, intervals and timeouts.
///
/// The default instance is backed by the system clock and tokio timers. [`TimeSource::test`]
/// creates a virtual clock that only moves when a test advances it, keyed by a name per timer so
/// independent timers can be driven separately.
#[derive(Clone, Default)]
pub struct TimeSource {
	test_time_sources: Option<Arc<TestTimeSources>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Deadline has elapsed")]
pub struct Elapsed;

struct TestTimeSources {
	named_time_sources: parking_lot::Mutex<BTreeMap<&'static str, Arc<TestTimeSource>>>,
	wall_clock: parking_lot::Mutex<DateTime<Utc>>,
}

struct TestTimeSource {
	time_sender: broadcast::Sender<Duration>,
	notification: Notify,
}

impl Default for TestTimeSource {
	fn default() -> Self {
		Self {
			time_sender: broadcast::channel(64).0,
			notification: Notify::new(),
		}
	}
}

impl TestTimeSources {
	fn new(now: DateTime<Utc>) -> Self {
		Self {
			named_time_sources: Default::default(),
			wall_clock: parking_lot::Mutex::new(now),
		}
	}

	fn named(&self, name: &'static str) -> Arc<TestTimeSource> {
		let mut time_sources = self.named_time_sources.lock();
		time_sources.entry(name).or_default().clone()
	}

	fn interval_at(&self, name: &'static str, start: Duration, period: Duration) -> TestInterval {
		let time_source = self.named(name);
		let interval = TestInterval {
			current_time: Duration::ZERO,
			next_deadline: start,
			period,
			receiver: BroadcastStream::new(time_source.time_sender.subscribe()),
		};

		time_source.notification.notify_one();

		interval
	}

	fn timeout<ValueFuture: Future>(
		&self,
		name: &'static str,
		duration: Duration,
		future: ValueFuture,
	) -> TestTimeout<ValueFuture> {
		let time_source = self.named(name);
		let timeout = TestTimeout {
			future,
			current_time: Duration::ZERO,
			deadline: duration,
			receiver: BroadcastStream::new(time_source.time_sender.subscribe()),
		};

		time_source.notification.notify_one();

		timeout
	}

	fn advance_time(&self, name: &'static str, by_duration: Duration) {
		// nobody might be waiting yet, that's fine
		let _ = self.named(name).time_sender.send(by_duration);
	}

	async fn wait_for_time_request(&self, name: &'static str) {
		// resolve the Arc first so the MutexGuard isn't held across an await point
		let time_source = self.named(name);
		time_source.notification.notified().await;
	}
}

impl TimeSource {
	/// Virtual time source whose wall clock starts at the unix epoch.
	pub fn test() -> Self {
		Self::test_at(DateTime::<Utc>::UNIX_EPOCH)
	}

	pub fn test_at(now: DateTime<Utc>) -> Self {
		Self {
			test_time_sources: Some(Arc::new(TestTimeSources::new(now))),
		}
	}

	pub fn now(&self) -> DateTime<Utc> {
		match &self.test_time_sources {
			None => Utc::now(),
			Some(test_time_sources) => *test_time_sources.wall_clock.lock(),
		}
	}

	pub fn interval_at(&self, name: &'static str, start: Duration, period: Duration) -> Interval {
		match &self.test_time_sources {
			None => {
				let mut interval = interval_at(tokio::time::Instant::now() + start, period);
				interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
				Interval::Tokio(interval)
			}
			Some(test_time_sources) => Interval::Test(test_time_sources.interval_at(name, start, period)),
		}
	}

	pub fn timeout<ValueFuture: Future>(
		&self,
		name: &'static str,
		duration: Duration,
		future: ValueFuture,
	) -> Timeout<ValueFuture> {
		match &self.test_time_sources {
			None => Timeout::Tokio(timeout(duration, future)),
			Some(test_time_sources) => Timeout::Test(test_time_sources.timeout(name, duration, future)),
		}
	}

	pub fn set_now(&self, now: DateTime<Utc>) {
		*self.test_time_sources().wall_clock.lock() = now;
	}

	pub fn advance_now(&self, by_duration: chrono::Duration) {
		*self.test_time_sources().wall_clock.lock() += by_duration;
	}

	pub fn advance_time(&self, name: &'static str, by_duration: Duration) {
		self.test_time_sources().advance_time(name, by_duration);
	}

	pub async fn wait_for_time_request(&self, name: &'static str) {
		match &self.test_time_sources {
			None => (),
			Some(test_time_sources) => test_time_sources.wait_for_time_request(name).await,
		}
	}

	fn test_time_sources(&self) -> &TestTimeSources {
		self.test_time_sources
			.as_deref()
			.expect("Can only be called in test mode.")
	}
}

pub enum Interval {
	Tokio(tokio::time::Interval),
	Test(TestInterval),
}

impl Interval {
	pub async fn tick(&mut self) {
		match self {
			Interval::Tokio(interval) => {
				interval.tick().await;
			}
			Interval::Test(interval) => interval
				.next()
				.await
				.unwrap_or_else(|| panic!("{} dropped prematurely.", type_name::<TimeSource>())),
		}
	}
}

pub struct TestInterval {
	current_time: Duration,
	next_deadline: Duration,
	period: Duration,
	receiver: BroadcastStream<Duration>,
}

impl futures_util::Stream for TestInterval {
	type Item = ();

	fn poll_next(mut self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		loop {
			match self.receiver.poll_next_unpin(context) {
				Poll::Ready(Some(time_delta)) => {
					self.current_time += time_delta.expect("Test time source lagged behind.");
				}
				Poll::Ready(None) => return Poll::Ready(None),
				Poll::Pending => break,
			}
		}

		if self.current_time >= self.next_deadline {
			let period = self.period;
			self.next_deadline += period;
			return Poll::Ready(Some(()));
		}

		Poll::Pending
	}
}

#[pin_project(project = ProjectedTimeout)]
pub enum Timeout<ValueFuture> {
	Tokio(#[pin] tokio::time::Timeout<ValueFuture>),
	Test(#[pin] TestTimeout<ValueFuture>),
}

impl<ValueFuture: Future> Future for Timeout<ValueFuture> {
	type Output = Result<ValueFuture::Output, Elapsed>;

	fn poll(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
		match self.project() {
			ProjectedTimeout::Tokio(timeout) => timeout.poll(context).map(|result| result.map_err(|_| Elapsed)),
			ProjectedTimeout::Test(timeout) => timeout.poll(context),
		}
	}
}

#[pin_project]
pub struct TestTimeout<ValueFuture> {
	#[pin]
	future: ValueFuture,
	current_time: Duration,
	deadline: Duration,
	receiver: BroadcastStream<Duration>,
}

impl<ValueFuture: Future> Future for TestTimeout<ValueFuture> {
	type Output = Result<ValueFuture::Output, Elapsed>;

	fn poll(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.project();
		loop {
			match this.receiver.poll_next_unpin(context) {
				Poll::Ready(Some(time_delta)) => {
					*this.current_time += time_delta.expect("Test time source lagged behind.");
				}
				Poll::Ready(None) => return Poll::Ready(Err(Elapsed)),
				Poll::Pending => break,
			}
		}

		if this.current_time >= this.deadline {
			return Poll::Ready(Err(Elapsed));
		}

		this.future.poll(context).map(Ok)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use futures_util::poll;
	use std::fmt::Debug;
	use std::pin::pin;

	#[tokio::test]
	async fn time_source_should_create_tokio_interval_with_correct_short_period() {
		let mut interval = create_tokio_based_interval(Duration::from_millis(0), Duration::from_millis(1));

		tokio::time::timeout(Duration::from_millis(100), interval.tick())
			.await
			.expect("Incorrect start time");
		tokio::time::timeout(Duration::from_millis(100), interval.tick())
			.await
			.expect("Incorrect period");
	}

	#[tokio::test]
	async fn time_source_should_create_tokio_interval_with_long_period() {
		let mut interval = create_tokio_based_interval(Duration::from_millis(0), Duration::from_secs(1));

		tokio::time::timeout(Duration::from_millis(500), interval.tick())
			.await
			.expect("Incorrect start time");
		tokio::time::timeout(Duration::from_millis(10), interval.tick())
			.await
			.expect_err("Incorrect period");
	}

	#[tokio::test]
	async fn time_source_should_create_tokio_interval_with_long_start_time() {
		let mut interval = create_tokio_based_interval(Duration::from_secs(1), Duration::from_secs(1));

		tokio::time::timeout(Duration::from_millis(500), interval.tick())
			.await
			.expect_err("Incorrect start time");
	}

	fn create_tokio_based_interval(start: Duration, period: Duration) -> Interval {
		let time_source = TimeSource::default();
		let interval = time_source.interval_at("irrelevant", start, period);

		assert!(matches!(interval, Interval::Tokio(_)));
		interval
	}

	#[test]
	fn default_time_source_should_report_system_time() {
		let time_source = TimeSource::default();

		let before = Utc::now();
		let now = time_source.now();
		let after = Utc::now();

		assert!((before..=after).contains(&now), "{now} was not between {before} and {after}");
	}

	#[test]
	fn test_time_source_should_only_move_its_wall_clock_when_told_to() {
		let start = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
			.expect("Invalid timestamp")
			.with_timezone(&Utc);
		let time_source = TimeSource::test_at(start);
		assert_eq!(start, time_source.now());

		time_source.advance_time("unrelated", Duration::from_secs(42));
		assert_eq!(start, time_source.now());

		time_source.advance_now(chrono::Duration::milliseconds(1337));
		assert_eq!(start + chrono::Duration::milliseconds(1337), time_source.now());

		time_source.set_now(DateTime::<Utc>::UNIX_EPOCH);
		assert_eq!(DateTime::<Utc>::UNIX_EPOCH, time_source.now());
	}

	#[test]
	fn test_time_source_wall_clock_should_be_shared_with_clones() {
		let original_time_source = TimeSource::test();
		let cloned_time_source = original_time_source.clone();

		cloned_time_source.advance_now(chrono::Duration::seconds(5));

		assert_eq!(
			DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(5),
			original_time_source.now()
		);
	}

	#[tokio::test]
	async fn test_interval_should_only_trigger_when_advanced_to_its_start_time() {
		let time_source = TimeSource::test();

		let mut interval = time_source.interval_at("test", Duration::from_secs(1337), Duration::from_secs(42));
		assert!(matches!(interval, Interval::Test(_)));

		let mut start_future = pin!(interval.tick());
		assert_eq!(poll!(start_future.as_mut()), Poll::Pending);

		time_source.advance_time("test", Duration::from_secs(42));
		assert_eq!(poll!(start_future.as_mut()), Poll::Pending);

		time_source.advance_time("test", Duration::from_secs(1337 - 42));
		assert_eq!(poll!(start_future.as_mut()), Poll::Ready(()));
	}

	#[tokio::test]
	async fn test_interval_should_trigger_after_period() {
		let time_source = TimeSource::test();

		let mut interval = time_source.interval_at("nirvana", Duration::ZERO, Duration::from_secs(42));

		interval.tick().await;

		{
			let mut first_period_future = pin!(interval.tick());
			assert_eq!(poll!(first_period_future.as_mut()), Poll::Pending);

			time_source.advance_time("nirvana", Duration::from_secs(1));
			assert_eq!(poll!(first_period_future.as_mut()), Poll::Pending);

			time_source.advance_time("nirvana", Duration::from_secs(41));
			assert_eq!(poll!(first_period_future.as_mut()), Poll::Ready(()));
		}

		{
			let mut second_period_future = pin!(interval.tick());
			assert_eq!(poll!(second_period_future.as_mut()), Poll::Pending);

			time_source.advance_time("nirvana", Duration::from_secs(10));
			assert_eq!(poll!(second_period_future.as_mut()), Poll::Pending);

			time_source.advance_time("nirvana", Duration::from_secs(40));
			assert_eq!(poll!(second_period_future.as_mut()), Poll::Ready(()));
		}
	}

	#[tokio::test]
	async fn test_time_source_should_advance_time_with_cloned_objects() {
		let original_time_source = TimeSource::test();
		let mut interval =
			original_time_source.interval_at("dolly", Duration::from_millis(1), Duration::from_millis(1));

		let cloned_time_source = original_time_source.clone();
		cloned_time_source.advance_time("dolly", Duration::from_millis(1));
		assert_poll(Poll::Ready(()), interval.tick()).await;
	}

	#[tokio::test]
	async fn test_interval_should_trigger_multiple_times_after_advancing_multiple_period_lengths() {
		let time_source = TimeSource::test();

		let mut interval = time_source.interval_at("multiple", Duration::from_secs(10), Duration::from_secs(100));

		time_source.advance_time("multiple", Duration::from_secs(210));

		assert_poll(Poll::Ready(()), interval.tick()).await;
		assert_poll(Poll::Ready(()), interval.tick()).await;
		assert_poll(Poll::Ready(()), interval.tick()).await;
		assert_poll(Poll::Pending, interval.tick()).await;
	}

	#[tokio::test]
	async fn time_source_should_create_tokio_timeout_that_elapses() {
		let time_source = TimeSource::default();

		let timeout = time_source.timeout("irrelevant", Duration::from_millis(1), std::future::pending::<u8>());
		assert_eq!(timeout.await, Err(Elapsed));
	}

	#[tokio::test]
	async fn time_source_should_create_tokio_timeout_that_succeeds() {
		let time_source = TimeSource::default();

		let timeout = time_source.timeout("irrelevant", Duration::from_millis(1), std::future::ready(42));
		assert_eq!(timeout.await, Ok(42));
	}

	#[tokio::test]
	async fn test_timeout_should_not_time_out_too_early() {
		let time_source = TimeSource::test();

		let timeout = time_source.timeout("early bird", Duration::from_millis(1337), std::future::ready(42));
		time_source.advance_time("early bird", Duration::from_millis(42));
		assert_eq!(timeout.await, Ok(42));
	}

	#[tokio::test]
	async fn test_timeout_should_time_out() {
		let time_source = TimeSource::test();

		let timeout = time_source.timeout("tick tock", Duration::from_millis(1337), std::future::ready(42));
		time_source.advance_time("tick tock", Duration::from_millis(1337));
		assert_eq!(timeout.await, Err(Elapsed));

		let timeout = time_source.timeout("tick tock", Duration::from_millis(1), std::future::pending::<u8>());
		time_source.advance_time("tick tock", Duration::from_millis(1));
		assert_eq!(timeout.await, Err(Elapsed));
	}

	#[tokio::test]
	async fn test_timeout_should_trigger_time_request() {
		const TIMEOUT_NAME: &str = "timeout";
		let time_source = TimeSource::test();

		assert_poll(Poll::Pending, time_source.wait_for_time_request(TIMEOUT_NAME)).await;

		time_source
			.timeout(TIMEOUT_NAME, Duration::from_millis(1337), std::future::ready(()))
			.await
			.expect("Timeout failed");
		assert_poll(Poll::Ready(()), time_source.wait_for_time_request(TIMEOUT_NAME)).await;
	}

	#[tokio::test]
	async fn test_interval_with_different_name_should_not_trigger_time_request() {
		const INTERVAL_NAME: &str = "interval";
		const WAIT_NAME: &str = "infinity";
		let time_source = TimeSource::test();

		let mut interval = time_source.interval_at(INTERVAL_NAME, Duration::ZERO, Duration::from_millis(1));
		interval.tick().await;
		assert_poll(Poll::Pending, time_source.wait_for_time_request(WAIT_NAME)).await;
	}

	async fn assert_poll<OutputType: Debug + PartialEq>(
		expected: Poll<OutputType>,
		future: impl Future<Output = OutputType>,
	) {
		let mut pinned = pin!(future);
		assert_eq!(expected, poll!(pinned.as_mut()));
	}
}
