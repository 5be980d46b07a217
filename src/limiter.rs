//! Fixed-window admission control shared by every request the client issues.
//!
//! A [`PermitPool`] holds `rate` admission slots. Each admission consumes one slot and nothing
//! hands it back individually; instead a single background reset loop returns the pool to full
//! capacity once per interval. The result is a fixed-window counter: at most `rate` admissions per
//! window, with bursts allowed on either side of a window boundary.
//!
//! [`FixedWindowLimiter`] owns exactly one reset loop at a time. Reconfiguration closes the old
//! pool, waits for the old loop to finish, then installs a fresh pool and loop so a retiring loop
//! can never drain the new pool.

// crates.io
use tokio::{
	runtime::Handle,
	sync::Semaphore,
	task::JoinHandle,
	time::{self, Instant, MissedTickBehavior},
};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	obs::{self, LimiterEvent},
};

/// Limiter parameters: `rate` admissions per `interval`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterConfig {
	/// Permits per window. Zero admits nothing.
	pub rate: u32,
	/// Window length between resets.
	pub interval: StdDuration,
}
impl LimiterConfig {
	/// Shortest window the reset loop will tick at.
	pub const MIN_INTERVAL: StdDuration = StdDuration::from_millis(1);

	/// Creates a configuration of `rate` admissions per `interval`.
	pub const fn new(rate: u32, interval: StdDuration) -> Self {
		Self { rate, interval }
	}

	/// Interval actually used by the reset loop; zero is clamped to [`Self::MIN_INTERVAL`].
	pub fn effective_interval(&self) -> StdDuration {
		self.interval.max(Self::MIN_INTERVAL)
	}
}
impl Default for LimiterConfig {
	fn default() -> Self {
		Self::new(1, StdDuration::from_secs(1))
	}
}

/// Bounded pool of admission slots drained back to zero occupancy on every reset.
#[derive(Debug)]
pub struct PermitPool {
	permits: Semaphore,
	capacity: usize,
}
impl PermitPool {
	/// Creates an empty pool with `capacity` free slots.
	pub fn new(capacity: u32) -> Self {
		let capacity = capacity as usize;

		Self { permits: Semaphore::new(capacity), capacity }
	}

	/// Maximum number of admissions per window.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Number of slots consumed since the last reset.
	pub fn occupancy(&self) -> usize {
		self.capacity.saturating_sub(self.permits.available_permits())
	}

	/// Waits for a free slot.
	///
	/// Fails with [`Error::Cancelled`] when `cancel` fires first, in which case no slot is taken,
	/// or with [`Error::Closed`] once the pool has been closed.
	pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
		tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(Error::Cancelled),
			permit = self.permits.acquire() => {
				permit.map_err(|_| Error::Closed)?.forget();

				Ok(())
			},
		}
	}

	/// Releases every held slot in one step and returns how many were released.
	///
	/// Only the reset loop calls this, so concurrent acquisitions can only lower the available
	/// count between the read and the release and capacity is never exceeded.
	pub fn reset(&self) -> usize {
		let released = self.occupancy();

		self.permits.add_permits(released);

		released
	}

	/// Closes the pool; current and future waiters fail with [`Error::Closed`].
	pub fn close(&self) {
		self.permits.close();
	}

	/// Returns `true` once [`PermitPool::close`] has been called.
	pub fn is_closed(&self) -> bool {
		self.permits.is_closed()
	}
}

/// Background task that resets a [`PermitPool`] once per window.
#[derive(Debug)]
struct ResetLoop {
	cancel: CancellationToken,
	handle: Option<JoinHandle<()>>,
}
impl ResetLoop {
	fn spawn(runtime: &Handle, pool: Arc<PermitPool>, config: LimiterConfig) -> Self {
		let cancel = CancellationToken::new();
		let period = config.effective_interval();
		let first_reset = Instant::now() + period;
		let handle = runtime.spawn(Self::run(pool, first_reset, period, cancel.clone()));

		obs::trace_limiter_event(LimiterEvent::Started {
			rate: config.rate,
			interval: config.interval,
		});

		Self { cancel, handle: Some(handle) }
	}

	async fn run(
		pool: Arc<PermitPool>,
		first_reset: Instant,
		period: StdDuration,
		cancel: CancellationToken,
	) {
		let mut ticker = time::interval_at(first_reset, period);

		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => return,
				_ = ticker.tick() => obs::record_window_reset(pool.reset()),
			}
		}
	}

	/// Signals the loop, waits until it has fully exited, and reports how it ended.
	///
	/// A panic inside the loop is contained here and reported as [`LimiterEvent::Panicked`].
	async fn stop(&mut self) -> LimiterEvent {
		self.cancel.cancel();

		let Some(handle) = self.handle.take() else { return LimiterEvent::Stopped };
		let event = match handle.await {
			Err(e) if e.is_panic() => LimiterEvent::Panicked,
			_ => LimiterEvent::Stopped,
		};

		obs::trace_limiter_event(event);

		event
	}
}
impl Drop for ResetLoop {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

/// Fixed-window limiter owning one [`PermitPool`] and the single loop that resets it.
#[derive(Debug)]
pub struct FixedWindowLimiter {
	config: LimiterConfig,
	pool: Arc<PermitPool>,
	reset_loop: ResetLoop,
	runtime: Handle,
	shut_down: bool,
}
impl FixedWindowLimiter {
	/// Starts a limiter and its reset loop on the ambient tokio runtime.
	pub fn start(config: LimiterConfig) -> Result<Self> {
		let runtime = Handle::try_current().map_err(|_| ConfigError::MissingRuntime)?;
		let pool = Arc::new(PermitPool::new(config.rate));
		let reset_loop = ResetLoop::spawn(&runtime, pool.clone(), config);

		Ok(Self { config, pool, reset_loop, runtime, shut_down: false })
	}

	/// Active configuration.
	pub fn config(&self) -> LimiterConfig {
		self.config
	}

	/// Shared handle to the active pool, so callers can wait without holding the owner.
	pub fn pool(&self) -> Arc<PermitPool> {
		self.pool.clone()
	}

	/// Returns `true` after [`FixedWindowLimiter::shutdown`].
	pub fn is_shut_down(&self) -> bool {
		self.shut_down
	}

	/// Waits for admission on the active pool.
	pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
		self.pool.acquire(cancel).await
	}

	/// Replaces the pool and the reset loop with ones built from `config`.
	///
	/// The old pool is closed first so no waiter is admitted mid-swap, and the old loop is fully
	/// stopped before the new pool exists.
	pub async fn reconfigure(&mut self, config: LimiterConfig) -> Result<()> {
		if self.shut_down {
			return Err(Error::Closed);
		}

		self.pool.close();
		self.reset_loop.stop().await;

		let pool = Arc::new(PermitPool::new(config.rate));

		self.reset_loop = ResetLoop::spawn(&self.runtime, pool.clone(), config);
		self.pool = pool;
		self.config = config;

		Ok(())
	}

	/// Stops the reset loop and closes the pool. A second call fails with [`Error::Closed`].
	pub async fn shutdown(&mut self) -> Result<()> {
		if self.shut_down {
			return Err(Error::Closed);
		}

		self.shut_down = true;
		self.reset_loop.stop().await;
		self.pool.close();

		Ok(())
	}
}
