//! Timers owned by a view: the repeating
//! current-time tick and one-shot delayed
//! actions. Both abort their task when
//! cancelled or dropped.

use std::time::Duration;

use chrono::{
  DateTime,
  Timelike,
  Utc
};
use tokio::task::JoinHandle;
use tokio::time::{
  Instant,
  MissedTickBehavior
};
use tracing::{
  debug,
  trace
};

#[derive(Debug)]
pub struct CurrentTimeTicker {
  handle: JoinHandle<()>
}

impl CurrentTimeTicker {
  /// Ticks immediately, then every
  /// `period`. Must be called inside a
  /// tokio runtime.
  pub fn spawn<F>(
    period: Duration,
    on_tick: F
  ) -> Self
  where
    F: FnMut(DateTime<Utc>) + Send + 'static
  {
    Self::spawn_at(Instant::now(), period, on_tick)
  }

  /// First tick on the next wall-clock
  /// minute boundary after `now`.
  pub fn spawn_minute_aligned<F>(
    now: DateTime<Utc>,
    on_tick: F
  ) -> Self
  where
    F: FnMut(DateTime<Utc>) + Send + 'static
  {
    Self::spawn_at(
      Instant::now() + until_next_minute(now),
      Duration::from_secs(60),
      on_tick
    )
  }

  fn spawn_at<F>(
    start: Instant,
    period: Duration,
    mut on_tick: F
  ) -> Self
  where
    F: FnMut(DateTime<Utc>) + Send + 'static
  {
    debug!(?period, "starting current-time ticker");
    let handle = tokio::spawn(async move {
      let mut interval =
        tokio::time::interval_at(start, period);
      interval.set_missed_tick_behavior(
        MissedTickBehavior::Delay
      );
      loop {
        interval.tick().await;
        let now = Utc::now();
        trace!(%now, "current-time tick");
        on_tick(now);
      }
    });
    Self { handle }
  }

  pub fn cancel(&self) {
    self.handle.abort();
  }

  #[must_use]
  pub fn is_finished(&self) -> bool {
    self.handle.is_finished()
  }
}

impl Drop for CurrentTimeTicker {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

/// Fire-once action, e.g. scrolling a
/// strip once its frame has settled.
#[derive(Debug)]
pub struct DeferredAction {
  handle: JoinHandle<()>
}

impl DeferredAction {
  pub fn schedule<F>(
    delay: Duration,
    action: F
  ) -> Self
  where
    F: FnOnce() + Send + 'static
  {
    let handle = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      action();
    });
    Self { handle }
  }

  pub fn cancel(&self) {
    if !self.handle.is_finished() {
      debug!("cancelling deferred action");
    }
    self.handle.abort();
  }

  #[must_use]
  pub fn is_finished(&self) -> bool {
    self.handle.is_finished()
  }
}

impl Drop for DeferredAction {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

#[must_use]
pub fn until_next_minute(
  now: DateTime<Utc>
) -> Duration {
  let into_minute =
    Duration::from_secs(u64::from(now.second()))
      + Duration::from_nanos(u64::from(
        now.nanosecond() % 1_000_000_000
      ));
  Duration::from_secs(60)
    .saturating_sub(into_minute)
}
