//! Timer scheduling behind an injectable interface
//!
//! The listener manager never sleeps; it asks a [`Scheduler`] for a timer and is called
//! back through `on_timer` once the timer fires. Two implementations:
//!
//! - [`VirtualScheduler`]: deadlines on a [`ManualClock`], fired by advancing time explicitly.
//! - [`DelayQueueScheduler`]: `tokio_util::time::DelayQueue`, polled by the listener task.

use crate::gamepad::clock::{Clock, ManualClock};
use std::collections::{BTreeMap, HashMap};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_util::time::{delay_queue, DelayQueue};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Releases the scroll "button" after the last wheel event
    ScrollRelease,
    /// Pushes the accumulated pointer motion to the stick
    MotionFlush,
    /// Recenters the stick once motion stops
    MotionIdle,
}

/// Payload of a scheduled timer; `generation` ties it to the listener generation that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub generation: u64,
    pub kind: TimerKind,
}

pub trait Scheduler: Send {
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerId;

    /// Cancelling an unknown or already fired timer is a no-op
    fn cancel(&mut self, id: TimerId);

    /// Number of timers that have neither fired nor been cancelled
    fn pending(&self) -> usize;
}

/// Deterministic scheduler for tests and manual stepping
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    clock: ManualClock,
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), Timer>,
}

impl VirtualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            next_id: 0,
            queue: BTreeMap::new(),
        }
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Pending timers in deadline order
    pub fn pending_timers(&self) -> Vec<(TimerId, Timer)> {
        self.queue
            .iter()
            .map(|((_, id), timer)| (*id, *timer))
            .collect()
    }

    /// Removes the earliest timer due at or before `until` and moves the clock to its deadline
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, Timer)> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if deadline > until {
            return None;
        }
        let timer = self.queue.remove(&(deadline, id))?;
        self.clock.set(deadline);
        Some((id, timer))
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.queue.insert((self.clock.now() + delay, id), timer);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.queue.retain(|(_, queued), _| *queued != id);
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Tokio-backed scheduler; must be used from within a runtime
#[derive(Debug, Default)]
pub struct DelayQueueScheduler {
    queue: DelayQueue<(TimerId, Timer)>,
    keys: HashMap<TimerId, delay_queue::Key>,
    next_id: u64,
}

impl DelayQueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next expired timer; `Ready(None)` when nothing is scheduled
    pub fn poll_expired(&mut self, cx: &mut Context<'_>) -> Poll<Option<(TimerId, Timer)>> {
        match self.queue.poll_expired(cx) {
            Poll::Ready(Some(expired)) => {
                let (id, timer) = expired.into_inner();
                self.keys.remove(&id);
                Poll::Ready(Some((id, timer)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Scheduler for DelayQueueScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let key = self.queue.insert((id, timer), delay);
        self.keys.insert(id, key);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(key) = self.keys.remove(&id) {
            self.queue.remove(&key);
        } else {
            debug!("Timer {:?} already fired or cancelled", id);
        }
    }

    fn pending(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(kind: TimerKind) -> Timer {
        Timer {
            generation: 1,
            kind,
        }
    }

    #[test]
    fn virtual_scheduler_fires_in_deadline_order() {
        let mut scheduler = VirtualScheduler::new(ManualClock::new());
        let idle = scheduler.schedule(Duration::from_millis(50), timer(TimerKind::MotionIdle));
        let scroll = scheduler.schedule(Duration::from_millis(20), timer(TimerKind::ScrollRelease));

        assert_eq!(scheduler.pop_due(Duration::from_millis(10)), None);
        assert_eq!(
            scheduler.pop_due(Duration::from_millis(60)),
            Some((scroll, timer(TimerKind::ScrollRelease)))
        );
        assert_eq!(scheduler.now(), Duration::from_millis(20));
        assert_eq!(
            scheduler.pop_due(Duration::from_millis(60)),
            Some((idle, timer(TimerKind::MotionIdle)))
        );
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut scheduler = VirtualScheduler::new(ManualClock::new());
        let id = scheduler.schedule(Duration::from_millis(20), timer(TimerKind::ScrollRelease));
        scheduler.cancel(id);
        scheduler.cancel(id);

        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.pop_due(Duration::from_secs(1)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_queue_scheduler_expires_after_delay() {
        let mut scheduler = DelayQueueScheduler::new();
        let cancelled = scheduler.schedule(Duration::from_millis(10), timer(TimerKind::MotionFlush));
        let kept = scheduler.schedule(Duration::from_millis(40), timer(TimerKind::MotionIdle));
        scheduler.cancel(cancelled);
        assert_eq!(scheduler.pending(), 1);

        let start = tokio::time::Instant::now();
        let fired = std::future::poll_fn(|cx| scheduler.poll_expired(cx)).await;

        assert_eq!(fired, Some((kept, timer(TimerKind::MotionIdle))));
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(scheduler.pending(), 0);
    }
}
