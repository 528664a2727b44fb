use log::debug;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Countdown,
    Advance,
    Opponent,
}

/// Aborts its task when dropped.
#[derive(Debug)]
pub struct TimerHandle(JoinHandle<()>);

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// The timers of one session. Each kind runs at most once at a time: starting
/// a kind replaces whatever was running under it.
#[derive(Debug)]
pub struct Timers<E> {
    tx: UnboundedSender<E>,
    running: HashMap<TimerKind, TimerHandle>,
}

impl<E: Send + 'static> Timers<E> {
    pub fn new(tx: UnboundedSender<E>) -> Self {
        Timers {
            tx,
            running: HashMap::new(),
        }
    }

    /// Sends `make()` every `period`, starting one period from now.
    pub fn every<F>(&mut self, kind: TimerKind, period: Duration, make: F)
    where
        F: Fn() -> E + Send + 'static,
    {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(make()).is_err() {
                    break;
                }
            }
        });
        self.replace(kind, handle);
    }

    /// Sends `event` once after `delay`.
    pub fn after(&mut self, kind: TimerKind, delay: Duration, event: E) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            let _ = tx.send(event);
        });
        self.replace(kind, handle);
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if self.running.remove(&kind).is_some() {
            debug!("[Timer] Cancelled {:?}", kind);
        }
    }

    pub fn cancel_all(&mut self) {
        debug!("[Timer] Cancelling {} timers", self.running.len());
        self.running.clear();
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.running
            .get(&kind)
            .is_some_and(|handle| !handle.0.is_finished())
    }

    fn replace(&mut self, kind: TimerKind, handle: JoinHandle<()>) {
        if self.running.insert(kind, TimerHandle(handle)).is_some() {
            debug!("[Timer] Replaced running {:?}", kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test(start_paused = true)]
    async fn periodic_timer_ticks_once_per_period() {
        let (tx, mut rx) = unbounded_channel();
        let mut timers = Timers::new(tx);
        let start = Instant::now();
        timers.every(TimerKind::Countdown, Duration::from_secs(1), || 7u32);

        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_sends_nothing() {
        let (tx, mut rx) = unbounded_channel::<u32>();
        let mut timers = Timers::new(tx);
        timers.every(TimerKind::Countdown, Duration::from_secs(1), || 1);
        timers.after(TimerKind::Advance, Duration::from_secs(2), 2);
        timers.cancel(TimerKind::Countdown);
        assert!(!timers.is_running(TimerKind::Countdown));

        sleep(Duration::from_secs(3)).await;
        assert_eq!(rx.try_recv().ok(), Some(2));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn starting_a_kind_again_replaces_it() {
        let (tx, mut rx) = unbounded_channel();
        let mut timers = Timers::new(tx);
        timers.after(TimerKind::Advance, Duration::from_secs(1), "old");
        timers.after(TimerKind::Advance, Duration::from_secs(2), "new");

        sleep(Duration::from_secs(3)).await;
        assert_eq!(rx.try_recv().ok(), Some("new"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_set_stops_every_timer() {
        let (tx, mut rx) = unbounded_channel::<u32>();
        let mut timers = Timers::new(tx.clone());
        timers.every(TimerKind::Countdown, Duration::from_secs(1), || 1);
        timers.after(TimerKind::Opponent, Duration::from_secs(1), 2);
        drop(timers);

        sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        drop(tx);
    }
}
