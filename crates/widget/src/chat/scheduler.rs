use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle for one scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

impl TimerToken {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// One-shot deferred callbacks for the simulated typing delay.
///
/// Fired tokens are delivered back to the widget by the host loop through
/// `ChatWidget::on_timer_fired`.
pub trait ReplyScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken;
    /// Returns true when the timer was still pending.
    fn cancel(&mut self, token: TimerToken) -> bool;
}

/// Virtual-clock scheduler; time only moves through `advance`.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_token: u64,
    pending: BTreeMap<TimerToken, Duration>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Moves the clock forward and returns every due token in deadline order.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerToken> {
        self.now += by;
        let now = self.now;

        let mut due = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(token, deadline)| (*deadline, *token))
            .collect::<Vec<_>>();
        due.sort();

        for (_, token) in &due {
            self.pending.remove(token);
        }
        due.into_iter().map(|(_, token)| token).collect()
    }
}

impl ReplyScheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken::new(self.next_token);
        self.pending.insert(token, self.now + delay);
        token
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        self.pending.remove(&token).is_some()
    }
}

/// Scheduler backed by tokio timers.
///
/// Each timer is a sleeping task that sends its token on the fired channel.
/// Must be used from inside a tokio runtime.
pub struct TokioScheduler {
    fired_tx: mpsc::UnboundedSender<TimerToken>,
    tasks: HashMap<TimerToken, JoinHandle<()>>,
    next_token: u64,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerToken>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        (
            Self {
                fired_tx,
                tasks: HashMap::new(),
                next_token: 0,
            },
            fired_rx,
        )
    }

    pub fn pending_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }
}

impl ReplyScheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        self.tasks.retain(|_, task| !task.is_finished());

        self.next_token += 1;
        let token = TimerToken::new(self.next_token);
        let fired_tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the host shut down.
            let _ = fired_tx.send(token);
        });
        self.tasks.insert(token, task);
        token
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        match self.tasks.remove(&token) {
            Some(task) => {
                let was_pending = !task.is_finished();
                task.abort();
                was_pending
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
