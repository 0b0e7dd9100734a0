use crate::config::Settings;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Duration, Instant, MissedTickBehavior},
};
use tracing::debug;

/// One decay step. `asleep` records the cadence the tick was scheduled
/// under, so a tick queued just before a sleep flip can be told apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    pub asleep: bool,
}

/// Periodic decay trigger. The running task is torn down and replaced
/// whenever the sleep state flips, so each cadence starts a fresh period.
pub struct DecayTimer {
    tx: mpsc::Sender<Tick>,
    awake: Duration,
    asleep: Duration,
    sleeping: bool,
    task: JoinHandle<()>,
}

impl DecayTimer {
    pub fn start(tx: mpsc::Sender<Tick>, settings: &Settings, sleeping: bool) -> Self {
        let awake = settings.tick_period(false);
        let asleep = settings.tick_period(true);
        let period = if sleeping { asleep } else { awake };
        let task = spawn_ticker(tx.clone(), period, sleeping);
        Self {
            tx,
            awake,
            asleep,
            sleeping,
            task,
        }
    }

    pub fn period(&self) -> Duration {
        if self.sleeping {
            self.asleep
        } else {
            self.awake
        }
    }

    pub fn retime(&mut self, sleeping: bool) {
        if sleeping == self.sleeping {
            return;
        }
        self.task.abort();
        self.sleeping = sleeping;
        self.task = spawn_ticker(self.tx.clone(), self.period(), sleeping);
        debug!(period_ms = self.period().as_millis() as u64, "decay timer rescheduled");
    }
}

impl Drop for DecayTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn spawn_ticker(tx: mpsc::Sender<Tick>, every: Duration, asleep: bool) -> JoinHandle<()> {
    // Anchor to the call, not to whenever the task first gets polled.
    let first = Instant::now() + every;
    tokio::spawn(async move {
        let mut t = time::interval_at(first, every);
        t.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            t.tick().await;
            if tx.send(Tick { asleep }).await.is_err() {
                break;
            }
        }
    })
}
