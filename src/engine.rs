use crate::clock::{Clock, SystemClock};
use crate::model::{clamp_stat, PetState, Rules, Span, STORAGE_KEY};
use crate::storage::KvStore;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{debug, info, warn};

pub const FEED_MESSAGE: &str = "+20 Fuel!";
pub const PET_MESSAGE: &str = "+15 Vibe!";
pub const SLEEP_MESSAGE: &str = "Sweet dreams...";
pub const WAKE_MESSAGE: &str = "Waking up!";
pub const ASLEEP_MESSAGE: &str = "Shh... it's sleeping";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied(&'static str),
    /// Refused because the pet is asleep; state untouched.
    Asleep,
}

impl ActionOutcome {
    pub fn message(self) -> &'static str {
        match self {
            ActionOutcome::Applied(m) => m,
            ActionOutcome::Asleep => ASLEEP_MESSAGE,
        }
    }

    pub fn applied(self) -> bool {
        matches!(self, ActionOutcome::Applied(_))
    }
}

/// Owns the pet record and is its only mutator. Every mutation re-evaluates
/// progression and overwrites the stored record before returning.
pub struct PetEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    rules: Rules,
    state: PetState,
}

impl<S: KvStore, C: Clock> PetEngine<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self::with_rules(store, clock, Rules::default())
    }

    pub fn with_rules(store: S, clock: C, rules: Rules) -> Self {
        let state = PetState::new_default(clock.now());
        Self {
            store,
            clock,
            rules,
            state,
        }
    }

    /// Loads the stored pet (or defaults), applies decay for the time spent
    /// away and writes the result back.
    pub fn initialize(&mut self) -> &PetState {
        let now = self.clock.now();
        self.state = match self.load_record() {
            Some(saved) => self.catch_up(saved, now),
            None => {
                info!("no saved pet, starting fresh");
                PetState::new_default(now)
            }
        };
        self.commit(now);
        &self.state
    }

    pub fn state(&self) -> &PetState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_fainted(&self) -> bool {
        self.state.is_fainted()
    }

    /// Feed and pet are only accepted while awake.
    pub fn can_interact(&self) -> bool {
        !self.state.is_sleeping
    }

    pub fn tick(&mut self) -> &PetState {
        let drift = self
            .rules
            .decay
            .drift(self.state.is_sleeping, Span::Ticks(1));
        self.state.apply_drift(drift);
        debug!(
            vibe = self.state.vibe,
            fuel = self.state.fuel,
            battery = self.state.battery,
            sleeping = self.state.is_sleeping,
            "tick"
        );
        self.commit(self.clock.now());
        &self.state
    }

    pub fn feed(&mut self) -> ActionOutcome {
        if self.state.is_sleeping {
            debug!("feed refused while asleep");
            return ActionOutcome::Asleep;
        }
        self.state.fuel = clamp_stat(self.state.fuel + self.rules.feed_amount);
        self.commit(self.clock.now());
        ActionOutcome::Applied(FEED_MESSAGE)
    }

    pub fn pet(&mut self) -> ActionOutcome {
        if self.state.is_sleeping {
            debug!("pet refused while asleep");
            return ActionOutcome::Asleep;
        }
        self.state.vibe = clamp_stat(self.state.vibe + self.rules.pet_amount);
        self.commit(self.clock.now());
        ActionOutcome::Applied(PET_MESSAGE)
    }

    pub fn toggle_sleep(&mut self) -> &'static str {
        self.state.is_sleeping = !self.state.is_sleeping;
        info!(sleeping = self.state.is_sleeping, "sleep toggled");
        self.commit(self.clock.now());
        if self.state.is_sleeping {
            SLEEP_MESSAGE
        } else {
            WAKE_MESSAGE
        }
    }

    /// Re-checks the high-stats streak against the current time. Returns the
    /// new level when this call levelled the pet up. Calling it twice at the
    /// same instant changes nothing the second time.
    pub fn evaluate_progression(&mut self) -> Option<u8> {
        let now = self.clock.now();
        let before = (self.state.level, self.state.high_stats_start_time);
        let levelled = self.progress(now);
        if before != (self.state.level, self.state.high_stats_start_time) {
            self.persist(now);
        }
        levelled
    }

    fn progress(&mut self, now: DateTime<Utc>) -> Option<u8> {
        let all_high = self.state.all_at_least(self.rules.high_threshold);
        match (all_high, self.state.high_stats_start_time) {
            (true, None) => self.state.high_stats_start_time = Some(now),
            (false, Some(_)) => self.state.high_stats_start_time = None,
            _ => {}
        }

        let start = self.state.high_stats_start_time?;
        if now - start < self.rules.streak_duration || self.state.level >= self.rules.level_cap {
            return None;
        }

        self.state.level += 1;
        // Stats are still all high here, so the next streak starts now.
        self.state.high_stats_start_time = Some(now);
        info!(level = self.state.level, "level up");
        Some(self.state.level)
    }

    fn commit(&mut self, now: DateTime<Utc>) {
        self.progress(now);
        self.persist(now);
    }

    fn persist(&mut self, now: DateTime<Utc>) {
        self.state.last_update = self.state.last_update.max(now);
        let data = match serde_json::to_string(&self.state) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "failed to encode pet stats");
                return;
            }
        };
        if let Err(e) = self.store.set(STORAGE_KEY, &data) {
            warn!(error = %e, "failed to save pet stats");
        }
    }

    fn load_record(&self) -> Option<PetState> {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to load pet stats, using defaults");
                return None;
            }
        };
        match serde_json::from_str::<PetState>(&raw) {
            Ok(st) => Some(st),
            Err(e) => {
                warn!(error = %e, "saved pet stats are unreadable, using defaults");
                None
            }
        }
    }

    fn catch_up(&self, mut saved: PetState, now: DateTime<Utc>) -> PetState {
        saved.clamp_all();
        let cap = self.rules.level_cap.max(1);
        if !(1..=cap).contains(&saved.level) {
            warn!(level = saved.level, "saved level out of range");
            saved.level = saved.level.clamp(1, cap);
        }
        if saved.high_stats_start_time.is_some_and(|t| t > now) {
            saved.high_stats_start_time = None;
        }

        let elapsed =
            (now - saved.last_update).clamp(ChronoDuration::zero(), self.rules.catchup_max);
        let hours = elapsed.num_milliseconds() as f64 / 3_600_000.0;
        let drift = self.rules.decay.drift(saved.is_sleeping, Span::Hours(hours));
        saved.apply_drift(drift);
        debug!(hours, sleeping = saved.is_sleeping, "applied offline decay");

        saved.last_update = saved.last_update.max(now);
        saved
    }
}
