use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

pub const STAT_MIN: f64 = 0.0;
pub const STAT_MAX: f64 = 100.0;

/// Key the pet record is stored under.
pub const STORAGE_KEY: &str = "tamagotchi-pet-stats";

pub(crate) fn clamp_stat(v: f64) -> f64 {
    if v.is_nan() {
        return STAT_MIN;
    }
    v.clamp(STAT_MIN, STAT_MAX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stat {
    Vibe,
    Fuel,
    Battery,
}

impl Stat {
    pub const ALL: [Stat; 3] = [Stat::Vibe, Stat::Fuel, Stat::Battery];

    pub fn label(self) -> &'static str {
        match self {
            Stat::Vibe => "Vibe",
            Stat::Fuel => "Fuel",
            Stat::Battery => "Battery",
        }
    }
}

/// The whole persisted pet. Field names and timestamp encoding match the
/// stored record: camelCase keys, epoch milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetState {
    pub vibe: f64,
    pub fuel: f64,
    pub battery: f64,
    pub is_sleeping: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_update: DateTime<Utc>,
    pub level: u8,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub high_stats_start_time: Option<DateTime<Utc>>,
}

impl PetState {
    pub fn new_default(now: DateTime<Utc>) -> Self {
        Self {
            vibe: 80.0,
            fuel: 80.0,
            battery: 100.0,
            is_sleeping: false,
            last_update: now,
            level: 1,
            high_stats_start_time: None,
        }
    }

    pub fn stat(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Vibe => self.vibe,
            Stat::Fuel => self.fuel,
            Stat::Battery => self.battery,
        }
    }

    pub fn is_fainted(&self) -> bool {
        Stat::ALL.iter().any(|s| self.stat(*s) <= STAT_MIN)
    }

    pub(crate) fn all_at_least(&self, threshold: f64) -> bool {
        Stat::ALL.iter().all(|s| self.stat(*s) >= threshold)
    }

    pub(crate) fn apply_drift(&mut self, d: Drift) {
        self.vibe = clamp_stat(self.vibe + d.vibe);
        self.fuel = clamp_stat(self.fuel + d.fuel);
        self.battery = clamp_stat(self.battery + d.battery);
    }

    pub(crate) fn clamp_all(&mut self) {
        self.apply_drift(Drift::default());
    }
}

/// How much time a decay step covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Span {
    Ticks(u32),
    Hours(f64),
}

/// Signed per-stat delta produced by the decay table.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Drift {
    pub vibe: f64,
    pub fuel: f64,
    pub battery: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatRate {
    pub per_tick: f64,
    pub per_hour: f64,
}

impl StatRate {
    fn over(self, span: Span) -> f64 {
        match span {
            Span::Ticks(n) => self.per_tick * f64::from(n),
            Span::Hours(h) => self.per_hour * h,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatRates {
    pub vibe: StatRate,
    pub fuel: StatRate,
    pub battery: StatRate,
}

/// Every decay and regeneration rate lives here; live ticks and offline
/// catch-up both read it through [`DecayTable::drift`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecayTable {
    pub awake: StatRates,
    pub asleep: StatRates,
}

impl DecayTable {
    pub fn drift(&self, sleeping: bool, span: Span) -> Drift {
        let rates = if sleeping { &self.asleep } else { &self.awake };
        Drift {
            vibe: rates.vibe.over(span),
            fuel: rates.fuel.over(span),
            battery: rates.battery.over(span),
        }
    }
}

impl Default for DecayTable {
    fn default() -> Self {
        Self {
            awake: StatRates {
                vibe: StatRate {
                    per_tick: -1.0,
                    per_hour: -5.0,
                },
                fuel: StatRate {
                    per_tick: -1.5,
                    per_hour: -8.0,
                },
                battery: StatRate {
                    per_tick: -0.5,
                    per_hour: -3.0,
                },
            },
            // Asleep ticks leave vibe and fuel alone, but hours away still
            // wear them down.
            asleep: StatRates {
                vibe: StatRate {
                    per_tick: 0.0,
                    per_hour: -5.0,
                },
                fuel: StatRate {
                    per_tick: 0.0,
                    per_hour: -8.0,
                },
                battery: StatRate {
                    per_tick: 2.0,
                    per_hour: 10.0,
                },
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rules {
    pub decay: DecayTable,
    pub feed_amount: f64,
    pub pet_amount: f64,
    pub high_threshold: f64,
    pub streak_duration: ChronoDuration,
    pub level_cap: u8,
    pub catchup_max: ChronoDuration,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            decay: DecayTable::default(),
            feed_amount: 20.0,
            pet_amount: 15.0,
            high_threshold: 80.0,
            streak_duration: ChronoDuration::seconds(30),
            level_cap: 3,
            catchup_max: ChronoDuration::days(7),
        }
    }
}
