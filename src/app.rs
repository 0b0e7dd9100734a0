use crate::clock::{Clock, SystemClock};
use crate::config::{load_settings, save_settings_atomic, Cli, Paths, Settings};
use crate::engine::PetEngine;
use crate::input::{collect_input_nonblocking, map_event_to_action, ShellAction};
use crate::model::{PetState, Stat};
use crate::render::{draw_frame, Terminal, View};
use crate::storage::{FileStore, KvStore};
use crate::ticker::{DecayTimer, Tick};
use crate::toast::{ToastKind, ToastSlot};
use anyhow::Context;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const LEVEL_UP_MESSAGE: &str = "Level up!";

/// Everything the shell keeps between frames apart from the terminal and
/// the timer.
pub struct Session<S, C = SystemClock> {
    engine: PetEngine<S, C>,
    toasts: ToastSlot,
    help: bool,
    quit: bool,
}

impl<S: KvStore, C: Clock> Session<S, C> {
    pub fn new(engine: PetEngine<S, C>, toast_ttl: Duration) -> Self {
        Self {
            engine,
            toasts: ToastSlot::new(toast_ttl),
            help: false,
            quit: false,
        }
    }

    pub fn engine(&self) -> &PetEngine<S, C> {
        &self.engine
    }

    pub fn sleeping(&self) -> bool {
        self.engine.state().is_sleeping
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Applies a decay tick unless it was scheduled for the other sleep
    /// state and got queued before the timer was retimed.
    pub fn on_tick(&mut self, tick: Tick, now: Instant) {
        if tick.asleep != self.sleeping() {
            debug!(asleep = tick.asleep, "dropping stale tick");
            return;
        }
        let before = self.engine.state().level;
        self.engine.tick();
        self.announce_level(before, now);
    }

    /// Picks up a streak that crossed the threshold between mutations.
    pub fn on_frame(&mut self, now: Instant) {
        if self.engine.evaluate_progression().is_some() {
            self.toasts.show(LEVEL_UP_MESSAGE, ToastKind::Plain, now);
        }
    }

    pub fn on_action(&mut self, action: ShellAction, now: Instant) {
        let before = self.engine.state().level;
        match action {
            ShellAction::Feed => {
                let out = self.engine.feed();
                let kind = if out.applied() {
                    ToastKind::Stat(Stat::Fuel)
                } else {
                    ToastKind::Plain
                };
                self.toasts.show(out.message(), kind, now);
            }
            ShellAction::Pet => {
                let out = self.engine.pet();
                let kind = if out.applied() {
                    ToastKind::Stat(Stat::Vibe)
                } else {
                    ToastKind::Plain
                };
                self.toasts.show(out.message(), kind, now);
            }
            ShellAction::SleepToggle => {
                let msg = self.engine.toggle_sleep();
                self.toasts.show(msg, ToastKind::Stat(Stat::Battery), now);
            }
            ShellAction::HelpToggle => self.help = !self.help,
            ShellAction::Quit => self.quit = true,
        }
        self.announce_level(before, now);
    }

    pub fn view(&self, now: Instant, color: bool) -> View<'_> {
        View {
            state: self.engine.state(),
            fainted: self.engine.is_fainted(),
            toast: self.toasts.visible(now),
            help: self.help,
            color,
        }
    }

    fn announce_level(&mut self, before: u8, now: Instant) {
        if self.engine.state().level > before {
            self.toasts.show(LEVEL_UP_MESSAGE, ToastKind::Plain, now);
        }
    }
}

pub fn status_line(st: &PetState) -> String {
    format!(
        "level {} | vibe {:.1} | fuel {:.1} | battery {:.1} | {}{}",
        st.level,
        st.vibe,
        st.fuel,
        st.battery,
        if st.is_sleeping { "asleep" } else { "awake" },
        if st.is_fainted() { " | fainted" } else { "" }
    )
}

struct App {
    settings: Settings,
    session: Session<FileStore>,
    term: Terminal,
    timer: DecayTimer,
    ticks: mpsc::Receiver<Tick>,
    color: bool,
}

impl App {
    fn init(
        settings: Settings,
        session: Session<FileStore>,
        color: bool,
    ) -> anyhow::Result<Self> {
        let (tx, ticks) = mpsc::channel(16);
        let timer = DecayTimer::start(tx, &settings, session.sleeping());
        let term = Terminal::begin().context("terminal setup failed")?;
        Ok(Self {
            settings,
            session,
            term,
            timer,
            ticks,
            color,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(5, 120);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        while !self.session.should_quit() {
            self.term.resize_if_needed()?;

            while let Ok(tick) = self.ticks.try_recv() {
                self.session.on_tick(tick, Instant::now());
            }

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) =
                    map_event_to_action(&ev, self.session.engine().can_interact())
                {
                    let was_sleeping = self.session.sleeping();
                    self.session.on_action(action, Instant::now());
                    if self.session.sleeping() != was_sleeping {
                        self.timer.retime(self.session.sleeping());
                    }
                }
            }

            let now = Instant::now();
            self.session.on_frame(now);
            let view = self.session.view(now, self.color);
            draw_frame(&mut self.term.cur, &view);
            self.term.present()?;
        }
        Ok(())
    }
}

pub async fn run(cli: Cli, paths: Paths) -> anyhow::Result<()> {
    let settings = load_settings(&paths.settings_path);
    let mut engine = PetEngine::new(FileStore::new(&paths.data_dir), SystemClock);
    engine.initialize();

    if cli.status {
        println!("{}", status_line(engine.state()));
        return Ok(());
    }

    info!(level = engine.state().level, "starting session");
    let color = settings.enable_color && !cli.no_color;
    let session = Session::new(engine, settings.toast_duration());
    let mut app = App::init(settings, session, color)?;
    let result = app.run();
    let ended = app.term.end();
    finish(result, ended, &paths.settings_path, &app.settings)
}

/// Writes the settings back and reports the first failure, the loop's own
/// error taking precedence over terminal teardown. A failed settings save
/// is only logged.
fn finish(
    result: anyhow::Result<()>,
    ended: anyhow::Result<()>,
    settings_path: &Path,
    settings: &Settings,
) -> anyhow::Result<()> {
    if let Err(e) = save_settings_atomic(settings_path, settings) {
        warn!(error = %e, path = %settings_path.display(), "failed to save settings");
    }
    result.and(ended.context("terminal teardown failed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::engine::{ASLEEP_MESSAGE, FEED_MESSAGE};
    use crate::storage::MemoryStore;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn session() -> (Session<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());
        let mut engine = PetEngine::new(MemoryStore::new(), clock.clone());
        engine.initialize();
        (Session::new(engine, Duration::from_secs(2)), clock)
    }

    #[test]
    fn feed_shows_confirmation_toast() {
        let (mut s, _) = session();
        let now = Instant::now();
        s.on_action(ShellAction::Feed, now);
        let view = s.view(now, true);
        assert_eq!(view.toast.map(|t| t.message), Some(FEED_MESSAGE));
        assert_eq!(view.state.fuel, 100.0);
    }

    #[test]
    fn engine_refusal_reaches_the_toast() {
        let (mut s, _) = session();
        let now = Instant::now();
        s.on_action(ShellAction::SleepToggle, now);
        assert!(s.sleeping());
        s.on_action(ShellAction::Feed, now);
        let view = s.view(now, true);
        assert_eq!(view.toast.map(|t| t.message), Some(ASLEEP_MESSAGE));
        assert_eq!(view.state.fuel, 80.0);
    }

    #[test]
    fn frame_detects_level_up_between_ticks() {
        let (mut s, clock) = session();
        let now = Instant::now();
        clock.advance(ChronoDuration::seconds(31));
        s.on_frame(now);
        assert_eq!(s.engine().state().level, 2);
        assert_eq!(
            s.view(now, true).toast.map(|t| t.message),
            Some(LEVEL_UP_MESSAGE)
        );
    }

    #[test]
    fn tick_from_the_old_cadence_is_dropped_after_falling_asleep() {
        let (mut s, _) = session();
        let now = Instant::now();
        for _ in 0..4 {
            s.on_tick(Tick { asleep: false }, now);
        }
        s.on_action(ShellAction::SleepToggle, now);
        let before = s.engine().state().clone();
        assert_eq!(before.battery, 98.0);

        s.on_tick(Tick { asleep: false }, now);
        assert_eq!(*s.engine().state(), before);

        s.on_tick(Tick { asleep: true }, now);
        let st = s.engine().state();
        assert_eq!((st.vibe, st.fuel, st.battery), (before.vibe, before.fuel, 100.0));
    }

    #[test]
    fn awake_tick_applies_decay() {
        let (mut s, _) = session();
        s.on_tick(Tick { asleep: false }, Instant::now());
        let st = s.engine().state();
        assert_eq!((st.vibe, st.fuel, st.battery), (79.0, 78.5, 99.5));
    }

    #[test]
    fn loop_error_survives_a_failed_settings_save() {
        let dir = tempfile::TempDir::new().unwrap();
        let unwritable = dir.path().join("missing").join("settings.json");
        let err = finish(
            Err(anyhow::anyhow!("input stream closed")),
            Ok(()),
            &unwritable,
            &Settings::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "input stream closed");
    }

    #[test]
    fn teardown_error_is_reported_when_the_loop_succeeded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let err = finish(
            Ok(()),
            Err(anyhow::anyhow!("tty gone")),
            &path,
            &Settings::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "terminal teardown failed");
        assert!(path.exists());
    }

    #[test]
    fn quit_and_help_only_touch_the_shell() {
        let (mut s, _) = session();
        let before = s.engine().state().clone();
        let now = Instant::now();
        s.on_action(ShellAction::HelpToggle, now);
        assert!(s.view(now, true).help);
        s.on_action(ShellAction::Quit, now);
        assert!(s.should_quit());
        assert_eq!(*s.engine().state(), before);
    }

    #[test]
    fn status_line_flags_fainting() {
        let mut st = PetState::new_default(Utc.timestamp_millis_opt(0).unwrap());
        st.fuel = 0.0;
        let line = status_line(&st);
        assert!(line.starts_with("level 1 | vibe 80.0 | fuel 0.0"));
        assert!(line.ends_with("awake | fainted"));
    }
}
