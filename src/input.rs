use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellAction {
    Feed,
    Pet,
    SleepToggle,
    HelpToggle,
    Quit,
}

#[derive(Clone, Debug)]
pub struct InputEvent {
    pub key: KeyCode,
    pub mods: KeyModifiers,
}

pub fn collect_input_nonblocking(max_wait: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();
    let mut timeout = max_wait;
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
        // only the first poll waits
        timeout = Duration::ZERO;
    }
    Ok(out)
}

/// Feed and pet keys map to nothing while the pet can't take them.
pub fn map_event_to_action(ev: &InputEvent, can_interact: bool) -> Option<ShellAction> {
    if matches!(ev.key, KeyCode::Char('c')) && ev.mods.contains(KeyModifiers::CONTROL) {
        return Some(ShellAction::Quit);
    }
    match ev.key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(ShellAction::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
            Some(ShellAction::HelpToggle)
        }
        KeyCode::Char('s') | KeyCode::Char('S') => Some(ShellAction::SleepToggle),
        KeyCode::Char('f') | KeyCode::Char('F') if can_interact => Some(ShellAction::Feed),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') if can_interact => {
            Some(ShellAction::Pet)
        }
        _ => None,
    }
}
