use crate::model::Stat;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Stat(Stat),
    Plain,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub message: &'static str,
    pub kind: ToastKind,
    shown_at: Instant,
}

/// Holds at most one confirmation message; a newer one replaces the old.
#[derive(Debug)]
pub struct ToastSlot {
    ttl: Duration,
    current: Option<Toast>,
}

impl ToastSlot {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn show(&mut self, message: &'static str, kind: ToastKind, now: Instant) {
        self.current = Some(Toast {
            message,
            kind,
            shown_at: now,
        });
    }

    pub fn visible(&self, now: Instant) -> Option<&Toast> {
        self.current
            .as_ref()
            .filter(|t| now.saturating_duration_since(t.shown_at) < self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_expires_after_ttl() {
        let t0 = Instant::now();
        let mut slot = ToastSlot::new(Duration::from_secs(2));
        assert!(slot.visible(t0).is_none());

        slot.show("+20 Fuel!", ToastKind::Stat(Stat::Fuel), t0);
        assert_eq!(
            slot.visible(t0 + Duration::from_millis(1999)).map(|t| t.message),
            Some("+20 Fuel!")
        );
        assert!(slot.visible(t0 + Duration::from_secs(2)).is_none());
    }

    #[test]
    fn newer_toast_restarts_the_window() {
        let t0 = Instant::now();
        let mut slot = ToastSlot::new(Duration::from_secs(2));
        slot.show("+20 Fuel!", ToastKind::Stat(Stat::Fuel), t0);
        slot.show("+15 Vibe!", ToastKind::Stat(Stat::Vibe), t0 + Duration::from_secs(1));

        let shown = slot.visible(t0 + Duration::from_millis(2500)).unwrap();
        assert_eq!(shown.message, "+15 Vibe!");
        assert_eq!(shown.kind, ToastKind::Stat(Stat::Vibe));
    }
}
