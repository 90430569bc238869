//! Short-lived notifications

use std::time::{Duration, Instant};

pub const TOAST_DURATION: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    expires_at: Instant,
}

/// Holds at most one toast; a new one replaces the current.
#[derive(Debug, Default)]
pub struct Toasts {
    current: Option<Toast>,
}

impl Toasts {
    pub fn show(&mut self, level: ToastLevel, message: impl Into<String>, now: Instant) {
        self.current = Some(Toast {
            level,
            message: message.into(),
            expires_at: now + TOAST_DURATION,
        });
    }

    pub fn tick(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|toast| now >= toast.expires_at) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_one_second() {
        let start = Instant::now();
        let mut toasts = Toasts::default();
        toasts.show(ToastLevel::Warning, "careful", start);

        toasts.tick(start + Duration::from_millis(999));
        assert_eq!(toasts.current().map(|t| t.message.as_str()), Some("careful"));

        toasts.tick(start + TOAST_DURATION);
        assert!(toasts.current().is_none());
    }

    #[test]
    fn newer_toast_replaces_older() {
        let start = Instant::now();
        let mut toasts = Toasts::default();
        toasts.show(ToastLevel::Success, "one", start);
        toasts.show(ToastLevel::Error, "two", start + Duration::from_millis(800));

        toasts.tick(start + Duration::from_millis(1200));
        let toast = toasts.current().expect("second toast alive");
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(toast.message, "two");
    }
}
