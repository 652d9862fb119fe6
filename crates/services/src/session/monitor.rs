use chrono::{DateTime, Duration, Utc};

/// The two signals that count as leaving the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusLoss {
    /// The page became hidden (tab switch, minimise).
    Hidden,
    /// The window lost input focus.
    Blur,
}

/// Escalating notice shown after a counted violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViolationWarning {
    pub count: u32,
    pub limit: u32,
}

impl ViolationWarning {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Warning {}/{}: Do not switch tabs or leave fullscreen! The test will be submitted automatically.",
            self.count, self.limit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorVerdict {
    /// Monitor is not running; nothing counted.
    Ignored,
    /// Same underlying focus loss as the previous counted event.
    Coalesced,
    Warn(ViolationWarning),
    /// The allowance is exhausted; the session must be submitted.
    ForceSubmit { count: u32 },
}

/// Counts focus-loss events during an active session.
///
/// The event that brings the count to `limit` forces submission instead of
/// warning. After that the monitor stops itself, so later events (including
/// the blur that accompanies a visibility change) are ignored.
#[derive(Debug)]
pub struct ViolationMonitor {
    limit: u32,
    coalesce: Duration,
    count: u32,
    active: bool,
    last_counted: Option<DateTime<Utc>>,
}

impl ViolationMonitor {
    #[must_use]
    pub fn new(limit: u32, coalesce: Duration) -> Self {
        Self {
            limit: limit.max(1),
            coalesce,
            count: 0,
            active: false,
            last_counted: None,
        }
    }

    /// Start a fresh count.
    pub fn start(&mut self) {
        self.count = 0;
        self.last_counted = None;
        self.active = true;
    }

    /// Stop counting. The last count stays readable. Idempotent.
    pub fn stop(&mut self) {
        self.active = false;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The user is back. A later focus loss is a new departure even when it
    /// falls inside the coalescing window.
    pub fn regained(&mut self) {
        self.last_counted = None;
    }

    pub fn record(&mut self, kind: FocusLoss, at: DateTime<Utc>) -> MonitorVerdict {
        if !self.active {
            return MonitorVerdict::Ignored;
        }
        if let Some(previous) = self.last_counted {
            if at - previous < self.coalesce {
                tracing::trace!(?kind, "focus loss coalesced with previous violation");
                return MonitorVerdict::Coalesced;
            }
        }

        self.count += 1;
        self.last_counted = Some(at);
        tracing::info!(?kind, count = self.count, limit = self.limit, "integrity violation");

        if self.count >= self.limit {
            self.active = false;
            return MonitorVerdict::ForceSubmit { count: self.count };
        }
        MonitorVerdict::Warn(ViolationWarning {
            count: self.count,
            limit: self.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::time::fixed_now;

    fn monitor() -> ViolationMonitor {
        let mut m = ViolationMonitor::new(3, Duration::seconds(1));
        m.start();
        m
    }

    #[test]
    fn third_violation_forces_submission() {
        let mut m = monitor();
        let t0 = fixed_now();
        assert_eq!(
            m.record(FocusLoss::Blur, t0),
            MonitorVerdict::Warn(ViolationWarning { count: 1, limit: 3 })
        );
        assert_eq!(
            m.record(FocusLoss::Hidden, t0 + Duration::seconds(10)),
            MonitorVerdict::Warn(ViolationWarning { count: 2, limit: 3 })
        );
        assert_eq!(
            m.record(FocusLoss::Blur, t0 + Duration::seconds(20)),
            MonitorVerdict::ForceSubmit { count: 3 }
        );
        assert!(!m.is_active());
        assert_eq!(
            m.record(FocusLoss::Blur, t0 + Duration::seconds(30)),
            MonitorVerdict::Ignored
        );
        assert_eq!(m.count(), 3);
    }

    #[test]
    fn hidden_and_blur_for_one_switch_count_once() {
        let mut m = monitor();
        let t0 = fixed_now();
        assert!(matches!(m.record(FocusLoss::Hidden, t0), MonitorVerdict::Warn(_)));
        assert_eq!(
            m.record(FocusLoss::Blur, t0 + Duration::milliseconds(5)),
            MonitorVerdict::Coalesced
        );
        assert_eq!(m.count(), 1);
    }

    #[test]
    fn regaining_focus_ends_the_coalescing_window() {
        let mut m = monitor();
        let t0 = fixed_now();
        let _ = m.record(FocusLoss::Blur, t0);
        m.regained();
        assert!(matches!(
            m.record(FocusLoss::Blur, t0 + Duration::milliseconds(300)),
            MonitorVerdict::Warn(ViolationWarning { count: 2, .. })
        ));
    }

    #[test]
    fn inactive_monitor_counts_nothing() {
        let mut m = ViolationMonitor::new(3, Duration::seconds(1));
        assert_eq!(m.record(FocusLoss::Blur, fixed_now()), MonitorVerdict::Ignored);
        assert_eq!(m.count(), 0);
    }

    #[test]
    fn warning_text_shows_escalation() {
        let warning = ViolationWarning { count: 2, limit: 3 };
        assert!(warning.message().starts_with("Warning 2/3"));
    }
}
