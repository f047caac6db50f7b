//! Quiet-period debounce for search text.

use std::time::{Duration, Instant};

/// Holds back search text until input has been quiet for a fixed period.
#[derive(Debug, Clone)]
pub struct SearchDebounce {
    quiet: Duration,
    applied: String,
    pending: Option<(String, Instant)>,
}

impl SearchDebounce {
    pub fn new(quiet: Duration) -> Self {
        SearchDebounce { quiet, applied: String::new(), pending: None }
    }

    /// Record new input at `at`. Restarts the quiet period.
    pub fn input(&mut self, text: &str, at: Instant) {
        self.pending = Some((text.to_string(), at));
    }

    /// Commit the pending text once the quiet period has elapsed.
    /// Returns true when the applied text changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let ready = matches!(&self.pending, Some((_, at)) if now.duration_since(*at) >= self.quiet);
        if !ready {
            return false;
        }
        let Some((text, _)) = self.pending.take() else {
            return false;
        };
        if text == self.applied {
            return false;
        }
        self.applied = text;
        true
    }

    /// The search text currently in effect.
    pub fn applied(&self) -> &str {
        &self.applied
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commits_after_quiet_period() {
        let start = Instant::now();
        let mut d = SearchDebounce::new(Duration::from_millis(300));
        d.input("lo", start);
        d.input("login", start + Duration::from_millis(100));

        assert!(!d.poll(start + Duration::from_millis(350)));
        assert_eq!(d.applied(), "");
        assert!(d.is_pending());

        assert!(d.poll(start + Duration::from_millis(400)));
        assert_eq!(d.applied(), "login");
        assert!(!d.is_pending());
    }

    #[test]
    fn test_unchanged_text_is_not_a_change() {
        let start = Instant::now();
        let mut d = SearchDebounce::new(Duration::from_millis(300));
        d.input("", start);
        assert!(!d.poll(start + Duration::from_secs(1)));
        assert!(!d.is_pending());
    }
}
