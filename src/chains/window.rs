//! Activity window: decides whether a relationship keeps its chain "active"

use chrono::{DateTime, Duration, Utc};

/// Recency threshold for a single build.
///
/// The start date is fixed at construction as
/// `now - (follow_up_period + 1) days`; a contact is active only when it
/// falls strictly after that instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    follow_up_period: u32,
    start: DateTime<Utc>,
}

impl ActivityWindow {
    /// Window anchored at an explicit `now`.
    pub fn new(follow_up_period: u32, now: DateTime<Utc>) -> Self {
        let start = now - Duration::days(i64::from(follow_up_period) + 1);
        Self {
            follow_up_period,
            start,
        }
    }

    /// Window anchored at the current wall-clock time.
    pub fn from_now(follow_up_period: u32) -> Self {
        Self::new(follow_up_period, Utc::now())
    }

    pub fn follow_up_period(&self) -> u32 {
        self.follow_up_period
    }

    /// First instant that is *not* active; contacts must be later than this.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn is_active(&self, contact_date: DateTime<Utc>) -> bool {
        contact_date > self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn start_is_period_plus_one_day_back() {
        let window = ActivityWindow::new(7, day(100));
        assert_eq!(window.start(), day(92));
        assert_eq!(window.follow_up_period(), 7);
    }

    #[test]
    fn comparison_is_strict() {
        let window = ActivityWindow::new(7, day(100));
        assert!(!window.is_active(day(92)));
        assert!(window.is_active(day(92) + Duration::seconds(1)));
        assert!(!window.is_active(day(50)));
    }

    #[test]
    fn zero_period_still_covers_one_day() {
        let window = ActivityWindow::new(0, day(10));
        assert_eq!(window.start(), day(9));
        assert!(window.is_active(day(10)));
    }

    #[test]
    fn future_contacts_are_active() {
        let window = ActivityWindow::new(28, day(10));
        assert!(window.is_active(day(400)));
    }
}
