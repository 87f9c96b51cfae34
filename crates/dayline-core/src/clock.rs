//! Clock collaborator
//!
//! Supplies "now" for the timeline marker and today's date for window starts
//! and new-task defaults.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Source of the current local date and time
pub trait Clock: Send + Sync {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;

    /// Current local calendar date
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Time of day to show on `date`'s timeline, only when `date` is today
    fn now_on(&self, date: NaiveDate) -> Option<NaiveTime> {
        let now = self.now();
        (now.date() == date).then(|| now.time())
    }
}

/// Wall clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self(date.and_time(time))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_on_only_for_today() {
        let today = NaiveDate::from_ymd_opt(2025, 9, 17).unwrap();
        let clock = FixedClock::at(today, NaiveTime::from_hms_opt(10, 30, 0).unwrap());

        assert_eq!(clock.today(), today);
        assert_eq!(clock.now_on(today), NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(clock.now_on(today.succ_opt().unwrap()), None);
    }
}
