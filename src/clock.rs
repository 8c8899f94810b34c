use chrono::{DateTime, Days, Utc};

/// Source of the current time for default request ranges.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn unix_now(clock: &dyn Clock) -> i64 {
    clock.now().timestamp()
}

/// Midnight UTC at the start of the previous day, in unix seconds.
pub fn unix_yesterday(clock: &dyn Clock) -> i64 {
    let today = clock.now().date_naive();
    today
        .checked_sub_days(Days::new(1))
        .unwrap_or(today)
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp())
        .unwrap_or_else(|| unix_now(clock))
}
