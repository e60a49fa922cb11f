//! Next-check scheduling and timestamp formats
//!
//! Timestamps are stored as naive wall-clock time in the service's zone,
//! without an offset. They are only meaningful together with that zone.

use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;

/// Storage format of `next_check` / `last_check` values
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Compact day/month format shown in the form
pub const DISPLAY_FORMAT: &str = "%d/%m %H:%M";

/// Default zone for stored and displayed timestamps
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Paris;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock reading `local` wall-clock time in `tz`
    pub fn at_local(tz: Tz, local: &str) -> Option<Self> {
        let naive = parse_storage(local).ok()?;
        localize(tz, &naive).map(|dt| Self::new(dt.with_timezone(&Utc)))
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// `now + hours`, expressed in `tz`. `None` if the result leaves chrono's range.
pub fn next_check(now: DateTime<Utc>, tz: Tz, hours: i64) -> Option<DateTime<Tz>> {
    let delta = TimeDelta::try_hours(hours)?;
    now.with_timezone(&tz).checked_add_signed(delta)
}

pub fn parse_storage(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), STORAGE_FORMAT)
}

pub fn format_storage(dt: &DateTime<Tz>) -> String {
    dt.format(STORAGE_FORMAT).to_string()
}

pub fn format_display(dt: &DateTime<Tz>) -> String {
    dt.format(DISPLAY_FORMAT).to_string()
}

/// Attach `tz` to a stored wall-clock time.
///
/// Times repeated by a DST fall-back resolve to the earlier instant; times
/// skipped by a spring-forward do not exist and yield `None`.
pub fn localize(tz: Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(naive).earliest()
}
