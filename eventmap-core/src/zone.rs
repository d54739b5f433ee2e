//! Time zone used to turn instants into calendar days.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::error::EventMapError;

/// "Today" and event dates are computed in this zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarZone {
    /// The system's local zone.
    #[default]
    Local,
    Named(Tz),
}

impl CalendarZone {
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            CalendarZone::Local => instant.with_timezone(&Local).date_naive(),
            CalendarZone::Named(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    /// Wall-clock time of `instant` in this zone.
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            CalendarZone::Local => instant.with_timezone(&Local).naive_local(),
            CalendarZone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    /// Whole calendar days from `now`'s date to `instant`'s date.
    pub fn days_between(&self, now: DateTime<Utc>, instant: DateTime<Utc>) -> i64 {
        (self.date_of(instant) - self.date_of(now)).num_days()
    }
}

impl FromStr for CalendarZone {
    type Err = EventMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "local" => Ok(CalendarZone::Local),
            name => name
                .parse::<Tz>()
                .map(CalendarZone::Named)
                .map_err(|_| EventMapError::Config(format!("Unknown time zone '{}'", name))),
        }
    }
}

impl fmt::Display for CalendarZone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CalendarZone::Local => write!(f, "local"),
            CalendarZone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}
