use anyhow::{Error, format_err};
use derive_more::Into;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, ops::Deref, str::FromStr};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use time_tz::{
    Offset, OffsetDateTimeExt, OffsetResult, PrimitiveDateTimeExt, TimeZone as TzTimeZone, Tz,
    timezones::{db::UTC, get_by_name},
};

use stack_string::StackString;

/// The zone that "local time" refers to for all day arithmetic.
#[derive(Into, Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
#[serde(into = "StackString", try_from = "StackString")]
pub struct TimeZone(&'static Tz);

impl TimeZone {
    #[must_use]
    pub fn utc() -> Self {
        Self(UTC)
    }

    #[must_use]
    pub fn local() -> Self {
        Self(time_tz::system::get_timezone().unwrap_or(UTC))
    }

    #[must_use]
    pub fn now(self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_timezone(self.0)
    }

    #[must_use]
    pub fn today(self) -> Date {
        self.now().date()
    }

    #[must_use]
    pub fn localize(self, dt: OffsetDateTime) -> OffsetDateTime {
        dt.to_timezone(self.0)
    }

    /// Local midnight of `date`. When midnight falls in a DST gap the offset
    /// in effect at that instant in UTC is used instead.
    #[must_use]
    pub fn day_start(self, date: Date) -> OffsetDateTime {
        let midnight = PrimitiveDateTime::new(date, Time::MIDNIGHT);
        match midnight.assume_timezone(self.0) {
            OffsetResult::Some(dt) | OffsetResult::Ambiguous(dt, _) => dt,
            OffsetResult::None => {
                let offset = self.0.get_offset_utc(&midnight.assume_utc()).to_utc();
                midnight.assume_offset(offset)
            }
        }
    }
}

impl Deref for TimeZone {
    type Target = Tz;
    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

impl From<TimeZone> for StackString {
    fn from(item: TimeZone) -> Self {
        item.0.name().into()
    }
}

impl FromStr for TimeZone {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        get_by_name(s)
            .map(Self)
            .ok_or_else(|| format_err!("{s} is not a valid timezone"))
    }
}

impl TryFrom<StackString> for TimeZone {
    type Error = Error;
    fn try_from(item: StackString) -> Result<Self, Self::Error> {
        item.as_str().parse()
    }
}
