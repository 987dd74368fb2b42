//! Turns a single command line token into the local day-start it names.
//!
//! Accepted tokens, tried in this order:
//!
//! * `now`
//! * absolute dates: `Mar 5 2024`, `3/5/24`, `3/5/2024`, `3-5-24`, `3-5-2024`
//! * relative offsets from today: `5d`, `-2w`, `+1m`
use derive_more::{Deref, From, Into};
use log::debug;
use stack_string::StackString;
use std::{fmt, str::FromStr};
use time::{Date, Duration, Month, OffsetDateTime, macros::format_description};

use crate::{errors::DateError, timezone::TimeZone};

const NOW: &str = "now";

/// An instant that sits on a local day boundary.
#[derive(Debug, Clone, Copy, Deref, Into, From, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimePoint(OffsetDateTime);

impl TimePoint {
    #[must_use]
    pub fn day_start(date: Date, tz: TimeZone) -> Self {
        Self(tz.day_start(date))
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]"
        );
        match self.0.format(format) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetUnit {
    Day,
    Week,
    Month,
}

impl OffsetUnit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'd' => Some(Self::Day),
            'w' => Some(Self::Week),
            'm' => Some(Self::Month),
            _ => None,
        }
    }
}

/// A signed number of days, weeks or months, e.g. `-3d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeOffset {
    pub magnitude: i64,
    pub unit: OffsetUnit,
}

impl FromStr for RelativeOffset {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DateError::UnparseableExpression(s.into());
        let unit_char = s.chars().last().ok_or_else(err)?;
        let unit = OffsetUnit::from_char(unit_char).ok_or_else(err)?;
        let magnitude = s[..s.len() - unit_char.len_utf8()]
            .parse()
            .map_err(|_| err())?;
        Ok(Self { magnitude, unit })
    }
}

impl RelativeOffset {
    /// Shift `today` by this offset. Month shifts keep the day of month and
    /// let it spill into the following month when the target month is
    /// shorter (Jan 31 + 1m is Mar 2 or Mar 3).
    #[must_use]
    pub fn apply(&self, today: Date) -> Option<Date> {
        match self.unit {
            OffsetUnit::Day => today.checked_add(days(self.magnitude)?),
            OffsetUnit::Week => today.checked_add(days(self.magnitude.checked_mul(7)?)?),
            OffsetUnit::Month => add_months(today, self.magnitude),
        }
    }
}

fn days(n: i64) -> Option<Duration> {
    n.checked_mul(86_400).map(Duration::seconds)
}

fn add_months(today: Date, months: i64) -> Option<Date> {
    let month0 = i64::from(today.year()) * 12 + i64::from(u8::from(today.month())) - 1;
    let target = month0.checked_add(months)?;
    let year = i32::try_from(target.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(target.rem_euclid(12) + 1).ok()?).ok()?;
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    first.checked_add(Duration::days(i64::from(today.day()) - 1))
}

type LayoutFn = fn(&str) -> Option<Date>;

/// Absolute layouts in priority order; the first one that accepts the whole
/// token wins.
const LAYOUTS: [(&str, LayoutFn); 5] = [
    ("Jan _2 2006", month_name_day_year),
    ("1/2/06", slash_short_year),
    ("1/2/2006", slash_long_year),
    ("1-2-06", dash_short_year),
    ("1-2-2006", dash_long_year),
];

/// Cursor over a numeric date with a two digit year.
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Between `min` and `max` ASCII digits, greedily.
    fn number(&mut self, min: usize, max: usize) -> Option<u32> {
        let len = self
            .rest
            .bytes()
            .take(max)
            .take_while(u8::is_ascii_digit)
            .count();
        if len < min {
            return None;
        }
        let (digits, rest) = self.rest.split_at(len);
        self.rest = rest;
        digits.parse().ok()
    }

    fn literal(&mut self, c: char) -> Option<()> {
        self.rest = self.rest.strip_prefix(c)?;
        Some(())
    }
}

/// Two digit years follow the POSIX convention: 69-99 are 19xx, 00-68 are 20xx.
fn expand_year(year: u32) -> u32 {
    if year >= 69 { 1900 + year } else { 2000 + year }
}

fn short_year_date(s: &str, separator: char) -> Option<Date> {
    let mut scanner = Scanner::new(s);
    let month = scanner.number(1, 2)?;
    scanner.literal(separator)?;
    let day = scanner.number(1, 2)?;
    scanner.literal(separator)?;
    let year = expand_year(scanner.number(2, 2)?);
    if !scanner.is_empty() {
        return None;
    }
    let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
    Date::from_calendar_date(i32::try_from(year).ok()?, month, u8::try_from(day).ok()?).ok()
}

/// Inner runs of spaces count as one, so `Mar  5 2024` reads like
/// `Mar 5 2024`.
fn month_name_day_year(s: &str) -> Option<Date> {
    if s.starts_with(' ') || s.ends_with(' ') {
        return None;
    }
    let collapsed = s
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Date::parse(
        &collapsed,
        format_description!("[month repr:short case_sensitive:false] [day padding:none] [year]"),
    )
    .ok()
}

fn slash_short_year(s: &str) -> Option<Date> {
    short_year_date(s, '/')
}

fn slash_long_year(s: &str) -> Option<Date> {
    Date::parse(
        s,
        format_description!("[month padding:none]/[day padding:none]/[year]"),
    )
    .ok()
}

fn dash_short_year(s: &str) -> Option<Date> {
    short_year_date(s, '-')
}

fn dash_long_year(s: &str) -> Option<Date> {
    Date::parse(
        s,
        format_description!("[month padding:none]-[day padding:none]-[year]"),
    )
    .ok()
}

/// Parses date tokens relative to a fixed "today" in a fixed zone.
#[derive(Debug, Clone, Copy)]
pub struct DateExpressionParser {
    today: Date,
    tz: TimeZone,
}

impl DateExpressionParser {
    /// Anchor relative tokens at the current date in `tz`.
    #[must_use]
    pub fn new(tz: TimeZone) -> Self {
        Self::with_today(tz.today(), tz)
    }

    #[must_use]
    pub fn with_today(today: Date, tz: TimeZone) -> Self {
        Self { today, tz }
    }

    #[must_use]
    pub fn today(&self) -> TimePoint {
        TimePoint::day_start(self.today, self.tz)
    }

    #[must_use]
    pub fn time_zone(&self) -> TimeZone {
        self.tz
    }

    pub fn parse(&self, token: &str) -> Result<TimePoint, DateError> {
        if token.is_empty() {
            return Err(DateError::UnparseableExpression(StackString::new()));
        }
        if token == NOW {
            return Ok(self.today());
        }
        for (layout, parse_layout) in LAYOUTS {
            if let Some(date) = parse_layout(token) {
                debug!("{token} matched layout {layout}");
                return Ok(TimePoint::day_start(date, self.tz));
            }
        }
        let offset: RelativeOffset = token.parse()?;
        let date = offset
            .apply(self.today)
            .ok_or_else(|| DateError::UnparseableExpression(token.into()))?;
        debug!("{token} is {offset:?} from {}", self.today);
        Ok(TimePoint::day_start(date, self.tz))
    }
}
