use std::fmt;
use time::{Date, Duration};

use crate::{
    date_expression::{DateExpressionParser, TimePoint},
    errors::DateError,
    timezone::TimeZone,
};

/// Inclusive range of whole local days: `from` is the first day's start,
/// `to` the last second of the final day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: TimePoint,
    to: TimePoint,
}

impl DateRange {
    /// Resolve zero, one or two date tokens. With no tokens the range is
    /// today; with one it is that day; with two it spans both, in whichever
    /// order they were given.
    pub fn resolve<T: AsRef<str>>(
        parser: &DateExpressionParser,
        tokens: &[T],
    ) -> Result<Self, DateError> {
        let (from, to) = match tokens {
            [] => (parser.today(), parser.today()),
            [token] => {
                let point = parser.parse(token.as_ref())?;
                (point, point)
            }
            [first, second] => (parser.parse(first.as_ref())?, parser.parse(second.as_ref())?),
            _ => {
                return Err(DateError::ArgumentCount(
                    tokens.iter().map(|t| t.as_ref().into()).collect(),
                ));
            }
        };
        Ok(Self::from_day_starts(from, to, parser.time_zone()))
    }

    /// Order the two day-starts, then stretch `to` to the end of its day.
    /// Ordering has to happen first, while both points are still day-starts.
    #[must_use]
    pub fn from_day_starts(from: TimePoint, to: TimePoint, tz: TimeZone) -> Self {
        let (from, to) = if from > to { (to, from) } else { (from, to) };
        Self {
            from,
            to: end_of_day(to.date(), tz),
        }
    }

    #[must_use]
    pub fn from(&self) -> TimePoint {
        self.from
    }

    #[must_use]
    pub fn to(&self) -> TimePoint {
        self.to
    }
}

/// One second before the next local day-start. On the last representable
/// date there is no next day; the range then stops 23:59:59 after its start,
/// or at the start itself when even that is out of range.
fn end_of_day(date: Date, tz: TimeZone) -> TimePoint {
    let start = tz.day_start(date);
    date.next_day()
        .map(|next| tz.day_start(next) - Duration::SECOND)
        .or_else(|| start.checked_add(Duration::DAY - Duration::SECOND))
        .unwrap_or(start)
        .into()
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Error;
    use time::macros::{date, datetime};

    use crate::{
        date_expression::{DateExpressionParser, TimePoint},
        date_range::DateRange,
        errors::DateError,
        timezone::TimeZone,
    };

    fn parser() -> DateExpressionParser {
        DateExpressionParser::with_today(date!(2024 - 03 - 15), TimeZone::utc())
    }

    #[test]
    fn test_no_tokens_is_today() -> Result<(), Error> {
        let range = DateRange::resolve::<&str>(&parser(), &[])?;
        assert_eq!(*range.from(), datetime!(2024-03-15 0:00 UTC));
        assert_eq!(*range.to(), datetime!(2024-03-15 23:59:59 UTC));
        assert_eq!(
            range.from(),
            TimePoint::day_start(range.to().date(), TimeZone::utc())
        );
        Ok(())
    }

    #[test]
    fn test_two_absolute_tokens() -> Result<(), Error> {
        let range = DateRange::resolve(&parser(), &["3/1/24", "3/10/24"])?;
        assert_eq!(*range.from(), datetime!(2024-03-01 0:00 UTC));
        assert_eq!(*range.to(), datetime!(2024-03-10 23:59:59 UTC));
        Ok(())
    }

    #[test]
    fn test_single_relative_token() -> Result<(), Error> {
        let range = DateRange::resolve(&parser(), &["5d"])?;
        assert_eq!(*range.from(), datetime!(2024-03-20 0:00 UTC));
        assert_eq!(*range.to(), datetime!(2024-03-20 23:59:59 UTC));
        Ok(())
    }

    #[test]
    fn test_token_order_does_not_matter() -> Result<(), Error> {
        let p = parser();
        let tokens = ["now", "-3d", "2w", "1m", "-1m", "3/1/24", "Mar 15 2024", "12-31-2023"];
        for first in tokens {
            for second in tokens {
                let forward = DateRange::resolve(&p, &[first, second])?;
                let backward = DateRange::resolve(&p, &[second, first])?;
                assert!(forward.from() <= forward.to(), "{first} {second}");
                assert_eq!(forward, backward, "{first} {second}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_same_day_two_tokens() -> Result<(), Error> {
        let range = DateRange::resolve(&parser(), &["now", "Mar 15 2024"])?;
        assert_eq!(*range.from(), datetime!(2024-03-15 0:00 UTC));
        assert_eq!(*range.to(), datetime!(2024-03-15 23:59:59 UTC));
        Ok(())
    }

    #[test]
    fn test_wrong_argument_count() {
        assert_eq!(
            DateRange::resolve(&parser(), &["now", "1d", "2d"]),
            Err(DateError::ArgumentCount(vec![
                "now".into(),
                "1d".into(),
                "2d".into()
            ]))
        );
    }

    #[test]
    fn test_unparseable_token_is_not_now() {
        assert_eq!(
            DateRange::resolve(&parser(), &["abc"]),
            Err(DateError::UnparseableExpression("abc".into()))
        );
        assert_eq!(
            DateRange::resolve(&parser(), &["now", "abc"]),
            Err(DateError::UnparseableExpression("abc".into()))
        );
    }

    #[test]
    fn test_last_representable_day() -> Result<(), Error> {
        for token in ["12/31/9999", "12-31-9999", "Dec 31 9999"] {
            let range = DateRange::resolve(&parser(), &[token])?;
            assert_eq!(*range.from(), datetime!(9999-12-31 0:00 UTC), "{token}");
            assert_eq!(*range.to(), datetime!(9999-12-31 23:59:59 UTC), "{token}");
        }

        let range = DateRange::resolve(&parser(), &["12/31/9999", "now"])?;
        assert_eq!(*range.from(), datetime!(2024-03-15 0:00 UTC));
        assert_eq!(*range.to(), datetime!(9999-12-31 23:59:59 UTC));
        Ok(())
    }

    #[test]
    fn test_end_of_day_across_dst() -> Result<(), Error> {
        let tz: TimeZone = "America/New_York".parse()?;
        let p = DateExpressionParser::with_today(date!(2024 - 03 - 10), tz);
        let range = DateRange::resolve::<&str>(&p, &[])?;
        assert_eq!(*range.from(), datetime!(2024-03-10 0:00 -5));
        assert_eq!(*range.to(), datetime!(2024-03-10 23:59:59 -4));
        Ok(())
    }
}
