use anyhow::{Error, format_err};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use time::{Date, Month, OffsetDateTime, UtcOffset};

/// The calendar API speaks chrono; everything past this crate uses `time`.
pub fn convert_datetime_to_gcal(datetime: OffsetDateTime) -> Result<DateTime<Utc>, Error> {
    Utc.timestamp_opt(datetime.unix_timestamp(), datetime.nanosecond())
        .single()
        .ok_or_else(|| format_err!("{datetime} cannot be sent to the calendar API"))
}

/// Keeps the offset the event was given in.
pub fn convert_gcal_datetime(datetime: &DateTime<FixedOffset>) -> Result<OffsetDateTime, Error> {
    let offset = UtcOffset::from_whole_seconds(datetime.offset().local_minus_utc())?;
    OffsetDateTime::from_unix_timestamp(datetime.timestamp())?
        .replace_nanosecond(datetime.timestamp_subsec_nanos())?
        .checked_to_offset(offset)
        .ok_or_else(|| format_err!("{datetime} is out of range"))
}

pub fn convert_gcal_date(date: NaiveDate) -> Result<Date, Error> {
    let month = Month::try_from(u8::try_from(date.month())?)?;
    Ok(Date::from_calendar_date(
        date.year(),
        month,
        u8::try_from(date.day())?,
    )?)
}

#[cfg(test)]
mod tests {
    use anyhow::Error;
    use chrono::{DateTime, NaiveDate};
    use time::macros::{date, datetime};

    use crate::datetimetype::{convert_datetime_to_gcal, convert_gcal_date, convert_gcal_datetime};

    #[test]
    fn test_convert_gcal_datetime_keeps_offset() -> Result<(), Error> {
        let wire = DateTime::parse_from_rfc3339("2024-03-15T09:30:00-04:00")?;
        let dt = convert_gcal_datetime(&wire)?;
        assert_eq!(dt, datetime!(2024-03-15 13:30 UTC));
        assert_eq!(dt.offset().whole_hours(), -4);
        Ok(())
    }

    #[test]
    fn test_convert_datetime_to_gcal() -> Result<(), Error> {
        let wire = convert_datetime_to_gcal(datetime!(2024-03-15 23:59:59 -4))?;
        assert_eq!(wire.to_rfc3339(), "2024-03-16T03:59:59+00:00");
        Ok(())
    }

    #[test]
    fn test_convert_gcal_date() -> Result<(), Error> {
        let Some(wire) = NaiveDate::from_ymd_opt(2024, 2, 29) else {
            panic!("invalid date");
        };
        assert_eq!(convert_gcal_date(wire)?, date!(2024 - 02 - 29));
        Ok(())
    }
}
