use anyhow::Error;
use log::debug;
use stack_string::StackString;
use time::{Date, OffsetDateTime};

use gcal_lib::{
    datetimetype::{convert_gcal_date, convert_gcal_datetime},
    gcal_instance::{
        CalendarEvents, Event as GCalEvent, EventAttendee, EventDateTime, GCalendarInstance,
    },
};

use crate::date_range::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    AllDay(Date),
    At(OffsetDateTime),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub email: StackString,
    pub organizer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub summary: StackString,
    pub attendees: Vec<Attendee>,
}

/// Events of one calendar; `owner` is the calendar's summary, which for a
/// primary calendar is the owner's email address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventList {
    pub owner: StackString,
    pub events: Vec<Event>,
}

/// Where `list` gets its events from.
pub trait EventSource {
    fn list_events(&self, calendar_id: &str, range: &DateRange) -> Result<EventList, Error>;
}

impl EventSource for GCalendarInstance {
    fn list_events(&self, calendar_id: &str, range: &DateRange) -> Result<EventList, Error> {
        let events = self.list_gcal_events(calendar_id, *range.from(), *range.to())?;
        Ok(events.into())
    }
}

fn from_gcal_eventdatetime(dt: &EventDateTime) -> Option<EventTime> {
    if let Some(date_time) = dt.date_time.as_ref() {
        convert_gcal_datetime(&date_time.fixed_offset()).ok().map(EventTime::At)
    } else if let Some(date) = dt.date {
        convert_gcal_date(date).ok().map(EventTime::AllDay)
    } else {
        None
    }
}

impl From<&EventAttendee> for Attendee {
    fn from(item: &EventAttendee) -> Self {
        Self {
            email: item.email.as_deref().unwrap_or_default().into(),
            organizer: item.organizer.unwrap_or(false),
        }
    }
}

impl Event {
    /// `None` for events without a usable start time.
    pub fn from_gcal_event(item: &GCalEvent) -> Option<Self> {
        let Some(start) = item.start.as_ref().and_then(from_gcal_eventdatetime) else {
            debug!("skipping event {:?} without start", item.id);
            return None;
        };
        Some(Self {
            start,
            end: item.end.as_ref().and_then(from_gcal_eventdatetime),
            summary: item.summary.as_deref().unwrap_or_default().into(),
            attendees: item.attendees.iter().flatten().map(Into::into).collect(),
        })
    }
}

impl From<CalendarEvents> for EventList {
    fn from(item: CalendarEvents) -> Self {
        Self {
            owner: item.summary,
            events: item
                .items
                .iter()
                .filter_map(Event::from_gcal_event)
                .collect(),
        }
    }
}
