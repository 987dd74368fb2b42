use anyhow::Error;
use stack_string::{StackString, format_sstr};
use std::io::Write;
use time::{Date, macros::format_description};

use crate::{
    calendar::{Attendee, EventList, EventTime},
    timezone::TimeZone,
};

/// Organizers with longer display names are left blank.
const ORGANIZER_WIDTH: usize = 12;

/// Prints events as one left-aligned table per day.
#[derive(Debug, Clone, Copy)]
pub struct AgendaRenderer {
    tz: TimeZone,
    participants_width: usize,
    summary_width: usize,
}

impl AgendaRenderer {
    #[must_use]
    pub fn new(tz: TimeZone, participants_width: usize, summary_width: usize) -> Self {
        Self {
            tz,
            participants_width,
            summary_width,
        }
    }

    /// All-day events are skipped.
    pub fn render(&self, list: &EventList, out: &mut dyn Write) -> Result<(), Error> {
        let (owner, domain) = list
            .owner
            .split_once('@')
            .unwrap_or((list.owner.as_str(), ""));

        let mut table = Table::default();
        let mut current_day: Option<Date> = None;

        for event in &list.events {
            let EventTime::At(start) = event.start else {
                continue;
            };
            let start = self.tz.localize(start);
            let minutes = match event.end {
                Some(EventTime::At(end)) => (end - start).whole_minutes().max(0),
                _ => 0,
            };

            let day = start.date();
            if current_day != Some(day) {
                if current_day.is_some() {
                    table.write(out)?;
                    table.clear();
                    writeln!(out)?;
                    writeln!(
                        out,
                        "{}",
                        day.format(format_description!(
                            "[weekday repr:short] [month repr:short] [day]"
                        ))?
                    )?;
                } else {
                    writeln!(
                        out,
                        "{} {}",
                        day.format(format_description!(
                            "[weekday repr:short] [month repr:short] [day] [year]"
                        ))?,
                        self.tz
                    )?;
                }
                current_day = Some(day);
            }

            let (organizer, names) = attendee_names(domain, &event.attendees);
            let organizer = if organizer.chars().count() > ORGANIZER_WIDTH {
                StackString::new()
            } else {
                organizer
            };

            table.push([
                start
                    .format(format_description!(
                        "[hour repr:12 padding:none]:[minute][period]"
                    ))?
                    .into(),
                format_sstr!("{}:{:02}", minutes / 60, minutes % 60),
                organizer,
                format_participants(owner, names, self.participants_width),
                truncate(&event.summary, self.summary_width),
            ]);
        }
        table.write(out)?;
        Ok(())
    }
}

/// Split attendees into the organizer and everyone else. Addresses in the
/// calendar owner's domain are shortened to their local part.
fn attendee_names(domain: &str, attendees: &[Attendee]) -> (StackString, Vec<StackString>) {
    let mut organizer = StackString::new();
    let mut names = Vec::new();
    for attendee in attendees {
        let name = match attendee.email.split_once('@') {
            Some((local, d)) if !domain.is_empty() && d == domain => local,
            _ => attendee.email.as_str(),
        };
        if attendee.organizer {
            organizer = name.into();
        } else {
            names.push(name.into());
        }
    }
    (organizer, names)
}

fn truncate(s: &str, width: usize) -> StackString {
    if s.chars().count() <= width {
        return s.into();
    }
    let end = s
        .char_indices()
        .nth(width.saturating_sub(3))
        .map_or(s.len(), |(idx, _)| idx);
    format_sstr!("{}...", &s[..end])
}

fn truncate_participants(cnt: usize, names: &[StackString]) -> StackString {
    let others = names.len() - cnt;
    let plural = if others > 1 { "s" } else { "" };
    if cnt == 0 {
        format_sstr!("+ {others} other{plural}")
    } else {
        format_sstr!("{} + {others} other{plural}", names[..cnt].join(" "))
    }
}

/// The owner goes first. When everyone does not fit in `width`, keep the
/// longest prefix that does and summarize the rest as `+ N others`.
fn format_participants(owner: &str, mut names: Vec<StackString>, width: usize) -> StackString {
    if let Some(idx) = names.iter().position(|n| n.as_str() == owner) {
        let name = names.remove(idx);
        names.insert(0, name);
    }

    let participants = names.join(" ");
    if participants.chars().count() <= width {
        return participants.into();
    }

    let mut cnt = 0;
    while cnt < names.len()
        && truncate_participants(cnt + 1, &names).chars().count() <= width
    {
        cnt += 1;
    }
    truncate_participants(cnt, &names)
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<[StackString; 5]>,
}

impl Table {
    fn push(&mut self, row: [StackString; 5]) {
        self.rows.push(row);
    }

    fn clear(&mut self) {
        self.rows.clear();
    }

    fn write(&self, out: &mut dyn Write) -> Result<(), Error> {
        let mut widths = [0usize; 5];
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        for row in &self.rows {
            let line: Vec<_> = row
                .iter()
                .zip(widths)
                .map(|(cell, width)| format_sstr!("{cell:<width$}"))
                .collect();
            writeln!(out, "{}", line.join(" ").trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Error;
    use stack_string::StackString;
    use time::macros::{date, datetime};

    use crate::{
        calendar::{Attendee, Event, EventList, EventTime},
        render::{AgendaRenderer, attendee_names, format_participants, truncate},
        timezone::TimeZone,
    };

    fn names(items: &[&str]) -> Vec<StackString> {
        items.iter().map(|s| (*s).into()).collect()
    }

    fn attendee(email: &str, organizer: bool) -> Attendee {
        Attendee {
            email: email.into(),
            organizer,
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 45).as_str(), "short");
        assert_eq!(truncate("abcdefghij", 10).as_str(), "abcdefghij");
        assert_eq!(truncate("abcdefghijk", 10).as_str(), "abcdefg...");
    }

    #[test]
    fn test_attendee_names() {
        let attendees = [
            attendee("jane@example.com", true),
            attendee("bob@example.com", false),
            attendee("carol@other.org", false),
            attendee("no-at-sign", false),
        ];
        let (organizer, others) = attendee_names("example.com", &attendees);
        assert_eq!(organizer.as_str(), "jane");
        assert_eq!(others, names(&["bob", "carol@other.org", "no-at-sign"]));

        let (organizer, others) = attendee_names("", &attendees);
        assert_eq!(organizer.as_str(), "jane@example.com");
        assert_eq!(others[0].as_str(), "bob@example.com");
    }

    #[test]
    fn test_format_participants() {
        assert_eq!(
            format_participants("bob", names(&["alice", "bob"]), 25).as_str(),
            "bob alice"
        );
        assert_eq!(
            format_participants(
                "bob",
                names(&["alice", "bob", "carol", "dave", "eve", "frank"]),
                25
            )
            .as_str(),
            "bob alice + 4 others"
        );
        assert_eq!(
            format_participants(
                "me",
                names(&["averyveryverylongname1", "averyveryverylongname2"]),
                25
            )
            .as_str(),
            "+ 2 others"
        );
        assert_eq!(
            format_participants(
                "me",
                names(&["alice", "averyveryverylongname2"]),
                25
            )
            .as_str(),
            "alice + 1 other"
        );
    }

    #[test]
    fn test_render_agenda() -> Result<(), Error> {
        let tz = TimeZone::utc();
        let list = EventList {
            owner: "jane@example.com".into(),
            events: vec![
                Event {
                    start: EventTime::At(datetime!(2024-03-15 9:30 UTC)),
                    end: Some(EventTime::At(datetime!(2024-03-15 9:45 UTC))),
                    summary: "Standup".into(),
                    attendees: vec![
                        attendee("jane@example.com", true),
                        attendee("bob@example.com", false),
                        attendee("carol@other.org", false),
                    ],
                },
                Event {
                    start: EventTime::AllDay(date!(2024 - 03 - 15)),
                    end: None,
                    summary: "Holiday".into(),
                    attendees: Vec::new(),
                },
                Event {
                    start: EventTime::At(datetime!(2024-03-15 13:00 UTC)),
                    end: Some(EventTime::At(datetime!(2024-03-15 14:30 UTC))),
                    summary: "Planning with a very long summary that goes beyond the limit"
                        .into(),
                    attendees: vec![
                        attendee("someone.with.long.name@example.com", true),
                        attendee("bob@example.com", false),
                        attendee("jane@example.com", false),
                    ],
                },
                Event {
                    start: EventTime::At(datetime!(2024-03-16 8:05 UTC)),
                    end: None,
                    summary: "Run".into(),
                    attendees: Vec::new(),
                },
            ],
        };

        let mut out = Vec::new();
        AgendaRenderer::new(tz, 25, 45).render(&list, &mut out)?;
        let output = String::from_utf8(out)?;

        let expected = format!(
            "Fri Mar 15 2024 {tz}\n\
             9:30AM 0:15 jane bob carol@other.org Standup\n\
             1:00PM 1:30      jane bob            Planning with a very long summary that goe...\n\
             \n\
             Sat Mar 16\n\
             8:05AM 0:00   Run\n"
        );
        assert_eq!(output, expected);
        Ok(())
    }

    #[test]
    fn test_render_empty() -> Result<(), Error> {
        let mut out = Vec::new();
        AgendaRenderer::new(TimeZone::utc(), 25, 45).render(&EventList::default(), &mut out)?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn test_render_in_local_zone() -> Result<(), Error> {
        let tz: TimeZone = "America/New_York".parse()?;
        let list = EventList {
            owner: "jane@example.com".into(),
            events: vec![Event {
                start: EventTime::At(datetime!(2024-03-16 2:00 UTC)),
                end: Some(EventTime::At(datetime!(2024-03-16 3:00 UTC))),
                summary: "Late call".into(),
                attendees: Vec::new(),
            }],
        };
        let mut out = Vec::new();
        AgendaRenderer::new(tz, 25, 45).render(&list, &mut out)?;
        assert_eq!(
            String::from_utf8(out)?,
            "Fri Mar 15 2024 America/New_York\n10:00PM 1:00   Late call\n"
        );
        Ok(())
    }
}
