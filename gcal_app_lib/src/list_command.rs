use log::debug;
use stack_string::StackString;
use std::io::Write;
use time::Date;

use crate::{
    calendar::EventSource,
    command::{CommandHandler, FlagSet},
    config::Config,
    date_expression::DateExpressionParser,
    date_range::DateRange,
    errors::{CommandError, DateError},
    gcal_cli::CALENDAR_FLAG,
    render::AgendaRenderer,
};

pub const LIST_SYNTAX: &str = "list [<from> [<to>]]";
pub const LIST_USAGE: &str = "list calendar events";

/// `list [<from> [<to>]]`: print the agenda of the resolved range.
#[derive(Debug)]
pub struct ListCommand<S> {
    source: S,
    config: Config,
    today: Option<Date>,
}

impl<S: EventSource> ListCommand<S> {
    #[must_use]
    pub fn new(source: S, config: Config) -> Self {
        Self {
            source,
            config,
            today: None,
        }
    }

    /// Resolve relative tokens against `today` instead of the clock.
    #[must_use]
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    fn parser(&self) -> DateExpressionParser {
        let tz = self.config.time_zone();
        match self.today {
            Some(today) => DateExpressionParser::with_today(today, tz),
            None => DateExpressionParser::new(tz),
        }
    }
}

impl<S: EventSource> CommandHandler for ListCommand<S> {
    fn run(
        &self,
        fs: &mut FlagSet,
        args: &[StackString],
        out: &mut dyn Write,
    ) -> Result<(), CommandError> {
        let parsed = fs.parse(args)?;
        let parser = self.parser();

        let range = match DateRange::resolve(&parser, parsed.args()) {
            Ok(range) => range,
            Err(e @ DateError::ArgumentCount(_)) => return Err(fs.usage_error(e).into()),
            Err(e) => return Err(e.into()),
        };

        let calendar_id = parsed
            .get_one(CALENDAR_FLAG)
            .unwrap_or(self.config.calendar_id.as_str());
        debug!("listing {calendar_id} for {range}");

        let events = self.source.list_events(calendar_id, &range)?;
        AgendaRenderer::new(
            parser.time_zone(),
            self.config.participants_width,
            self.config.summary_width,
        )
        .render(&events, out)?;
        Ok(())
    }
}
