use anyhow::{Error, format_err};
use chrono::{DateTime, Utc};
use google_calendar3::{CalendarHub, api::Scope};
pub use google_calendar3::api::{Event, EventAttendee, EventDateTime, Events};
use hyper::client::HttpConnector;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use log::debug;
use stack_string::StackString;
use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};
use time::OffsetDateTime;
use tokio::runtime::Builder;
use yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod, read_application_secret};

use crate::{datetimetype::convert_datetime_to_gcal, exponential_retry};

pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
const TOKEN_FILE: &str = "token.json";

type GCHub = CalendarHub<HttpsConnector<HttpConnector>>;

/// All events of one calendar within a time window, pages merged.
#[derive(Debug, Clone, Default)]
pub struct CalendarEvents {
    /// For a user's primary calendar this is the owner's email address.
    pub summary: StackString,
    pub items: Vec<Event>,
}

/// Nothing is read from disk until the first request.
#[derive(Debug, Clone)]
pub struct GCalendarInstance {
    gcal_token_path: PathBuf,
    gcal_secret_file: PathBuf,
}

impl GCalendarInstance {
    pub fn new(gcal_token_path: &Path, gcal_secret_file: &Path) -> Self {
        Self {
            gcal_token_path: gcal_token_path.to_path_buf(),
            gcal_secret_file: gcal_secret_file.to_path_buf(),
        }
    }

    /// Installed-application flow; tokens are cached in `token.json` under
    /// the token path and refreshed by the authenticator.
    async fn create_gcal(&self) -> Result<GCHub, Error> {
        let secret = read_application_secret(&self.gcal_secret_file)
            .await
            .map_err(|e| format_err!("unable to read {}: {e}", self.gcal_secret_file.display()))?;

        if !self.gcal_token_path.exists() {
            create_dir_all(&self.gcal_token_path)?;
        }

        let auth =
            InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
                .persist_tokens_to_disk(self.gcal_token_path.join(TOKEN_FILE))
                .build()
                .await?;
        // consent, if any, happens before the retried requests
        auth.token(&[CALENDAR_READONLY_SCOPE]).await?;

        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build();
        Ok(CalendarHub::new(
            hyper::Client::builder().build(connector),
            auth,
        ))
    }

    async fn gcal_events(
        gcal: &GCHub,
        gcal_id: &str,
        min_time: DateTime<Utc>,
        max_time: DateTime<Utc>,
        next_page_token: Option<&str>,
    ) -> Result<Events, Error> {
        debug!("events.list {gcal_id} {next_page_token:?}");
        let req = gcal
            .events()
            .list(gcal_id)
            .time_min(min_time)
            .time_max(max_time)
            .show_deleted(false)
            .single_events(true)
            .order_by("startTime")
            .add_scope(Scope::Readonly);
        let req = if let Some(next_page_token) = next_page_token {
            req.page_token(next_page_token)
        } else {
            req
        };
        let (_, events) = req.doit().await.map_err(|e| format_err!("{e}"))?;
        Ok(events)
    }

    pub fn list_gcal_events(
        &self,
        gcal_id: &str,
        min_time: OffsetDateTime,
        max_time: OffsetDateTime,
    ) -> Result<CalendarEvents, Error> {
        let min_time = convert_datetime_to_gcal(min_time)?;
        let max_time = convert_datetime_to_gcal(max_time)?;

        let runtime = Builder::new_current_thread().enable_all().build()?;
        let gcal = runtime.block_on(self.create_gcal())?;

        let mut output = CalendarEvents::default();
        let mut next_page_token: Option<StackString> = None;
        loop {
            let events = exponential_retry(|| {
                runtime.block_on(Self::gcal_events(
                    &gcal,
                    gcal_id,
                    min_time,
                    max_time,
                    next_page_token.as_ref().map(StackString::as_str),
                ))
            })
            .map_err(|e| format_err!("unable to retrieve events: {e}"))?;

            if output.summary.is_empty() {
                if let Some(summary) = events.summary {
                    output.summary = summary.into();
                }
            }
            output.items.extend(events.items.unwrap_or_default());
            if let Some(token) = events.next_page_token {
                next_page_token.replace(token.into());
            } else {
                break;
            }
        }
        Ok(output)
    }
}
