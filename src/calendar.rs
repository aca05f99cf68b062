pub mod google;

use super::{Error, Result};
use crate::auth::Token;
use async_trait::async_trait;
use google::GoogleCalendarClient;
use std::fmt;
use std::io::{self, Write};

/// Identifier of the authenticated user's default calendar.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Maximum number of events requested from the calendar.
pub const MAX_RESULTS: u32 = 10;

/// Represents a single calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The event title.
    pub title: String,
    /// The start of the event as reported by the source, either a timestamp or a date for
    /// all-day events.
    pub start: String,
}

impl Event {
    pub fn new<T: Into<String>, S: Into<String>>(title: T, start: S) -> Event {
        Event {
            title: title.into(),
            start: start.into(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Event: {} ({})", self.title, self.start)
    }
}

impl From<google::models::Event> for Event {
    fn from(ev: google::models::Event) -> Self {
        Self {
            start: ev
                .start
                .as_ref()
                .map(|start| start.as_str().to_owned())
                .unwrap_or_default(),
            title: ev.summary.unwrap_or_default(),
        }
    }
}

/// Trait that needs to be implemented by a source of calendar events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetches events from the source.
    async fn fetch_events(&self) -> Result<Vec<Event>>;
}

/// An `EventSource` that returns events from a static list.
pub struct StaticEventSource {
    events: Vec<Event>,
}

impl StaticEventSource {
    /// Creates a new `StaticEventSource` from an iterator.
    pub fn new<I>(iter: I) -> StaticEventSource
    where
        I: IntoIterator,
        I::Item: Into<Event>,
    {
        StaticEventSource {
            events: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl EventSource for StaticEventSource {
    async fn fetch_events(&self) -> Result<Vec<Event>> {
        Ok(self.events.clone())
    }
}

/// An `EventSource` listing the first page of events of a Google calendar.
#[derive(Debug)]
pub struct GoogleCalendarEventSource {
    client: GoogleCalendarClient,
    calendar_id: String,
    max_results: u32,
}

impl GoogleCalendarEventSource {
    /// Creates an event source for the primary calendar, authenticated with `token`.
    pub fn new(token: &Token) -> Result<GoogleCalendarEventSource> {
        let client = GoogleCalendarClient::new(token).map_err(Error::ClientInit)?;
        Ok(GoogleCalendarEventSource::with_client(client))
    }

    /// Creates an event source for the primary calendar using an existing client.
    pub fn with_client(client: GoogleCalendarClient) -> GoogleCalendarEventSource {
        GoogleCalendarEventSource {
            client,
            calendar_id: PRIMARY_CALENDAR.to_owned(),
            max_results: MAX_RESULTS,
        }
    }
}

#[async_trait]
impl EventSource for GoogleCalendarEventSource {
    async fn fetch_events(&self) -> Result<Vec<Event>> {
        let (events, next_page_token) = self
            .client
            .get_events(&self.calendar_id, Some(self.max_results))
            .await
            .map_err(Error::Api)?;

        if next_page_token.is_some() {
            log::debug!("more events available, only the first page is listed");
        }

        Ok(events.into_iter().map(Into::into).collect())
    }
}

/// Writes one line per event to `out`, in the given order.
pub fn print_events<W: Write>(events: &[Event], out: &mut W) -> io::Result<()> {
    for event in events {
        writeln!(out, "{event}")?;
    }

    out.flush()
}
