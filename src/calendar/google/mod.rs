pub mod models;

use crate::auth::Token;
use http::Extensions;
use indexmap::IndexMap;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};

/// Base URL of the Google Calendar v3 API.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Error while making a http request.
    #[error("failure requesting remote resource: {0}")]
    Request(#[from] reqwest::Error),

    /// Error while executing some middleware code.
    #[error("request middleware failed with: {0}")]
    RequestMiddleware(#[from] reqwest_middleware::Error),

    /// Error while building http headers.
    #[error("encountered invalid HTTP header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    /// The API base URL cannot be used to build request URLs.
    #[error("invalid API base URL `{0}`")]
    InvalidBaseUrl(String),

    /// The API answered with a non-success status.
    #[error("calendar API responded with {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// Error while parsing a JSON response.
    #[error("failed to parse response as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Attaches the access token to every request.
struct AuthMiddleware {
    authorization: HeaderValue,
}

impl AuthMiddleware {
    fn new(token: &Token) -> Result<AuthMiddleware, ClientError> {
        let mut authorization = HeaderValue::try_from(token.authorization())?;
        authorization.set_sensitive(true);
        Ok(AuthMiddleware { authorization })
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        req.headers_mut()
            .insert(AUTHORIZATION, self.authorization.clone());
        next.run(req, extensions).await
    }
}

/// Google calendar client for making requests to the google calendar api
#[derive(Debug)]
pub struct GoogleCalendarClient {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl GoogleCalendarClient {
    /// Creates a new google calendar client that authenticates every request with `token`.
    ///
    /// No request is made here. The token is used until the process exits and is never
    /// refreshed, so requests fail once it has expired.
    pub fn new(token: &Token) -> Result<GoogleCalendarClient, ClientError> {
        let client = ClientBuilder::new(
            reqwest::Client::builder()
                .user_agent(concat!("gcal-agenda/", env!("CARGO_PKG_VERSION")))
                .build()?,
        )
        .with(AuthMiddleware::new(token)?)
        .build();

        Ok(GoogleCalendarClient {
            client,
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
        })
    }

    /// Points the client at a different API root.
    pub fn with_base_url(mut self, base_url: &str) -> Result<GoogleCalendarClient, ClientError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Queries a single page of events from the calendar `calendar_id`. If `event_count` is set,
    /// at most that many events are returned. The second element of the result is the page token
    /// for the next page, if the API reported one.
    pub async fn get_events(
        &self,
        calendar_id: &str,
        event_count: Option<u32>,
    ) -> Result<(Vec<models::Event>, Option<String>), ClientError> {
        let query = build_query_parameters(&event_count);

        let response = self
            .client
            .get(self.events_url(calendar_id)?)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<models::ErrorResponse>(&body) {
                Ok(error) => error.error.message,
                Err(_) => body,
            };
            return Err(ClientError::Status { status, message });
        }

        let events: models::Events = serde_json::from_str(&body)?;

        log::debug!("fetched {} events from Google Calendar", events.items.len());

        Ok((events.items, events.next_page_token))
    }

    fn events_url(&self, calendar_id: &str) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, ClientError> {
    let url = Url::parse(base_url).map_err(|_| ClientError::InvalidBaseUrl(base_url.to_owned()))?;

    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidBaseUrl(base_url.to_owned()));
    }

    Ok(url)
}

fn build_query_parameters(event_count: &Option<u32>) -> IndexMap<&'static str, String> {
    // see: https://developers.google.com/calendar/api/v3/reference/events/list
    let mut query_parameters: IndexMap<&'static str, String> = IndexMap::new();

    if let Some(count) = event_count {
        // limit the number of events to a specific count
        query_parameters.insert("maxResults", count.to_string());
    }

    query_parameters
}
