use std::io::{self, Write};
use thiserror::Error;

pub mod auth;
pub mod calendar;
pub mod credentials;

use auth::{AuthorizationConfig, Authorizer, CodeReader, Token, TokenExchange};
use calendar::{google::ClientError, print_events, EventSource};
use credentials::CredentialSource;

/// OAuth scope granting read-only access to the user's calendars.
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Opaque state value embedded in the authorization URL.
pub const AUTH_STATE: &str = "state-token";

/// Result type used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by all fallible operations within this crate.
///
/// There is one variant per pipeline stage. None of them is recoverable.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The credentials file is missing or malformed.
    #[error("unable to load credentials: {0}")]
    Configuration(String),
    /// The authorization code could not be read or was rejected by the token endpoint.
    #[error("unable to retrieve token from web: {0}")]
    Authorization(String),
    /// The calendar client could not be constructed.
    #[error("unable to create calendar client: {0}")]
    ClientInit(#[source] ClientError),
    /// The calendar API call failed.
    #[error("unable to retrieve events: {0}")]
    Api(#[source] ClientError),
    /// Writing to the console failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}

/// Runs the whole pipeline: load credentials, authorize interactively, build the calendar client
/// with `connect` and print the listed events to `out`.
///
/// Every stage is fail-fast. Later stages never run once an earlier one failed.
pub async fn run<C, R, X, F, S, W>(
    credentials: &C,
    code_reader: &mut R,
    token_exchange: &X,
    connect: F,
    out: &mut W,
) -> Result<()>
where
    C: CredentialSource + ?Sized,
    R: CodeReader + ?Sized,
    X: TokenExchange + ?Sized,
    F: FnOnce(Token) -> Result<S>,
    S: EventSource,
    W: Write,
{
    let credentials = credentials.load()?;
    let config = AuthorizationConfig::from_credentials(&credentials, CALENDAR_READONLY_SCOPE)?;

    let token = Authorizer::new(&config, AUTH_STATE)
        .authorize(code_reader, token_exchange, out)
        .await?;

    let source = connect(token)?;
    let events = source.fetch_events().await?;

    print_events(&events, out)?;

    Ok(())
}
