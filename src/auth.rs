//! OAuth 2.0 authorization code flow with a manually pasted code.
//!
//! The user opens the printed authorization URL, grants access and pastes the one-time code back
//! into the console. The code is then exchanged for an access token at the token endpoint. The
//! token is used as is: its expiry is recorded but never checked, and it is never refreshed.

use crate::credentials::{ClientSection, CredentialsFile};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;
use std::io::{self, BufRead, Write};

/// Google's authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google's token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Everything needed to run the authorization code flow for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationConfig {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    scopes: Vec<String>,
    auth_url: Url,
    token_url: Url,
}

impl AuthorizationConfig {
    /// Builds the configuration from loaded credentials and a single scope.
    ///
    /// The `installed` section takes precedence over `web`, which takes precedence over the flat
    /// fields at the root of the file.
    pub fn from_credentials(credentials: &CredentialsFile, scope: &str) -> Result<Self> {
        let section = match credentials.installed.as_ref().or(credentials.web.as_ref()) {
            Some(section) => section.clone(),
            None => flat_section(credentials),
        };

        if section.client_id.is_none() && section.client_secret.is_none() {
            return Err(Error::Configuration(
                "no OAuth client found; expected an `installed` or `web` section or a \
                 top-level `client_id`"
                    .into(),
            ));
        }

        let client_id = required(section.client_id, "client_id")?;
        let client_secret = required(section.client_secret, "client_secret")?;
        let redirect_url = section
            .redirect_uris
            .into_iter()
            .find(|uri| !uri.is_empty())
            .ok_or_else(|| Error::Configuration("missing redirect URL".into()))?;

        let auth_url = parse_endpoint(section.auth_uri.as_deref(), GOOGLE_AUTH_URL, "auth_uri")?;
        let token_url =
            parse_endpoint(section.token_uri.as_deref(), GOOGLE_TOKEN_URL, "token_uri")?;

        Ok(AuthorizationConfig {
            client_id,
            client_secret,
            redirect_url,
            scopes: vec![scope.to_owned()],
            auth_url,
            token_url,
        })
    }

    /// The OAuth client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The OAuth client secret.
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Redirect URL registered for the client.
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Scopes requested during authorization.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The authorization endpoint.
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// The token endpoint.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Builds the URL the user has to visit to grant access. Offline access is requested so
    /// that the token endpoint also hands out a refresh token.
    pub fn auth_code_url(&self, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .extend_pairs(self.auth_code_parameters(state));
        url.into()
    }

    fn auth_code_parameters(&self, state: &str) -> IndexMap<&'static str, String> {
        IndexMap::from([
            ("access_type", "offline".to_owned()),
            ("client_id", self.client_id.clone()),
            ("redirect_uri", self.redirect_url.clone()),
            ("response_type", "code".to_owned()),
            ("scope", self.scopes.join(" ")),
            ("state", state.to_owned()),
        ])
    }
}

fn flat_section(credentials: &CredentialsFile) -> ClientSection {
    ClientSection {
        client_id: credentials.client_id.clone(),
        client_secret: credentials.client_secret.clone(),
        redirect_uris: credentials.redirect_url.iter().cloned().collect(),
        auth_uri: credentials.auth_uri.clone(),
        token_uri: credentials.token_uri.clone(),
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Configuration(format!("missing `{field}`"))),
    }
}

fn parse_endpoint(value: Option<&str>, default: &str, field: &str) -> Result<Url> {
    let value = value.unwrap_or(default);
    Url::parse(value).map_err(|err| Error::Configuration(format!("invalid `{field}`: {err}")))
}

/// An OAuth 2.0 token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    /// Point in time after which the access token is no longer accepted.
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// Creates a bearer token without refresh token or expiry.
    pub fn bearer<S: Into<String>>(access_token: S) -> Token {
        Token {
            access_token: access_token.into(),
            token_type: "Bearer".into(),
            refresh_token: None,
            expiry: None,
        }
    }

    /// The token type with the usual capitalization, defaulting to `Bearer`.
    pub fn token_type(&self) -> &str {
        let token_type = self.token_type.as_str();

        if token_type.is_empty() || token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else if token_type.eq_ignore_ascii_case("mac") {
            "MAC"
        } else if token_type.eq_ignore_ascii_case("basic") {
            "Basic"
        } else {
            token_type
        }
    }

    /// Value for the `Authorization` header of API requests.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type(), self.access_token)
    }
}

/// Successful response of the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self, now: DateTime<Utc>) -> Token {
        Token {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token,
            expiry: self
                .expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| now + Duration::seconds(secs)),
        }
    }
}

/// Error response of the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenErrorResponse {
    fn message(&self) -> String {
        match &self.error_description {
            Some(description) => format!("{}: {}", self.error, description),
            None => self.error.clone(),
        }
    }
}

/// Source of the authorization code the user obtained in the browser.
pub trait CodeReader {
    /// Blocks until a code is available.
    fn read_code(&mut self) -> Result<String>;
}

/// Reads the authorization code as the first word of a single line.
#[derive(Debug)]
pub struct ConsoleCodeReader<R> {
    reader: R,
}

impl<R: BufRead> ConsoleCodeReader<R> {
    pub fn new(reader: R) -> ConsoleCodeReader<R> {
        ConsoleCodeReader { reader }
    }
}

impl ConsoleCodeReader<io::StdinLock<'static>> {
    /// Creates a reader on the process' standard input.
    pub fn stdin() -> Self {
        ConsoleCodeReader::new(io::stdin().lock())
    }
}

impl<R: BufRead> CodeReader for ConsoleCodeReader<R> {
    fn read_code(&mut self) -> Result<String> {
        let mut line = String::new();

        let read = self.reader.read_line(&mut line).map_err(|err| {
            Error::Authorization(format!("unable to read authorization code: {err}"))
        })?;

        if read == 0 {
            return Err(Error::Authorization(
                "unable to read authorization code: unexpected end of input".into(),
            ));
        }

        line.split_whitespace()
            .next()
            .map(ToOwned::to_owned)
            .ok_or_else(|| Error::Authorization("no authorization code entered".into()))
    }
}

/// Exchanges an authorization code for a token.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, config: &AuthorizationConfig, code: &str) -> Result<Token>;
}

/// A `TokenExchange` that talks to the token endpoint named in the configuration.
#[derive(Debug, Clone)]
pub struct HttpTokenExchange {
    http_client: reqwest::Client,
}

impl HttpTokenExchange {
    pub fn new() -> Result<HttpTokenExchange> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("gcal-agenda/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| Error::Authorization(format!("failed to create HTTP client: {err}")))?;

        Ok(HttpTokenExchange { http_client })
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange(&self, config: &AuthorizationConfig, code: &str) -> Result<Token> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_url()),
            ("client_id", config.client_id()),
            ("client_secret", config.client_secret()),
        ];

        let response = self
            .http_client
            .post(config.token_url().clone())
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|err| Error::Authorization(format!("token request failed: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| Error::Authorization(format!("failed to read token response: {err}")))?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(error) => error.message(),
                Err(_) => body,
            };
            return Err(Error::Authorization(format!(
                "token exchange failed ({status}): {reason}"
            )));
        }

        let token = serde_json::from_str::<TokenResponse>(&body)
            .map_err(|err| Error::Authorization(format!("invalid token response: {err}")))?
            .into_token(Utc::now());

        log::debug!("token endpoint returned a {} token", token.token_type());

        Ok(token)
    }
}

/// Drives the interactive part of the flow for one configuration.
#[derive(Debug)]
pub struct Authorizer<'a> {
    config: &'a AuthorizationConfig,
    state: &'a str,
}

impl<'a> Authorizer<'a> {
    pub fn new(config: &'a AuthorizationConfig, state: &'a str) -> Authorizer<'a> {
        Authorizer { config, state }
    }

    /// Prints the authorization URL to `out`, reads the code from `code_reader` and exchanges it.
    ///
    /// A rejected code is not retried.
    pub async fn authorize<R, X, W>(
        &self,
        code_reader: &mut R,
        token_exchange: &X,
        out: &mut W,
    ) -> Result<Token>
    where
        R: CodeReader + ?Sized,
        X: TokenExchange + ?Sized,
        W: Write,
    {
        let auth_url = self.config.auth_code_url(self.state);

        writeln!(out, "Go to the following link in your browser: \n{auth_url}")?;
        write!(out, "Enter the authorization code: ")?;
        out.flush()?;

        let code = code_reader.read_code()?;
        // The prompt line is only terminated by the echo of an interactive terminal.
        writeln!(out)?;

        log::info!("exchanging authorization code for a token");

        token_exchange.exchange(self.config, &code).await
    }
}
