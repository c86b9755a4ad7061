//! Error types used across the bot.

use thiserror::Error;

use crate::model::Permissions;

/// Errors from talking to the platform, over the gateway or the REST API.
///
/// [`Forbidden`](ClientError::Forbidden) is split out from other bad status
/// codes because some commands treat it as an expected outcome (a member with
/// closed DMs, for instance) rather than a failure.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Not for bad status codes like 403 or 404 -- those show up as
    /// [`Forbidden`](ClientError::Forbidden), [`NotFound`](ClientError::NotFound)
    /// or [`Api`](ClientError::Api). This is for transport-level stuff like
    /// DNS failures, TLS errors, timeouts, etc.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Token contains characters that are not valid in a header")]
    InvalidToken,

    #[error("Connection closed by server")]
    ConnectionClosed,

    #[error("Call .event_handler() before .build()")]
    MissingHandler,

    #[error("Gateway protocol error: {0}")]
    Protocol(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The string contains the status and body, like
    /// `"HTTP 429: {\"message\": \"You are being rate limited.\"}"`.
    #[error("API error: {0}")]
    Api(String),
}

/// Everything that can go wrong between "this message starts with a prefix"
/// and "the handler produced a reply".
///
/// Each variant renders to exactly one user-facing reply through
/// [`ErrorReporter`](crate::report::ErrorReporter).
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("missing required argument `{0}`")]
    MissingArgument(String),

    #[error("bad argument: {0}")]
    BadArgument(String),

    /// Carries the permissions the author is missing.
    #[error("missing permissions: {0}")]
    PermissionDenied(Permissions),

    #[error("command is restricted to the bot owner")]
    OwnerOnly,

    #[error("{0}")]
    Handler(String),
}

impl From<ClientError> for CommandError {
    fn from(err: ClientError) -> Self {
        CommandError::Handler(err.to_string())
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
