use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw reply from the transport: the HTTP status and the body, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Option<String>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// What the notification endpoint said it did with the payment details.
///
/// Both fields are optional: a 2xx reply with an unexpected body still counts
/// as a delivered notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationOutcome {
    pub message: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ReplyBody {
    #[serde(default, alias = "mensagem", alias = "Mensagem", alias = "Message")]
    message: Option<String>,
    #[serde(default, alias = "data", alias = "Data", alias = "Date")]
    date: Option<String>,
}

impl NotificationOutcome {
    /// Best-effort parse of the endpoint's reply body.
    pub fn from_body(body: Option<&str>) -> Self {
        let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<ReplyBody>(body) {
            Ok(reply) => Self {
                message: reply.message,
                date: reply.date.as_deref().and_then(parse_reply_date),
            },
            Err(_) => Self::default(),
        }
    }
}

fn parse_reply_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Why the payment details did not reach the notification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchFailure {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("endpoint rejected the payment details with status {status}")]
    Rejected { status: u16 },
    #[error("payment details unavailable: {0}")]
    DetailsUnavailable(String),
    #[error("dispatch cancelled")]
    Cancelled,
    #[error("dispatch failed unexpectedly: {0}")]
    Unexpected(String),
}

impl DispatchFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchFailure::Transport(_) => "transport",
            DispatchFailure::Rejected { .. } => "rejected",
            DispatchFailure::DetailsUnavailable(_) => "details_unavailable",
            DispatchFailure::Cancelled => "cancelled",
            DispatchFailure::Unexpected(_) => "unexpected",
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            DispatchFailure::Rejected { status } => Some(*status),
            _ => None,
        }
    }
}
