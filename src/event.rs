//! Dispatch-ready events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::envelope::RawEnvelope;
use crate::error::SessionError;
use crate::message::ChatMessage;

/// Flat discriminant over every dispatchable event.
///
/// Each kind is also the capability an observer declares to receive it.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Error,
    StatusText,
    Text,
    Image,
    Video,
    Audio,
    Document,
    Location,
    LiveLocation,
    RawEnvelope,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Error,
        Self::StatusText,
        Self::Text,
        Self::Image,
        Self::Video,
        Self::Audio,
        Self::Document,
        Self::Location,
        Self::LiveLocation,
        Self::RawEnvelope,
    ];

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::StatusText => "status_text",
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Location => "location",
            Self::LiveLocation => "live_location",
            Self::RawEnvelope => "raw_envelope",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Event {
    /// Infrastructure failure from the session layer.
    Error(SessionError),
    /// Free-form status update (presence, battery, ...).
    StatusText(String),
    /// A decoded chat message.
    ChatMessage(ChatMessage),
    /// An undecoded envelope.
    RawEnvelope(Box<RawEnvelope>),
}

impl Event {
    /// The kind used to select observers.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Error(_) => EventKind::Error,
            Self::StatusText(_) => EventKind::StatusText,
            Self::ChatMessage(m) => m.kind(),
            Self::RawEnvelope(_) => EventKind::RawEnvelope,
        }
    }
}

impl From<SessionError> for Event {
    fn from(err: SessionError) -> Self {
        Self::Error(err)
    }
}

impl From<ChatMessage> for Event {
    fn from(msg: ChatMessage) -> Self {
        Self::ChatMessage(msg)
    }
}

impl From<RawEnvelope> for Event {
    fn from(env: RawEnvelope) -> Self {
        Self::RawEnvelope(Box::new(env))
    }
}
