//! First-level classification of inbound values.
//!
//! The session layer pushes loosely typed values; [`classify`] decides which
//! dispatch path each one takes. The only side effect is a diagnostic for
//! shapes nobody can handle.

use serde::{Deserialize, Serialize};

use crate::envelope::RawEnvelope;
use crate::error::SessionError;
use crate::event::Event;
use crate::message::ChatMessage;
use crate::node::ProtocolNode;

/// A value as it arrives from the session layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Inbound {
    /// Nothing (a closed or idle read).
    Empty,
    /// Infrastructure failure.
    Error(SessionError),
    /// Status text.
    Status(String),
    /// Protocol-tree node.
    Node(ProtocolNode),
    /// Undecoded envelope outside any node.
    Envelope(Box<RawEnvelope>),
    /// Already decoded chat message.
    Message(ChatMessage),
    /// Anything else; `shape` names what it was.
    Unrecognized {
        /// Human-readable description of the value's shape.
        shape: String,
    },
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// Nothing to do.
    Empty,
    /// Ready for fan-out.
    Event(Event),
    /// Needs routing.
    Node(ProtocolNode),
    /// Not deliverable.
    Unrecognized {
        /// Shape of the dropped value.
        shape: String,
    },
}

/// Classifies an inbound value.
#[must_use]
pub fn classify(value: Inbound) -> Classified {
    match value {
        Inbound::Empty => Classified::Empty,
        Inbound::Error(err) => Classified::Event(Event::Error(err)),
        Inbound::Status(text) => Classified::Event(Event::StatusText(text)),
        Inbound::Message(msg) => Classified::Event(Event::ChatMessage(msg)),
        Inbound::Envelope(env) => Classified::Event(Event::RawEnvelope(env)),
        Inbound::Node(node) => Classified::Node(node),
        Inbound::Unrecognized { shape } => {
            tracing::warn!(
                target: "courier::classify",
                shape = %shape,
                "unknown type in dispatcher input, dropping"
            );
            Classified::Unrecognized { shape }
        }
    }
}

impl From<Event> for Inbound {
    fn from(event: Event) -> Self {
        match event {
            Event::Error(err) => Self::Error(err),
            Event::StatusText(text) => Self::Status(text),
            Event::ChatMessage(msg) => Self::Message(msg),
            Event::RawEnvelope(env) => Self::Envelope(env),
        }
    }
}

impl From<SessionError> for Inbound {
    fn from(err: SessionError) -> Self {
        Self::Error(err)
    }
}

impl From<String> for Inbound {
    fn from(text: String) -> Self {
        Self::Status(text)
    }
}

impl From<&str> for Inbound {
    fn from(text: &str) -> Self {
        Self::Status(text.to_string())
    }
}

impl From<ProtocolNode> for Inbound {
    fn from(node: ProtocolNode) -> Self {
        Self::Node(node)
    }
}

impl From<RawEnvelope> for Inbound {
    fn from(env: RawEnvelope) -> Self {
        Self::Envelope(Box::new(env))
    }
}

impl From<ChatMessage> for Inbound {
    fn from(msg: ChatMessage) -> Self {
        Self::Message(msg)
    }
}

impl<T: Into<Inbound>> From<Option<T>> for Inbound {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}
