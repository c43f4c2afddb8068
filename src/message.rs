//! Typed chat messages.
//!
//! These are the decoded, easy-to-use forms of [`RawEnvelope`](crate::RawEnvelope)s.
//! One decoded envelope yields exactly one [`ChatMessage`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::{MediaRef, MessageStatus};
use crate::event::EventKind;

/// Metadata shared by every chat message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Message id.
    pub id: String,
    /// Chat the message belongs to.
    pub remote_jid: String,
    /// Author within a group chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_jid: Option<String>,
    /// Whether this account sent the message.
    pub from_me: bool,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
    /// Sender's display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    /// Delivery status.
    #[serde(default)]
    pub status: MessageStatus,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    pub info: MessageInfo,
    pub text: String,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMessage {
    pub info: MessageInfo,
    pub caption: String,
    pub thumbnail: Vec<u8>,
    pub media: MediaRef,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMessage {
    pub info: MessageInfo,
    pub caption: String,
    pub thumbnail: Vec<u8>,
    pub length_seconds: u32,
    pub gif_playback: bool,
    pub media: MediaRef,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMessage {
    pub info: MessageInfo,
    pub length_seconds: u32,
    /// Voice note rather than an audio file.
    pub ptt: bool,
    pub media: MediaRef,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMessage {
    pub info: MessageInfo,
    pub title: String,
    pub page_count: u32,
    pub file_name: String,
    pub thumbnail: Vec<u8>,
    pub media: MediaRef,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMessage {
    pub info: MessageInfo,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub address: String,
    pub url: String,
    pub thumbnail: Vec<u8>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveLocationMessage {
    pub info: MessageInfo,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: u32,
    pub speed_mps: f32,
    /// Degrees clockwise from magnetic north.
    pub heading_degrees: u32,
    pub caption: String,
    pub sequence_number: i64,
    pub thumbnail: Vec<u8>,
}

/// A decoded chat message.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatMessage {
    Text(TextMessage),
    Image(ImageMessage),
    Video(VideoMessage),
    Audio(AudioMessage),
    Document(DocumentMessage),
    Location(LocationMessage),
    LiveLocation(LiveLocationMessage),
}

impl ChatMessage {
    /// The dispatch kind (and capability) this message maps to.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Text(_) => EventKind::Text,
            Self::Image(_) => EventKind::Image,
            Self::Video(_) => EventKind::Video,
            Self::Audio(_) => EventKind::Audio,
            Self::Document(_) => EventKind::Document,
            Self::Location(_) => EventKind::Location,
            Self::LiveLocation(_) => EventKind::LiveLocation,
        }
    }

    /// Shared metadata.
    #[must_use]
    pub const fn info(&self) -> &MessageInfo {
        match self {
            Self::Text(m) => &m.info,
            Self::Image(m) => &m.info,
            Self::Video(m) => &m.info,
            Self::Audio(m) => &m.info,
            Self::Document(m) => &m.info,
            Self::Location(m) => &m.info,
            Self::LiveLocation(m) => &m.info,
        }
    }
}

impl From<TextMessage> for ChatMessage {
    fn from(m: TextMessage) -> Self {
        Self::Text(m)
    }
}

impl From<ImageMessage> for ChatMessage {
    fn from(m: ImageMessage) -> Self {
        Self::Image(m)
    }
}
