//! Raw message envelopes.
//!
//! A [`RawEnvelope`] is the undecoded message record as the session layer
//! parsed it off the wire. Bodies mirror the wire schema: every payload kind is
//! an optional field and a well-formed envelope populates at most one of them.

use serde::{Deserialize, Serialize};

/// Identifies a message within a chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MessageKey {
    /// Chat the message belongs to.
    pub remote_jid: String,
    /// Whether the message was sent from this account.
    #[serde(default)]
    pub from_me: bool,
    /// Server-assigned message id.
    pub id: String,
    /// Author within a group chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
}

/// Delivery status of a message.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Error,
    #[default]
    Pending,
    ServerAck,
    DeliveryAck,
    Read,
    Played,
}

/// Encrypted media location and integrity data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MediaRef {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub media_key: Vec<u8>,
    #[serde(default)]
    pub file_sha256: Vec<u8>,
    #[serde(default)]
    pub file_enc_sha256: Vec<u8>,
    #[serde(default)]
    pub file_length: u64,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtendedTextBody {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageBody {
    #[serde(default)]
    pub media: MediaRef,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub jpeg_thumbnail: Vec<u8>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoBody {
    #[serde(default)]
    pub media: MediaRef,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub jpeg_thumbnail: Vec<u8>,
    #[serde(default)]
    pub seconds: u32,
    #[serde(default)]
    pub gif_playback: bool,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioBody {
    #[serde(default)]
    pub media: MediaRef,
    #[serde(default)]
    pub seconds: u32,
    /// Push-to-talk (voice note) flag.
    #[serde(default)]
    pub ptt: bool,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentBody {
    #[serde(default)]
    pub media: MediaRef,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub jpeg_thumbnail: Vec<u8>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationBody {
    pub degrees_latitude: f64,
    pub degrees_longitude: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub jpeg_thumbnail: Vec<u8>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LiveLocationBody {
    pub degrees_latitude: f64,
    pub degrees_longitude: f64,
    #[serde(default)]
    pub accuracy_in_meters: u32,
    #[serde(default)]
    pub speed_in_mps: f32,
    #[serde(default)]
    pub degrees_clockwise_from_magnetic_north: u32,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub sequence_number: i64,
    #[serde(default)]
    pub jpeg_thumbnail: Vec<u8>,
}

/// Shared contact card. Has no typed chat-message counterpart.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactCardBody {
    pub display_name: String,
    #[serde(default)]
    pub vcard: String,
}

/// Payload of an envelope.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_text_message: Option<ExtendedTextBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_message: Option<ImageBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_message: Option<VideoBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_message: Option<AudioBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_message: Option<DocumentBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_message: Option<LocationBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_location_message: Option<LiveLocationBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_message: Option<ContactCardBody>,
}

impl MessageBody {
    /// Plain conversation text.
    #[must_use]
    pub fn conversation(text: impl Into<String>) -> Self {
        Self {
            conversation: Some(text.into()),
            ..Self::default()
        }
    }

    /// Image with a caption.
    #[must_use]
    pub fn image(caption: impl Into<String>, media: MediaRef) -> Self {
        Self {
            image_message: Some(ImageBody {
                media,
                caption: caption.into(),
                ..ImageBody::default()
            }),
            ..Self::default()
        }
    }

    /// Contact card (not representable as a typed chat message).
    #[must_use]
    pub fn contact_card(display_name: impl Into<String>, vcard: impl Into<String>) -> Self {
        Self {
            contact_message: Some(ContactCardBody {
                display_name: display_name.into(),
                vcard: vcard.into(),
            }),
            ..Self::default()
        }
    }
}

/// An undecoded message record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawEnvelope {
    /// Message identity.
    pub key: MessageKey,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub message_timestamp: u64,
    /// Sender's self-chosen display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    /// Delivery status, when the server reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    /// Payload; absent for protocol-only records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageBody>,
}

impl RawEnvelope {
    /// Creates an envelope for the given chat and message id.
    #[must_use]
    pub fn new(remote_jid: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            key: MessageKey {
                remote_jid: remote_jid.into(),
                id: id.into(),
                ..MessageKey::default()
            },
            ..Self::default()
        }
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_body(mut self, body: MessageBody) -> Self {
        self.message = Some(body);
        self
    }

    /// Sets the timestamp (seconds since the Unix epoch).
    #[must_use]
    pub const fn with_timestamp(mut self, secs: u64) -> Self {
        self.message_timestamp = secs;
        self
    }

    /// Message id shorthand.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.key.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_builder_sets_fields() {
        let env = RawEnvelope::new("123@s.whatsapp.net", "ABC")
            .with_timestamp(1_600_000_000)
            .with_body(MessageBody::conversation("hi"));

        assert_eq!(env.id(), "ABC");
        assert_eq!(env.key.remote_jid, "123@s.whatsapp.net");
        assert!(!env.key.from_me);
        assert_eq!(env.message_timestamp, 1_600_000_000);
        assert_eq!(
            env.message.and_then(|m| m.conversation).as_deref(),
            Some("hi")
        );
    }

    #[test]
    fn envelope_deserializes_with_sparse_fields() {
        let json = serde_json::json!({
            "key": { "remote_jid": "g@g.us", "id": "X1", "participant": "p@s.whatsapp.net" },
            "status": "delivery_ack",
            "message": { "location_message": { "degrees_latitude": 1.5, "degrees_longitude": -2.0 } }
        });

        let env: RawEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(env.key.participant.as_deref(), Some("p@s.whatsapp.net"));
        assert_eq!(env.status, Some(MessageStatus::DeliveryAck));
        assert_eq!(env.message_timestamp, 0);

        let loc = env.message.unwrap().location_message.unwrap();
        assert!((loc.degrees_latitude - 1.5).abs() < f64::EPSILON);
        assert!(loc.name.is_empty());
    }
}
