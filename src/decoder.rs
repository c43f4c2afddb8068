//! Envelope decoding.
//!
//! Decoding is pure and total: an envelope either maps onto one typed
//! [`ChatMessage`] or it does not. A miss is an expected outcome, not an error.

use chrono::{DateTime, Utc};

use crate::envelope::{MessageBody, RawEnvelope};
use crate::message::{
    AudioMessage, ChatMessage, DocumentMessage, ImageMessage, LiveLocationMessage,
    LocationMessage, MessageInfo, TextMessage, VideoMessage,
};

/// Converts raw envelopes into typed chat messages.
pub trait MessageDecoder: Send + Sync {
    /// Returns `None` when the envelope has no typed representation.
    fn decode(&self, envelope: &RawEnvelope) -> Option<ChatMessage>;
}

/// Decoder for the standard body layout.
///
/// Body fields are checked in a fixed order; the first populated one wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDecoder;

impl MessageDecoder for DefaultDecoder {
    fn decode(&self, envelope: &RawEnvelope) -> Option<ChatMessage> {
        let body = envelope.message.as_ref()?;
        let info = message_info(envelope);
        decode_body(body, info)
    }
}

/// Extracts the metadata every variant carries.
#[must_use]
pub fn message_info(envelope: &RawEnvelope) -> MessageInfo {
    MessageInfo {
        id: envelope.key.id.clone(),
        remote_jid: envelope.key.remote_jid.clone(),
        sender_jid: envelope.key.participant.clone(),
        from_me: envelope.key.from_me,
        timestamp: timestamp_from_secs(envelope.message_timestamp),
        push_name: envelope.push_name.clone(),
        status: envelope.status.unwrap_or_default(),
    }
}

// Out-of-range timestamps collapse to the epoch rather than dropping the message.
fn timestamp_from_secs(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .unwrap_or_default()
}

fn decode_body(body: &MessageBody, info: MessageInfo) -> Option<ChatMessage> {
    if let Some(text) = &body.conversation {
        return Some(ChatMessage::Text(TextMessage {
            info,
            text: text.clone(),
        }));
    }
    if let Some(ext) = &body.extended_text_message {
        return Some(ChatMessage::Text(TextMessage {
            info,
            text: ext.text.clone(),
        }));
    }
    if let Some(img) = &body.image_message {
        return Some(ChatMessage::Image(ImageMessage {
            info,
            caption: img.caption.clone(),
            thumbnail: img.jpeg_thumbnail.clone(),
            media: img.media.clone(),
        }));
    }
    if let Some(vid) = &body.video_message {
        return Some(ChatMessage::Video(VideoMessage {
            info,
            caption: vid.caption.clone(),
            thumbnail: vid.jpeg_thumbnail.clone(),
            length_seconds: vid.seconds,
            gif_playback: vid.gif_playback,
            media: vid.media.clone(),
        }));
    }
    if let Some(aud) = &body.audio_message {
        return Some(ChatMessage::Audio(AudioMessage {
            info,
            length_seconds: aud.seconds,
            ptt: aud.ptt,
            media: aud.media.clone(),
        }));
    }
    if let Some(doc) = &body.document_message {
        return Some(ChatMessage::Document(DocumentMessage {
            info,
            title: doc.title.clone(),
            page_count: doc.page_count,
            file_name: doc.file_name.clone(),
            thumbnail: doc.jpeg_thumbnail.clone(),
            media: doc.media.clone(),
        }));
    }
    if let Some(loc) = &body.location_message {
        return Some(ChatMessage::Location(LocationMessage {
            info,
            latitude: loc.degrees_latitude,
            longitude: loc.degrees_longitude,
            name: loc.name.clone(),
            address: loc.address.clone(),
            url: loc.url.clone(),
            thumbnail: loc.jpeg_thumbnail.clone(),
        }));
    }
    if let Some(live) = &body.live_location_message {
        return Some(ChatMessage::LiveLocation(LiveLocationMessage {
            info,
            latitude: live.degrees_latitude,
            longitude: live.degrees_longitude,
            accuracy_meters: live.accuracy_in_meters,
            speed_mps: live.speed_in_mps,
            heading_degrees: live.degrees_clockwise_from_magnetic_north,
            caption: live.caption.clone(),
            sequence_number: live.sequence_number,
            thumbnail: live.jpeg_thumbnail.clone(),
        }));
    }
    None
}
