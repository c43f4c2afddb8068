//! Observers and their capabilities.
//!
//! [`Handler`] is the minimal contract every observer meets: it receives
//! infrastructure errors. Everything else is opt-in. A handler type
//! implements whichever capability traits it cares about and declares them
//! when it is registered through [`ObserverBuilder`]; the trait bounds on the
//! builder make it impossible to declare a capability the type lacks.
//!
//! ```rust,ignore
//! struct Printer;
//! impl Handler for Printer {
//!     fn handle_error(&self, err: SessionError) { eprintln!("{err}"); }
//! }
//! impl TextMessageHandler for Printer {
//!     fn handle_text_message(&self, msg: TextMessage) { println!("{}", msg.text); }
//! }
//!
//! let observer = ObserverBuilder::new(Printer).name("printer").text().build();
//! hub.register(observer);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::RawEnvelope;
use crate::error::SessionError;
use crate::event::EventKind;
use crate::message::{
    AudioMessage, DocumentMessage, ImageMessage, LiveLocationMessage, LocationMessage,
    TextMessage, VideoMessage,
};

/// Baseline capability: receives infrastructure errors.
pub trait Handler: Send + Sync {
    /// Called for every error reported by the session layer.
    fn handle_error(&self, err: SessionError);
}

/// Receives status updates (presence, battery level, ...).
pub trait StatusHandler: Handler {
    #[allow(missing_docs)]
    fn handle_status(&self, status: String);
}

#[allow(missing_docs)]
pub trait TextMessageHandler: Handler {
    fn handle_text_message(&self, message: TextMessage);
}

#[allow(missing_docs)]
pub trait ImageMessageHandler: Handler {
    fn handle_image_message(&self, message: ImageMessage);
}

#[allow(missing_docs)]
pub trait VideoMessageHandler: Handler {
    fn handle_video_message(&self, message: VideoMessage);
}

#[allow(missing_docs)]
pub trait AudioMessageHandler: Handler {
    fn handle_audio_message(&self, message: AudioMessage);
}

#[allow(missing_docs)]
pub trait DocumentMessageHandler: Handler {
    fn handle_document_message(&self, message: DocumentMessage);
}

#[allow(missing_docs)]
pub trait LocationMessageHandler: Handler {
    fn handle_location_message(&self, message: LocationMessage);
}

#[allow(missing_docs)]
pub trait LiveLocationMessageHandler: Handler {
    fn handle_live_location_message(&self, message: LiveLocationMessage);
}

/// Receives envelopes as they came off the wire, before decoding.
pub trait RawMessageHandler: Handler {
    #[allow(missing_docs)]
    fn handle_raw_message(&self, envelope: RawEnvelope);
}

/// Unique identifier for a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObserverId(Uuid);

impl ObserverId {
    /// Create a new random observer id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// One optional slot per non-error capability. The error slot is mandatory and
// lives on `Observer` itself.
#[derive(Default, Clone)]
pub(crate) struct Slots {
    pub(crate) status: Option<Arc<dyn StatusHandler>>,
    pub(crate) text: Option<Arc<dyn TextMessageHandler>>,
    pub(crate) image: Option<Arc<dyn ImageMessageHandler>>,
    pub(crate) video: Option<Arc<dyn VideoMessageHandler>>,
    pub(crate) audio: Option<Arc<dyn AudioMessageHandler>>,
    pub(crate) document: Option<Arc<dyn DocumentMessageHandler>>,
    pub(crate) location: Option<Arc<dyn LocationMessageHandler>>,
    pub(crate) live_location: Option<Arc<dyn LiveLocationMessageHandler>>,
    pub(crate) raw: Option<Arc<dyn RawMessageHandler>>,
}

/// A registered observer: a handler plus the capabilities it declared.
#[derive(Clone)]
pub struct Observer {
    id: ObserverId,
    name: String,
    pub(crate) error: Arc<dyn Handler>,
    pub(crate) slots: Slots,
}

impl Observer {
    /// Observer id.
    #[must_use]
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Display name (defaults to the handler's type name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this observer receives events of `kind`.
    #[must_use]
    pub const fn supports(&self, kind: EventKind) -> bool {
        let s = &self.slots;
        match kind {
            EventKind::Error => true,
            EventKind::StatusText => s.status.is_some(),
            EventKind::Text => s.text.is_some(),
            EventKind::Image => s.image.is_some(),
            EventKind::Video => s.video.is_some(),
            EventKind::Audio => s.audio.is_some(),
            EventKind::Document => s.document.is_some(),
            EventKind::Location => s.location.is_some(),
            EventKind::LiveLocation => s.live_location.is_some(),
            EventKind::RawEnvelope => s.raw.is_some(),
        }
    }

    /// Declared capabilities, error first.
    #[must_use]
    pub fn capabilities(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|k| self.supports(*k))
            .collect()
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Declares which capabilities a handler is registered for.
pub struct ObserverBuilder<H> {
    handler: Arc<H>,
    name: Option<String>,
    slots: Slots,
}

impl<H: Handler + 'static> ObserverBuilder<H> {
    /// Starts a builder that owns `handler`.
    pub fn new(handler: H) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    /// Starts a builder around a shared handler, so the caller can keep a handle.
    pub fn from_arc(handler: Arc<H>) -> Self {
        Self {
            handler,
            name: None,
            slots: Slots::default(),
        }
    }

    /// Sets the display name used in diagnostics.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declares the status-text capability.
    #[must_use]
    pub fn status(mut self) -> Self
    where
        H: StatusHandler,
    {
        self.slots.status = Some(self.handler.clone());
        self
    }

    /// Declares the text-message capability.
    #[must_use]
    pub fn text(mut self) -> Self
    where
        H: TextMessageHandler,
    {
        self.slots.text = Some(self.handler.clone());
        self
    }

    /// Declares the image-message capability.
    #[must_use]
    pub fn image(mut self) -> Self
    where
        H: ImageMessageHandler,
    {
        self.slots.image = Some(self.handler.clone());
        self
    }

    /// Declares the video-message capability.
    #[must_use]
    pub fn video(mut self) -> Self
    where
        H: VideoMessageHandler,
    {
        self.slots.video = Some(self.handler.clone());
        self
    }

    /// Declares the audio-message capability.
    #[must_use]
    pub fn audio(mut self) -> Self
    where
        H: AudioMessageHandler,
    {
        self.slots.audio = Some(self.handler.clone());
        self
    }

    /// Declares the document-message capability.
    #[must_use]
    pub fn document(mut self) -> Self
    where
        H: DocumentMessageHandler,
    {
        self.slots.document = Some(self.handler.clone());
        self
    }

    /// Declares the location-message capability.
    #[must_use]
    pub fn location(mut self) -> Self
    where
        H: LocationMessageHandler,
    {
        self.slots.location = Some(self.handler.clone());
        self
    }

    /// Declares the live-location-message capability.
    #[must_use]
    pub fn live_location(mut self) -> Self
    where
        H: LiveLocationMessageHandler,
    {
        self.slots.live_location = Some(self.handler.clone());
        self
    }

    /// Declares the raw-envelope capability.
    #[must_use]
    pub fn raw(mut self) -> Self
    where
        H: RawMessageHandler,
    {
        self.slots.raw = Some(self.handler.clone());
        self
    }

    /// Finishes the declaration.
    #[must_use]
    pub fn build(self) -> Observer {
        let name = self
            .name
            .unwrap_or_else(|| std::any::type_name::<H>().to_string());
        Observer {
            id: ObserverId::new(),
            name,
            error: self.handler,
            slots: self.slots,
        }
    }
}
