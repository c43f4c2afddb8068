//! # courier - capability-based event dispatch
//!
//! courier sits between a chat session layer and application code. The
//! session layer pushes whatever it read off the connection (errors, status
//! strings, protocol nodes, raw message envelopes); courier classifies each
//! value and fans the resulting events out to registered observers, but only
//! to those that declared the matching capability.
//!
//! ## Core Concepts
//!
//! - **Observer**: a handler registered with a declared capability set. Error
//!   delivery is mandatory; every other kind is opt-in.
//! - **Event**: error, status text, one of seven chat-message variants, or a
//!   raw envelope.
//! - **Hub**: the entry point. Routes `"action"` nodes to message delivery and
//!   contacts responses to the contact store.
//! - **Delivery pool**: every delivery runs as its own fire-and-forget task.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use courier::{DispatchConfig, Handler, Hub, ObserverBuilder, SessionError};
//! use courier::{TextMessage, TextMessageHandler};
//!
//! struct Printer;
//! impl Handler for Printer {
//!     fn handle_error(&self, err: SessionError) { eprintln!("error: {err}"); }
//! }
//! impl TextMessageHandler for Printer {
//!     fn handle_text_message(&self, msg: TextMessage) { println!("{}", msg.text); }
//! }
//!
//! let hub = Hub::new(DispatchConfig::default())?;
//! hub.register(ObserverBuilder::new(Printer).text().build());
//! hub.dispatch(node_from_session);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod envelope;
pub mod error;
pub mod event;
pub mod message;
pub mod node;

// Collaborators
pub mod contact;
pub mod decoder;

// Dispatch
pub mod classify;
pub mod config;
pub mod dispatcher;
pub mod hub;
pub mod observer;
pub mod pool;
pub mod registry;
pub mod router;
pub mod stats;

// Re-export primary types at crate root for convenience
pub use classify::{classify, Classified, Inbound};
pub use config::DispatchConfig;
pub use contact::{Contact, ContactStore, ContactStoreError, InMemoryContactStore};
pub use decoder::{DefaultDecoder, MessageDecoder};
pub use envelope::{MediaRef, MessageBody, MessageKey, MessageStatus, RawEnvelope};
pub use error::{CourierError, CourierResult, ExecutionError, SessionError, ValidationError};
pub use event::{Event, EventKind};
pub use hub::{Hub, HubBuilder};
pub use message::{
    AudioMessage, ChatMessage, DocumentMessage, ImageMessage, LiveLocationMessage,
    LocationMessage, MessageInfo, TextMessage, VideoMessage,
};
pub use node::{NodeChild, NodeContent, ProtocolNode};
pub use observer::{
    AudioMessageHandler, DocumentMessageHandler, Handler, ImageMessageHandler,
    LiveLocationMessageHandler, LocationMessageHandler, Observer, ObserverBuilder, ObserverId,
    RawMessageHandler, StatusHandler, TextMessageHandler, VideoMessageHandler,
};
pub use registry::{ObserverRegistry, RegistrySnapshot};
pub use router::{DefaultRoutePolicy, NodeRoute, RoutePolicy};
pub use stats::DispatchStats;
