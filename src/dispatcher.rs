//! Fan-out dispatcher.
//!
//! For one event and one registry snapshot, every observer holding the
//! matching capability gets exactly one delivery task. Errors go to every
//! observer. Tasks are independent: no ordering between observers, no
//! waiting, and no failure travels back to the caller.

use std::sync::Arc;

use crate::event::Event;
use crate::message::ChatMessage;
use crate::observer::Observer;
use crate::pool::{DeliveryPool, Job, Task};
use crate::registry::{ObserverRegistry, RegistrySnapshot};
use crate::stats::Counters;

/// Delivers classified events to capable observers.
#[derive(Debug)]
pub struct FanoutDispatcher {
    registry: Arc<ObserverRegistry>,
    pool: DeliveryPool,
    counters: Arc<Counters>,
}

impl FanoutDispatcher {
    pub(crate) fn new(
        registry: Arc<ObserverRegistry>,
        pool: DeliveryPool,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            registry,
            pool,
            counters,
        }
    }

    /// Delivers `event` against the current registry snapshot.
    ///
    /// Returns the number of delivery tasks submitted.
    pub fn deliver(&self, event: &Event) -> usize {
        let snapshot = self.registry.snapshot();
        self.deliver_to(event, &snapshot)
    }

    /// Delivers `event` to the observers in `snapshot`.
    pub fn deliver_to(&self, event: &Event, snapshot: &RegistrySnapshot) -> usize {
        Counters::bump(&self.counters.events);
        let kind = event.kind();

        let mut submitted = 0usize;
        let mut skipped = 0u64;
        for observer in snapshot.iter() {
            let Some(job) = bind(observer, event) else {
                skipped += 1;
                tracing::trace!(
                    target: "courier::dispatch",
                    observer = %observer.id(),
                    name = observer.name(),
                    kind = %kind,
                    "observer lacks capability, skipping"
                );
                continue;
            };

            let task = Task {
                observer: observer.id(),
                kind,
                job,
            };
            // Failures are counted and logged by the pool; nothing to propagate.
            if self.pool.submit(task).is_ok() {
                submitted += 1;
            }
        }
        Counters::add(&self.counters.skipped, skipped);

        tracing::trace!(
            target: "courier::dispatch",
            kind = %kind,
            observers = snapshot.len(),
            submitted,
            "event dispatched"
        );
        submitted
    }

    /// The delivery pool.
    #[must_use]
    pub const fn pool(&self) -> &DeliveryPool {
        &self.pool
    }
}

// Builds the delivery closure for `observer`, or `None` when it did not
// declare the capability for this event. Each closure owns its own clone.
fn bind(observer: &Observer, event: &Event) -> Option<Job> {
    let slots = &observer.slots;
    match event {
        Event::Error(err) => {
            let handler = Arc::clone(&observer.error);
            let err = err.clone();
            Some(Box::new(move || handler.handle_error(err)))
        }
        Event::StatusText(text) => job(slots.status.as_ref(), text, |h, v| h.handle_status(v)),
        Event::RawEnvelope(env) => job(slots.raw.as_ref(), env, |h, v| h.handle_raw_message(*v)),
        Event::ChatMessage(msg) => match msg {
            ChatMessage::Text(m) => job(slots.text.as_ref(), m, |h, v| h.handle_text_message(v)),
            ChatMessage::Image(m) => job(slots.image.as_ref(), m, |h, v| h.handle_image_message(v)),
            ChatMessage::Video(m) => job(slots.video.as_ref(), m, |h, v| h.handle_video_message(v)),
            ChatMessage::Audio(m) => job(slots.audio.as_ref(), m, |h, v| h.handle_audio_message(v)),
            ChatMessage::Document(m) => {
                job(slots.document.as_ref(), m, |h, v| h.handle_document_message(v))
            }
            ChatMessage::Location(m) => {
                job(slots.location.as_ref(), m, |h, v| h.handle_location_message(v))
            }
            ChatMessage::LiveLocation(m) => job(slots.live_location.as_ref(), m, |h, v| {
                h.handle_live_location_message(v);
            }),
        },
    }
}

fn job<H, T>(slot: Option<&Arc<H>>, value: &T, call: fn(&H, T)) -> Option<Job>
where
    H: ?Sized + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    let handler = Arc::clone(slot?);
    let value = value.clone();
    Some(Box::new(move || call(&handler, value)))
}
