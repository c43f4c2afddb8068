//! The dispatch hub: single entry point for the session layer.
//!
//! `Hub::dispatch` takes whatever the session layer produced, classifies it,
//! routes protocol nodes, and hands events to the fan-out dispatcher. It never
//! fails and never blocks on observers.

use std::sync::Arc;
use std::time::Duration;

use crate::classify::{classify, Classified, Inbound};
use crate::config::DispatchConfig;
use crate::contact::{ContactStore, InMemoryContactStore};
use crate::decoder::{DefaultDecoder, MessageDecoder};
use crate::dispatcher::FanoutDispatcher;
use crate::envelope::RawEnvelope;
use crate::error::CourierResult;
use crate::event::Event;
use crate::node::{NodeChild, NodeContent, ProtocolNode};
use crate::observer::{Observer, ObserverId};
use crate::pool::DeliveryPool;
use crate::registry::{ObserverRegistry, RegistrySnapshot};
use crate::router::{DefaultRoutePolicy, NodeRoute, RoutePolicy};
use crate::stats::{Counters, DispatchStats};

/// Builder for [`Hub`].
pub struct HubBuilder<P: RoutePolicy = DefaultRoutePolicy> {
    config: DispatchConfig,
    decoder: Option<Arc<dyn MessageDecoder>>,
    contacts: Option<Arc<dyn ContactStore>>,
    policy: P,
}

impl Default for HubBuilder<DefaultRoutePolicy> {
    fn default() -> Self {
        Self {
            config: DispatchConfig::default(),
            decoder: None,
            contacts: None,
            policy: DefaultRoutePolicy,
        }
    }
}

impl<P: RoutePolicy> HubBuilder<P> {
    /// Delivery pool settings.
    #[must_use]
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Envelope decoder (default: [`DefaultDecoder`]).
    #[must_use]
    pub fn decoder(mut self, decoder: Arc<dyn MessageDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Contact store (default: a fresh [`InMemoryContactStore`]).
    #[must_use]
    pub fn contact_store(mut self, store: Arc<dyn ContactStore>) -> Self {
        self.contacts = Some(store);
        self
    }

    /// Node routing policy.
    #[must_use]
    pub fn policy<Q: RoutePolicy>(self, policy: Q) -> HubBuilder<Q> {
        HubBuilder {
            config: self.config,
            decoder: self.decoder,
            contacts: self.contacts,
            policy,
        }
    }

    /// Starts the delivery pool and returns the hub.
    pub fn build(self) -> CourierResult<Hub<P>> {
        let counters = Arc::new(Counters::default());
        let registry = Arc::new(ObserverRegistry::new());
        let pool = DeliveryPool::start(&self.config, Arc::clone(&counters))?;
        let dispatcher = FanoutDispatcher::new(Arc::clone(&registry), pool, Arc::clone(&counters));

        Ok(Hub {
            registry,
            dispatcher,
            decoder: self
                .decoder
                .unwrap_or_else(|| Arc::new(DefaultDecoder) as Arc<dyn MessageDecoder>),
            contacts: self
                .contacts
                .unwrap_or_else(|| Arc::new(InMemoryContactStore::new()) as Arc<dyn ContactStore>),
            policy: self.policy,
            counters,
        })
    }
}

/// Classifies, routes and fans out inbound values.
pub struct Hub<P: RoutePolicy = DefaultRoutePolicy> {
    registry: Arc<ObserverRegistry>,
    dispatcher: FanoutDispatcher,
    decoder: Arc<dyn MessageDecoder>,
    contacts: Arc<dyn ContactStore>,
    policy: P,
    counters: Arc<Counters>,
}

impl Hub<DefaultRoutePolicy> {
    /// Hub with default collaborators.
    pub fn new(config: DispatchConfig) -> CourierResult<Self> {
        Self::builder().config(config).build()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn builder() -> HubBuilder<DefaultRoutePolicy> {
        HubBuilder::default()
    }
}

impl<P: RoutePolicy> Hub<P> {
    /// Adds an observer. Observers live as long as the hub.
    pub fn register(&self, observer: Observer) -> ObserverId {
        self.registry.register(observer)
    }

    /// Top-level entry for the session layer's feed.
    pub fn dispatch(&self, value: impl Into<Inbound>) {
        match classify(value.into()) {
            Classified::Empty => {}
            // Decoding is reserved for action-node elements; a bare envelope
            // is delivered raw.
            Classified::Event(event) => {
                self.dispatcher.deliver(&event);
            }
            Classified::Node(node) => self.route(node),
            Classified::Unrecognized { .. } => Counters::bump(&self.counters.unrecognized),
        }
    }

    /// Acts on a protocol node according to the route policy.
    pub fn route(&self, node: ProtocolNode) {
        let route = self.policy.route(&node);
        match route {
            NodeRoute::Messages => self.route_messages(node),
            NodeRoute::Contacts => self.route_contacts(node),
            NodeRoute::Ignore => {
                Counters::bump(&self.counters.ignored_nodes);
                tracing::trace!(
                    target: "courier::router",
                    description = %node.description,
                    "node ignored"
                );
            }
        }
    }

    /// Fans an already-classified event out. Returns the number of deliveries.
    pub fn handle(&self, event: &Event) -> usize {
        self.dispatcher.deliver(event)
    }

    /// Blocks until in-flight deliveries finish or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> CourierResult<()> {
        self.dispatcher.pool().wait_idle(timeout)
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// The observer registry.
    #[must_use]
    pub fn registry(&self) -> &ObserverRegistry {
        &self.registry
    }

    /// The contact store receiving directory updates.
    #[must_use]
    pub fn contact_store(&self) -> &Arc<dyn ContactStore> {
        &self.contacts
    }

    fn route_messages(&self, node: ProtocolNode) {
        let children = match node.content {
            NodeContent::Children(children) => children,
            other => {
                tracing::trace!(
                    target: "courier::router",
                    content = other.kind(),
                    "action node without child list"
                );
                return;
            }
        };

        let snapshot = self.registry.snapshot();
        for child in children {
            if let NodeChild::Envelope(env) = child {
                self.deliver_envelope(env, &snapshot);
            }
        }
    }

    // Raw form first, then the decoded form when there is one. Both go to the
    // same snapshot so raw and typed observers see the same population.
    fn deliver_envelope(&self, env: Box<RawEnvelope>, snapshot: &RegistrySnapshot) {
        let decoded = self.decoder.decode(&env);
        let id = env.key.id.clone();
        self.dispatcher.deliver_to(&Event::RawEnvelope(env), snapshot);

        match decoded {
            Some(msg) => {
                self.dispatcher.deliver_to(&Event::ChatMessage(msg), snapshot);
            }
            None => {
                Counters::bump(&self.counters.decode_misses);
                tracing::debug!(
                    target: "courier::router",
                    message_id = %id,
                    "envelope has no typed representation"
                );
            }
        }
    }

    fn route_contacts(&self, node: ProtocolNode) {
        match self.contacts.update_contacts(node.content) {
            Ok(()) => Counters::bump(&self.counters.contact_updates),
            Err(err) => {
                Counters::bump(&self.counters.contact_failures);
                tracing::warn!(
                    target: "courier::router",
                    error = %err,
                    "contact store rejected update"
                );
            }
        }
    }
}

impl<P: RoutePolicy> std::fmt::Debug for Hub<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("observers", &self.registry.len())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
