//! Node routing policy.
//!
//! Deciding what a node means is separated from acting on it: a
//! [`RoutePolicy`] inspects the node and the [`Hub`](crate::Hub) carries the
//! decision out.

use std::fmt;

use crate::node::{ProtocolNode, ACTION, CONTACTS, RESPONSE};

/// What to do with a protocol node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRoute {
    /// Unwrap envelopes; deliver raw and decoded forms.
    Messages,
    /// Forward content to the contact store.
    Contacts,
    /// Nothing.
    Ignore,
}

impl fmt::Display for NodeRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Messages => "messages",
            Self::Contacts => "contacts",
            Self::Ignore => "ignore",
        })
    }
}

/// Chooses a route for a node.
pub trait RoutePolicy: Send + Sync {
    /// Selects the route for `node`.
    fn route(&self, node: &ProtocolNode) -> NodeRoute;
}

/// Standard policy.
///
/// - `description == "action"` is `Messages`.
/// - `description == "response"` with `type == "contacts"` is `Contacts`.
/// - Everything else is `Ignore`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRoutePolicy;

impl RoutePolicy for DefaultRoutePolicy {
    fn route(&self, node: &ProtocolNode) -> NodeRoute {
        match node.description.as_str() {
            ACTION => NodeRoute::Messages,
            RESPONSE if node.attribute("type") == Some(CONTACTS) => NodeRoute::Contacts,
            _ => NodeRoute::Ignore,
        }
    }
}
