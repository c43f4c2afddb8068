//! Protocol-tree nodes as handed over by the session layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::envelope::RawEnvelope;

/// Node description for message batches.
pub const ACTION: &str = "action";
/// Node description for query responses.
pub const RESPONSE: &str = "response";
/// `type` attribute value marking a contact directory response.
pub const CONTACTS: &str = "contacts";

/// One element of a node's child list.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NodeChild {
    Envelope(Box<RawEnvelope>),
    Node(ProtocolNode),
}

/// Content carried by a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NodeContent {
    /// No content.
    #[default]
    Empty,
    /// Ordered child list.
    Children(Vec<NodeChild>),
    /// Opaque binary payload.
    Bytes(Vec<u8>),
    /// Opaque text payload.
    Text(String),
}

impl NodeContent {
    /// Short label used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Children(_) => "children",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
        }
    }
}

/// A parsed protocol-tree node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProtocolNode {
    /// Node tag, e.g. `"action"` or `"response"`.
    pub description: String,
    /// Key/value attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Node content.
    #[serde(default)]
    pub content: NodeContent,
}

impl ProtocolNode {
    /// Creates a node with no attributes and no content.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// An `"action"` node wrapping the given envelopes.
    #[must_use]
    pub fn action(envelopes: impl IntoIterator<Item = RawEnvelope>) -> Self {
        Self::new(ACTION).with_content(NodeContent::Children(
            envelopes
                .into_iter()
                .map(|e| NodeChild::Envelope(Box::new(e)))
                .collect(),
        ))
    }

    /// A contacts `"response"` node with the given content.
    #[must_use]
    pub fn contacts_response(content: NodeContent) -> Self {
        Self::new(RESPONSE)
            .with_attribute("type", CONTACTS)
            .with_content(content)
    }

    /// Adds or replaces an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Replaces the content.
    #[must_use]
    pub fn with_content(mut self, content: NodeContent) -> Self {
        self.content = content;
        self
    }

    /// Attribute lookup.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}
