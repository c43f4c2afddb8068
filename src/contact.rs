//! Contact directory collaborator.
//!
//! The router forwards the content of contacts-response nodes here. What a
//! store does with it is its own business; [`InMemoryContactStore`] keeps a
//! JID-keyed directory.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{NodeChild, NodeContent};

/// Child-node description for one directory entry.
pub const USER: &str = "user";

/// Errors a contact store can report.
#[derive(Debug, Error)]
pub enum ContactStoreError {
    /// Content was not in a shape the store understands.
    #[error("Unexpected contacts content: {kind}")]
    UnexpectedContent {
        /// Content label.
        kind: String,
    },

    /// Backend error.
    #[error("Contact store backend error: {0}")]
    Backend(String),
}

/// Receives contact directory updates.
pub trait ContactStore: Send + Sync {
    /// Applies the content of a contacts-response node.
    fn update_contacts(&self, content: NodeContent) -> Result<(), ContactStoreError>;
}

/// A directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Account JID.
    pub jid: String,
    /// Name the contact chose for themselves.
    #[serde(default)]
    pub notify: String,
    /// Name saved in the address book.
    #[serde(default)]
    pub name: String,
    /// Short form of `name`.
    #[serde(default)]
    pub short: String,
}

/// Thread-safe in-memory contact directory.
#[derive(Debug, Default)]
pub struct InMemoryContactStore {
    by_jid: RwLock<HashMap<String, Contact>>,
}

fn lock_err(context: &'static str) -> ContactStoreError {
    ContactStoreError::Backend(format!("poisoned lock: {context}"))
}

impl InMemoryContactStore {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contact by JID.
    pub fn get(&self, jid: &str) -> Result<Option<Contact>, ContactStoreError> {
        let map = self.by_jid.read().map_err(|_| lock_err("contacts.get"))?;
        Ok(map.get(jid).cloned())
    }

    /// All contacts, sorted by JID.
    pub fn all(&self) -> Result<Vec<Contact>, ContactStoreError> {
        let map = self.by_jid.read().map_err(|_| lock_err("contacts.all"))?;
        let mut out: Vec<Contact> = map.values().cloned().collect();
        out.sort_by(|a, b| a.jid.cmp(&b.jid));
        Ok(out)
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> Result<usize, ContactStoreError> {
        let map = self.by_jid.read().map_err(|_| lock_err("contacts.len"))?;
        Ok(map.len())
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> Result<bool, ContactStoreError> {
        Ok(self.len()? == 0)
    }
}

impl ContactStore for InMemoryContactStore {
    fn update_contacts(&self, content: NodeContent) -> Result<(), ContactStoreError> {
        let children = match content {
            NodeContent::Children(children) => children,
            other => {
                return Err(ContactStoreError::UnexpectedContent {
                    kind: other.kind().to_string(),
                })
            }
        };

        let mut parsed = Vec::with_capacity(children.len());
        for child in children {
            let NodeChild::Node(node) = child else {
                continue;
            };
            if node.description != USER {
                continue;
            }
            let Some(jid) = node.attribute("jid").filter(|j| !j.is_empty()) else {
                tracing::debug!(
                    target: "courier::contacts",
                    "contact entry without jid, skipping"
                );
                continue;
            };
            let attr = |k: &str| node.attribute(k).unwrap_or_default().to_string();
            parsed.push(Contact {
                jid: jid.to_string(),
                notify: attr("notify"),
                name: attr("name"),
                short: attr("short"),
            });
        }

        let count = parsed.len();
        let mut map = self
            .by_jid
            .write()
            .map_err(|_| lock_err("contacts.update"))?;
        for contact in parsed {
            map.insert(contact.jid.clone(), contact);
        }
        let total = map.len();
        drop(map);

        tracing::debug!(
            target: "courier::contacts",
            updated = count,
            total,
            "contact directory updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::RawEnvelope;
    use crate::node::ProtocolNode;

    fn user(jid: &str, notify: &str) -> NodeChild {
        NodeChild::Node(
            ProtocolNode::new(USER)
                .with_attribute("jid", jid)
                .with_attribute("notify", notify),
        )
    }

    #[test]
    fn users_are_upserted_by_jid() {
        let store = InMemoryContactStore::new();
        store
            .update_contacts(NodeContent::Children(vec![
                user("b@s.whatsapp.net", "Bea"),
                user("a@s.whatsapp.net", "Al"),
            ]))
            .unwrap();
        store
            .update_contacts(NodeContent::Children(vec![user("a@s.whatsapp.net", "Alan")]))
            .unwrap();

        assert_eq!(store.len().unwrap(), 2);
        let a = store.get("a@s.whatsapp.net").unwrap().unwrap();
        assert_eq!(a.notify, "Alan");
        assert!(a.name.is_empty());

        let jids: Vec<String> = store.all().unwrap().into_iter().map(|c| c.jid).collect();
        assert_eq!(jids, vec!["a@s.whatsapp.net", "b@s.whatsapp.net"]);
    }

    #[test]
    fn entries_without_jid_or_of_other_kinds_are_skipped() {
        let store = InMemoryContactStore::new();
        store
            .update_contacts(NodeContent::Children(vec![
                NodeChild::Node(ProtocolNode::new(USER).with_attribute("notify", "ghost")),
                NodeChild::Node(ProtocolNode::new("group").with_attribute("jid", "g@g.us")),
                NodeChild::Envelope(Box::new(RawEnvelope::new("x", "1"))),
                user("c@s.whatsapp.net", "Cy"),
            ]))
            .unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert!(store.get("g@g.us").unwrap().is_none());
    }

    #[test]
    fn non_list_content_is_rejected() {
        let store = InMemoryContactStore::new();
        let err = store
            .update_contacts(NodeContent::Bytes(vec![1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, ContactStoreError::UnexpectedContent { ref kind } if kind == "bytes"));
        assert!(store.is_empty().unwrap());
    }
}
