//! Append-only observer registry.
//!
//! Readers get an immutable snapshot and never hold the lock while
//! delivering. Registration copies the current list, appends, and swaps the
//! new list in, so a snapshot taken before a registration never observes it.

use std::sync::{Arc, PoisonError, RwLock};

use crate::observer::{Observer, ObserverId};

/// Immutable, ordered view of the registered observers.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    observers: Arc<Vec<Arc<Observer>>>,
}

impl RegistrySnapshot {
    /// Number of observers in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// True when no observer was registered at snapshot time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Observers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Observer>> {
        self.observers.iter()
    }
}

/// Registry of observers. Observers are never removed.
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    current: RwLock<RegistrySnapshot>,
}

impl ObserverRegistry {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer. No deduplication.
    pub fn register(&self, observer: Observer) -> ObserverId {
        let id = observer.id();
        let name = observer.name().to_string();

        // Registration cannot fail: a poisoned lock still guards a valid list.
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: Vec<Arc<Observer>> = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.observers.iter().cloned());
        next.push(Arc::new(observer));
        let count = next.len();
        guard.observers = Arc::new(next);
        drop(guard);

        tracing::debug!(
            target: "courier::registry",
            observer = %id,
            name = %name,
            registered = count,
            "observer registered"
        );
        id
    }

    /// Current observers.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
