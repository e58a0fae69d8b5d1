//! Per-kind callback registry shared by a feed's message handler.

use std::collections::HashMap;
use std::sync::Arc;

use super::variants::EventCallback;
use crate::domain::{EventKind, Fields};
use crate::error::DispatchError;

/// At most one callback per event kind.
#[derive(Clone, Default)]
pub struct Callbacks {
    by_kind: HashMap<EventKind, Arc<dyn EventCallback>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `callback` under its own kind, replacing any previous one.
    pub fn register(&mut self, callback: impl EventCallback) {
        self.by_kind.insert(callback.kind(), Arc::new(callback));
    }

    #[must_use]
    pub fn with(mut self, callback: impl EventCallback) -> Self {
        self.register(callback);
        self
    }

    pub fn get(&self, kind: EventKind) -> Option<&Arc<dyn EventCallback>> {
        self.by_kind.get(&kind)
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    /// Deliver `fields` to the callback for `kind`.
    ///
    /// Returns `Ok(false)` when nothing is registered for the kind.
    pub async fn dispatch(&self, kind: EventKind, fields: Fields) -> Result<bool, DispatchError> {
        match self.by_kind.get(&kind) {
            Some(callback) => {
                callback.call(fields).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.by_kind.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("Callbacks").field("kinds", &kinds).finish()
    }
}
