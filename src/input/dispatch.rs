//! Document-level key event dispatch
//!
//! Listeners are registered with [`KeyDispatcher::subscribe`] and stay
//! registered exactly as long as the returned [`KeySubscription`] lives.
//! Listeners may subscribe or unsubscribe from inside a dispatch; such
//! changes take effect from the next key press.

use crate::input::KeyEvent;
use log::debug;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Listener callback. Returns true when it handled the key and the host's
/// default action must be suppressed.
pub type KeyListener = Arc<dyn Fn(&KeyEvent) -> bool + Send + Sync>;

type ListenerList = Arc<RwLock<Vec<(u64, KeyListener)>>>;

/// Fan-out point for host key presses
#[derive(Clone, Default)]
pub struct KeyDispatcher {
    listeners: ListenerList,
    next_id: Arc<AtomicU64>,
}

impl KeyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener until the returned handle is dropped
    pub fn subscribe<F>(&self, listener: F) -> KeySubscription
    where
        F: Fn(&KeyEvent) -> bool + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.listeners.write().push((id, Arc::new(listener)));
        debug!("Key listener {} registered", id);

        KeySubscription {
            id,
            listeners: Arc::clone(&self.listeners),
        }
    }

    /// Deliver a key press to every listener
    ///
    /// Returns true if any listener asked for the default action to be
    /// suppressed.
    pub fn dispatch(&self, event: &KeyEvent) -> bool {
        // Snapshot so listeners can drop subscriptions without deadlocking
        let listeners: Vec<KeyListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        let mut prevent_default = false;
        for listener in listeners {
            prevent_default |= listener(event);
        }
        prevent_default
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for KeyDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyDispatcher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Registration handle; dropping it removes the listener
#[must_use = "the listener is removed as soon as the subscription is dropped"]
pub struct KeySubscription {
    id: u64,
    listeners: ListenerList,
}

impl KeySubscription {
    /// Remove the listener now
    pub fn unsubscribe(self) {}
}

impl Drop for KeySubscription {
    fn drop(&mut self) {
        self.listeners.write().retain(|(id, _)| *id != self.id);
        debug!("Key listener {} removed", self.id);
    }
}

impl std::fmt::Debug for KeySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySubscription").field("id", &self.id).finish()
    }
}
