//! The two channels a highlight id travels on.
//!
//! - [`HandoffSlot`]: written right before navigating, taken exactly once by
//!   the view that renders next.
//! - [`HighlightBus`]: same-view broadcast for replies that do not navigate.
//!
//! Views keep what they receive in an [`ActiveHighlight`], which expires on
//! its own after [`HIGHLIGHT_DURATION`].

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::debug;

/// How long a highlight stays visible
pub const HIGHLIGHT_DURATION: Duration = Duration::from_secs(5);

const BUS_CAPACITY: usize = 16;

/// Single-value, read-once handoff between the assistant and the next view
#[derive(Debug, Clone, Default)]
pub struct HandoffSlot {
    inner: Arc<Mutex<Option<String>>>,
}

impl HandoffSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an id, replacing anything not yet taken
    pub fn set(&self, id: impl Into<String>) {
        let id = id.into();
        debug!(%id, "highlight handed off");
        *self.lock() = Some(id);
    }

    /// Read and clear
    pub fn take(&self) -> Option<String> {
        self.lock().take()
    }

    /// Read without consuming
    pub fn peek(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // The slot holds plain data, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Payload of a same-view highlight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightEvent {
    pub id: String,
}

/// Publish/subscribe channel for highlights on the current view
#[derive(Debug, Clone)]
pub struct HighlightBus {
    tx: broadcast::Sender<HighlightEvent>,
}

impl HighlightBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HighlightEvent> {
        self.tx.subscribe()
    }

    /// Send to every current subscriber; returns how many there were
    pub fn publish(&self, id: impl Into<String>) -> usize {
        let event = HighlightEvent { id: id.into() };
        debug!(id = %event.id, "highlight broadcast");
        // No subscribers is fine: nothing is mounted to react
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for HighlightBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A view's currently highlighted entity
#[derive(Debug, Clone, Default)]
pub struct ActiveHighlight {
    current: Option<(String, Instant)>,
}

impl ActiveHighlight {
    pub fn show(&mut self, id: impl Into<String>, now: Instant) {
        self.current = Some((id.into(), now + HIGHLIGHT_DURATION));
    }

    /// Pick up a pending handoff, if any
    pub fn take_from(&mut self, slot: &HandoffSlot, now: Instant) {
        if let Some(id) = slot.take() {
            self.show(id, now);
        }
    }

    pub fn current(&self, now: Instant) -> Option<&str> {
        match &self.current {
            Some((id, until)) if now < *until => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn is_highlighted(&self, id: &str, now: Instant) -> bool {
        self.current(now) == Some(id)
    }

    /// Drop an expired highlight; returns true if something was cleared
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.current.is_some() && self.current(now).is_none() {
            self.current = None;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
