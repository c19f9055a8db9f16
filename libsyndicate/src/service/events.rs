//! Publish progress events
//!
//! An in-process broadcast bus. The publishing service emits events while a
//! publish is in flight; any number of subscribers (synd-post's progress lines,
//! synd-serve's event log) may listen. Emitting with no subscribers drops the
//! event, and a lagging subscriber misses the oldest events instead of
//! blocking the publisher.
//!
//! # Example
//!
//! ```
//! use libsyndicate::service::events::{Event, EventBus};
//! use libsyndicate::Platform;
//!
//! # async fn example() {
//! let bus = EventBus::new(100);
//! let mut receiver = bus.subscribe();
//!
//! bus.emit(Event::PublishStarted {
//!     post_id: "abc123".to_string(),
//!     platforms: vec![Platform::DevTo],
//! });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::Platform;

pub type EventReceiver = broadcast::Receiver<Event>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send `event` to current subscribers without waiting
    pub fn emit(&self, event: Event) {
        // No receivers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A publish to these platforms is starting
    PublishStarted {
        post_id: String,
        platforms: Vec<Platform>,
    },

    PlatformSucceeded {
        post_id: String,
        platform: Platform,
        external_id: Option<String>,
        url: Option<String>,
    },

    PlatformFailed {
        post_id: String,
        platform: Platform,
        error: String,
    },

    /// Every platform has settled
    PublishCompleted {
        post_id: String,
        succeeded: Vec<Platform>,
        failed: Vec<Platform>,
    },
}

impl Event {
    pub fn post_id(&self) -> &str {
        match self {
            Event::PublishStarted { post_id, .. }
            | Event::PlatformSucceeded { post_id, .. }
            | Event::PlatformFailed { post_id, .. }
            | Event::PublishCompleted { post_id, .. } => post_id,
        }
    }
}
