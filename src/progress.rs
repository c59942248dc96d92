#![forbid(unsafe_code)]

//! Progress events and the hub that fans them out to server-sent-event
//! listeners.

use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

pub const MERGING_PERCENT: f64 = 90.0;
pub const COMPLETED_PERCENT: f64 = 100.0;

/// One update pushed to listeners while a tracked yt-dlp run is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    Starting { percent: f64 },
    Downloading { percent: f64 },
    Merging { percent: f64 },
    Completed { percent: f64 },
    Error { message: String },
}

impl ProgressEvent {
    pub fn starting() -> Self {
        Self::Starting { percent: 0.0 }
    }

    pub fn downloading(percent: f64) -> Self {
        Self::Downloading { percent }
    }

    pub fn merging() -> Self {
        Self::Merging {
            percent: MERGING_PERCENT,
        }
    }

    pub fn completed() -> Self {
        Self::Completed {
            percent: COMPLETED_PERCENT,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// How events are routed between concurrent downloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProgressScope {
    /// Every listener sees every event.
    #[default]
    Global,
    /// Events tagged with a session only reach listeners of that session
    /// (and listeners that did not ask for one).
    Session,
}

impl ProgressScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" => Some(Self::Global),
            "session" => Some(Self::Session),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Session => "session",
        }
    }
}

pub type SubscriberId = u64;

struct Subscriber {
    session: Option<String>,
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

/// Registry of live progress listeners. One instance per server.
pub struct ProgressHub {
    scope: ProgressScope,
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
}

impl ProgressHub {
    pub fn new(scope: ProgressScope) -> Self {
        Self {
            scope,
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn scope(&self) -> ProgressScope {
        self.scope
    }

    /// Registers a listener. Dropping the returned subscription unregisters it.
    pub fn subscribe(self: &Arc<Self>, session: Option<String>) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .insert(id, Subscriber { session, sender });
        debug!("progress subscriber {id} connected");

        Subscription {
            id,
            receiver,
            hub: Arc::clone(self),
        }
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers.lock().remove(&id).is_some() {
            debug!("progress subscriber {id} disconnected");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Sends `event` to every matching listener. Listeners whose channel has
    /// closed are dropped from the registry; delivery to the rest continues.
    pub fn publish(&self, event: &ProgressEvent, session: Option<&str>) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|id, subscriber| {
            if !self.accepts(subscriber, session) {
                return !subscriber.sender.is_closed();
            }
            let delivered = subscriber.sender.send(event.clone()).is_ok();
            if !delivered {
                debug!("dropping closed progress subscriber {id}");
            }
            delivered
        });
    }

    fn accepts(&self, subscriber: &Subscriber, session: Option<&str>) -> bool {
        match (self.scope, session, subscriber.session.as_deref()) {
            (ProgressScope::Global, _, _) => true,
            (ProgressScope::Session, None, _) | (ProgressScope::Session, _, None) => true,
            (ProgressScope::Session, Some(event), Some(listener)) => event == listener,
        }
    }
}

/// A listener's end of the hub.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
    hub: Arc<ProgressHub>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next event. Returns `None` once the hub forgot us.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.receiver.recv().await
    }

    /// Drains whatever is already queued without waiting.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

/// Publishing handle bound to one request's session, handed to the process
/// runner for tracked invocations.
#[derive(Clone)]
pub struct ProgressPublisher {
    hub: Arc<ProgressHub>,
    session: Option<String>,
}

impl ProgressPublisher {
    pub fn new(hub: Arc<ProgressHub>, session: Option<String>) -> Self {
        Self { hub, session }
    }

    pub fn publish(&self, event: ProgressEvent) {
        self.hub.publish(&event, self.session.as_deref());
    }
}
