use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;

use super::Event;

/// Async broadcast bus: every subscriber gets an independent FIFO and sees
/// every emitted event, unlike `tokio::sync::broadcast`'s lossy,
/// lagging-receiver semantics. Each `subscribe()` call registers a fresh
/// `mpsc` channel; `emit` pushes onto all of them; `shutdown` closes every
/// sender so each subscriber's stream ends.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<Event>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `event` onto every currently-registered subscriber's queue.
    /// Subscribers that have already dropped their receiver are silently
    /// skipped rather than treated as an error.
    pub fn emit(&self, event: Event) {
        for sender in &self.subscribers {
            let _ = sender.send(event.clone());
        }
    }

    /// Registers a new subscriber and returns a stream of every event
    /// emitted from this point forward, ending when [`EventBus::shutdown`]
    /// is called.
    pub fn subscribe(&mut self) -> impl Stream<Item = Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        UnboundedReceiverStream::new(rx)
    }

    /// Signals every subscriber to stop by dropping all sender handles,
    /// which closes each subscriber's stream.
    pub fn shutdown(&mut self) {
        self.subscribers.clear();
    }
}
