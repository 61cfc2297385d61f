//! Event scripts for one connection attempt.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use wa_bridge::{BridgeError, ConnectionUpdate, EventStream, MessageBatch, ProviderEvent, WireMessage};

/// One scripted step.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver an event.
    Event(ProviderEvent),
    /// Pause before the next step.
    Delay(Duration),
}

/// The events of one connection attempt.
///
/// Unless [`Script::end`] is called the stream stays open after the last
/// step, like a live connection that has gone quiet.
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
    ends: bool,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(mut self, event: ProviderEvent) -> Self {
        self.steps.push(Step::Event(event));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.steps.push(Step::Delay(delay));
        self
    }

    pub fn delay_ms(self, millis: u64) -> Self {
        self.delay(Duration::from_millis(millis))
    }

    /// `connection: open`
    pub fn open(self) -> Self {
        self.event(ProviderEvent::Connection(ConnectionUpdate::open()))
    }

    /// `connection: close` with a status code.
    pub fn close(self, status_code: u16) -> Self {
        self.event(ProviderEvent::Connection(ConnectionUpdate::close(status_code)))
    }

    /// A pairing challenge.
    pub fn pairing(self, qr: &str) -> Self {
        self.event(ProviderEvent::Connection(ConnectionUpdate::pairing(qr)))
    }

    /// A history sync batch.
    pub fn history(self, messages: Vec<WireMessage>) -> Self {
        self.event(ProviderEvent::HistorySet(MessageBatch::new(messages)))
    }

    /// A message upsert batch.
    pub fn upsert(self, messages: Vec<WireMessage>) -> Self {
        self.event(ProviderEvent::MessagesUpsert(MessageBatch::new(messages)))
    }

    /// End the stream after the last step.
    pub fn end(mut self) -> Self {
        self.ends = true;
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Turn the script into an event stream.
    pub fn into_stream(self) -> EventStream {
        let played = stream::unfold(self.steps.into_iter(), |mut steps| async move {
            loop {
                match steps.next()? {
                    Step::Event(event) => return Some((Ok::<_, BridgeError>(event), steps)),
                    Step::Delay(delay) => tokio::time::sleep(delay).await,
                }
            }
        });

        if self.ends {
            played.boxed()
        } else {
            played.chain(stream::pending()).boxed()
        }
    }
}
