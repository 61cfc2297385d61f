//! Server-Sent Events (SSE) client for receiving session events.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::types::ProviderEvent;

/// A stream of session events for one connection attempt.
///
/// Unlike a generic SSE consumer this stream never retries: the session
/// engine treats the end of the stream as a closed connection and decides
/// itself whether to reconnect.
pub struct EventStreamSource {
    event_source: EventSource,
}

impl EventStreamSource {
    /// Open the event stream for the session keyed by `auth`.
    pub fn new(config: &BridgeConfig, auth: &str) -> Result<Self, BridgeError> {
        let url = config.events_url(auth);
        info!("Creating SSE connection to {}", url);

        // Long-lived; must not share the RPC client's request timeout
        let sse_client = reqwest::Client::builder().build()?;

        let event_source = sse_client
            .get(&url)
            .eventsource()
            .map_err(|e| BridgeError::Sse(e.to_string()))?;

        Ok(Self { event_source })
    }
}

impl Stream for EventStreamSource {
    type Item = Result<ProviderEvent, BridgeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.event_source).poll_next(cx) {
                Poll::Ready(Some(Ok(Event::Open))) => {
                    debug!("SSE connection opened");
                    continue;
                }
                Poll::Ready(Some(Ok(Event::Message(msg)))) => {
                    match ProviderEvent::from_sse(&msg.event, &msg.data) {
                        Ok(Some(event)) => {
                            debug!("Received SSE event: {}", msg.event);
                            return Poll::Ready(Some(Ok(event)));
                        }
                        Ok(None) => {
                            debug!("Ignoring SSE event type: {}", msg.event);
                            continue;
                        }
                        Err(e) => {
                            warn!("Failed to parse SSE event data: {}", e);
                            debug!("Raw data: {}", msg.data);
                            continue;
                        }
                    }
                }
                Poll::Ready(Some(Err(reqwest_eventsource::Error::StreamEnded))) => {
                    info!("SSE stream ended");
                    self.event_source.close();
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Err(e))) => {
                    error!("SSE error: {}", e);
                    self.event_source.close();
                    return Poll::Ready(Some(Err(BridgeError::Sse(e.to_string()))));
                }
                Poll::Ready(None) => {
                    info!("SSE stream ended");
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Open the event stream for the session keyed by `auth`.
pub fn subscribe(config: &BridgeConfig, auth: &str) -> Result<EventStreamSource, BridgeError> {
    EventStreamSource::new(config, auth)
}
