//! Best-effort delivery of notification events.
//!
//! An event is delivered by issuing a GET request to its configured URL. Any
//! response, whatever its status code, counts as delivered. Transport errors
//! are retried a bounded number of times; after that the event is dropped.

use std::time::Duration;

use log::{info, warn};

use crate::clock::Clock;

/// Attempts per event, including the first one
pub const MAX_ATTEMPTS: u32 = 10;

/// Pause between two attempts
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// A single outbound GET request.
pub trait Transport {
    type Error: std::fmt::Display;

    /// Return the HTTP status code of the response.
    fn get(&self, url: &str) -> Result<u16, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    type Error = T::Error;

    fn get(&self, url: &str) -> Result<u16, Self::Error> {
        (**self).get(url)
    }
}

/// Blocking HTTP client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    type Error = reqwest::Error;

    fn get(&self, url: &str) -> Result<u16, Self::Error> {
        let response = self.client.get(url).send()?;
        Ok(response.status().as_u16())
    }
}

/// What happened to an event. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// No URL configured
    Skipped,
    Sent { status: u16, attempts: u32 },
    GaveUp { attempts: u32 },
}

pub struct Notifier<T, C> {
    transport: T,
    clock: C,
}

impl<T: Transport, C: Clock> Notifier<T, C> {
    pub fn new(transport: T, clock: C) -> Self {
        Self { transport, clock }
    }

    /// Deliver an event to `url`. An empty URL is a no-op.
    ///
    /// Never fails; see [`Delivery`] for the outcome.
    pub fn send(&self, url: &str) -> Delivery {
        if url.is_empty() {
            return Delivery::Skipped;
        }

        for attempt in 1..=MAX_ATTEMPTS {
            match self.transport.get(url) {
                Ok(status) => {
                    info!("Sent request to {} which returned: {}", url, status);
                    return Delivery::Sent {
                        status,
                        attempts: attempt,
                    };
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!(
                        "Could not send request to {} (attempt {}/{}): {}, retrying in {:?}",
                        url, attempt, MAX_ATTEMPTS, e, RETRY_BACKOFF
                    );
                    self.clock.sleep(RETRY_BACKOFF);
                }
                Err(e) => {
                    warn!("Could not send request to {}: {}", url, e);
                }
            }
        }

        warn!(
            "Could not send message in {} attempts, giving up",
            MAX_ATTEMPTS
        );
        Delivery::GaveUp {
            attempts: MAX_ATTEMPTS,
        }
    }
}
