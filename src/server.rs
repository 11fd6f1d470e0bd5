//! The ticket server: public facade plus the serialized refresh coordinator.
//!
//! All refresh traffic funnels through one background task. Callers hand it
//! a request over an unbounded queue and await a one-shot reply; the renewal
//! timer feeds the same loop. Requests are processed strictly one batch at a
//! time, which is what guarantees at most one issuer fetch in flight without
//! a lock around the network call.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::cache::TicketCache;
use crate::error::TicketError;
use crate::issuer::TicketIssuer;
use crate::schedule::RenewalSchedule;
use crate::ticket::{Ticket, buffered_expiry};

type TicketResult = Result<String, TicketError>;

struct RefreshRequest {
    /// The caller's copy of the ticket. Empty means "refresh
    /// unconditionally"; non-empty means "my copy was rejected downstream".
    current: String,
    reply: oneshot::Sender<TicketResult>,
}

/// Cloneable handle to the one refresh coordinator for a credential stream.
///
/// Every call site must share clones of a single `TicketServer`. A second
/// server constructed for the same credential stream runs its own fetch loop
/// and defeats the at-most-one-fetch guarantee; construct once, clone freely.
/// The background task exits when the last handle is dropped.
#[derive(Clone)]
pub struct TicketServer {
    cache: Arc<TicketCache>,
    schedule: RenewalSchedule,
    tx: mpsc::UnboundedSender<RefreshRequest>,
}

impl TicketServer {
    /// Spawn the coordinator task and return a handle to it.
    ///
    /// The renewal timer starts at a randomized 100-300 day period and is
    /// retuned to the real ticket lifetime after the first successful fetch.
    /// Must be called from within a tokio runtime.
    pub fn spawn<I>(issuer: I) -> Self
    where
        I: TicketIssuer + 'static,
    {
        Self::spawn_with_schedule(issuer, RenewalSchedule::desynchronized())
    }

    /// Like [`spawn`](Self::spawn), but with an explicit initial renewal
    /// period instead of the randomized default.
    pub fn spawn_with_initial_period<I>(issuer: I, period: Duration) -> Self
    where
        I: TicketIssuer + 'static,
    {
        Self::spawn_with_schedule(issuer, RenewalSchedule::with_period(period))
    }

    fn spawn_with_schedule<I>(issuer: I, schedule: RenewalSchedule) -> Self
    where
        I: TicketIssuer + 'static,
    {
        let cache = Arc::new(TicketCache::new());
        let (tx, rx) = mpsc::unbounded_channel();

        let coordinator = Coordinator {
            cache: cache.clone(),
            issuer,
            schedule: schedule.clone(),
            rx,
        };
        tokio::spawn(coordinator.run());

        Self {
            cache,
            schedule,
            tx,
        }
    }

    /// The current ticket, refreshing once if none is cached.
    ///
    /// The fast path is a cache read with no coordination and no network
    /// access.
    pub async fn ticket(&self) -> TicketResult {
        let cached = self.cache.get();
        if !cached.is_empty() {
            return Ok(cached.value);
        }
        self.refresh_ticket("").await
    }

    /// Force a refresh because `current` was rejected downstream.
    ///
    /// An empty `current` refreshes unconditionally. A non-empty `current`
    /// that no longer matches the cache means someone else already refreshed;
    /// the newer cached value is returned without a network call.
    pub async fn refresh_ticket(&self, current: &str) -> TicketResult {
        let (reply, rx) = oneshot::channel();
        let request = RefreshRequest {
            current: current.to_owned(),
            reply,
        };
        self.tx
            .send(request)
            .map_err(|_| TicketError::CoordinatorGone)?;
        rx.await.map_err(|_| TicketError::CoordinatorGone)?
    }

    /// The current background renewal period.
    pub fn renewal_period(&self) -> Duration {
        self.schedule.period()
    }
}

/// Whether a caller's stale-ticket complaint is already obsolete: someone
/// else refreshed since the caller took its copy.
fn is_superseded(current: &str, cached: &Ticket) -> bool {
    !current.is_empty() && !cached.is_empty() && current != cached.value
}

struct Coordinator<I> {
    cache: Arc<TicketCache>,
    issuer: I,
    schedule: RenewalSchedule,
    rx: mpsc::UnboundedReceiver<RefreshRequest>,
}

impl<I: TicketIssuer> Coordinator<I> {
    async fn run(mut self) {
        let mut ticker = self.schedule.ticker();
        loop {
            tokio::select! {
                request = self.rx.recv() => {
                    let Some(request) = request else {
                        debug!("all ticket server handles dropped, stopping coordinator");
                        break;
                    };
                    if let Some(expires_in) = self.handle_requests(request).await {
                        ticker = self.schedule.retune(expires_in);
                    }
                }
                _ = ticker.tick() => {
                    match self.refresh().await {
                        Ok(ticket) => {
                            let expires_in = Duration::from_secs(ticket.expires_in as u64);
                            if let Some(new_ticker) = self.schedule.maybe_retune(expires_in) {
                                ticker = new_ticker;
                            }
                        }
                        Err(error) => warn!(%error, "scheduled ticket refresh failed"),
                    }
                }
            }
        }
    }

    /// Handle one caller request plus everything queued behind it.
    ///
    /// Requests whose complaint is already obsolete are answered from the
    /// cache; at most one fetch serves all the rest. Returns the buffered
    /// lifetime of a freshly stored ticket when the renewal schedule must be
    /// reset, `None` when nothing new was fetched.
    async fn handle_requests(&mut self, first: RefreshRequest) -> Option<Duration> {
        let mut batch = vec![first];
        while let Ok(request) = self.rx.try_recv() {
            batch.push(request);
        }

        let cached = self.cache.get();
        let mut waiting = Vec::with_capacity(batch.len());
        for request in batch {
            if is_superseded(&request.current, &cached) {
                debug!("refresh request superseded by a newer cached ticket");
                let _ = request.reply.send(Ok(cached.value.clone()));
            } else {
                waiting.push(request);
            }
        }
        if waiting.is_empty() {
            return None;
        }

        let outcome = self.refresh().await;
        if outcome.is_ok() {
            // Requests that queued while the fetch was in flight joined the
            // same flight; they get the same ticket. After a failure, late
            // arrivals keep their place in the queue for a fresh attempt.
            while let Ok(request) = self.rx.try_recv() {
                waiting.push(request);
            }
        }

        let result: TicketResult = match &outcome {
            Ok(ticket) => Ok(ticket.value.clone()),
            Err(error) => Err(error.clone()),
        };
        for request in waiting {
            let _ = request.reply.send(result.clone());
        }

        match outcome {
            Ok(ticket) => Some(Duration::from_secs(ticket.expires_in as u64)),
            Err(_) => None,
        }
    }

    /// One fetch through the issuer boundary.
    ///
    /// Any failure stores the empty sentinel so stale data is never served
    /// after a failed refresh.
    async fn refresh(&mut self) -> Result<Ticket, TicketError> {
        let issued = match self.issuer.fetch_ticket().await {
            Ok(issued) => issued,
            Err(error) => {
                self.cache.put(Ticket::empty());
                return Err(error);
            }
        };

        let expires_in = match buffered_expiry(issued.expires_in) {
            Ok(expires_in) => expires_in,
            Err(error) => {
                warn!(
                    raw_expires_in = issued.expires_in,
                    "issuer reported an unusable ticket lifetime"
                );
                self.cache.put(Ticket::empty());
                return Err(error);
            }
        };

        let ticket = Ticket::new(issued.ticket, expires_in);
        self.cache.put(ticket.clone());
        debug!(
            expires_in,
            expires_at = %ticket.expires_at(),
            "stored freshly issued ticket"
        );
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_superseded() {
        let cached = Ticket::new("A", 600);

        // A complaint about a ticket the cache no longer holds is obsolete.
        assert!(is_superseded("B", &cached));

        // Unconditional refreshes and matching complaints go to the issuer.
        assert!(!is_superseded("", &cached));
        assert!(!is_superseded("A", &cached));

        // An empty cache can never supersede anything.
        assert!(!is_superseded("B", &Ticket::empty()));
    }
}
