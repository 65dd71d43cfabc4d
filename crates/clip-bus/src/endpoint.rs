//! Endpoints: the two sides of the bus.
//!
//! [`pair`] builds a connected page/privileged endpoint pair and spawns a
//! dispatch task per side. Each endpoint owns a [`RuntimeHandle`] modeling
//! the validity of its execution context — page navigation or a privileged
//! restart invalidates the handle, and every send checks it before the
//! first byte moves and again after every await, because invalidation is
//! asynchronous and can land mid-flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use clip_core::constants::{INTERACTIVE_SEND_TIMEOUT_MS, JOURNEY_SEND_TIMEOUT_MS};
use clip_core::ids::RequestId;

use crate::errors::BusError;
use crate::protocol::{Envelope, Reply, Request, Response};
use crate::registry::HandlerRegistry;

/// Which execution context an endpoint models.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextKind {
    /// Page-embedded context; one per displayed page.
    Page,
    /// Privileged background context; one per extension session.
    Privileged,
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page => f.write_str("page"),
            Self::Privileged => f.write_str("privileged"),
        }
    }
}

/// Validity flag for an execution context.
///
/// Cloned handles observe the same flag, so the session can invalidate a
/// context from outside the endpoint.
#[derive(Clone, Debug, Default)]
pub struct RuntimeHandle {
    invalidated: Arc<AtomicBool>,
}

impl RuntimeHandle {
    /// A fresh, valid handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the context is still usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.invalidated.load(Ordering::Acquire)
    }

    /// Tear the context down. Irreversible for this handle.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }
}

/// Per-send knobs.
#[derive(Clone, Copy, Debug)]
pub struct SendOptions {
    /// How long to wait for each attempt's reply.
    pub timeout: Duration,
    /// How many times to re-send after a timeout. Error replies are never
    /// retried.
    pub retries: u32,
}

impl SendOptions {
    /// The latency-sensitive profile journey captures use: short timeout,
    /// no retry.
    #[must_use]
    pub fn journey() -> Self {
        Self {
            timeout: Duration::from_millis(JOURNEY_SEND_TIMEOUT_MS),
            retries: 0,
        }
    }

    /// The interactive profile dialog-backed calls use: long timeout, one
    /// retry.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            timeout: Duration::from_millis(INTERACTIVE_SEND_TIMEOUT_MS),
            retries: 1,
        }
    }
}

impl Default for SendOptions {
    fn default() -> Self {
        Self::journey()
    }
}

enum Frame {
    Request(Envelope),
    Reply(Reply),
}

/// One side of the bus.
pub struct Endpoint {
    kind: ContextKind,
    handle: RuntimeHandle,
    peer_tx: mpsc::UnboundedSender<Frame>,
    pending: DashMap<RequestId, oneshot::Sender<Reply>>,
    registry: HandlerRegistry,
}

/// The two connected endpoints [`pair`] produces.
pub struct EndpointPair {
    /// The page-context side.
    pub page: Arc<Endpoint>,
    /// The privileged-context side.
    pub privileged: Arc<Endpoint>,
}

/// Build a connected page/privileged pair and spawn their dispatch tasks.
///
/// Must run inside a tokio runtime.
#[must_use]
pub fn pair() -> EndpointPair {
    let (to_privileged, from_page) = mpsc::unbounded_channel();
    let (to_page, from_privileged) = mpsc::unbounded_channel();

    let page = Arc::new(Endpoint {
        kind: ContextKind::Page,
        handle: RuntimeHandle::new(),
        peer_tx: to_privileged,
        pending: DashMap::new(),
        registry: HandlerRegistry::new(),
    });
    let privileged = Arc::new(Endpoint {
        kind: ContextKind::Privileged,
        handle: RuntimeHandle::new(),
        peer_tx: to_page,
        pending: DashMap::new(),
        registry: HandlerRegistry::new(),
    });

    drop(tokio::spawn(run_dispatch(page.clone(), from_privileged)));
    drop(tokio::spawn(run_dispatch(privileged.clone(), from_page)));

    EndpointPair { page, privileged }
}

impl Endpoint {
    /// Which context this endpoint models.
    #[must_use]
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// The context's validity handle.
    #[must_use]
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// This side's handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    fn ensure_valid(&self) -> Result<(), BusError> {
        if self.handle.is_valid() {
            Ok(())
        } else {
            Err(BusError::ContextInvalidated)
        }
    }

    /// Send a request to the peer context and await the correlated reply.
    ///
    /// Semantics:
    /// - fails fast with [`BusError::ContextInvalidated`] when this side's
    ///   handle is dead, re-checked after every await;
    /// - each timeout removes the pending entry (any late reply is then
    ///   dropped) and re-sends under a **fresh** ID while retries remain;
    /// - an explicit error reply is terminal — no retry.
    pub async fn send(&self, request: Request, options: SendOptions) -> Result<Response, BusError> {
        let attempts = options.retries.saturating_add(1);
        for attempt in 1..=attempts {
            self.ensure_valid()?;

            let id = RequestId::new();
            let (reply_tx, reply_rx) = oneshot::channel();
            let _ = self.pending.insert(id.clone(), reply_tx);

            let envelope = Envelope {
                id: id.clone(),
                request: request.clone(),
            };
            if self.peer_tx.send(Frame::Request(envelope)).is_err() {
                let _ = self.pending.remove(&id);
                return Err(BusError::ChannelClosed);
            }
            trace!(context = %self.kind, %id, attempt, "request sent");

            match tokio::time::timeout(options.timeout, reply_rx).await {
                Ok(Ok(reply)) => {
                    // Invalidation may have landed while we were parked.
                    self.ensure_valid()?;
                    return reply.into_result().map_err(BusError::Remote);
                }
                Ok(Err(_closed)) => {
                    let _ = self.pending.remove(&id);
                    return Err(BusError::ChannelClosed);
                }
                Err(_elapsed) => {
                    // Drop the pending entry first so a reply racing the
                    // timeout is discarded, then decide whether to retry.
                    let _ = self.pending.remove(&id);
                    self.ensure_valid()?;
                    debug!(context = %self.kind, %id, attempt, "send timed out");
                }
            }
        }
        Err(BusError::Timeout { attempts })
    }

    /// Liveness probe: a `PING` under the journey timeout profile.
    pub async fn probe(&self) -> Result<(), BusError> {
        match self.send(Request::Ping, SendOptions::journey()).await? {
            Response::Pong { .. } => Ok(()),
            other => {
                debug!(context = %self.kind, response = ?other, "unexpected probe reply");
                Ok(())
            }
        }
    }
}

/// Receive loop for one endpoint: routes replies to pending senders and
/// spawns a task per incoming request so handlers can overlap.
async fn run_dispatch(endpoint: Arc<Endpoint>, mut rx: mpsc::UnboundedReceiver<Frame>) {
    while let Some(frame) = rx.recv().await {
        match frame {
            Frame::Request(envelope) => {
                if !endpoint.handle.is_valid() {
                    trace!(context = %endpoint.kind, id = %envelope.id, "dropping request for invalidated context");
                    continue;
                }
                let ep = endpoint.clone();
                drop(tokio::spawn(async move {
                    let reply = ep.registry.dispatch(envelope.id, envelope.request).await;
                    // The peer may be gone by now; nothing left to notify.
                    let _ = ep.peer_tx.send(Frame::Reply(reply));
                }));
            }
            Frame::Reply(reply) => match endpoint.pending.remove(&reply.id) {
                Some((_, tx)) => {
                    let _ = tx.send(reply);
                }
                None => {
                    trace!(context = %endpoint.kind, id = %reply.id, "dropping late reply");
                }
            },
        }
    }
    debug!(context = %endpoint.kind, "dispatch loop ended");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
