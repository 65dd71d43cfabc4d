//! Handler registration and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::warn;

use clip_core::ids::RequestId;

use crate::errors::{ErrorBody, UNKNOWN_MESSAGE_TYPE};
use crate::protocol::{MessageKind, Reply, Request, Response};

/// An async handler for one message kind.
///
/// The contract: exactly one reply per request. Returning `Err` produces an
/// error reply; the dispatch layer never lets a request go unanswered.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one request and produce its reply payload.
    async fn handle(&self, request: Request) -> Result<Response, ErrorBody>;
}

/// One handler per [`MessageKind`].
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<MessageKind, Arc<dyn MessageHandler>>>,
}

impl HandlerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a handler with a message kind.
    ///
    /// Exactly one handler per kind: registering a second replaces the
    /// first, loudly, because that is almost always a wiring mistake.
    pub fn register(&self, kind: MessageKind, handler: impl MessageHandler + 'static) {
        let previous = self.handlers.write().insert(kind, Arc::new(handler));
        if previous.is_some() {
            warn!(%kind, "replacing existing handler for message kind");
        }
    }

    /// Whether a handler is registered for the kind.
    #[must_use]
    pub fn has_handler(&self, kind: MessageKind) -> bool {
        self.handlers.read().contains_key(&kind)
    }

    /// Registered kinds, for diagnostics.
    #[must_use]
    pub fn kinds(&self) -> Vec<MessageKind> {
        self.handlers.read().keys().copied().collect()
    }

    /// Dispatch a request and build the correlated reply.
    ///
    /// An unregistered kind yields a structured `UNKNOWN_MESSAGE_TYPE`
    /// error reply rather than a panic: a programmer error at the
    /// protocol boundary is reported through the protocol itself.
    pub async fn dispatch(&self, id: RequestId, request: Request) -> Reply {
        let kind = request.kind();
        let handler = self.handlers.read().get(&kind).cloned();
        match handler {
            Some(handler) => match handler.handle(request).await {
                Ok(response) => Reply::success(id, response),
                Err(body) => Reply::error(id, body),
            },
            None => Reply::error(
                id,
                ErrorBody::new(
                    UNKNOWN_MESSAGE_TYPE,
                    format!("no handler registered for {kind}"),
                ),
            ),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::INVALID_PARAMS;

    struct PingHandler;

    #[async_trait]
    impl MessageHandler for PingHandler {
        async fn handle(&self, _request: Request) -> Result<Response, ErrorBody> {
            Ok(Response::pong_now())
        }
    }

    struct RejectingHandler;

    #[async_trait]
    impl MessageHandler for RejectingHandler {
        async fn handle(&self, _request: Request) -> Result<Response, ErrorBody> {
            Err(ErrorBody::new(INVALID_PARAMS, "nope"))
        }
    }

    #[tokio::test]
    async fn dispatch_routes_to_registered_handler() {
        let registry = HandlerRegistry::new();
        registry.register(MessageKind::Ping, PingHandler);

        let reply = registry.dispatch(RequestId::from("r1"), Request::Ping).await;
        assert!(reply.success);
        assert_eq!(reply.id.as_str(), "r1");
        assert!(matches!(reply.response, Some(Response::Pong { .. })));
    }

    #[tokio::test]
    async fn dispatch_unknown_kind_is_structured_error() {
        let registry = HandlerRegistry::new();
        let reply = registry
            .dispatch(RequestId::from("r2"), Request::GetSettings)
            .await;
        assert!(!reply.success);
        let body = reply.error.unwrap();
        assert_eq!(body.code, UNKNOWN_MESSAGE_TYPE);
        assert!(body.message.contains("GET_SETTINGS"));
    }

    #[tokio::test]
    async fn handler_error_becomes_error_reply() {
        let registry = HandlerRegistry::new();
        registry.register(MessageKind::Ping, RejectingHandler);

        let reply = registry.dispatch(RequestId::from("r3"), Request::Ping).await;
        assert!(!reply.success);
        assert_eq!(reply.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn second_registration_replaces_first() {
        let registry = HandlerRegistry::new();
        registry.register(MessageKind::Ping, RejectingHandler);
        registry.register(MessageKind::Ping, PingHandler);

        let reply = registry.dispatch(RequestId::from("r4"), Request::Ping).await;
        assert!(reply.success, "latest registration should win");
    }

    #[test]
    fn kinds_lists_registrations() {
        let registry = HandlerRegistry::new();
        assert!(registry.kinds().is_empty());
        registry.register(MessageKind::Ping, PingHandler);
        registry.register(MessageKind::GetSettings, PingHandler);
        assert_eq!(registry.kinds().len(), 2);
        assert!(registry.has_handler(MessageKind::Ping));
        assert!(!registry.has_handler(MessageKind::SaveScreenshot));
    }
}
