//! # clip-bus
//!
//! Request/response RPC between the two isolated execution contexts of the
//! capture pipeline: the **page** context (one per displayed page, torn
//! down on navigation) and the **privileged** context (one per extension
//! session, restartable by the host).
//!
//! The contexts share no memory. Every call is an envelope with a UUID-v7
//! correlation ID; the sender tracks a pending entry until a correlated
//! reply arrives, the timeout elapses, or its runtime handle is
//! invalidated. Retries re-send with a fresh ID on timeout only — an
//! explicit error reply is terminal — and replies to IDs that are no
//! longer pending are dropped.
//!
//! The protocol is a closed tagged union ([`Request`]/[`Response`]), so the
//! dispatch boundary gets compile-time coverage of every message kind.

#![deny(unsafe_code)]

pub mod endpoint;
pub mod errors;
pub mod protocol;
pub mod registry;

pub use endpoint::{ContextKind, Endpoint, EndpointPair, RuntimeHandle, SendOptions, pair};
pub use errors::{BusError, ErrorBody};
pub use protocol::{
    CaptureScreenshotParams, Envelope, MessageKind, Reply, Request, Response, SaveJourneyParams,
    SaveScreenshotParams,
};
pub use registry::{HandlerRegistry, MessageHandler};
