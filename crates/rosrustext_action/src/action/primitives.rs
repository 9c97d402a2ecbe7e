//! Capabilities the action client consumes from a transport.
//!
//! The client never talks to a middleware directly: an adapter layer implements
//! these traits over its own service clients and subscriptions, and the client
//! composes five of them into one unit.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::QosProfile;

/// Result alias for primitive (transport-level) operations.
pub type PrimitiveResult<T> = std::result::Result<T, PrimitiveError>;

/// Transport-level failure classes the client knows how to reclassify.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrimitiveErrorKind {
    BadAlloc,
    /// Nothing available to take.
    TakeFailed,
    /// Service/topic name rejected.
    NameInvalid,
    /// The primitive itself is not usable.
    Invalid,
    /// Wait set has no free slot of the requested kind.
    Full,
    Other,
}

/// Error reported by a transport primitive.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("{kind:?}: {message}")]
pub struct PrimitiveError {
    pub kind: PrimitiveErrorKind,
    pub message: Cow<'static, str>,
}

impl PrimitiveError {
    pub fn new(kind: PrimitiveErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn take_failed() -> Self {
        Self::new(PrimitiveErrorKind::TakeFailed, "no data available to take")
    }
}

/// Identity of one primitive instance.
///
/// Two handles are equal only if they were cloned from the same `EntityHandle::new()`
/// call. Values never alias: a different primitive landing on the same wait-set slot
/// compares unequal.
#[derive(Clone)]
pub struct EntityHandle(Arc<()>);

impl EntityHandle {
    pub fn new() -> Self {
        Self(Arc::new(()))
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for EntityHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for EntityHandle {}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({:p})", Arc::as_ptr(&self.0))
    }
}

/// `rmw_request_id_t` equivalent returned alongside a service response.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct RequestHeader {
    pub writer_guid: [u8; 16],
    pub sequence_number: i64,
}

/// Provenance of a feed message. The action client drops it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct MessageInfo {
    pub source_timestamp: i64,
    pub received_timestamp: i64,
    pub publication_sequence_number: u64,
}

/// What a transport needs to create one primitive.
#[derive(Debug, Clone, Copy)]
pub struct EndpointSpec<'a> {
    /// Fully derived service or topic name.
    pub name: &'a str,
    /// Interface name, e.g. `example_interfaces/action/Fibonacci_SendGoal`.
    pub type_name: &'a str,
    pub qos: &'a QosProfile,
}

/// Request/response channel (service client).
pub trait ServiceClient<Req, Resp>: Send {
    fn handle(&self) -> &EntityHandle;

    fn is_valid(&self) -> bool;

    /// Send a request; returns the sequence number correlating the response.
    fn send_request(&mut self, request: &Req) -> PrimitiveResult<i64>;

    /// Non-blocking take; `TakeFailed` when no response is queued.
    fn take_response(&mut self) -> PrimitiveResult<(RequestHeader, Resp)>;

    /// True when a matching service server is reachable.
    fn server_is_available(&self) -> PrimitiveResult<bool>;

    fn fini(&mut self) -> PrimitiveResult<()>;
}

/// Streaming feed (subscription).
pub trait Subscription<Msg>: Send {
    fn handle(&self) -> &EntityHandle;

    fn is_valid(&self) -> bool;

    /// Non-blocking take; `TakeFailed` when no message is queued.
    fn take(&mut self) -> PrimitiveResult<(Msg, MessageInfo)>;

    fn publisher_count(&self) -> PrimitiveResult<usize>;

    /// Replace the content filter expression. Empty string disables filtering.
    fn set_content_filter(&mut self, expression: &str) -> PrimitiveResult<()>;

    fn fini(&mut self) -> PrimitiveResult<()>;
}

/// Parent capability that creates primitives (a node, in ROS terms).
pub trait ActionTransport {
    fn is_valid(&self) -> bool;

    fn create_client<Req, Resp>(
        &mut self,
        spec: EndpointSpec<'_>,
    ) -> PrimitiveResult<Box<dyn ServiceClient<Req, Resp>>>
    where
        Req: Send + 'static,
        Resp: Send + 'static;

    fn create_subscription<Msg>(
        &mut self,
        spec: EndpointSpec<'_>,
    ) -> PrimitiveResult<Box<dyn Subscription<Msg>>>
    where
        Msg: Send + 'static;
}
