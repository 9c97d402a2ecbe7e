//! In-process transport.
//!
//! Implements `ActionTransport`, both primitive traits and `WaitSet` without any
//! middleware. Live endpoints are reachable through probes so callers can play the
//! server side: queue responses and messages, flip validity, watch the applied
//! content filter, and inject failures. Finalized endpoints are dropped from the
//! registry on the next registration.
//!
//! Test tooling only: built under `cfg(test)` or the `loopback` feature.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::primitives::{
    ActionTransport, EndpointSpec, EntityHandle, MessageInfo, PrimitiveError, PrimitiveErrorKind,
    PrimitiveResult, RequestHeader, ServiceClient, Subscription,
};
use super::wait::WaitSet;
use super::{
    ActionNames, ActionType, CancelGoalRequest, CancelGoalResponse, FeedbackMessage,
    GetResultRequest, GetResultResponse, GoalStatusArray, QosProfile, SendGoalRequest,
    SendGoalResponse,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn injected(kind: PrimitiveErrorKind, what: &'static str) -> PrimitiveError {
    PrimitiveError::new(kind, format!("injected {what} failure"))
}

trait EndpointState: Send + Sync {
    fn has_pending(&self) -> bool;
    fn is_finalized(&self) -> bool;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum EndpointKind {
    Client,
    Subscription,
}

struct Endpoint {
    name: String,
    type_name: String,
    qos: QosProfile,
    kind: EndpointKind,
    handle: EntityHandle,
    state: Arc<dyn EndpointState>,
}

/// In-process transport ("node") that creates loopback primitives.
pub struct LoopbackTransport {
    valid: bool,
    endpoints: Vec<Endpoint>,
    creation_faults: HashMap<String, PrimitiveErrorKind>,
    fini_faults: HashMap<String, PrimitiveErrorKind>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self {
            valid: true,
            endpoints: Vec::new(),
            creation_faults: HashMap::new(),
            fini_faults: HashMap::new(),
        }
    }

    /// Mark the transport (in)valid; an invalid transport refuses `init`.
    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// Make every creation of an endpoint named `name` fail with `kind`.
    pub fn fail_creation(&mut self, name: impl Into<String>, kind: PrimitiveErrorKind) {
        self.creation_faults.insert(name.into(), kind);
    }

    pub fn clear_creation_fault(&mut self, name: &str) {
        self.creation_faults.remove(name);
    }

    /// Endpoints named `name` created from now on fail their first fini with `kind`.
    pub fn fail_fini_on_create(&mut self, name: impl Into<String>, kind: PrimitiveErrorKind) {
        self.fini_faults.insert(name.into(), kind);
    }

    /// Names of the endpoints not yet finalized, oldest first.
    pub fn endpoint_names(&self) -> Vec<&str> {
        self.endpoints
            .iter()
            .filter(|e| !e.state.is_finalized())
            .map(|e| e.name.as_str())
            .collect()
    }

    /// Interface name and QoS the newest endpoint called `name` was created with.
    pub fn endpoint_config(&self, name: &str) -> Option<(&str, QosProfile)> {
        self.endpoints
            .iter()
            .rev()
            .find(|e| e.name == name)
            .map(|e| (e.type_name.as_str(), e.qos))
    }

    /// Probe the newest client endpoint called `name`.
    pub fn client_probe<Req, Resp>(&self, name: &str) -> Option<ClientProbe<Req, Resp>>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let state = self.find(name, EndpointKind::Client)?;
        let state = state.into_any().downcast::<ClientState<Req, Resp>>().ok()?;
        Some(ClientProbe { state })
    }

    /// Probe the newest subscription endpoint called `name`.
    pub fn subscription_probe<Msg>(&self, name: &str) -> Option<SubscriptionProbe<Msg>>
    where
        Msg: Send + 'static,
    {
        let state = self.find(name, EndpointKind::Subscription)?;
        let state = state.into_any().downcast::<SubscriptionState<Msg>>().ok()?;
        Some(SubscriptionProbe { state })
    }

    /// Probes for all five endpoints of `action_name` (whichever exist).
    pub fn action_probes<A: ActionType>(&self, action_name: &str) -> ActionProbes<A> {
        let Ok(names) = ActionNames::for_action(action_name) else {
            return ActionProbes::empty();
        };
        ActionProbes {
            goal: self.client_probe(&names.goal_service),
            cancel: self.client_probe(&names.cancel_service),
            result: self.client_probe(&names.result_service),
            feedback: self.subscription_probe(&names.feedback_topic),
            status: self.subscription_probe(&names.status_topic),
        }
    }

    fn find(&self, name: &str, kind: EndpointKind) -> Option<Arc<dyn EndpointState>> {
        self.endpoints
            .iter()
            .rev()
            .find(|e| e.name == name && e.kind == kind)
            .map(|e| Arc::clone(&e.state))
    }

    fn has_pending(&self, handle: &EntityHandle) -> bool {
        self.endpoints
            .iter()
            .any(|e| &e.handle == handle && !e.state.is_finalized() && e.state.has_pending())
    }

    fn register(
        &mut self,
        spec: EndpointSpec<'_>,
        kind: EndpointKind,
        state: Arc<dyn EndpointState>,
    ) -> PrimitiveResult<EntityHandle> {
        if let Some(kind) = self.creation_faults.get(spec.name) {
            return Err(injected(*kind, "creation"));
        }
        if spec.name.is_empty() {
            return Err(PrimitiveError::new(
                PrimitiveErrorKind::NameInvalid,
                "endpoint name must not be empty",
            ));
        }
        // Finalized endpoints stay probe-able until the next registration.
        self.endpoints.retain(|e| !e.state.is_finalized());
        let handle = EntityHandle::new();
        self.endpoints.push(Endpoint {
            name: spec.name.to_owned(),
            type_name: spec.type_name.to_owned(),
            qos: *spec.qos,
            kind,
            handle: handle.clone(),
            state,
        });
        Ok(handle)
    }
}

impl ActionTransport for LoopbackTransport {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn create_client<Req, Resp>(
        &mut self,
        spec: EndpointSpec<'_>,
    ) -> PrimitiveResult<Box<dyn ServiceClient<Req, Resp>>>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let state = Arc::new(ClientState::<Req, Resp>::new());
        lock(&state.inner).fail_fini = self.fini_faults.get(spec.name).copied();
        let handle = self.register(spec, EndpointKind::Client, state.clone())?;
        Ok(Box::new(LoopbackClient { handle, state }))
    }

    fn create_subscription<Msg>(
        &mut self,
        spec: EndpointSpec<'_>,
    ) -> PrimitiveResult<Box<dyn Subscription<Msg>>>
    where
        Msg: Send + 'static,
    {
        let state = Arc::new(SubscriptionState::<Msg>::new());
        lock(&state.inner).fail_fini = self.fini_faults.get(spec.name).copied();
        let handle = self.register(spec, EndpointKind::Subscription, state.clone())?;
        Ok(Box::new(LoopbackSubscription { handle, state }))
    }
}

// ---------------- Service clients ----------------

struct ClientInner<Resp> {
    valid: bool,
    finalized: bool,
    server_available: bool,
    next_sequence: i64,
    sent: Vec<i64>,
    responses: VecDeque<(RequestHeader, Resp)>,
    fail_send: Option<PrimitiveErrorKind>,
    fail_take: Option<PrimitiveErrorKind>,
    fail_availability: Option<PrimitiveErrorKind>,
    fail_fini: Option<PrimitiveErrorKind>,
    fini_calls: usize,
}

struct ClientState<Req, Resp> {
    inner: Mutex<ClientInner<Resp>>,
    _request: std::marker::PhantomData<fn(Req)>,
}

impl<Req, Resp> ClientState<Req, Resp> {
    fn new() -> Self {
        Self {
            inner: Mutex::new(ClientInner {
                valid: true,
                finalized: false,
                server_available: false,
                next_sequence: 1,
                sent: Vec::new(),
                responses: VecDeque::new(),
                fail_send: None,
                fail_take: None,
                fail_availability: None,
                fail_fini: None,
                fini_calls: 0,
            }),
            _request: std::marker::PhantomData,
        }
    }
}

impl<Req, Resp> EndpointState for ClientState<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn has_pending(&self) -> bool {
        !lock(&self.inner).responses.is_empty()
    }

    fn is_finalized(&self) -> bool {
        lock(&self.inner).finalized
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

struct LoopbackClient<Req, Resp> {
    handle: EntityHandle,
    state: Arc<ClientState<Req, Resp>>,
}

impl<Req, Resp> ServiceClient<Req, Resp> for LoopbackClient<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    fn is_valid(&self) -> bool {
        let inner = lock(&self.state.inner);
        inner.valid && !inner.finalized
    }

    fn send_request(&mut self, _request: &Req) -> PrimitiveResult<i64> {
        let mut inner = lock(&self.state.inner);
        if let Some(kind) = inner.fail_send.take() {
            return Err(injected(kind, "send"));
        }
        if inner.finalized {
            return Err(PrimitiveError::new(PrimitiveErrorKind::Invalid, "client finalized"));
        }
        let sequence_number = inner.next_sequence;
        inner.next_sequence += 1;
        inner.sent.push(sequence_number);
        Ok(sequence_number)
    }

    fn take_response(&mut self) -> PrimitiveResult<(RequestHeader, Resp)> {
        let mut inner = lock(&self.state.inner);
        if let Some(kind) = inner.fail_take.take() {
            return Err(injected(kind, "take"));
        }
        inner
            .responses
            .pop_front()
            .ok_or_else(PrimitiveError::take_failed)
    }

    fn server_is_available(&self) -> PrimitiveResult<bool> {
        let mut inner = lock(&self.state.inner);
        if let Some(kind) = inner.fail_availability.take() {
            return Err(injected(kind, "availability query"));
        }
        Ok(inner.server_available)
    }

    fn fini(&mut self) -> PrimitiveResult<()> {
        let mut inner = lock(&self.state.inner);
        inner.fini_calls += 1;
        inner.finalized = true;
        match inner.fail_fini.take() {
            Some(kind) => Err(injected(kind, "fini")),
            None => Ok(()),
        }
    }
}

/// Server-side view of a loopback service client.
pub struct ClientProbe<Req, Resp> {
    state: Arc<ClientState<Req, Resp>>,
}

impl<Req, Resp> ClientProbe<Req, Resp> {
    /// Queue a response for the request with `sequence_number`.
    pub fn push_response(&self, sequence_number: i64, response: Resp) {
        let header = RequestHeader {
            writer_guid: [0; 16],
            sequence_number,
        };
        lock(&self.state.inner).responses.push_back((header, response));
    }

    pub fn set_valid(&self, valid: bool) {
        lock(&self.state.inner).valid = valid;
    }

    pub fn set_server_available(&self, available: bool) {
        lock(&self.state.inner).server_available = available;
    }

    /// Fail the next send with `kind`.
    pub fn fail_next_send(&self, kind: PrimitiveErrorKind) {
        lock(&self.state.inner).fail_send = Some(kind);
    }

    /// Fail the next take with `kind`.
    pub fn fail_next_take(&self, kind: PrimitiveErrorKind) {
        lock(&self.state.inner).fail_take = Some(kind);
    }

    /// Fail the next availability query with `kind`.
    pub fn fail_next_availability_query(&self, kind: PrimitiveErrorKind) {
        lock(&self.state.inner).fail_availability = Some(kind);
    }

    /// Fail the next fini with `kind` (the client is still torn down).
    pub fn fail_next_fini(&self, kind: PrimitiveErrorKind) {
        lock(&self.state.inner).fail_fini = Some(kind);
    }

    /// Sequence numbers handed out so far.
    pub fn sent_sequence_numbers(&self) -> Vec<i64> {
        lock(&self.state.inner).sent.clone()
    }

    pub fn is_finalized(&self) -> bool {
        lock(&self.state.inner).finalized
    }

    pub fn fini_calls(&self) -> usize {
        lock(&self.state.inner).fini_calls
    }
}

// ---------------- Subscriptions ----------------

struct SubscriptionInner<Msg> {
    valid: bool,
    finalized: bool,
    publisher_count: usize,
    messages: VecDeque<(Msg, MessageInfo)>,
    published: u64,
    content_filter: String,
    filter_updates: usize,
    fail_filter: Option<PrimitiveErrorKind>,
    fail_take: Option<PrimitiveErrorKind>,
    fail_publisher_count: Option<PrimitiveErrorKind>,
    fail_fini: Option<PrimitiveErrorKind>,
    fini_calls: usize,
}

struct SubscriptionState<Msg> {
    inner: Mutex<SubscriptionInner<Msg>>,
}

impl<Msg> SubscriptionState<Msg> {
    fn new() -> Self {
        Self {
            inner: Mutex::new(SubscriptionInner {
                valid: true,
                finalized: false,
                publisher_count: 0,
                messages: VecDeque::new(),
                published: 0,
                content_filter: String::new(),
                filter_updates: 0,
                fail_filter: None,
                fail_take: None,
                fail_publisher_count: None,
                fail_fini: None,
                fini_calls: 0,
            }),
        }
    }
}

impl<Msg: Send + 'static> EndpointState for SubscriptionState<Msg> {
    fn has_pending(&self) -> bool {
        !lock(&self.inner).messages.is_empty()
    }

    fn is_finalized(&self) -> bool {
        lock(&self.inner).finalized
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

struct LoopbackSubscription<Msg> {
    handle: EntityHandle,
    state: Arc<SubscriptionState<Msg>>,
}

impl<Msg: Send + 'static> Subscription<Msg> for LoopbackSubscription<Msg> {
    fn handle(&self) -> &EntityHandle {
        &self.handle
    }

    fn is_valid(&self) -> bool {
        let inner = lock(&self.state.inner);
        inner.valid && !inner.finalized
    }

    fn take(&mut self) -> PrimitiveResult<(Msg, MessageInfo)> {
        let mut inner = lock(&self.state.inner);
        if let Some(kind) = inner.fail_take.take() {
            return Err(injected(kind, "take"));
        }
        inner
            .messages
            .pop_front()
            .ok_or_else(PrimitiveError::take_failed)
    }

    fn publisher_count(&self) -> PrimitiveResult<usize> {
        let mut inner = lock(&self.state.inner);
        if let Some(kind) = inner.fail_publisher_count.take() {
            return Err(injected(kind, "publisher count"));
        }
        Ok(inner.publisher_count)
    }

    fn set_content_filter(&mut self, expression: &str) -> PrimitiveResult<()> {
        let mut inner = lock(&self.state.inner);
        if let Some(kind) = inner.fail_filter {
            return Err(injected(kind, "content filter"));
        }
        inner.content_filter = expression.to_owned();
        inner.filter_updates += 1;
        Ok(())
    }

    fn fini(&mut self) -> PrimitiveResult<()> {
        let mut inner = lock(&self.state.inner);
        inner.fini_calls += 1;
        inner.finalized = true;
        match inner.fail_fini.take() {
            Some(kind) => Err(injected(kind, "fini")),
            None => Ok(()),
        }
    }
}

/// Publisher-side view of a loopback subscription.
pub struct SubscriptionProbe<Msg> {
    state: Arc<SubscriptionState<Msg>>,
}

impl<Msg> SubscriptionProbe<Msg> {
    /// Deliver a message (no filter evaluation: the probe plays the broker).
    pub fn push_message(&self, msg: Msg) {
        let mut inner = lock(&self.state.inner);
        inner.published += 1;
        let info = MessageInfo {
            source_timestamp: 0,
            received_timestamp: 0,
            publication_sequence_number: inner.published,
        };
        inner.messages.push_back((msg, info));
    }

    pub fn set_valid(&self, valid: bool) {
        lock(&self.state.inner).valid = valid;
    }

    pub fn set_publisher_count(&self, count: usize) {
        lock(&self.state.inner).publisher_count = count;
    }

    /// Make content filter updates fail with `kind` until cleared.
    pub fn fail_content_filter(&self, kind: PrimitiveErrorKind) {
        lock(&self.state.inner).fail_filter = Some(kind);
    }

    pub fn clear_content_filter_failure(&self) {
        lock(&self.state.inner).fail_filter = None;
    }

    pub fn fail_next_take(&self, kind: PrimitiveErrorKind) {
        lock(&self.state.inner).fail_take = Some(kind);
    }

    pub fn fail_next_publisher_count(&self, kind: PrimitiveErrorKind) {
        lock(&self.state.inner).fail_publisher_count = Some(kind);
    }

    pub fn fail_next_fini(&self, kind: PrimitiveErrorKind) {
        lock(&self.state.inner).fail_fini = Some(kind);
    }

    /// Last successfully applied content filter ("" = unfiltered).
    pub fn content_filter(&self) -> String {
        lock(&self.state.inner).content_filter.clone()
    }

    pub fn filter_updates(&self) -> usize {
        lock(&self.state.inner).filter_updates
    }

    pub fn is_finalized(&self) -> bool {
        lock(&self.state.inner).finalized
    }

    pub fn fini_calls(&self) -> usize {
        lock(&self.state.inner).fini_calls
    }
}

/// Probes for the five endpoints of one action.
pub struct ActionProbes<A: ActionType> {
    pub goal: Option<ClientProbe<SendGoalRequest<A::Goal>, SendGoalResponse>>,
    pub cancel: Option<ClientProbe<CancelGoalRequest, CancelGoalResponse>>,
    pub result: Option<ClientProbe<GetResultRequest, GetResultResponse<A::Result>>>,
    pub feedback: Option<SubscriptionProbe<FeedbackMessage<A::Feedback>>>,
    pub status: Option<SubscriptionProbe<GoalStatusArray>>,
}

impl<A: ActionType> ActionProbes<A> {
    fn empty() -> Self {
        Self {
            goal: None,
            cancel: None,
            result: None,
            feedback: None,
            status: None,
        }
    }

    /// Make every endpoint look like a healthy server is on the other side.
    pub fn bring_server_up(&self) {
        if let Some(p) = &self.goal {
            p.set_server_available(true);
        }
        if let Some(p) = &self.cancel {
            p.set_server_available(true);
        }
        if let Some(p) = &self.result {
            p.set_server_available(true);
        }
        if let Some(p) = &self.feedback {
            p.set_publisher_count(1);
        }
        if let Some(p) = &self.status {
            p.set_publisher_count(1);
        }
    }
}

// ---------------- Wait set ----------------

/// Fixed-capacity wait set with a manually or transport-driven ready snapshot.
#[derive(Debug)]
pub struct LoopbackWaitSet {
    client_capacity: usize,
    subscription_capacity: usize,
    clients: Vec<EntityHandle>,
    subscriptions: Vec<EntityHandle>,
    ready_clients: Vec<Option<EntityHandle>>,
    ready_subscriptions: Vec<Option<EntityHandle>>,
}

impl LoopbackWaitSet {
    pub fn new(client_capacity: usize, subscription_capacity: usize) -> Self {
        Self {
            client_capacity,
            subscription_capacity,
            clients: Vec::new(),
            subscriptions: Vec::new(),
            ready_clients: vec![None; client_capacity],
            ready_subscriptions: vec![None; subscription_capacity],
        }
    }

    /// Drop all registrations and the snapshot; capacity is kept.
    pub fn clear(&mut self) {
        self.clients.clear();
        self.subscriptions.clear();
        self.clear_ready();
    }

    /// Rebuild with new capacities (drops registrations).
    pub fn resize(&mut self, client_capacity: usize, subscription_capacity: usize) {
        *self = Self::new(client_capacity, subscription_capacity);
    }

    pub fn clear_ready(&mut self) {
        self.ready_clients.iter_mut().for_each(|slot| *slot = None);
        self.ready_subscriptions.iter_mut().for_each(|slot| *slot = None);
    }

    /// Snapshot: registered entities with queued data become ready, all others not.
    ///
    /// Returns the number of ready entities. Never blocks.
    pub fn poll(&mut self, transport: &LoopbackTransport) -> usize {
        self.clear_ready();
        let mut ready = 0;
        for (slot, handle) in self.clients.iter().enumerate() {
            if transport.has_pending(handle) {
                self.ready_clients[slot] = Some(handle.clone());
                ready += 1;
            }
        }
        for (slot, handle) in self.subscriptions.iter().enumerate() {
            if transport.has_pending(handle) {
                self.ready_subscriptions[slot] = Some(handle.clone());
                ready += 1;
            }
        }
        ready
    }

    /// Mark the client registered at `index` ready.
    pub fn mark_client_ready(&mut self, index: usize) {
        if let Some(handle) = self.clients.get(index) {
            self.ready_clients[index] = Some(handle.clone());
        }
    }

    /// Mark the subscription registered at `index` ready.
    pub fn mark_subscription_ready(&mut self, index: usize) {
        if let Some(handle) = self.subscriptions.get(index) {
            self.ready_subscriptions[index] = Some(handle.clone());
        }
    }

    /// Put an arbitrary handle at a client slot of the snapshot.
    pub fn set_ready_client(&mut self, index: usize, handle: Option<EntityHandle>) {
        if let Some(slot) = self.ready_clients.get_mut(index) {
            *slot = handle;
        }
    }

    /// Put an arbitrary handle at a subscription slot of the snapshot.
    pub fn set_ready_subscription(&mut self, index: usize, handle: Option<EntityHandle>) {
        if let Some(slot) = self.ready_subscriptions.get_mut(index) {
            *slot = handle;
        }
    }
}

impl WaitSet for LoopbackWaitSet {
    fn add_client(&mut self, client: &EntityHandle) -> PrimitiveResult<usize> {
        if self.clients.len() >= self.client_capacity {
            return Err(PrimitiveError::new(
                PrimitiveErrorKind::Full,
                "no free client slot",
            ));
        }
        self.clients.push(client.clone());
        Ok(self.clients.len() - 1)
    }

    fn add_subscription(&mut self, subscription: &EntityHandle) -> PrimitiveResult<usize> {
        if self.subscriptions.len() >= self.subscription_capacity {
            return Err(PrimitiveError::new(
                PrimitiveErrorKind::Full,
                "no free subscription slot",
            ));
        }
        self.subscriptions.push(subscription.clone());
        Ok(self.subscriptions.len() - 1)
    }

    fn client_capacity(&self) -> usize {
        self.client_capacity
    }

    fn subscription_capacity(&self) -> usize {
        self.subscription_capacity
    }

    fn ready_client(&self, index: usize) -> Option<&EntityHandle> {
        self.ready_clients.get(index).and_then(Option::as_ref)
    }

    fn ready_subscription(&self, index: usize) -> Option<&EntityHandle> {
        self.ready_subscriptions.get(index).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec<'a>(name: &'a str, qos: &'a QosProfile) -> EndpointSpec<'a> {
        EndpointSpec {
            name,
            type_name: "test_msgs/msg/Int",
            qos,
        }
    }

    #[test]
    fn client_round_trip_through_probe() {
        let mut transport = LoopbackTransport::new();
        let qos = QosProfile::services_default();
        let mut client = transport
            .create_client::<u8, u16>(spec("svc", &qos))
            .unwrap();
        let probe = transport.client_probe::<u8, u16>("svc").unwrap();

        let seq = client.send_request(&1).unwrap();
        assert_eq!(probe.sent_sequence_numbers(), vec![seq]);

        assert_eq!(
            client.take_response().unwrap_err().kind,
            PrimitiveErrorKind::TakeFailed
        );
        probe.push_response(seq, 42);
        let (header, resp) = client.take_response().unwrap();
        assert_eq!(header.sequence_number, seq);
        assert_eq!(resp, 42);
    }

    #[test]
    fn creation_fault_is_injected() {
        let mut transport = LoopbackTransport::new();
        let qos = QosProfile::default();
        transport.fail_creation("topic", PrimitiveErrorKind::NameInvalid);
        let err = transport
            .create_subscription::<u8>(spec("topic", &qos))
            .err()
            .unwrap();
        assert_eq!(err.kind, PrimitiveErrorKind::NameInvalid);
        assert!(transport.endpoint_names().is_empty());

        transport.clear_creation_fault("topic");
        assert!(transport.create_subscription::<u8>(spec("topic", &qos)).is_ok());
    }

    #[test]
    fn probe_type_mismatch_is_none() {
        let mut transport = LoopbackTransport::new();
        let qos = QosProfile::default();
        let _sub = transport
            .create_subscription::<u8>(spec("topic", &qos))
            .unwrap();
        assert!(transport.subscription_probe::<u32>("topic").is_none());
        assert!(transport.client_probe::<u8, u8>("topic").is_none());
    }

    #[test]
    fn poll_marks_only_pending_entities() {
        let mut transport = LoopbackTransport::new();
        let qos = QosProfile::default();
        let sub = transport
            .create_subscription::<u8>(spec("a", &qos))
            .unwrap();
        let other = transport
            .create_subscription::<u8>(spec("b", &qos))
            .unwrap();

        let mut ws = LoopbackWaitSet::new(0, 2);
        let a = ws.add_subscription(sub.handle()).unwrap();
        let b = ws.add_subscription(other.handle()).unwrap();
        assert!(ws.add_subscription(sub.handle()).is_err());

        transport.subscription_probe::<u8>("a").unwrap().push_message(7);
        assert_eq!(ws.poll(&transport), 1);
        assert_eq!(ws.ready_subscription(a), Some(sub.handle()));
        assert_eq!(ws.ready_subscription(b), None);
    }

    #[test]
    fn finalized_endpoints_leave_the_registry() {
        let mut transport = LoopbackTransport::new();
        let qos = QosProfile::default();
        let mut old = transport
            .create_subscription::<u8>(spec("a", &qos))
            .unwrap();
        let old_probe = transport.subscription_probe::<u8>("a").unwrap();
        old_probe.push_message(1);
        old.fini().unwrap();

        // Not listed and never ready, though still probe-able until the next registration.
        assert!(transport.endpoint_names().is_empty());
        assert!(!transport.has_pending(old.handle()));
        assert!(transport.subscription_probe::<u8>("a").is_some());

        let _new = transport
            .create_subscription::<u8>(spec("b", &qos))
            .unwrap();
        assert_eq!(transport.endpoints.len(), 1);
        assert!(transport.subscription_probe::<u8>("a").is_none());
    }
}
