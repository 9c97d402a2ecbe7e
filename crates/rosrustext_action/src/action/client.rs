use tracing::debug;

use crate::error::{CoreError, Domain, ErrorKind, Payload, Result, Severity};
use crate::logging::log_core_error;

use super::msgs::InterfaceNames;
use super::primitives::{
    ActionTransport, EndpointSpec, PrimitiveError, PrimitiveErrorKind, PrimitiveResult,
    RequestHeader, ServiceClient, Subscription,
};
use super::wait::WaitSetSlots;
use super::{
    ActionClientOptions, ActionNames, ActionType, CancelGoalRequest, CancelGoalResponse,
    FeedbackMessage, GetResultRequest, GetResultResponse, GoalInterestSet, GoalStatusArray,
    GoalUuid, SendGoalRequest, SendGoalResponse,
};

pub(crate) type GoalClient<A> =
    Box<dyn ServiceClient<SendGoalRequest<<A as ActionType>::Goal>, SendGoalResponse>>;
pub(crate) type CancelClient = Box<dyn ServiceClient<CancelGoalRequest, CancelGoalResponse>>;
pub(crate) type ResultClient<A> =
    Box<dyn ServiceClient<GetResultRequest, GetResultResponse<<A as ActionType>::Result>>>;
pub(crate) type FeedbackSubscription<A> =
    Box<dyn Subscription<FeedbackMessage<<A as ActionType>::Feedback>>>;
pub(crate) type StatusSubscription = Box<dyn Subscription<GoalStatusArray>>;

/// The five sub-resources of an action client, in init order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Goal,
    Cancel,
    Result,
    Feedback,
    Status,
}

impl Role {
    /// Short label used in diagnostics ("goal client", "status subscription").
    pub const fn label(self) -> &'static str {
        match self {
            Role::Goal => "goal client",
            Role::Cancel => "cancel client",
            Role::Result => "result client",
            Role::Feedback => "feedback subscription",
            Role::Status => "status subscription",
        }
    }
}

/// Client side of the action protocol.
///
/// Owns three service clients (goal, cancel, result) and two subscriptions
/// (feedback, status) as one unit. Observably either fully initialized or not at
/// all: `init` rolls back everything it created before reporting a failure, and
/// `fini` always leaves the client re-initializable.
///
/// Not synchronized: callers serialize `init`/`fini`/send/take/goal mutations per
/// client.
pub struct ActionClient<A: ActionType> {
    inner: Option<ClientImpl<A>>,
}

pub(crate) struct ClientImpl<A: ActionType> {
    pub(crate) action_name: String,
    pub(crate) options: ActionClientOptions,
    pub(crate) goal_client: GoalClient<A>,
    pub(crate) cancel_client: CancelClient,
    pub(crate) result_client: ResultClient<A>,
    pub(crate) feedback_subscription: FeedbackSubscription<A>,
    pub(crate) status_subscription: StatusSubscription,
    pub(crate) wait_set_slots: Option<WaitSetSlots>,
    pub(crate) goal_uuids: GoalInterestSet,
}

impl<A: ActionType> Default for ActionClient<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle.
impl<A: ActionType> ActionClient<A> {
    /// A client that has never been initialized.
    pub const fn new() -> Self {
        Self { inner: None }
    }

    /// Create the five primitives for `action_name`.
    ///
    /// Primitives are created in order goal, cancel, result, feedback, status. If any
    /// step fails, the ones already created are finalized in reverse order before the
    /// error is returned. A cleanup failure turns the result into a `Generic` error
    /// wrapping the original cause.
    pub fn init<T: ActionTransport>(
        &mut self,
        transport: &mut T,
        action_name: &str,
        options: &ActionClientOptions,
    ) -> Result<()> {
        if !transport.is_valid() {
            return Err(CoreError::error()
                .domain(Domain::Action)
                .kind(ErrorKind::NodeInvalid)
                .msg("transport is invalid")
                .build());
        }
        let names = ActionNames::for_action(action_name)?;
        debug!(action = action_name, "Initializing client for action name");
        if self.inner.is_some() {
            return Err(CoreError::warn()
                .domain(Domain::Action)
                .kind(ErrorKind::AlreadyInitialized)
                .msg("action client already initialized")
                .build());
        }

        let mut partial = PartialPrimitives::<A>::new();
        let built = partial
            .create_all(transport, &names, &InterfaceNames::of::<A>(), options)
            .and_then(|()| {
                partial.complete().ok_or_else(|| {
                    CoreError::error()
                        .domain(Domain::Action)
                        .msg("action client primitives incomplete after init")
                        .build()
                })
            });

        let primitives = match built {
            Ok(p) => p,
            Err(original) => return Err(rollback_init(partial, original)),
        };

        self.inner = Some(ClientImpl {
            action_name: action_name.to_owned(),
            options: *options,
            goal_client: primitives.goal,
            cancel_client: primitives.cancel,
            result_client: primitives.result,
            feedback_subscription: primitives.feedback,
            status_subscription: primitives.status,
            wait_set_slots: None,
            goal_uuids: GoalInterestSet::new(),
        });
        debug!(action = action_name, "Action client initialized");
        Ok(())
    }

    /// Finalize all five primitives and drop the goal interest set.
    ///
    /// Every primitive gets a fini attempt even after one fails; the first failure
    /// is reported as the cause of a `Generic` error. The client is uninitialized
    /// afterwards either way.
    pub fn fini(&mut self) -> Result<()> {
        debug!("Finalizing action client");
        let inner = self.inner.take().ok_or_else(|| {
            CoreError::warn()
                .domain(Domain::Action)
                .kind(ErrorKind::NotInitialized)
                .msg("action client is not initialized")
                .build()
        })?;
        let result = inner.fini();
        debug!("Action client finalized");
        result
    }

    /// Explicit validity check: the first reason the client is unusable, if any.
    pub fn check_valid(&self) -> Result<()> {
        self.valid_impl().map(|_| ())
    }

    /// True iff initialized and all five primitives report themselves valid.
    ///
    /// The reason for a `false` is logged; use `check_valid` to get it as a value.
    pub fn is_valid(&self) -> bool {
        match self.check_valid() {
            Ok(()) => true,
            Err(e) => {
                log_core_error(&CoreError { severity: Severity::Debug, ..e });
                false
            }
        }
    }

    /// Action name, or None unless the client is valid.
    pub fn action_name(&self) -> Option<&str> {
        self.valid_impl().ok().map(|i| i.action_name.as_str())
    }

    /// Options copied at init, or None unless the client is valid.
    pub fn options(&self) -> Option<&ActionClientOptions> {
        self.valid_impl().ok().map(|i| &i.options)
    }

    /// True iff all three services have a reachable server and both feeds have at
    /// least one publisher. A failed query aborts the check.
    pub fn server_is_available(&self) -> Result<bool> {
        let inner = self.valid_impl()?;

        let mut available = true;
        available &= query(Role::Goal, inner.goal_client.server_is_available())?;
        available &= query(Role::Cancel, inner.cancel_client.server_is_available())?;
        available &= query(Role::Result, inner.result_client.server_is_available())?;
        let feedback_publishers = inner.feedback_subscription.publisher_count();
        available &= query(Role::Feedback, feedback_publishers)? != 0;
        let status_publishers = inner.status_subscription.publisher_count();
        available &= query(Role::Status, status_publishers)? != 0;
        Ok(available)
    }

    pub(crate) fn valid_impl(&self) -> Result<&ClientImpl<A>> {
        let inner = self
            .inner
            .as_ref()
            .ok_or_else(|| CoreError::client_invalid("action client implementation is invalid"))?;
        inner.validate()?;
        Ok(inner)
    }

    pub(crate) fn valid_impl_mut(&mut self) -> Result<&mut ClientImpl<A>> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| CoreError::client_invalid("action client implementation is invalid"))?;
        inner.validate()?;
        Ok(inner)
    }
}

/// Channels and feeds.
impl<A: ActionType> ActionClient<A> {
    pub fn send_goal_request(&mut self, request: &SendGoalRequest<A::Goal>) -> Result<i64> {
        let inner = self.valid_impl_mut()?;
        send_on(Role::Goal, inner.goal_client.as_mut(), request)
    }

    pub fn take_goal_response(&mut self) -> Result<(RequestHeader, SendGoalResponse)> {
        let inner = self.valid_impl_mut()?;
        take_response_on(Role::Goal, inner.goal_client.as_mut())
    }

    pub fn send_cancel_request(&mut self, request: &CancelGoalRequest) -> Result<i64> {
        let inner = self.valid_impl_mut()?;
        send_on(Role::Cancel, inner.cancel_client.as_mut(), request)
    }

    pub fn take_cancel_response(&mut self) -> Result<(RequestHeader, CancelGoalResponse)> {
        let inner = self.valid_impl_mut()?;
        take_response_on(Role::Cancel, inner.cancel_client.as_mut())
    }

    pub fn send_result_request(&mut self, request: &GetResultRequest) -> Result<i64> {
        let inner = self.valid_impl_mut()?;
        send_on(Role::Result, inner.result_client.as_mut(), request)
    }

    pub fn take_result_response(
        &mut self,
    ) -> Result<(RequestHeader, GetResultResponse<A::Result>)> {
        let inner = self.valid_impl_mut()?;
        take_response_on(Role::Result, inner.result_client.as_mut())
    }

    pub fn take_feedback(&mut self) -> Result<FeedbackMessage<A::Feedback>> {
        let inner = self.valid_impl_mut()?;
        take_message_on(Role::Feedback, inner.feedback_subscription.as_mut())
    }

    pub fn take_status(&mut self) -> Result<GoalStatusArray> {
        let inner = self.valid_impl_mut()?;
        take_message_on(Role::Status, inner.status_subscription.as_mut())
    }
}

/// Goal interest set (feedback content filtering).
impl<A: ActionType> ActionClient<A> {
    /// Start receiving feedback for `id`.
    ///
    /// Re-adding a tracked uuid only refreshes its cached string. If the rebuilt
    /// filter can't be applied, the uuid stays tracked and the error wraps the apply
    /// failure; `resync_feedback_filter` retries just the apply.
    pub fn add_goal_uuid(&mut self, id: GoalUuid) -> Result<()> {
        let inner = self.valid_impl_mut()?;
        inner.goal_uuids.insert(id);
        debug!(uuid = %id, "set content filtered topic after adding a uuid");
        inner
            .apply_feedback_filter()
            .map_err(|e| filter_update_error("adding", id, e))
    }

    /// Stop receiving feedback for `id`. `NotFound` (and no change) if not tracked.
    pub fn remove_goal_uuid(&mut self, id: GoalUuid) -> Result<()> {
        let inner = self.valid_impl_mut()?;
        if inner.goal_uuids.remove(&id).is_none() {
            return Err(CoreError::warn()
                .domain(Domain::Action)
                .kind(ErrorKind::NotFound)
                .msgf(format_args!(
                    "item key [{id}] not found in the map of goal uuids"
                ))
                .payload(Payload::GoalUuid(*id.as_bytes()))
                .build());
        }
        debug!(uuid = %id, "set content filtered topic after removing a uuid");
        inner
            .apply_feedback_filter()
            .map_err(|e| filter_update_error("removing", id, e))
    }

    /// Re-apply the filter for the current membership without changing it.
    pub fn resync_feedback_filter(&mut self) -> Result<()> {
        self.valid_impl_mut()?.apply_feedback_filter()
    }

    /// Filter expression for the current membership (None unless valid).
    pub fn feedback_filter(&self) -> Option<String> {
        self.valid_impl()
            .ok()
            .map(|i| i.goal_uuids.filter_expression())
    }

    /// False unless the client is valid.
    pub fn is_tracking(&self, id: &GoalUuid) -> bool {
        self.valid_impl()
            .is_ok_and(|i| i.goal_uuids.contains(id))
    }

    /// Currently tracked goal uuids (empty unless the client is valid).
    pub fn tracked_goals(&self) -> Vec<GoalUuid> {
        self.valid_impl()
            .map(|i| i.goal_uuids.uuids().copied().collect())
            .unwrap_or_default()
    }
}

impl<A: ActionType> ClientImpl<A> {
    fn validate(&self) -> Result<()> {
        let checks = [
            (self.goal_client.is_valid(), Role::Goal),
            (self.cancel_client.is_valid(), Role::Cancel),
            (self.result_client.is_valid(), Role::Result),
            (self.feedback_subscription.is_valid(), Role::Feedback),
            (self.status_subscription.is_valid(), Role::Status),
        ];
        match checks.into_iter().find(|(valid, _)| !*valid) {
            Some((_, role)) => Err(CoreError::client_invalid(format!(
                "{} is invalid",
                role.label()
            ))),
            None => Ok(()),
        }
    }

    fn apply_feedback_filter(&mut self) -> Result<()> {
        let expression = self.goal_uuids.filter_expression();
        debug!(size = self.goal_uuids.len(), feedback_filter = %expression, "rebuilt feedback filter");
        self.feedback_subscription
            .set_content_filter(&expression)
            .map_err(|e| {
                CoreError::error()
                    .domain(Domain::Transport)
                    .kind(classify(&e))
                    .msgf(format_args!("failed to set feedback content filter: {e}"))
                    .payload(Payload::FeedbackFilter { expression })
                    .build()
            })
    }

    fn fini(mut self) -> Result<()> {
        let outcomes = [
            (Role::Goal, self.goal_client.fini()),
            (Role::Cancel, self.cancel_client.fini()),
            (Role::Result, self.result_client.fini()),
            (Role::Feedback, self.feedback_subscription.fini()),
            (Role::Status, self.status_subscription.fini()),
        ];
        let first_failure = outcomes
            .into_iter()
            .find_map(|(role, outcome)| outcome.err().map(|e| teardown_error(role, e)));

        for (uuid, shown) in self.goal_uuids.drain() {
            debug!(uuid = %uuid, "remove a uuid: {shown}");
        }

        match first_failure {
            None => Ok(()),
            Some(cause) => Err(CoreError::error()
                .domain(Domain::Action)
                .msg("failed to finalize action client")
                .cause(cause)
                .build()),
        }
    }
}

/// Primitives created so far during one `init` call.
struct PartialPrimitives<A: ActionType> {
    goal: Option<GoalClient<A>>,
    cancel: Option<CancelClient>,
    result: Option<ResultClient<A>>,
    feedback: Option<FeedbackSubscription<A>>,
    status: Option<StatusSubscription>,
}

struct Primitives<A: ActionType> {
    goal: GoalClient<A>,
    cancel: CancelClient,
    result: ResultClient<A>,
    feedback: FeedbackSubscription<A>,
    status: StatusSubscription,
}

impl<A: ActionType> PartialPrimitives<A> {
    fn new() -> Self {
        Self {
            goal: None,
            cancel: None,
            result: None,
            feedback: None,
            status: None,
        }
    }

    fn create_all<T: ActionTransport>(
        &mut self,
        transport: &mut T,
        names: &ActionNames,
        types: &InterfaceNames,
        options: &ActionClientOptions,
    ) -> Result<()> {
        self.goal = Some(create_step(Role::Goal, || {
            transport.create_client(EndpointSpec {
                name: &names.goal_service,
                type_name: &types.send_goal,
                qos: &options.goal_service_qos,
            })
        })?);
        self.cancel = Some(create_step(Role::Cancel, || {
            transport.create_client(EndpointSpec {
                name: &names.cancel_service,
                type_name: types.cancel_goal,
                qos: &options.cancel_service_qos,
            })
        })?);
        self.result = Some(create_step(Role::Result, || {
            transport.create_client(EndpointSpec {
                name: &names.result_service,
                type_name: &types.get_result,
                qos: &options.result_service_qos,
            })
        })?);
        self.feedback = Some(create_step(Role::Feedback, || {
            transport.create_subscription(EndpointSpec {
                name: &names.feedback_topic,
                type_name: &types.feedback,
                qos: &options.feedback_topic_qos,
            })
        })?);
        self.status = Some(create_step(Role::Status, || {
            transport.create_subscription(EndpointSpec {
                name: &names.status_topic,
                type_name: types.status,
                qos: &options.status_topic_qos,
            })
        })?);
        Ok(())
    }

    fn complete(&mut self) -> Option<Primitives<A>> {
        if self.goal.is_none()
            || self.cancel.is_none()
            || self.result.is_none()
            || self.feedback.is_none()
            || self.status.is_none()
        {
            return None;
        }
        Some(Primitives {
            goal: self.goal.take()?,
            cancel: self.cancel.take()?,
            result: self.result.take()?,
            feedback: self.feedback.take()?,
            status: self.status.take()?,
        })
    }

    /// Finalize whatever was created, newest first. Reports the first failure.
    fn unwind(mut self) -> Result<()> {
        let mut outcomes: Vec<(Role, PrimitiveResult<()>)> = Vec::new();
        if let Some(mut s) = self.status.take() {
            outcomes.push((Role::Status, s.fini()));
        }
        if let Some(mut s) = self.feedback.take() {
            outcomes.push((Role::Feedback, s.fini()));
        }
        if let Some(mut c) = self.result.take() {
            outcomes.push((Role::Result, c.fini()));
        }
        if let Some(mut c) = self.cancel.take() {
            outcomes.push((Role::Cancel, c.fini()));
        }
        if let Some(mut c) = self.goal.take() {
            outcomes.push((Role::Goal, c.fini()));
        }
        for (role, _) in &outcomes {
            debug!(role = role.label(), "rolled back");
        }
        match outcomes
            .into_iter()
            .find_map(|(role, outcome)| outcome.err().map(|e| teardown_error(role, e)))
        {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn rollback_init<A: ActionType>(partial: PartialPrimitives<A>, original: CoreError) -> CoreError {
    match partial.unwind() {
        Ok(()) => original,
        Err(cleanup) => CoreError::error()
            .domain(Domain::Action)
            .kind(ErrorKind::Generic)
            .msgf(format_args!("failed to cleanup action client: {cleanup}"))
            .cause(original)
            .build(),
    }
}

// ---------------- Per-role steps ----------------

fn create_step<P>(role: Role, create: impl FnOnce() -> PrimitiveResult<P>) -> Result<P> {
    create().map_err(|e| {
        let kind = match e.kind {
            PrimitiveErrorKind::BadAlloc => ErrorKind::ResourceExhausted,
            PrimitiveErrorKind::NameInvalid => ErrorKind::NameInvalid,
            PrimitiveErrorKind::Invalid => ErrorKind::Unavailable,
            _ => ErrorKind::Generic,
        };
        CoreError::error()
            .domain(Domain::Action)
            .kind(kind)
            .msgf(format_args!("failed to create {}: {e}", role.label()))
            .build()
    })
}

fn send_on<Req, Resp>(
    role: Role,
    client: &mut dyn ServiceClient<Req, Resp>,
    request: &Req,
) -> Result<i64> {
    debug!(role = role.label(), "Sending action request");
    let sequence_number = client.send_request(request).map_err(|e| {
        let kind = match e.kind {
            PrimitiveErrorKind::BadAlloc => ErrorKind::ResourceExhausted,
            _ => ErrorKind::Generic,
        };
        CoreError::error()
            .domain(Domain::Action)
            .kind(kind)
            .msgf(format_args!("{} failed to send request: {e}", role.label()))
            .build()
    })?;
    debug!(role = role.label(), sequence_number, "Action request sent");
    Ok(sequence_number)
}

fn take_response_on<Req, Resp>(
    role: Role,
    client: &mut dyn ServiceClient<Req, Resp>,
) -> Result<(RequestHeader, Resp)> {
    debug!(role = role.label(), "Taking action response");
    let taken = client.take_response().map_err(|e| take_error(role, e))?;
    debug!(role = role.label(), "Action response taken");
    Ok(taken)
}

fn take_message_on<Msg>(role: Role, subscription: &mut dyn Subscription<Msg>) -> Result<Msg> {
    debug!(role = role.label(), "Taking action message");
    // Provenance is not part of the action client surface.
    let (msg, _info) = subscription.take().map_err(|e| take_error(role, e))?;
    debug!(role = role.label(), "Action message taken");
    Ok(msg)
}

fn take_error(role: Role, e: PrimitiveError) -> CoreError {
    let (kind, severity) = match e.kind {
        PrimitiveErrorKind::TakeFailed => (ErrorKind::TakeFailed, Severity::Debug),
        PrimitiveErrorKind::BadAlloc => (ErrorKind::ResourceExhausted, Severity::Error),
        _ => (ErrorKind::Generic, Severity::Error),
    };
    CoreError::new(
        Domain::Action,
        kind,
        severity,
        format!("{} failed to take: {e}", role.label()),
    )
}

fn query<T>(role: Role, outcome: PrimitiveResult<T>) -> Result<T> {
    outcome.map_err(|e| {
        CoreError::error()
            .domain(Domain::Transport)
            .kind(classify(&e))
            .msgf(format_args!("failed to query {}: {e}", role.label()))
            .build()
    })
}

fn teardown_error(role: Role, e: PrimitiveError) -> CoreError {
    CoreError::error()
        .domain(Domain::Transport)
        .kind(classify(&e))
        .msgf(format_args!("failed to finalize {}: {e}", role.label()))
        .build()
}

fn filter_update_error(action: &'static str, id: GoalUuid, inner: CoreError) -> CoreError {
    CoreError::error()
        .domain(Domain::Action)
        .kind(inner.kind)
        .msgf(format_args!(
            "failed to set content filtered topic after {action} uuid {id}"
        ))
        .payload(Payload::GoalUuid(*id.as_bytes()))
        .cause(inner)
        .build()
}

/// Generic reclassification for queries, teardown and filter updates.
pub(crate) fn classify(e: &PrimitiveError) -> ErrorKind {
    match e.kind {
        PrimitiveErrorKind::BadAlloc => ErrorKind::ResourceExhausted,
        PrimitiveErrorKind::Invalid => ErrorKind::Unavailable,
        PrimitiveErrorKind::NameInvalid => ErrorKind::NameInvalid,
        PrimitiveErrorKind::TakeFailed | PrimitiveErrorKind::Full | PrimitiveErrorKind::Other => {
            ErrorKind::Generic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_failed_stays_distinct() {
        let e = take_error(Role::Goal, PrimitiveError::take_failed());
        assert_eq!(e.kind, ErrorKind::TakeFailed);
        assert!(e.is_take_failed());
    }

    #[test]
    fn take_preserves_bad_alloc_and_collapses_the_rest() {
        let oom = take_error(
            Role::Feedback,
            PrimitiveError::new(PrimitiveErrorKind::BadAlloc, "oom"),
        );
        assert_eq!(oom.kind, ErrorKind::ResourceExhausted);

        let other = take_error(
            Role::Status,
            PrimitiveError::new(PrimitiveErrorKind::Invalid, "gone"),
        );
        assert_eq!(other.kind, ErrorKind::Generic);
    }

    #[test]
    fn create_step_maps_name_and_alloc_failures() {
        let name = create_step::<()>(Role::Cancel, || {
            Err(PrimitiveError::new(PrimitiveErrorKind::NameInvalid, "bad"))
        })
        .unwrap_err();
        assert_eq!(name.kind, ErrorKind::NameInvalid);
        assert!(name.message.contains("cancel client"));

        let oom = create_step::<()>(Role::Status, || {
            Err(PrimitiveError::new(PrimitiveErrorKind::BadAlloc, "oom"))
        })
        .unwrap_err();
        assert_eq!(oom.kind, ErrorKind::ResourceExhausted);
    }

    #[test]
    fn filter_update_error_wraps_inner() {
        let inner = CoreError::error()
            .kind(ErrorKind::Generic)
            .msg("apply failed")
            .build();
        let id = GoalUuid::from_bytes([3; 16]);
        let outer = filter_update_error("adding", id, inner.clone());
        assert_eq!(outer.kind, ErrorKind::Generic);
        assert_eq!(outer.payload, Payload::GoalUuid([3; 16]));
        assert_eq!(outer.cause.as_deref(), Some(&inner));
    }
}
