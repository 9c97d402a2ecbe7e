//! rosrustext_action::action
//!
//! Client side of the ROS 2 action protocol, transport-agnostic.
//!
//! Key ideas:
//! - One `ActionClient` owns five primitives (goal/cancel/result clients, feedback/status subscriptions)
//! - Primitives come from an `ActionTransport`; the client only composes and reclassifies
//! - Feedback is narrowed with a content filter rebuilt from the tracked goal uuids
//! - Wait-set integration identifies readiness by primitive identity, not slot value

mod client;
mod goal_uuid;
mod interest;
#[cfg(any(test, feature = "loopback"))]
pub mod loopback;
mod msgs;
mod names;
mod options;
mod primitives;
mod qos;
mod wait;

pub use client::{ActionClient, Role};
pub use goal_uuid::{GoalUuid, UUID_SIZE};
pub use interest::{feedback_filter_expression, GoalInterestSet};
pub use msgs::{
    ActionType, CancelGoalRequest, CancelGoalResponse, CancelReturnCode, FeedbackMessage,
    GetResultRequest, GetResultResponse, GoalInfo, GoalStatus, GoalStatusArray, GoalStatusCode,
    SendGoalRequest, SendGoalResponse, Time,
};
pub use names::ActionNames;
pub use options::ActionClientOptions;
pub use primitives::{
    ActionTransport, EndpointSpec, EntityHandle, MessageInfo, PrimitiveError, PrimitiveErrorKind,
    PrimitiveResult, RequestHeader, ServiceClient, Subscription,
};
pub use qos::{Durability, History, QosProfile, Reliability};
pub use wait::{ReadyEntities, WaitSet, WaitSetEntityCounts, WaitSetIndices, WaitSetSlots};
