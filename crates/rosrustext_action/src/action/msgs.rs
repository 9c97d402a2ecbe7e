//! Standard action wrapper messages (transport-agnostic).
//!
//! These mirror the `action_msgs` envelopes every action shares. The user payloads
//! (goal, result, feedback) come from the `ActionType` implementation; encoding is
//! the transport layer's concern.

use super::GoalUuid;

/// Type descriptor for one action.
///
/// The implementing type *is* the descriptor handed to `ActionClient::init`.
pub trait ActionType: 'static {
    /// Fully qualified interface name, e.g. `example_interfaces/action/Fibonacci`.
    const TYPE_NAME: &'static str;

    type Goal: Send + 'static;
    type Result: Send + 'static;
    type Feedback: Send + 'static;
}

/// `builtin_interfaces/msg/Time`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

/// `action_msgs/msg/GoalInfo`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct GoalInfo {
    pub goal_id: GoalUuid,
    pub stamp: Time,
}

/// `action_msgs/msg/GoalStatus` status codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum GoalStatusCode {
    #[default]
    Unknown,
    Accepted,
    Executing,
    Canceling,
    Succeeded,
    Canceled,
    Aborted,
}

impl GoalStatusCode {
    /// Wire value (`action_msgs/msg/GoalStatus.STATUS_*`).
    pub const fn id(self) -> i8 {
        match self {
            GoalStatusCode::Unknown => 0,
            GoalStatusCode::Accepted => 1,
            GoalStatusCode::Executing => 2,
            GoalStatusCode::Canceling => 3,
            GoalStatusCode::Succeeded => 4,
            GoalStatusCode::Canceled => 5,
            GoalStatusCode::Aborted => 6,
        }
    }

    pub const fn from_id(id: i8) -> Option<Self> {
        match id {
            0 => Some(GoalStatusCode::Unknown),
            1 => Some(GoalStatusCode::Accepted),
            2 => Some(GoalStatusCode::Executing),
            3 => Some(GoalStatusCode::Canceling),
            4 => Some(GoalStatusCode::Succeeded),
            5 => Some(GoalStatusCode::Canceled),
            6 => Some(GoalStatusCode::Aborted),
            _ => None,
        }
    }

    /// Succeeded, Canceled and Aborted are final.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            GoalStatusCode::Succeeded | GoalStatusCode::Canceled | GoalStatusCode::Aborted
        )
    }
}

/// `action_msgs/msg/GoalStatus`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct GoalStatus {
    pub goal_info: GoalInfo,
    pub status: GoalStatusCode,
}

/// `action_msgs/msg/GoalStatusArray` (payload of the status feed).
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct GoalStatusArray {
    pub status_list: Vec<GoalStatus>,
}

/// `<Action>_SendGoal` request.
#[derive(Debug, Clone, PartialEq)]
pub struct SendGoalRequest<G> {
    pub goal_id: GoalUuid,
    pub goal: G,
}

/// `<Action>_SendGoal` response.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct SendGoalResponse {
    pub accepted: bool,
    pub stamp: Time,
}

/// `action_msgs/srv/CancelGoal` request.
///
/// A zero uuid with a zero stamp cancels all goals; see the CancelGoal docs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct CancelGoalRequest {
    pub goal_info: GoalInfo,
}

/// `action_msgs/srv/CancelGoal` return codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum CancelReturnCode {
    #[default]
    None,
    Rejected,
    UnknownGoalId,
    GoalTerminated,
}

impl CancelReturnCode {
    pub const fn id(self) -> i8 {
        match self {
            CancelReturnCode::None => 0,
            CancelReturnCode::Rejected => 1,
            CancelReturnCode::UnknownGoalId => 2,
            CancelReturnCode::GoalTerminated => 3,
        }
    }
}

/// `action_msgs/srv/CancelGoal` response.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct CancelGoalResponse {
    pub return_code: CancelReturnCode,
    pub goals_canceling: Vec<GoalInfo>,
}

/// `<Action>_GetResult` request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct GetResultRequest {
    pub goal_id: GoalUuid,
}

/// `<Action>_GetResult` response.
#[derive(Debug, Clone, PartialEq)]
pub struct GetResultResponse<R> {
    pub status: GoalStatusCode,
    pub result: R,
}

/// `<Action>_FeedbackMessage` (payload of the feedback feed).
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackMessage<F> {
    pub goal_id: GoalUuid,
    pub feedback: F,
}

/// Interface names of the five sub-resources of an action type.
pub(crate) struct InterfaceNames {
    pub(crate) send_goal: String,
    pub(crate) cancel_goal: &'static str,
    pub(crate) get_result: String,
    pub(crate) feedback: String,
    pub(crate) status: &'static str,
}

impl InterfaceNames {
    pub(crate) fn of<A: ActionType>() -> Self {
        Self {
            send_goal: format!("{}_SendGoal", A::TYPE_NAME),
            cancel_goal: "action_msgs/srv/CancelGoal",
            get_result: format!("{}_GetResult", A::TYPE_NAME),
            feedback: format!("{}_FeedbackMessage", A::TYPE_NAME),
            status: "action_msgs/msg/GoalStatusArray",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_through_wire_ids() {
        for id in 0..=6 {
            let code = GoalStatusCode::from_id(id).expect("valid status id");
            assert_eq!(code.id(), id);
        }
        assert_eq!(GoalStatusCode::from_id(7), None);
    }

    #[test]
    fn only_final_states_are_terminal() {
        assert!(GoalStatusCode::Succeeded.is_terminal());
        assert!(GoalStatusCode::Aborted.is_terminal());
        assert!(!GoalStatusCode::Executing.is_terminal());
        assert!(!GoalStatusCode::Canceling.is_terminal());
    }

    struct Fibonacci;

    impl ActionType for Fibonacci {
        const TYPE_NAME: &'static str = "example_interfaces/action/Fibonacci";
        type Goal = i32;
        type Result = Vec<i32>;
        type Feedback = Vec<i32>;
    }

    #[test]
    fn interface_names_derive_from_type_name() {
        let names = InterfaceNames::of::<Fibonacci>();
        assert_eq!(names.send_goal, "example_interfaces/action/Fibonacci_SendGoal");
        assert_eq!(names.get_result, "example_interfaces/action/Fibonacci_GetResult");
        assert_eq!(
            names.feedback,
            "example_interfaces/action/Fibonacci_FeedbackMessage"
        );
        assert_eq!(names.cancel_goal, "action_msgs/srv/CancelGoal");
        assert_eq!(names.status, "action_msgs/msg/GoalStatusArray");
    }
}
