use crate::error::{CoreError, Domain, ErrorKind, Result};

/// Names of the five sub-resources behind one action.
///
/// Validity of the resulting names (characters, namespaces) is left to the
/// transport, which rejects them with `NameInvalid` at primitive init.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ActionNames {
    pub goal_service: String,
    pub cancel_service: String,
    pub result_service: String,
    pub feedback_topic: String,
    pub status_topic: String,
}

impl ActionNames {
    /// Standard derivation: `<action>/_action/{send_goal,cancel_goal,get_result,feedback,status}`.
    pub fn for_action(action_name: &str) -> Result<Self> {
        if action_name.is_empty() {
            return Err(CoreError::error()
                .domain(Domain::Action)
                .kind(ErrorKind::InvalidArgument)
                .msg("action name must not be empty")
                .build());
        }

        Ok(Self {
            goal_service: format!("{action_name}/_action/send_goal"),
            cancel_service: format!("{action_name}/_action/cancel_goal"),
            result_service: format!("{action_name}/_action/get_result"),
            feedback_topic: format!("{action_name}/_action/feedback"),
            status_topic: format!("{action_name}/_action/status"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_standard_names() {
        let names = ActionNames::for_action("fibonacci").unwrap();
        assert_eq!(names.goal_service, "fibonacci/_action/send_goal");
        assert_eq!(names.cancel_service, "fibonacci/_action/cancel_goal");
        assert_eq!(names.result_service, "fibonacci/_action/get_result");
        assert_eq!(names.feedback_topic, "fibonacci/_action/feedback");
        assert_eq!(names.status_topic, "fibonacci/_action/status");
    }

    #[test]
    fn empty_name_is_invalid_argument() {
        let e = ActionNames::for_action("").unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidArgument);
    }
}
