use super::QosProfile;

/// Per-sub-resource transport policy for an action client.
///
/// Copied into the client at `init`; immutable afterwards except by re-init.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ActionClientOptions {
    pub goal_service_qos: QosProfile,
    pub cancel_service_qos: QosProfile,
    pub result_service_qos: QosProfile,
    pub feedback_topic_qos: QosProfile,
    pub status_topic_qos: QosProfile,
}

impl ActionClientOptions {
    pub fn with_goal_service_qos(mut self, qos: QosProfile) -> Self {
        self.goal_service_qos = qos;
        self
    }

    pub fn with_cancel_service_qos(mut self, qos: QosProfile) -> Self {
        self.cancel_service_qos = qos;
        self
    }

    pub fn with_result_service_qos(mut self, qos: QosProfile) -> Self {
        self.result_service_qos = qos;
        self
    }

    pub fn with_feedback_topic_qos(mut self, qos: QosProfile) -> Self {
        self.feedback_topic_qos = qos;
        self
    }

    pub fn with_status_topic_qos(mut self, qos: QosProfile) -> Self {
        self.status_topic_qos = qos;
        self
    }
}

impl Default for ActionClientOptions {
    /// Services default for the three channels, topics default for feedback,
    /// transient-local keep-last-1 for status.
    fn default() -> Self {
        Self {
            goal_service_qos: QosProfile::services_default(),
            cancel_service_qos: QosProfile::services_default(),
            result_service_qos: QosProfile::services_default(),
            feedback_topic_qos: QosProfile::topics_default(),
            status_topic_qos: QosProfile::action_status_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Durability, Reliability};

    #[test]
    fn defaults_match_rmw_presets() {
        let o = ActionClientOptions::default();
        assert_eq!(o.goal_service_qos, QosProfile::services_default());
        assert_eq!(o.cancel_service_qos, QosProfile::services_default());
        assert_eq!(o.result_service_qos, QosProfile::services_default());
        assert_eq!(o.feedback_topic_qos, QosProfile::topics_default());
        assert_eq!(o.status_topic_qos.durability, Durability::TransientLocal);
        assert_eq!(o.status_topic_qos.depth, 1);
    }

    #[test]
    fn defaults_are_fresh_values() {
        let mut a = ActionClientOptions::default();
        a.feedback_topic_qos = a.feedback_topic_qos.reliability(Reliability::BestEffort);
        assert_eq!(a.feedback_topic_qos.reliability, Reliability::BestEffort);
        assert_eq!(
            ActionClientOptions::default().feedback_topic_qos,
            QosProfile::topics_default()
        );
    }

    #[test]
    fn setters_replace_single_profile() {
        let qos = QosProfile::topics_default().keep_last(3);
        let o = ActionClientOptions::default().with_feedback_topic_qos(qos);
        assert_eq!(o.feedback_topic_qos.depth, 3);
        assert_eq!(o.status_topic_qos, QosProfile::action_status_default());
    }
}
