/// QoS history policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum History {
    SystemDefault,
    KeepLast,
    KeepAll,
}

/// QoS reliability policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Reliability {
    SystemDefault,
    Reliable,
    BestEffort,
}

/// QoS durability policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Durability {
    SystemDefault,
    TransientLocal,
    Volatile,
}

/// Transport policy attached to a channel or feed at init time.
///
/// Opaque to this crate: it is copied into the client and handed to the transport
/// untouched.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct QosProfile {
    pub history: History,
    pub depth: usize,
    pub reliability: Reliability,
    pub durability: Durability,
}

impl QosProfile {
    /// rmw `rmw_qos_profile_services_default`.
    pub const fn services_default() -> Self {
        Self {
            history: History::KeepLast,
            depth: 10,
            reliability: Reliability::Reliable,
            durability: Durability::Volatile,
        }
    }

    /// rmw `rmw_qos_profile_default`.
    pub const fn topics_default() -> Self {
        Self {
            history: History::KeepLast,
            depth: 10,
            reliability: Reliability::Reliable,
            durability: Durability::Volatile,
        }
    }

    /// Status feed default: late joiners get the latest goal status array.
    pub const fn action_status_default() -> Self {
        Self {
            history: History::KeepLast,
            depth: 1,
            reliability: Reliability::Reliable,
            durability: Durability::TransientLocal,
        }
    }

    pub const fn keep_last(mut self, depth: usize) -> Self {
        self.history = History::KeepLast;
        self.depth = depth;
        self
    }

    pub const fn reliability(mut self, reliability: Reliability) -> Self {
        self.reliability = reliability;
        self
    }

    pub const fn durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }
}

impl Default for QosProfile {
    fn default() -> Self {
        Self::topics_default()
    }
}
