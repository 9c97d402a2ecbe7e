use tracing::debug;

use crate::error::{CoreError, Domain, ErrorKind, Payload, Result};

use super::client::{classify, ActionClient, Role};
use super::primitives::{EntityHandle, PrimitiveError, PrimitiveErrorKind, PrimitiveResult};
use super::ActionType;

/// Externally owned readiness multiplexer.
///
/// Slots are grouped by entity kind. After a wait, the ready snapshot holds the
/// handle of each ready entity at its slot and nothing at the others.
pub trait WaitSet {
    /// Register a service client; returns its slot index.
    fn add_client(&mut self, client: &EntityHandle) -> PrimitiveResult<usize>;

    /// Register a subscription; returns its slot index.
    fn add_subscription(&mut self, subscription: &EntityHandle) -> PrimitiveResult<usize>;

    fn client_capacity(&self) -> usize;

    fn subscription_capacity(&self) -> usize;

    /// Handle stored at a client slot in the ready snapshot.
    fn ready_client(&self, index: usize) -> Option<&EntityHandle>;

    /// Handle stored at a subscription slot in the ready snapshot.
    fn ready_subscription(&self, index: usize) -> Option<&EntityHandle>;
}

/// Slot indices from the most recent registration.
///
/// Only meaningful for the wait set they came from; re-register after that wait set
/// is rebuilt.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WaitSetSlots {
    pub goal_client: usize,
    pub cancel_client: usize,
    pub result_client: usize,
    pub feedback_subscription: usize,
    pub status_subscription: usize,
}

/// First slot of each group, as returned by registration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WaitSetIndices {
    /// Goal client slot (first of the client group).
    pub client_index: usize,
    /// Feedback subscription slot (first of the subscription group).
    pub subscription_index: usize,
}

/// Number of wait-set entities an action client occupies, per kind.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WaitSetEntityCounts {
    pub subscriptions: usize,
    pub guard_conditions: usize,
    pub timers: usize,
    pub clients: usize,
    pub services: usize,
}

/// Which of the five primitives were ready in a wait-set snapshot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct ReadyEntities {
    pub feedback: bool,
    pub status: bool,
    pub goal_response: bool,
    pub cancel_response: bool,
    pub result_response: bool,
}

impl ReadyEntities {
    pub fn any(&self) -> bool {
        self.feedback
            || self.status
            || self.goal_response
            || self.cancel_response
            || self.result_response
    }
}

impl<A: ActionType> ActionClient<A> {
    /// Wait-set footprint: 3 clients, 2 subscriptions, nothing else.
    pub fn wait_set_entity_counts(&self) -> Result<WaitSetEntityCounts> {
        self.valid_impl()?;
        Ok(WaitSetEntityCounts {
            subscriptions: 2,
            guard_conditions: 0,
            timers: 0,
            clients: 3,
            services: 0,
        })
    }

    /// Register goal, cancel, result (clients) then feedback, status (subscriptions).
    ///
    /// The five slot indices are cached on the client for `entities_ready`.
    pub fn add_to_wait_set(&mut self, wait_set: &mut dyn WaitSet) -> Result<WaitSetIndices> {
        let inner = self.valid_impl_mut()?;

        let goal_client = wait_set
            .add_client(inner.goal_client.handle())
            .map_err(|e| add_error(Role::Goal, e))?;
        let cancel_client = wait_set
            .add_client(inner.cancel_client.handle())
            .map_err(|e| add_error(Role::Cancel, e))?;
        let result_client = wait_set
            .add_client(inner.result_client.handle())
            .map_err(|e| add_error(Role::Result, e))?;
        let feedback_subscription = wait_set
            .add_subscription(inner.feedback_subscription.handle())
            .map_err(|e| add_error(Role::Feedback, e))?;
        let status_subscription = wait_set
            .add_subscription(inner.status_subscription.handle())
            .map_err(|e| add_error(Role::Status, e))?;

        let slots = WaitSetSlots {
            goal_client,
            cancel_client,
            result_client,
            feedback_subscription,
            status_subscription,
        };
        debug!(?slots, "action client added to wait set");
        inner.wait_set_slots = Some(slots);

        Ok(WaitSetIndices {
            client_index: slots.goal_client,
            subscription_index: slots.feedback_subscription,
        })
    }

    /// Classify which primitives are ready in `wait_set`'s snapshot.
    ///
    /// Each cached slot is bounds-checked against the wait set's current capacity,
    /// then the handle at that slot is compared by identity with the client's own
    /// primitive.
    pub fn entities_ready(&self, wait_set: &dyn WaitSet) -> Result<ReadyEntities> {
        let inner = self.valid_impl()?;
        let slots = inner.wait_set_slots.ok_or_else(|| {
            CoreError::warn()
                .domain(Domain::WaitSet)
                .kind(ErrorKind::WaitSetInvalid)
                .msg("action client has not been added to a wait set")
                .build()
        })?;

        let subscriptions = wait_set.subscription_capacity();
        let clients = wait_set.client_capacity();
        check_bounds(Role::Feedback, slots.feedback_subscription, subscriptions)?;
        check_bounds(Role::Status, slots.status_subscription, subscriptions)?;
        check_bounds(Role::Goal, slots.goal_client, clients)?;
        check_bounds(Role::Cancel, slots.cancel_client, clients)?;
        check_bounds(Role::Result, slots.result_client, clients)?;

        Ok(ReadyEntities {
            feedback: same_entity(
                wait_set.ready_subscription(slots.feedback_subscription),
                inner.feedback_subscription.handle(),
            ),
            status: same_entity(
                wait_set.ready_subscription(slots.status_subscription),
                inner.status_subscription.handle(),
            ),
            goal_response: same_entity(
                wait_set.ready_client(slots.goal_client),
                inner.goal_client.handle(),
            ),
            cancel_response: same_entity(
                wait_set.ready_client(slots.cancel_client),
                inner.cancel_client.handle(),
            ),
            result_response: same_entity(
                wait_set.ready_client(slots.result_client),
                inner.result_client.handle(),
            ),
        })
    }
}

/// Identity, not value: a different primitive at the same slot is not ours.
fn same_entity(ready: Option<&EntityHandle>, own: &EntityHandle) -> bool {
    ready.is_some_and(|handle| handle == own)
}

fn check_bounds(role: Role, index: usize, capacity: usize) -> Result<()> {
    if index < capacity {
        return Ok(());
    }
    let entity = role.label();
    Err(CoreError::error()
        .domain(Domain::WaitSet)
        .kind(ErrorKind::WaitSetInvalid)
        .msgf(format_args!("wait set index for {entity} is out of bounds"))
        .payload(Payload::WaitSetSlot {
            entity,
            index,
            capacity,
        })
        .build())
}

fn add_error(role: Role, e: PrimitiveError) -> CoreError {
    let kind = match e.kind {
        PrimitiveErrorKind::Invalid => ErrorKind::WaitSetInvalid,
        _ => classify(&e),
    };
    CoreError::error()
        .domain(Domain::WaitSet)
        .kind(kind)
        .msgf(format_args!("failed to add {} to wait set: {e}", role.label()))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_check_reports_slot() {
        assert!(check_bounds(Role::Goal, 2, 3).is_ok());
        let e = check_bounds(Role::Goal, 3, 3).unwrap_err();
        assert_eq!(e.kind, ErrorKind::WaitSetInvalid);
        assert_eq!(
            e.payload,
            Payload::WaitSetSlot {
                entity: "goal client",
                index: 3,
                capacity: 3
            }
        );
    }

    #[test]
    fn full_wait_set_is_generic() {
        let e = add_error(
            Role::Status,
            PrimitiveError::new(PrimitiveErrorKind::Full, "no free subscription slot"),
        );
        assert_eq!(e.kind, ErrorKind::Generic);
        assert_eq!(e.domain, Domain::WaitSet);
    }

    #[test]
    fn ready_entities_any() {
        assert!(!ReadyEntities::default().any());
        let r = ReadyEntities {
            status: true,
            ..ReadyEntities::default()
        };
        assert!(r.any());
    }
}
