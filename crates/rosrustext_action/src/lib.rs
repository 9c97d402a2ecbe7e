//! rosrustext_action: ROS-agnostic action client coordination.
//!
//! Design goals:
//! - Pure, testable logic (transport behind traits, no ROS deps).
//! - Explicit types; no macro wizardry.
//! - All-or-nothing lifecycle: a client is fully initialized or not at all.

pub mod error;

/// Severity-aware tracing of `CoreError`s.
pub mod logging;

/// Action client, its primitives and wait-set integration.
pub mod action;

pub use action::{ActionClient, ActionClientOptions, ActionType, GoalUuid};
pub use error::{CoreError, ErrorKind, Result};
