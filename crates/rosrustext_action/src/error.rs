use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Convenient result alias for rosrustext_action.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Log/handling importance. Maps onto tracing levels in `logging`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// Where an error came from (helps triage and routing).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Domain {
    Action,
    Transport,
    WaitSet,
    /// Builder default when no domain is set.
    Other,
}

/// Stable error "kind" for matching/branching.
///
/// This is the client-level vocabulary: primitive failures are always
/// reclassified into one of these before they leave the crate.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// Empty/missing required input.
    InvalidArgument,
    AlreadyInitialized,
    NotInitialized,
    /// Operating on a torn-down or corrupt client.
    ClientInvalid,
    /// The transport that creates primitives is no longer valid.
    NodeInvalid,
    /// A sub-resource reports itself invalid or its peer unreachable.
    Unavailable,
    /// A derived sub-resource name was rejected by the transport.
    NameInvalid,
    /// Allocation-class failure, preserved through every layer.
    ResourceExhausted,
    /// Nothing to take right now. Transient: try later.
    TakeFailed,
    NotFound,
    WaitSetInvalid,
    Generic,
}

/// Optional structured payload for rich context.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,

    /// Raw bytes of the goal uuid the operation was about.
    GoalUuid([u8; 16]),

    /// Wait-set slot that failed a bounds check.
    WaitSetSlot {
        entity: &'static str,
        index: usize,
        capacity: usize,
    },

    /// Feedback content filter that could not be applied.
    FeedbackFilter { expression: String },
}

/// The one error type that crosses module boundaries in rosrustext_action.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("{severity:?}: {message}")]
pub struct CoreError {
    pub domain: Domain,
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: Cow<'static, str>,
    pub payload: Payload,
    /// Inner error this one wraps (rollback over the original failure, filter apply, ...).
    #[source]
    pub cause: Option<Box<CoreError>>,
}

impl CoreError {
    /// Fully-specified constructor (rarely needed at call sites).
    pub fn new(
        domain: Domain,
        kind: ErrorKind,
        severity: Severity,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            domain,
            kind,
            severity,
            message: message.into(),
            payload: Payload::None,
            cause: None,
        }
    }

    // ---------------- Fluent entry points ----------------

    #[inline]
    pub fn trace() -> ErrB {
        ErrB::new(Severity::Trace)
    }
    #[inline]
    pub fn debug() -> ErrB {
        ErrB::new(Severity::Debug)
    }
    #[inline]
    pub fn info() -> ErrB {
        ErrB::new(Severity::Info)
    }
    #[inline]
    pub fn warn() -> ErrB {
        ErrB::new(Severity::Warn)
    }
    #[inline]
    pub fn error() -> ErrB {
        ErrB::new(Severity::Error)
    }
    #[inline]
    pub fn fatal() -> ErrB {
        ErrB::new(Severity::Fatal)
    }

    /// Operation attempted on a client that is not (or no longer) fully initialized.
    pub fn client_invalid(reason: impl Into<Cow<'static, str>>) -> Self {
        CoreError::error()
            .domain(Domain::Action)
            .kind(ErrorKind::ClientInvalid)
            .msg(reason)
            .build()
    }

    /// True for the "no data right now" condition callers should retry later.
    pub fn is_take_failed(&self) -> bool {
        self.kind == ErrorKind::TakeFailed
    }

    /// Innermost error in the cause chain (self if there is none).
    pub fn root_cause(&self) -> &CoreError {
        let mut current = self;
        while let Some(inner) = current.cause.as_deref() {
            current = inner;
        }
        current
    }
}

/// Fluent builder that behaves like iterator chains (takes self, returns Self).
/// Defaults:
/// - domain = Other
/// - kind = Generic
/// - message = ""
/// - payload = None
/// - cause = None
#[derive(Debug, Clone)]
pub struct ErrB {
    domain: Domain,
    kind: ErrorKind,
    severity: Severity,
    message: Cow<'static, str>,
    payload: Payload,
    cause: Option<Box<CoreError>>,
}

impl ErrB {
    #[inline]
    fn new(severity: Severity) -> Self {
        Self {
            domain: Domain::Other,
            kind: ErrorKind::Generic,
            severity,
            message: Cow::Borrowed(""),
            payload: Payload::None,
            cause: None,
        }
    }

    // -------- Guided setters --------

    /// Set/override the domain (defaults to Domain::Other).
    #[inline]
    pub fn domain(mut self, d: Domain) -> Self {
        self.domain = d;
        self
    }

    /// Set/override the kind (defaults to ErrorKind::Generic).
    #[inline]
    pub fn kind(mut self, k: ErrorKind) -> Self {
        self.kind = k;
        self
    }

    /// Set/override the message (defaults to "").
    #[inline]
    pub fn msg(mut self, m: impl Into<Cow<'static, str>>) -> Self {
        self.message = m.into();
        self
    }

    /// Formatting-friendly message setter.
    #[inline]
    pub fn msgf(mut self, args: fmt::Arguments<'_>) -> Self {
        self.message = Cow::Owned(args.to_string());
        self
    }

    /// Only one payload: this replaces any previous payload (default is None).
    #[inline]
    pub fn payload(mut self, p: Payload) -> Self {
        self.payload = p;
        self
    }

    /// Wrap an inner error.
    #[inline]
    pub fn cause(mut self, inner: CoreError) -> Self {
        self.cause = Some(Box::new(inner));
        self
    }

    // -------- Finish --------
    #[inline]
    pub fn build(self) -> CoreError {
        CoreError {
            domain: self.domain,
            kind: self.kind,
            severity: self.severity,
            message: self.message,
            payload: self.payload,
            cause: self.cause,
        }
    }
}

impl From<ErrB> for CoreError {
    fn from(b: ErrB) -> Self {
        b.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn builder_defaults_to_generic() {
        let e = CoreError::warn().msg("boom").build();
        assert_eq!(e.kind, ErrorKind::Generic);
        assert_eq!(e.domain, Domain::Other);
        assert_eq!(e.severity, Severity::Warn);
        assert_eq!(e.payload, Payload::None);
        assert!(e.cause.is_none());
        assert_eq!(e.to_string(), "Warn: boom");
    }

    #[test]
    fn cause_is_exposed_as_source() {
        let inner = CoreError::error()
            .kind(ErrorKind::Unavailable)
            .msg("cancel client init failed")
            .build();
        let outer = CoreError::error()
            .domain(Domain::Action)
            .msg("failed to cleanup action client")
            .cause(inner.clone())
            .build();

        let source = outer.source().expect("wrapped error should expose a source");
        assert_eq!(source.to_string(), inner.to_string());
        assert_eq!(outer.root_cause(), &inner);
    }

    #[test]
    fn msgf_formats_message() {
        let e = CoreError::info()
            .kind(ErrorKind::NotFound)
            .msgf(format_args!("item key [{}] not found", 7))
            .build();
        assert_eq!(e.message, "item key [7] not found");
        assert!(!e.is_take_failed());
    }
}
