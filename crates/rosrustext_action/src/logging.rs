use crate::error::{CoreError, Severity};

/// Emit a `CoreError` at the tracing level matching its severity.
pub fn log_core_error(err: &CoreError) {
    match err.severity {
        Severity::Trace => tracing::trace!(kind = ?err.kind, domain = ?err.domain, "{err}"),
        Severity::Debug => tracing::debug!(kind = ?err.kind, domain = ?err.domain, "{err}"),
        Severity::Info => tracing::info!(kind = ?err.kind, domain = ?err.domain, "{err}"),
        Severity::Warn => tracing::warn!(kind = ?err.kind, domain = ?err.domain, "{err}"),
        Severity::Error | Severity::Fatal => {
            tracing::error!(kind = ?err.kind, domain = ?err.domain, "{err}")
        }
    }
}
