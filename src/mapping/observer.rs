use std::fmt;
use std::sync::Arc;

use crate::error::{MappingError, MappingErrorKind};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MappingSeverity {
    /// Informational event.
    Info,
    /// A cell was empty or unparsable; only this row is lost.
    Warning,
    /// The sheet does not have the shape the class map expects.
    Error,
    /// Loading failed, or the type can never be mapped.
    Critical,
}

impl MappingSeverity {
    /// Default severity for an error.
    pub fn of(error: &MappingError) -> Self {
        match error.kind() {
            MappingErrorKind::EmptyValue | MappingErrorKind::InvalidValue => Self::Warning,
            MappingErrorKind::Schema => Self::Error,
            MappingErrorKind::Source | MappingErrorKind::Fatal => Self::Critical,
        }
    }
}

/// Context about one mapped row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowContext {
    /// 1-based row number in the sheet.
    pub row: usize,
    /// Name of the target type.
    pub target_type: &'static str,
}

/// Observer interface for row mapping outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait MappingObserver: Send + Sync {
    /// Called when a row maps successfully.
    fn on_row_mapped(&self, _ctx: &RowContext) {}

    /// Called when a row fails to map.
    fn on_row_failed(&self, _ctx: &RowContext, _severity: MappingSeverity, _error: &MappingError) {}

    /// Called when a failure meets the mapper's alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_row_failed`].
    fn on_alert(&self, ctx: &RowContext, severity: MappingSeverity, error: &MappingError) {
        self.on_row_failed(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn MappingObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn MappingObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl MappingObserver for CompositeObserver {
    fn on_row_mapped(&self, ctx: &RowContext) {
        for o in &self.observers {
            o.on_row_mapped(ctx);
        }
    }

    fn on_row_failed(&self, ctx: &RowContext, severity: MappingSeverity, error: &MappingError) {
        for o in &self.observers {
            o.on_row_failed(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &RowContext, severity: MappingSeverity, error: &MappingError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits mapping events as `tracing` events.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl MappingObserver for TracingObserver {
    fn on_row_mapped(&self, ctx: &RowContext) {
        tracing::trace!(row = ctx.row, target_type = ctx.target_type, "row mapped");
    }

    fn on_row_failed(&self, ctx: &RowContext, severity: MappingSeverity, error: &MappingError) {
        tracing::warn!(
            row = ctx.row,
            target_type = ctx.target_type,
            ?severity,
            error = %error,
            "row failed"
        );
    }

    fn on_alert(&self, ctx: &RowContext, severity: MappingSeverity, error: &MappingError) {
        tracing::error!(
            row = ctx.row,
            target_type = ctx.target_type,
            ?severity,
            error = %error,
            "row mapping alert"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::column::ResolutionError;

    #[test]
    fn severity_follows_error_kind() {
        let empty = MappingError::EmptyValue {
            row: 2,
            column: 0,
            member: "a".to_string(),
        };
        let missing = MappingError::ColumnResolution {
            row: 2,
            member: "a".to_string(),
            source: ResolutionError::NotFound {
                name: "a".to_string(),
            },
        };
        let cycle = MappingError::RecursiveMapping {
            chain: vec!["A".to_string(), "A".to_string()],
        };
        assert_eq!(MappingSeverity::of(&empty), MappingSeverity::Warning);
        assert_eq!(MappingSeverity::of(&missing), MappingSeverity::Error);
        assert_eq!(MappingSeverity::of(&cycle), MappingSeverity::Critical);
        assert!(MappingSeverity::Critical > MappingSeverity::Warning);
    }
}
