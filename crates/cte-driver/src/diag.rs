//! Driver diagnostics: per-class error counters and the last reported error.

use crate::error::{CteError, ErrorClass};

/// Diagnostic counters kept by [`crate::Cte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagCounters {
    /// The last error reported by any operation, if any.
    pub last_error: Option<CteError>,
    /// Saturating counter for parameter-class errors.
    pub parameter_errors: u16,
    /// Saturating counter for capacity-class errors.
    pub capacity_errors: u16,
    /// Saturating counter for state-class errors.
    pub state_errors: u16,
    /// Saturating counter for mapping-class errors.
    pub mapping_errors: u16,
    /// Saturating counter for hardware-class errors.
    pub hardware_errors: u16,
    /// Saturating counter for warning outcomes (start while executing).
    pub warnings: u16,
}

impl DiagCounters {
    /// Creates cleared counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error, updating the last error and its class counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_error(&mut self, error: CteError) {
        self.last_error = Some(error);
        let counter = match error.class() {
            ErrorClass::Parameter => &mut self.parameter_errors,
            ErrorClass::Capacity => &mut self.capacity_errors,
            ErrorClass::State => &mut self.state_errors,
            ErrorClass::Mapping => &mut self.mapping_errors,
            ErrorClass::Hardware => &mut self.hardware_errors,
        };
        *counter = counter.saturating_add(1);
    }

    /// Records a warning outcome.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_warning(&mut self) {
        self.warnings = self.warnings.saturating_add(1);
    }

    /// Total errors recorded across all classes, saturating.
    #[must_use]
    pub const fn total_errors(&self) -> u16 {
        self.parameter_errors
            .saturating_add(self.capacity_errors)
            .saturating_add(self.state_errors)
            .saturating_add(self.mapping_errors)
            .saturating_add(self.hardware_errors)
    }

    /// Resets all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Callback invoked with every error reported by the driver.
///
/// Installed through [`crate::Cte::set_error_hook`]; useful as a
/// breakpoint or halt trap during bring-up.
pub type ErrorHook = Box<dyn FnMut(CteError) + Send>;

#[cfg(test)]
mod tests {
    use super::DiagCounters;
    use crate::error::CteError;

    #[test]
    fn errors_are_counted_per_class() {
        let mut diag = DiagCounters::new();
        diag.record_error(CteError::TableTooLong);
        diag.record_error(CteError::NotInitialized);
        diag.record_error(CteError::NotRunning);

        assert_eq!(diag.last_error, Some(CteError::NotRunning));
        assert_eq!(diag.parameter_errors, 1);
        assert_eq!(diag.state_errors, 2);
        assert_eq!(diag.total_errors(), 3);
    }

    #[test]
    fn counters_saturate() {
        let mut diag = DiagCounters {
            hardware_errors: u16::MAX,
            warnings: u16::MAX,
            ..DiagCounters::default()
        };
        diag.record_error(CteError::IrqRegisterFailed);
        diag.record_warning();
        assert_eq!(diag.hardware_errors, u16::MAX);
        assert_eq!(diag.warnings, u16::MAX);

        diag.reset();
        assert_eq!(diag, DiagCounters::default());
    }
}
