//! Preflight checks run before probing.
//!
//! # Checks Performed
//!
//! - **Resolution**: the clock advances and is fine enough to resolve cache hits
//! - **System**: platform-specific checks (CPU governor, hypervisor, load on Linux)
//!
//! Warnings never stop a run. They are carried into the report.

mod resolution;
mod system;

pub use resolution::{resolution_check, ResolutionWarning, COARSE_RESOLUTION_NS};
pub use system::{governor_warning, hypervisor_warning, load_warning, system_check, SystemWarning, LOAD_THRESHOLD};

use serde::{Deserialize, Serialize};

use crate::measurement::TimeSource;

/// Any preflight warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PreflightWarning {
    /// From the clock check.
    Resolution(ResolutionWarning),
    /// From the system checks.
    System(SystemWarning),
}

impl PreflightWarning {
    /// Check if this warning indicates a critical issue.
    pub fn is_critical(&self) -> bool {
        match self {
            PreflightWarning::Resolution(w) => w.is_critical(),
            PreflightWarning::System(w) => w.is_critical(),
        }
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            PreflightWarning::Resolution(w) => w.description(),
            PreflightWarning::System(w) => w.description(),
        }
    }
}

impl From<ResolutionWarning> for PreflightWarning {
    fn from(warning: ResolutionWarning) -> Self {
        PreflightWarning::Resolution(warning)
    }
}

impl From<SystemWarning> for PreflightWarning {
    fn from(warning: SystemWarning) -> Self {
        PreflightWarning::System(warning)
    }
}

/// Run all preflight checks against `clock` and collect warnings.
pub fn run_all_checks<C: TimeSource + ?Sized>(clock: &mut C) -> Vec<PreflightWarning> {
    let mut warnings: Vec<PreflightWarning> = Vec::new();
    if let Some(warning) = resolution_check(clock) {
        warnings.push(warning.into());
    }
    warnings.extend(system_check().into_iter().map(PreflightWarning::from));
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::MonotonicClock;

    #[test]
    fn test_monotonic_clock_passes_resolution() {
        let warnings = run_all_checks(&mut MonotonicClock::new());
        assert!(!warnings.iter().any(PreflightWarning::is_critical));
    }

    #[test]
    fn test_wrapping_delegates() {
        let warning: PreflightWarning = SystemWarning::VirtualMachineDetected.into();
        assert!(!warning.is_critical());
        assert!(warning.description().contains("virtual machine"));
    }
}
