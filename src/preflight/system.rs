//! System-level preflight checks.
//!
//! Platform-specific checks for conditions that skew latency curves.

use serde::{Deserialize, Serialize};

/// Load average above which a warning is emitted.
pub const LOAD_THRESHOLD: f64 = 1.0;

/// Warning from system checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SystemWarning {
    /// CPU frequency scaling is not set to performance mode.
    CpuGovernorNotPerformance {
        /// Current governor setting.
        current: String,
    },

    /// Running under a hypervisor.
    VirtualMachineDetected,

    /// High system load detected.
    HighSystemLoad {
        /// One-minute load average.
        load_average: f64,
        /// Threshold exceeded.
        threshold: f64,
    },
}

impl SystemWarning {
    /// System warnings are informational.
    pub fn is_critical(&self) -> bool {
        false
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            SystemWarning::CpuGovernorNotPerformance { current } => {
                format!(
                    "CPU frequency governor is '{}', recommend 'performance' for stable latencies. \
                     Set with: sudo cpufreq-set -g performance",
                    current
                )
            }
            SystemWarning::VirtualMachineDetected => {
                "Running in a virtual machine. Cache and TLB behaviour may reflect \
                 the hypervisor's sharing and second-level translation."
                    .to_string()
            }
            SystemWarning::HighSystemLoad {
                load_average,
                threshold,
            } => {
                format!(
                    "High system load detected: {:.2} (threshold: {:.2}). \
                     Other tasks may evict the probe's working set.",
                    load_average, threshold
                )
            }
        }
    }
}

/// Perform all system checks.
///
/// On unsupported platforms, returns an empty vector.
pub fn system_check() -> Vec<SystemWarning> {
    #[allow(unused_mut)]
    let mut warnings = Vec::new();

    #[cfg(target_os = "linux")]
    {
        let governor = std::fs::read_to_string("/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor");
        if let Some(warning) = governor.ok().and_then(|g| governor_warning(&g)) {
            warnings.push(warning);
        }
        let cpuinfo = std::fs::read_to_string("/proc/cpuinfo");
        if let Some(warning) = cpuinfo.ok().and_then(|c| hypervisor_warning(&c)) {
            warnings.push(warning);
        }
        let loadavg = std::fs::read_to_string("/proc/loadavg");
        if let Some(warning) = loadavg.ok().and_then(|l| load_warning(&l)) {
            warnings.push(warning);
        }
    }

    warnings
}

/// Warn unless the governor file names `performance`.
pub fn governor_warning(contents: &str) -> Option<SystemWarning> {
    let governor = contents.trim().to_lowercase();
    (!governor.is_empty() && governor != "performance")
        .then_some(SystemWarning::CpuGovernorNotPerformance { current: governor })
}

/// Warn when `/proc/cpuinfo` carries the hypervisor flag.
pub fn hypervisor_warning(cpuinfo: &str) -> Option<SystemWarning> {
    cpuinfo
        .to_lowercase()
        .contains("hypervisor")
        .then_some(SystemWarning::VirtualMachineDetected)
}

/// Warn when the one-minute load in `/proc/loadavg` exceeds [`LOAD_THRESHOLD`].
pub fn load_warning(loadavg: &str) -> Option<SystemWarning> {
    let load = loadavg.split_whitespace().next()?.parse::<f64>().ok()?;
    (load > LOAD_THRESHOLD).then_some(SystemWarning::HighSystemLoad {
        load_average: load,
        threshold: LOAD_THRESHOLD,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_check_runs() {
        let _warnings = system_check();
    }

    #[test]
    fn test_governor() {
        assert_eq!(governor_warning("performance\n"), None);
        let warning = governor_warning("powersave\n").unwrap();
        assert!(warning.description().contains("powersave"));
    }

    #[test]
    fn test_hypervisor() {
        assert_eq!(
            hypervisor_warning("flags\t: fpu vme hypervisor lahf_lm"),
            Some(SystemWarning::VirtualMachineDetected)
        );
        assert_eq!(hypervisor_warning("flags\t: fpu vme"), None);
    }

    #[test]
    fn test_load() {
        assert_eq!(load_warning("0.42 0.30 0.20 1/200 1234"), None);
        let warning = load_warning("2.50 1.00 0.50 3/200 1234").unwrap();
        assert!(warning.description().contains("2.50"));
        assert_eq!(load_warning("garbage"), None);
    }

    #[test]
    fn test_warning_is_not_critical() {
        let warnings = vec![
            SystemWarning::CpuGovernorNotPerformance {
                current: "powersave".to_string(),
            },
            SystemWarning::VirtualMachineDetected,
            SystemWarning::HighSystemLoad {
                load_average: 2.0,
                threshold: 1.0,
            },
        ];
        for warning in warnings {
            assert!(!warning.is_critical(), "System warnings should not be critical");
        }
    }
}
