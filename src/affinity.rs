//! Core-class scheduling hints.
//!
//! On macOS the calling thread's QoS class biases the scheduler toward
//! performance or efficiency cores. Other platforms have no portable
//! equivalent and report [`AffinityError::Unsupported`]; probing proceeds
//! unchanged either way.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AffinityError;

/// Processor core class to bias execution toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoreClass {
    /// Performance cores (user-interactive QoS).
    Performance,
    /// Efficiency cores (background QoS).
    Efficiency,
}

impl CoreClass {
    /// Both classes, performance first.
    pub const ALL: [CoreClass; 2] = [CoreClass::Performance, CoreClass::Efficiency];
}

impl fmt::Display for CoreClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreClass::Performance => write!(f, "P-core"),
            CoreClass::Efficiency => write!(f, "E-core"),
        }
    }
}

/// Set the calling thread's QoS class for `class`.
#[cfg(target_os = "macos")]
pub fn apply_core_hint(class: CoreClass) -> Result<(), AffinityError> {
    let qos = match class {
        CoreClass::Performance => libc::qos_class_t::QOS_CLASS_USER_INTERACTIVE,
        CoreClass::Efficiency => libc::qos_class_t::QOS_CLASS_BACKGROUND,
    };
    // SAFETY: only changes the scheduling class of the current thread.
    let code = unsafe { libc::pthread_set_qos_class_self_np(qos, 0) };
    if code == 0 {
        Ok(())
    } else {
        Err(AffinityError::Rejected { code })
    }
}

/// Core-class hints are only available on macOS.
#[cfg(not(target_os = "macos"))]
pub fn apply_core_hint(_class: CoreClass) -> Result<(), AffinityError> {
    Err(AffinityError::Unsupported)
}
