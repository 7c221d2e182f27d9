//! Error types.
//!
//! None of these escape the per-parameter probe functions: the prober turns
//! every [`ProbeError`] into the documented default for that parameter. They
//! are visible through the `*_curve` functions and the optional interfaces
//! (sysfs topology, core-affinity hints).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while building or measuring an access pattern.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A backing buffer could not be reserved.
    #[error("could not allocate {bytes} bytes for the probe buffer")]
    AllocationFailed {
        /// Requested size in bytes.
        bytes: usize,
    },

    /// A sweep finished without a single measured point.
    #[error("{probe} sweep produced no measurements")]
    EmptySweep {
        /// Probe family name.
        probe: &'static str,
    },
}

/// Failure while reading the operating-system cache descriptors.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The descriptor directory does not exist on this system.
    #[error("no cache descriptors under {}", .0.display())]
    NotAvailable(PathBuf),

    /// A descriptor file exists but could not be read.
    #[error("failed to read {}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A descriptor file held a value that is not a size or a count.
    #[error("unexpected value {value:?} in {}", .path.display())]
    Parse {
        /// File being read.
        path: PathBuf,
        /// Raw first token.
        value: String,
    },
}

/// Failure while applying a core-class scheduling hint.
#[derive(Debug, Error)]
pub enum AffinityError {
    /// The platform has no core-class scheduling hint.
    #[error("core-class hints are not supported on this platform")]
    Unsupported,

    /// The platform rejected the hint.
    #[error("scheduler rejected the core-class hint (code {code})")]
    Rejected {
        /// Return code from the platform call.
        code: i32,
    },
}
