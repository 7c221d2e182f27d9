//! Memory and instruction ordering barrier.
//!
//! Placed on both sides of every clock sample so loads from the timed region
//! cannot drift across the measurement boundary:
//! - x86_64: `mfence`
//! - aarch64: `dmb sy; isb`
//! - Fallback: `SeqCst` fence

use std::sync::atomic::{compiler_fence, Ordering};

/// Emit a full memory/instruction ordering barrier.
///
/// Never call this inside a timed loop: it would perturb the very latency
/// being measured.
#[inline(always)]
pub fn barrier() {
    compiler_fence(Ordering::SeqCst);

    #[cfg(target_arch = "x86_64")]
    unsafe {
        // No `nomem`: the asm block doubles as a compiler memory clobber.
        std::arch::asm!("mfence", options(nostack, preserves_flags));
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        std::arch::asm!("dmb sy", "isb", options(nostack, preserves_flags));
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    std::sync::atomic::fence(Ordering::SeqCst);

    compiler_fence(Ordering::SeqCst);
}
