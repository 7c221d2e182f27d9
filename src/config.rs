//! Configuration for probing.

use std::env;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::detect::Thresholds;

/// Preset sizes for a probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Small buffers and few passes, for tests and smoke runs.
    Quick,
    /// The full tables (default).
    Full,
}

/// Stride sweep for the cache line size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSizeSweep {
    /// Backing buffer in bytes (default: 32 MiB).
    pub buffer_bytes: usize,
    /// Strides in ascending order (default: 8..1024).
    pub strides: Vec<usize>,
    /// Timed passes per stride (default: 3).
    pub iterations: usize,
}

/// Working-set sweep for L1/L2/L3 capacities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSizeSweep {
    /// Working sets in ascending order (default: 4 KiB..32 MiB).
    pub working_sets: Vec<usize>,
    /// Timed passes per working set (default: 5).
    pub iterations: usize,
    /// Timed accesses per pass, as a multiple of the element count (default: 4).
    pub accesses_per_element: usize,
    /// Pattern seed (default: 12345).
    pub seed: u64,
}

/// Same-set candidate sweep for associativity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociativitySweep {
    /// Distance between same-set addresses in bytes (default: 4096).
    pub set_stride: usize,
    /// Candidate way counts in ascending order (default: 2..32).
    pub candidates: Vec<usize>,
    /// Timed passes per candidate (default: 100).
    pub iterations: usize,
    /// Rounds over all candidate addresses per pass (default: 10,000).
    pub rounds: usize,
    /// Pattern seed.
    pub seed: u64,
}

/// Stride sweep for the page size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizeSweep {
    /// Backing buffer in bytes (default: 128 MiB).
    pub buffer_bytes: usize,
    /// Strides in ascending order (default: 512..16384).
    pub strides: Vec<usize>,
    /// Timed passes per stride (default: 3).
    pub iterations: usize,
}

/// Page-count sweep for TLB capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlbSweep {
    /// Page counts in ascending order (default: 8..4096).
    pub page_counts: Vec<usize>,
    /// Timed passes per page count (default: 5).
    pub iterations: usize,
    /// Timed accesses per pass, as a multiple of the page count (default: 200).
    pub accesses_per_page: usize,
    /// Warm-up accesses, as a multiple of the page count (default: 4).
    pub warmup_per_page: usize,
    /// Independent trials aggregated by mode (default: 10).
    pub trials: usize,
    /// Base seed; each trial derives its own (default: 54321).
    pub seed: u64,
}

impl TlbSweep {
    /// Pages the buffer must hold.
    pub fn max_pages(&self) -> usize {
        self.page_counts.iter().copied().max().unwrap_or(0)
    }
}

/// Configuration options for [`MemoryProber`](crate::MemoryProber).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Line-size probe.
    pub line_size: LineSizeSweep,
    /// Cache-size probe.
    pub cache_sizes: CacheSizeSweep,
    /// Associativity probe.
    pub associativity: AssociativitySweep,
    /// Page-size probe.
    pub page_size: PageSizeSweep,
    /// TLB probe.
    pub tlb: TlbSweep,
    /// Knee thresholds.
    pub thresholds: Thresholds,
    /// Optional per-buffer byte budget. Larger requests fail as allocation
    /// failures and the probe falls back to its default.
    pub memory_limit_bytes: Option<usize>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            line_size: LineSizeSweep {
                buffer_bytes: constants::LINE_BUFFER_BYTES,
                strides: constants::LINE_STRIDES.to_vec(),
                iterations: 3,
            },
            cache_sizes: CacheSizeSweep {
                working_sets: constants::CACHE_WORKING_SETS.to_vec(),
                iterations: 5,
                accesses_per_element: 4,
                seed: constants::CACHE_SEED,
            },
            associativity: AssociativitySweep {
                set_stride: constants::ASSOCIATIVITY_SET_STRIDE,
                candidates: constants::ASSOCIATIVITY_CANDIDATES.to_vec(),
                iterations: 100,
                rounds: 10_000,
                seed: constants::ASSOCIATIVITY_SEED,
            },
            page_size: PageSizeSweep {
                buffer_bytes: constants::PAGE_BUFFER_BYTES,
                strides: constants::PAGE_STRIDES.to_vec(),
                iterations: 3,
            },
            tlb: TlbSweep {
                page_counts: constants::TLB_PAGE_COUNTS.to_vec(),
                iterations: 5,
                accesses_per_page: 200,
                warmup_per_page: 4,
                trials: constants::TLB_TRIALS,
                seed: constants::TLB_SEED,
            },
            thresholds: Thresholds::default(),
            memory_limit_bytes: None,
        }
    }
}

impl ProbeConfig {
    /// Reduced buffers and passes.
    ///
    /// Settings:
    /// - 4 MiB line buffer, 1 pass
    /// - working sets up to 4 MiB, 2 passes
    /// - 5 associativity passes of 500 rounds
    /// - 16 MiB page buffer, 1 pass
    /// - up to 512 TLB pages, 3 trials
    pub fn quick() -> Self {
        let defaults = Self::default();
        Self {
            line_size: LineSizeSweep {
                buffer_bytes: 4 * 1024 * 1024,
                iterations: 1,
                ..defaults.line_size
            },
            cache_sizes: CacheSizeSweep {
                working_sets: constants::CACHE_WORKING_SETS
                    .iter()
                    .copied()
                    .filter(|&size| size <= 4 * 1024 * 1024)
                    .collect(),
                iterations: 2,
                ..defaults.cache_sizes
            },
            associativity: AssociativitySweep {
                iterations: 5,
                rounds: 500,
                ..defaults.associativity
            },
            page_size: PageSizeSweep {
                buffer_bytes: 16 * 1024 * 1024,
                iterations: 1,
                ..defaults.page_size
            },
            tlb: TlbSweep {
                page_counts: constants::TLB_PAGE_COUNTS
                    .iter()
                    .copied()
                    .filter(|&pages| pages <= 512)
                    .collect(),
                iterations: 2,
                accesses_per_page: 20,
                trials: 3,
                ..defaults.tlb
            },
            ..defaults
        }
    }

    /// Preset for `mode`.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Quick => Self::quick(),
            Mode::Full => Self::default(),
        }
    }

    /// Use `seed` for every pattern family.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.cache_sizes.seed = seed;
        self.associativity.seed = seed;
        self.tlb.seed = seed;
        self
    }

    /// Merge overrides from environment variables.
    ///
    /// - `MEMPROBE_MODE`: `quick` or `full`, replaces the whole preset
    /// - `MEMPROBE_SEED`: seed for every pattern family
    /// - `MEMPROBE_TLB_TRIALS`: TLB trial count
    /// - `MEMPROBE_MEMORY_LIMIT`: per-buffer byte budget
    pub fn from_env(self) -> Self {
        let mut config = match parse_mode_env("MEMPROBE_MODE") {
            Some(mode) => Self::for_mode(mode),
            None => self,
        };
        if let Some(seed) = parse_u64_env("MEMPROBE_SEED") {
            config = config.with_seed(seed);
        }
        if let Some(trials) = parse_usize_env("MEMPROBE_TLB_TRIALS") {
            config.tlb.trials = trials;
        }
        if let Some(limit) = parse_usize_env("MEMPROBE_MEMORY_LIMIT") {
            config.memory_limit_bytes = Some(limit);
        }
        config
    }
}

fn parse_mode_env(key: &str) -> Option<Mode> {
    match env::var(key).ok()?.to_ascii_lowercase().as_str() {
        "quick" => Some(Mode::Quick),
        "full" => Some(Mode::Full),
        _ => None,
    }
}

fn parse_usize_env(key: &str) -> Option<usize> {
    env::var(key).ok()?.parse().ok()
}

fn parse_u64_env(key: &str) -> Option<u64> {
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let config = ProbeConfig::default();
        assert_eq!(config.line_size.strides.first(), Some(&8));
        assert_eq!(config.cache_sizes.working_sets.len(), 24);
        assert_eq!(config.associativity.candidates.last(), Some(&32));
        assert_eq!(config.tlb.max_pages(), 4096);
        assert_eq!(config.tlb.trials, 10);
        assert!(config.memory_limit_bytes.is_none());
    }

    #[test]
    fn test_quick_is_smaller() {
        let quick = ProbeConfig::quick();
        let full = ProbeConfig::default();
        assert!(quick.line_size.buffer_bytes < full.line_size.buffer_bytes);
        assert!(quick.page_size.buffer_bytes < full.page_size.buffer_bytes);
        assert!(quick.tlb.max_pages() < full.tlb.max_pages());
        assert_eq!(quick.line_size.strides, full.line_size.strides);
        assert_eq!(quick.thresholds, full.thresholds);
    }

    #[test]
    fn test_with_seed() {
        let config = ProbeConfig::quick().with_seed(7);
        assert_eq!(config.cache_sizes.seed, 7);
        assert_eq!(config.associativity.seed, 7);
        assert_eq!(config.tlb.seed, 7);
    }

    #[test]
    fn test_for_mode() {
        assert_eq!(ProbeConfig::for_mode(Mode::Full), ProbeConfig::default());
        assert_eq!(ProbeConfig::for_mode(Mode::Quick), ProbeConfig::quick());
    }
}
