//! Command-line entry point.
//!
//! Run with:
//! ```text
//! memprobe [--quick] [--json] [--curves] [--sysfs] [--cores] [--seed N]
//! ```

use std::process::ExitCode;
use std::time::Instant;

use env_logger::Env;
use log::{info, warn};

use memprobe::output::{format_report, to_json_pretty};
use memprobe::preflight::run_all_checks;
use memprobe::topology::read_cpu0_cache_descriptors;
use memprobe::{
    apply_core_hint, CoreClass, CoreRun, MemoryProber, MemoryReport, Metadata, PlatformClock, ProbeConfig,
    TimeSource,
};

const USAGE: &str = "\
Usage: memprobe [OPTIONS]

Infer cache line size, cache capacities, associativity, page size and
TLB capacity from access timing.

Options:
  --quick     Smaller buffers and fewer passes
  --json      Print the report as JSON
  --curves    Include every latency curve in the report
  --sysfs     Also read the operating-system cache descriptors for cpu0
  --cores     Repeat line-size and cache-size probes per core class
  --seed N    Seed for every pattern family
  --help      Print this message

Environment:
  MEMPROBE_MODE, MEMPROBE_SEED, MEMPROBE_TLB_TRIALS, MEMPROBE_MEMORY_LIMIT
  RUST_LOG or MEMPROBE_LOG (default: warn)";

#[derive(Debug, Default)]
struct CliOptions {
    quick: bool,
    json: bool,
    curves: bool,
    sysfs: bool,
    cores: bool,
    seed: Option<u64>,
    help: bool,
}

fn parse_args(args: &[String]) -> CliOptions {
    let mut options = CliOptions::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--quick" => options.quick = true,
            "--json" => options.json = true,
            "--curves" => options.curves = true,
            "--sysfs" => options.sysfs = true,
            "--cores" => options.cores = true,
            "--help" | "-h" => options.help = true,
            "--seed" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse() {
                        Ok(seed) => options.seed = Some(seed),
                        Err(_) => warn!("ignoring invalid seed {:?}", args[i + 1]),
                    }
                    i += 1;
                } else {
                    warn!("--seed needs a value");
                }
            }
            other => warn!("ignoring unknown argument {:?}", other),
        }
        i += 1;
    }

    options
}

fn init_logging() {
    let env = if std::env::var_os("MEMPROBE_LOG").is_some() {
        Env::new().filter("MEMPROBE_LOG")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();
}

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args);
    if options.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let preset = if options.quick { ProbeConfig::quick() } else { ProbeConfig::default() };
    let mut config = preset.from_env();
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }

    let start = Instant::now();
    let mut clock = PlatformClock::default();
    let warnings = run_all_checks(&mut clock);
    for warning in &warnings {
        warn!("{}", warning.description());
    }

    let authoritative = if options.sysfs {
        read_cpu0_cache_descriptors().unwrap_or_else(|e| {
            warn!("operating-system cache descriptors unavailable: {}", e);
            Vec::new()
        })
    } else {
        Vec::new()
    };

    let mut prober = MemoryProber::with_clock(clock, config.clone());
    let run = prober.run();

    let mut core_runs = Vec::new();
    if options.cores {
        for class in CoreClass::ALL {
            let hint_applied = match apply_core_hint(class) {
                Ok(()) => true,
                Err(e) => {
                    info!("{} hint not applied: {}", class, e);
                    false
                }
            };
            core_runs.push(CoreRun {
                core_class: class,
                hint_applied,
                line_size: prober.line_size(),
                caches: prober.cache_sizes(),
            });
        }
    }

    let clock = prober.clock();
    let report = MemoryReport {
        hierarchy: run.hierarchy,
        curves: options.curves.then_some(run.curves),
        core_runs,
        authoritative,
        warnings,
        metadata: Metadata {
            clock: clock.name().to_string(),
            ticks_per_ns: clock.ticks_per_ns(),
            clock_resolution_ns: clock.resolution_ns(),
            runtime_secs: start.elapsed().as_secs_f64(),
            config,
        },
    };

    if options.json {
        match to_json_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", format_report(&report));
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("memprobe")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_flags() {
        let options = parse_args(&args(&["--quick", "--json", "--seed", "42", "--cores"]));
        assert!(options.quick && options.json && options.cores);
        assert!(!options.curves && !options.sysfs);
        assert_eq!(options.seed, Some(42));
    }

    #[test]
    fn test_parse_bad_seed() {
        let options = parse_args(&args(&["--seed", "abc", "--curves"]));
        assert_eq!(options.seed, None);
        assert!(options.curves);
    }
}
