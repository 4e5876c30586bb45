//! A simulator wrapper

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::HierarchyConfig;
use crate::error::{SimulatorResult, TraceError};
use crate::memory::cache::CacheHistory;
use crate::memory::{AccessOutcome, AccessType, InclusiveHierarchy};

/// One trace record
pub type Operation = (AccessType, u32);

/// Run policy chosen on the command line
#[derive(Clone, Debug, Default)]
pub struct RunPolicy {
    /// Output path, `<trace>.out` when unset
    pub output: Option<PathBuf>,
    /// Print hit/miss statistics after the run
    pub history: bool,
}

/// Statistics of a finished run
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub accesses: usize,
    pub l1: CacheHistory,
    pub l2: CacheHistory,
    pub memory_writes: u64,
}

impl RunSummary {
    pub fn of(hierarchy: &InclusiveHierarchy, accesses: usize) -> Self {
        Self {
            accesses,
            l1: hierarchy.l1.history,
            l2: hierarchy.l2.history,
            memory_writes: hierarchy.memory_writes,
        }
    }
}

/// Parse a single trace line such as `R 0x1f40` or `w 7ffc`
fn parse_operation(line: &str) -> Option<Operation> {
    let mut parts = line.split_whitespace();
    let access_type = match parts.next()? {
        "R" | "r" => AccessType::Read,
        "W" | "w" => AccessType::Write,
        _ => return None,
    };

    let address_str = parts.next()?;
    let digits = address_str
        .strip_prefix("0x")
        .or_else(|| address_str.strip_prefix("0X"))
        .unwrap_or(address_str);
    let address = u32::from_str_radix(digits, 16).ok()?;

    Some((access_type, address))
}

/// Parse trace content. The first malformed line
/// ends the trace, like the end of the input would.
pub fn parse_operations(content: &str) -> Vec<Operation> {
    let mut operations = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        match parse_operation(line) {
            Some(operation) => operations.push(operation),
            None => {
                warn!(
                    "Trace stops at line {}: expected '<R|W> <hex address>', found '{}'",
                    line_num + 1,
                    line.trim()
                );
                break;
            }
        }
    }

    operations
}

/// Fetch operations from the trace file
pub fn fetch_operations(trace_path: &Path) -> SimulatorResult<Vec<Operation>> {
    let content = std::fs::read_to_string(trace_path)
        .map_err(|e| TraceError::FileReadError(trace_path.into(), e))?;
    Ok(parse_operations(&content))
}

/// Simulate the operations in order, one outcome per operation
pub fn run_trace(
    hierarchy: &mut InclusiveHierarchy,
    operations: &[Operation],
) -> Vec<AccessOutcome> {
    operations
        .iter()
        .map(|(access_type, address)| {
            let outcome = hierarchy.access(*access_type, *address);
            debug!("{:?} {:#010x} -> {}", access_type, address, outcome);
            outcome
        })
        .collect()
}

/// Write one `l1 l2 mem` line per outcome
pub fn write_outcomes(
    output_path: &Path,
    outcomes: &[AccessOutcome],
) -> SimulatorResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_path(output_path)?;

    for outcome in outcomes {
        let [l1, l2, memory] = outcome.codes();
        writer.write_record([l1.to_string(), l2.to_string(), memory.to_string()])?;
    }
    writer.flush()?;

    Ok(())
}

/// Default output path: the trace path with `.out` appended
pub fn default_output_path(trace_path: &Path) -> PathBuf {
    let mut path = trace_path.as_os_str().to_owned();
    path.push(".out");
    PathBuf::from(path)
}

/// Run simulation of the trace file under the given config file
/// and write the outcome file
pub fn run(
    config_path: &Path,
    trace_path: &Path,
    policy: &RunPolicy,
) -> SimulatorResult<RunSummary> {
    // Configuration errors abort before any output exists
    let config = HierarchyConfig::from_path(config_path)?;
    let mut hierarchy = config.build()?;
    info!(
        "L1: {} sets x {} ways, L2: {} sets x {} ways, {}-byte blocks",
        config.l1.num_sets(),
        config.l1.ways(),
        config.l2.num_sets(),
        config.l2.ways(),
        config.l1.block_size
    );

    let operations = fetch_operations(trace_path)?;
    let outcomes = run_trace(&mut hierarchy, &operations);

    let output_path = policy
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(trace_path));
    write_outcomes(&output_path, &outcomes)?;
    info!("Wrote {} outcomes to {}", outcomes.len(), output_path.display());

    hierarchy.verify_inclusion()?;

    let summary = RunSummary::of(&hierarchy, outcomes.len());
    if policy.history {
        eprintln!("[HISTORY] # accesses = {}", summary.accesses);
        eprintln!(
            "[HISTORY] L1: {:?}, miss rate = {:.4}",
            summary.l1,
            summary.l1.get_miss_rate()
        );
        eprintln!(
            "[HISTORY] L2: {:?}, miss rate = {:.4}",
            summary.l2,
            summary.l2.get_miss_rate()
        );
        eprintln!("[HISTORY] memory writes = {}", summary.memory_writes);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulatorError;
    use std::fs;

    #[test]
    fn test_parse_operations() {
        let operations = parse_operations("R 0x10\nw 1F\nW 0XfFfFfFfF\n");
        assert_eq!(
            operations,
            vec![
                (AccessType::Read, 0x10),
                (AccessType::Write, 0x1f),
                (AccessType::Write, 0xffff_ffff),
            ]
        );
    }

    #[test]
    fn test_malformed_line_ends_trace() {
        let content = "R 0x10\nX 0x20\nR 0x30\n";
        assert_eq!(parse_operations(content), vec![(AccessType::Read, 0x10)]);

        let content = "R 0x10\nR zz\nR 0x30\n";
        assert_eq!(parse_operations(content).len(), 1);

        let content = "R 0x10\n\nR 0x30\n";
        assert_eq!(parse_operations(content).len(), 1);

        // Addresses wider than 32 bits are malformed
        assert!(parse_operations("R 0x100000000").is_empty());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("traces/trace.txt")),
            PathBuf::from("traces/trace.txt.out")
        );
    }

    #[test]
    fn test_run_writes_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("cacheconfig.txt");
        let trace_path = dir.path().join("trace.txt");
        // One-block L1 and L2 of 1 KiB each
        fs::write(&config_path, "L1:\n1024\n1\n1\nL2:\n1024\n1\n1\n").unwrap();
        fs::write(&trace_path, "W 0x0\nR 0x0\nR 0x400\nR 0x800\n").unwrap();

        let summary = run(&config_path, &trace_path, &RunPolicy::default()).unwrap();
        assert_eq!(summary.accesses, 4);
        assert_eq!(summary.memory_writes, 1);

        let output = fs::read_to_string(dir.path().join("trace.txt.out")).unwrap();
        assert_eq!(output, "4 4 6\n2 2 5\n2 2 5\n2 2 5\n");
    }

    #[test]
    fn test_run_honours_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config");
        let trace_path = dir.path().join("trace");
        let output_path = dir.path().join("result.txt");
        fs::write(&config_path, "L1: 16 2 1 L2: 16 4 4").unwrap();
        fs::write(&trace_path, "R 0x40\nR 0x40\n").unwrap();

        let policy = RunPolicy { output: Some(output_path.clone()), history: true };
        run(&config_path, &trace_path, &policy).unwrap();
        assert_eq!(fs::read_to_string(output_path).unwrap(), "2 2 5\n1 0 5\n");
    }

    #[test]
    fn test_config_error_produces_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config");
        let trace_path = dir.path().join("trace");
        fs::write(&config_path, "L1: 32 1 1 L2: 64 1 1").unwrap();
        fs::write(&trace_path, "R 0x0\n").unwrap();

        let result = run(&config_path, &trace_path, &RunPolicy::default());
        assert!(matches!(result, Err(SimulatorError::ConfigError(_))));
        assert!(!dir.path().join("trace.out").exists());
    }

    #[test]
    fn test_missing_trace() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config");
        fs::write(&config_path, "L1: 32 1 1 L2: 32 1 1").unwrap();

        let result = run(
            &config_path,
            &dir.path().join("missing"),
            &RunPolicy::default(),
        );
        assert!(matches!(result, Err(SimulatorError::TraceError(_))));
    }
}
