use std::path::PathBuf;

use crate::run_wrapper::RunPolicy;

xflags::xflags! {
    /// Two-level (L1/L2) cache hierarchy simulator.
    cmd CacheSimArgs {
        /// Path to the cache configuration file.
        required config: PathBuf

        /// Path to the memory trace file.
        required trace: PathBuf

        /// Where to write the access states, `<trace>.out` by default.
        optional -o, --output path: PathBuf

        /// Prints hit/miss counts and memory writes after simulation.
        optional --stats

        /// Enables verbose mode, logging every access and eviction.
        /// Largely used for debugging purposes.
        optional -v, --verbose
    }
}

impl From<&CacheSimArgs> for RunPolicy {
    fn from(args: &CacheSimArgs) -> Self {
        RunPolicy { output: args.output.clone(), history: args.stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CacheSimArgs::from_vec(vec![
            "cacheconfig.txt".into(),
            "trace.txt".into(),
            "--stats".into(),
            "-o".into(),
            "out.txt".into(),
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("cacheconfig.txt"));
        assert!(args.stats);
        assert!(!args.verbose);

        let policy = RunPolicy::from(&args);
        assert_eq!(policy.output, Some(PathBuf::from("out.txt")));
        assert!(policy.history);
    }

    #[test]
    fn test_missing_trace_is_rejected() {
        assert!(CacheSimArgs::from_vec(vec!["cacheconfig.txt".into()]).is_err());
    }
}
