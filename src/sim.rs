use std::process;

use log::LevelFilter;
use sim_lib::flags::CacheSimArgs;
use sim_lib::run_wrapper::{self, RunPolicy};

fn main() {
    let args = CacheSimArgs::from_env_or_exit();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let policy = RunPolicy::from(&args);
    if let Err(e) = run_wrapper::run(&args.config, &args.trace, &policy) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
