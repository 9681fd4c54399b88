use std::env;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "RANKSIM_LOG";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    std::process::exit(ranksim::cli::run_with_args(&args));
}
