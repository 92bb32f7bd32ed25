//! ibc-ratelimit replay
//!
//! Loads a rate limit config, wires the middleware around a logging transfer
//! app with the in-memory quota contract, replays a JSON-lines trace of
//! send/recv/ack/timeout steps, and prints the resulting counters.
//!
//! Usage: `ibc-ratelimit-replay <config.yaml> <trace.jsonl>`
//! Log level comes from `RUST_LOG`.

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use ibc_ratelimit_core::error::{Result, RateLimitError};
use ibc_ratelimit_middleware::{config, replay};

fn run(config_path: &str, trace_path: &str) -> Result<()> {
    let cfg = config::load_from_file(config_path)?;
    let trace = std::fs::read_to_string(trace_path)
        .map_err(|e| RateLimitError::BadMessage(format!("read trace failed: {e}")))?;
    let steps = replay::parse_trace(&trace)?;

    let replayer = replay::Replayer::from_config(&cfg)?;
    tracing::info!(
        steps = steps.len(),
        contract = %cfg.rate_limit.contract_address,
        "ibc-ratelimit-replay starting"
    );

    for (i, outcome) in replayer.run(&steps).iter().enumerate() {
        println!("{:>4} {:?}", i + 1, outcome);
    }
    for event in replayer.events().events() {
        println!("event {} {:?}", event.kind, event.attributes);
    }
    print!("{}", replayer.metrics().render());
    Ok(())
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = std::env::args().collect();
    let [_, config_path, trace_path] = args.as_slice() else {
        eprintln!("usage: ibc-ratelimit-replay <config.yaml> <trace.jsonl>");
        return ExitCode::from(2);
    };

    match run(config_path, trace_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "replay failed");
            ExitCode::FAILURE
        }
    }
}
