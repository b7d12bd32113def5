//! locking-server: the ticket/inventory HTTP API over an in-memory store.
//!
//! ```text
//! locking-server --addr 127.0.0.1:8080 --demo-delays
//! ```

use std::process;
use std::time::Duration;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use locking_rust::{http, seed, DelayProfile, Engine, EngineConfig, DEFAULT_LOCK_TIMEOUT};

fn build_cli() -> Command {
    Command::new("locking-server")
        .about("Optimistic vs pessimistic locking demo over HTTP")
        .arg(
            Arg::new("addr")
                .long("addr")
                .value_name("HOST:PORT")
                .default_value("0.0.0.0:8080")
                .help("Address to listen on"),
        )
        .arg(
            Arg::new("lock-timeout-ms")
                .long("lock-timeout-ms")
                .value_name("MILLIS")
                .value_parser(value_parser!(u64))
                .help("How long a booking waits for a ticket lock (default 3000)"),
        )
        .arg(
            Arg::new("demo-delays")
                .long("demo-delays")
                .action(ArgAction::SetTrue)
                .help("Pause inside operations to widen race windows (5s update, 1s reduce, 2s book)"),
        )
        .arg(
            Arg::new("no-seed")
                .long("no-seed")
                .action(ArgAction::SetTrue)
                .help("Start with an empty store"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("info")
                .help("Log verbosity"),
        )
}

fn config_from(matches: &ArgMatches) -> EngineConfig {
    let lock_timeout = matches
        .get_one::<u64>("lock-timeout-ms")
        .map(|ms| Duration::from_millis(*ms))
        .unwrap_or(DEFAULT_LOCK_TIMEOUT);
    let delays = if matches.get_flag("demo-delays") {
        DelayProfile::demo()
    } else {
        DelayProfile::none()
    };

    EngineConfig::default()
        .with_lock_timeout(lock_timeout)
        .with_delays(delays)
}

fn init_tracing(matches: &ArgMatches) {
    let level = matches
        .get_one::<String>("log-level")
        .and_then(|l| l.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_tracing(&matches);

    let config = config_from(&matches);
    tracing::info!(
        lock_timeout = ?config.lock_timeout,
        delays = ?config.delays,
        "starting locking-server"
    );
    let engine = Engine::in_memory(config);

    if !matches.get_flag("no-seed") {
        if let Err(e) = seed(&engine) {
            tracing::error!(error = %e, "failed to seed sample data");
            process::exit(1);
        }
    }

    let addr = matches
        .get_one::<String>("addr")
        .cloned()
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());
    if let Err(e) = http::serve(engine, &addr).await {
        tracing::error!(error = %e, addr = %addr, "server stopped");
        process::exit(1);
    }
}
