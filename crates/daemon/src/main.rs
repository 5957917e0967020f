// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `spd` — the sprite-sync daemon binary.

use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let config_dir = match sp_daemon::env::config_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("spd: {e}");
            return 1;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&config_dir) {
        eprintln!("spd: cannot create {}: {e}", config_dir.display());
        return 1;
    }

    // Structured JSON lines into sp.log; SP_LOG tunes the filter.
    let appender = tracing_appender::rolling::never(&config_dir, "sp.log");
    let (writer, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(sp_daemon::env::log_filter()))
        .with_writer(writer)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("spd: cannot start runtime: {e}");
            return 1;
        }
    };

    match runtime.block_on(sp_daemon::lifecycle::run()) {
        Ok(()) => 0,
        Err(e) => {
            // The socket may already be gone; stderr is all we have left.
            eprintln!("spd: {e}");
            tracing::error!(error = %e, "daemon exited with error");
            1
        }
    }
}
