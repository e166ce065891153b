//! fwsync - declarative iptables/ipset state synchronizer
//!
//! Reads a JSON task list and converges the kernel's packet-filter state
//! onto it: ordered rule chains via minimal-diff reconciliation, unordered
//! address sets via set difference, plus unconditional init operations for
//! tables, chains and sets.
//!
//! # Usage
//!
//! ```bash
//! fwsync -c config.json            # Reconcile IPv4 state
//! fwsync -c config.json -6         # Reconcile IPv6 state (ip6tables/ipset inet6)
//! fwsync -c config.json --debug    # Echo every issued command
//! ```
//!
//! # Behavior
//!
//! - A configuration that fails to load or parse aborts the run before any
//!   mutation is issued.
//! - A failed iptables/ipset operation is reported as a JSON diagnostic and
//!   the run continues; re-running converges to the declared state.

mod config;
mod core;

use clap::Parser;
use crate::core::backend::AddressFamily;
use crate::core::error::Diagnostic;
use crate::core::iptables::IptablesBackend;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fwsync")]
#[command(about = "Declarative iptables/ipset state synchronizer", long_about = None)]
struct Cli {
    /// Path to the JSON task-list configuration
    #[arg(short = 'c', long, default_value = "config.json", value_name = "FILE")]
    config_file: PathBuf,

    /// Reconcile IPv6 state (ip6tables, ipset family inet6) instead of IPv4
    #[arg(short = '6', long)]
    ipv6: bool,

    /// Echo every issued command at debug level
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            Diagnostic::error(format!("Failed to create runtime: {e}")).emit();
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Diagnostic::error(e.to_string()).emit();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> crate::core::error::Result<()> {
    // Configuration errors are fatal before any mutation
    let run_config = config::load_config(&cli.config_file).await?;

    if !nix::unistd::getuid().is_root() {
        Diagnostic::warning("Not running as root; iptables/ipset mutations will likely be rejected")
            .emit();
    }

    let family = if cli.ipv6 {
        AddressFamily::Inet6
    } else {
        AddressFamily::Inet
    };
    let mut backend = IptablesBackend::new(family).with_command_echo(cli.debug);

    crate::core::engine::run(&mut backend, &run_config.task_list).await
}
