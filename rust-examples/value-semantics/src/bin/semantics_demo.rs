//! Value/reference semantics demo.
//!
//! Runs the copy-then-mutate experiment for each kind, then the fault
//! barrier lesson.
//!
//! ```bash
//! # Every kind
//! cargo run --bin semantics_demo
//!
//! # Only slices and maps, with debug logging
//! cargo run --bin semantics_demo -- --kind dynamic-view --kind mapping -v
//!
//! # Let the risky operation's fault escape
//! cargo run --bin semantics_demo -- --unprotected
//! ```

use anyhow::{Context, Result, bail};
use clap::Parser;
use semantics_common::{Kind, describe_panic};
use tracing::{Level, debug, error};
use value_semantics::faults::{self, BarrierMode};

/// Shows which kinds copy their contents and which share them.
#[derive(Parser)]
#[command(name = "semantics_demo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Kind to demonstrate (repeatable). Defaults to all six.
    #[arg(short, long = "kind", value_name = "KIND")]
    kinds: Vec<Kind>,

    /// Run the fault lesson without its barrier. The process dies.
    #[arg(long)]
    unprotected: bool,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

/// Replaces the default panic message with one carrying the fault
/// descriptor. Faults caught by a barrier are only worth a debug line.
///
/// An unrecovered fault is always written to stderr, whatever `RUST_LOG`
/// filters out.
fn install_fault_hook(unprotected: bool) {
    std::panic::set_hook(Box::new(move |info| {
        let fault = describe_panic(info.payload());
        if unprotected {
            error!(%fault, "unrecovered fault, terminating");
            eprintln!("fatal fault: {fault}");
        } else {
            debug!(%fault, "fault raised");
        }
    }));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    install_fault_hook(cli.unprotected);

    let kinds = if cli.kinds.is_empty() {
        Kind::ALL.to_vec()
    } else {
        cli.kinds
    };

    let mut violated = Vec::new();
    for kind in kinds {
        let lesson = value_semantics::demonstrate(kind)
            .with_context(|| format!("{kind} lesson hit a fault"))?;
        println!("{lesson}");
        if !lesson.holds() {
            violated.push(kind.name());
        }
    }

    let mode = if cli.unprotected {
        BarrierMode::Absent
    } else {
        BarrierMode::Installed
    };
    println!("--- fault barrier ---");
    for line in faults::demonstrate(mode) {
        println!("{line}");
    }

    if !violated.is_empty() {
        bail!("guarantee violated for: {}", violated.join(", "));
    }

    println!("\ndemonstration finished");
    Ok(())
}
