//! # credence CLI entry point
//!
//! Parses arguments, configures logging from `-v` and dispatches to the
//! subcommand handlers in the library.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use credence_cli::documents::{run_sign, run_verify, SignArgs, VerifyArgs};
use credence_cli::keys::{run_did, run_keygen, DidArgs, KeygenArgs};

/// Credence offline toolchain.
///
/// Generates Ed25519 keys, derives `did:key` identifiers, and signs and
/// verifies credential and presentation JSON without a running service.
#[derive(Parser, Debug)]
#[command(name = "credence", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 key pair.
    Keygen(KeygenArgs),
    /// Print the did:key for a public key.
    Did(DidArgs),
    /// Sign an unsigned credential or presentation.
    Sign(SignArgs),
    /// Verify a credential or presentation offline.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::Did(args) => run_did(args),
        Commands::Sign(args) => run_sign(args),
        Commands::Verify(args) => run_verify(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
