//! # Main — CLI Entry Point
//!
//! Routes subcommands to the generator and the HTTP service. Handles shared
//! concerns: `.env` loading, structured logging, and validation of the
//! deployment-wide generator settings.
//!
//! ## Subcommands
//!
//! - `serve`: run the HTTP service.
//! - `generate`: print one or more primes (in parallel on a Rayon pool).
//! - `check`: run the sieve and primality test on a given hex value.
//!
//! ## Global Options
//!
//! - `--bits` / `VANITYPRIME_BITS`: bit-length of every generated prime (default 1024).
//! - `--mr-rounds` / `VANITYPRIME_MR_ROUNDS`: Miller–Rabin rounds (default and minimum 20).

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use vanityprime::config::{DEFAULT_BITS, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use vanityprime::primality::DEFAULT_ROUNDS;

#[derive(Parser)]
#[command(name = "vanityprime", about = "Generate large random probable primes")]
struct Cli {
    /// Bit length of generated primes, fixed for the deployment
    #[arg(long, env = "VANITYPRIME_BITS", default_value_t = DEFAULT_BITS)]
    bits: u32,

    /// Miller-Rabin rounds for primality testing (minimum 20)
    #[arg(long, env = "VANITYPRIME_MR_ROUNDS", default_value_t = DEFAULT_ROUNDS)]
    mr_rounds: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP prime service
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Per-request generation budget in seconds
        #[arg(long, env = "VANITYPRIME_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,
        /// Maximum concurrent searches (defaults to logical cores)
        #[arg(long, env = "VANITYPRIME_MAX_CONCURRENT")]
        max_concurrent: Option<usize>,
        /// Bearer token enabling the exit endpoint (disabled when unset)
        #[arg(long, env = "VANITYPRIME_ADMIN_TOKEN", hide_env_values = true)]
        admin_token: Option<String>,
    },
    /// Generate primes and print them as lowercase hex, one per line
    Generate {
        /// Vanity string (accepted, does not constrain the output)
        #[arg(long, default_value = "")]
        vanity: String,
        /// Number of primes to generate
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Emit one JSON object per prime, with search statistics
        #[arg(long)]
        json: bool,
        /// Number of rayon worker threads (defaults to all logical cores)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Report sieve and primality verdicts for a hex value
    Check {
        /// Value in hexadecimal, optional 0x prefix
        value: String,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for container log collectors, human-readable otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let generator = cli::generator_config(&cli)?;

    match &cli.command {
        Commands::Serve {
            port,
            timeout_secs,
            max_concurrent,
            admin_token,
        } => cli::run_serve(
            generator,
            *port,
            *timeout_secs,
            *max_concurrent,
            admin_token.as_deref(),
        ),
        Commands::Generate {
            vanity,
            count,
            json,
            threads,
        } => cli::run_generate(&generator, vanity, *count, *json, *threads),
        Commands::Check { value } => cli::run_check(&generator, value),
    }
}
