//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim: config validation,
//! the server launcher, batch generation, and the `check` report.

use anyhow::{Context, Result};
use rayon::prelude::*;
use rug::Integer;
use std::time::Duration;
use tracing::{info, warn};
use vanityprime::config::{GeneratorConfig, ServerConfig};
use vanityprime::primality::PrimalityTester;
use vanityprime::shaper::is_well_shaped;
use vanityprime::sieve::{has_small_factor, SMALL_PRIMES};
use vanityprime::{generate_vanity_prime_with, server, Generated};

use super::Cli;

pub fn generator_config(cli: &Cli) -> Result<GeneratorConfig> {
    GeneratorConfig::new(cli.bits, cli.mr_rounds).context("invalid generator configuration")
}

pub fn run_serve(
    generator: GeneratorConfig,
    port: u16,
    timeout_secs: u64,
    max_concurrent: Option<usize>,
    admin_token: Option<&str>,
) -> Result<()> {
    let mut config = ServerConfig::new(port, generator)
        .with_timeout(Duration::from_secs(timeout_secs.max(1)))
        .with_admin_token(admin_token);
    if let Some(n) = max_concurrent {
        config = config.with_max_concurrent(n);
    }
    if !config.exit_enabled() {
        info!("VANITYPRIME_ADMIN_TOKEN not set; exit endpoint disabled");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::run(config))
}

pub fn run_generate(
    generator: &GeneratorConfig,
    vanity: &str,
    count: usize,
    json: bool,
    threads: Option<usize>,
) -> Result<()> {
    configure_rayon(threads);
    info!(
        bits = generator.bits(),
        mr_rounds = generator.mr_rounds(),
        count,
        cores = rayon::current_num_threads(),
        "generating primes"
    );

    let primes: Vec<Generated> = (0..count)
        .into_par_iter()
        .map(|_| generate_vanity_prime_with(generator, vanity, None))
        .collect::<Result<Vec<_>, _>>()
        .context("prime generation failed")?;

    for g in &primes {
        if json {
            let line = serde_json::json!({
                "prime": g.hex(),
                "bits": generator.bits(),
                "mr_rounds": generator.mr_rounds(),
                "stats": g.stats,
                "elapsed_ms": g.elapsed.as_millis() as u64,
            });
            println!("{}", line);
        } else {
            println!("{}", g.hex());
        }
    }
    Ok(())
}

pub fn run_check(generator: &GeneratorConfig, value: &str) -> Result<()> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let n = Integer::from_str_radix(digits, 16)
        .with_context(|| format!("not a hexadecimal integer: {}", value))?;

    let factor = SMALL_PRIMES
        .iter()
        .copied()
        .find(|&q| n.is_divisible_u(q as u32) && n != q);
    let probably_prime = generator.tester().is_probably_prime(&n);

    println!("bits            {}", n.significant_bits());
    println!(
        "well shaped     {} (for {} bits)",
        is_well_shaped(&n, generator.bits()),
        generator.bits()
    );
    match factor {
        Some(q) => println!("small factor    {}", q),
        None if has_small_factor(&n) => println!("small factor    2"),
        None => println!("small factor    none"),
    }
    println!(
        "probably prime  {} ({} rounds)",
        probably_prime,
        generator.mr_rounds()
    );
    Ok(())
}

/// Size the global rayon pool; `None` or 0 keeps rayon's default.
fn configure_rayon(threads: Option<usize>) {
    let num_threads = threads.unwrap_or(0);
    if num_threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            warn!(error = %e, "Could not configure rayon thread pool");
        }
    }
}
