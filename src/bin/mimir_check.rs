//! mimir-check: verify caching end to end.
//!
//! Loads configuration, calls a counting operation several times through an
//! interceptor and reports whether every call after the first was served
//! from cache.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Parser;
use tracing::info;

use mimir::{CacheSettings, Config, HashedKeyGenerator, MemoryCache, Mimir, OperationCall};

/// Mimir cache self-check.
#[derive(Parser)]
#[command(name = "mimir-check")]
#[command(version)]
#[command(about = "Check that mimir caches operation results")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "MIMIR_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Number of calls to make.
    #[arg(short, long, default_value_t = 2)]
    runs: u32,

    /// Use hashed argument keys.
    #[arg(long)]
    hashed_keys: bool,
}

/// Operation whose result changes on every real invocation.
struct Counter {
    value: AtomicU64,
}

impl Counter {
    fn increment_and_return(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialise tracing (default: mimir=info; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mimir=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    info!(defaults = ?config.defaults, "configuration loaded");

    let engine = Arc::new(MemoryCache::new());
    let mut builder = Mimir::builder().backend(engine.clone()).config(&config);
    if args.hashed_keys {
        builder = builder.key_generator(Arc::new(HashedKeyGenerator::new()));
    }
    let cache = builder.build()?;

    let counter = Counter {
        value: AtomicU64::new(0),
    };
    let call = OperationCall::on(&counter, "increment_and_return").build();
    let settings = CacheSettings::new().no_expiration();

    let mut results = Vec::with_capacity(args.runs as usize);
    for run in 1..=args.runs {
        let value: u64 = cache.call(&call, &settings, || counter.increment_and_return())?;
        println!("call {run}: {value}");
        results.push(value);
    }

    let invocations = counter.value.load(Ordering::SeqCst);
    let stats = engine.stats();
    println!(
        "real invocations: {invocations}, namespaces: {}",
        stats.namespaces
    );

    if results.windows(2).all(|pair| pair[0] == pair[1]) && invocations <= 1 {
        println!("caching works");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("caching is NOT working");
        Ok(ExitCode::FAILURE)
    }
}
