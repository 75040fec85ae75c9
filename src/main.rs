//! Disk LRU - command-line access to a cache file
//!
//! # Usage
//! ```text
//! disk_lru get KEY
//! disk_lru put KEY VALUE
//! disk_lru delete KEY
//! disk_lru contains KEY
//! disk_lru purge THRESHOLD_US
//! disk_lru purge-older-than SECONDS
//! disk_lru clear | len | keys | stats
//! ```
//!
//! The cache file and limits come from `DISK_LRU_*` environment variables.

use std::env;
use std::process::ExitCode;

use anyhow::{bail, Context};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use disk_lru::{CacheConfig, DiskLruCache};

const USAGE: &str = "usage: disk_lru <get KEY | put KEY VALUE | delete KEY | contains KEY | \
purge THRESHOLD_US | purge-older-than SECONDS | clear | len | keys | stats>";

fn main() -> ExitCode {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "disk_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: path={}, max_entries={}, pool_size={}",
        config.path.display(),
        config.max_entries,
        config.pool_size
    );

    let cache = DiskLruCache::with_config(config).context("failed to open cache")?;
    let result = execute(&cache, args);
    cache.close();
    result
}

fn execute(cache: &DiskLruCache, args: &[String]) -> anyhow::Result<()> {
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
    match argv.as_slice() {
        ["get", key] => match cache.get(key)? {
            Some(value) => println!("{}", value),
            None => bail!("key not found: {}", key),
        },
        ["put", key, value] => cache.put(key, value)?,
        ["delete", key] => {
            let removed = cache.delete(key)?;
            println!("{}", if removed { "deleted" } else { "absent" });
        }
        ["contains", key] => println!("{}", cache.contains(key)?),
        ["purge", threshold] => {
            let threshold: i64 = threshold
                .parse()
                .with_context(|| format!("invalid threshold: {}", threshold))?;
            println!("{}", cache.purge(threshold)?);
        }
        ["purge-older-than", seconds] => {
            let cutoff = cutoff_for_age(seconds, Utc::now())?;
            println!("{}", cache.purge_older_than(cutoff)?);
        }
        ["clear"] => println!("{}", cache.clear()?),
        ["len"] => println!("{}", cache.len()?),
        ["keys"] => {
            for key in cache.keys()? {
                println!("{}", key);
            }
        }
        ["stats"] => {
            let stats = cache.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        _ => bail!(USAGE),
    }
    Ok(())
}

/// Instant `seconds` before `now`. Negative ages are rejected.
fn cutoff_for_age(seconds: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    let seconds: i64 = seconds
        .parse()
        .with_context(|| format!("invalid age in seconds: {}", seconds))?;
    if seconds < 0 {
        bail!("age must not be negative: {}", seconds);
    }
    TimeDelta::try_seconds(seconds)
        .and_then(|age| now.checked_sub_signed(age))
        .with_context(|| format!("age out of range: {}", seconds))
}
