//! WARDEN Admin Audit Log: Demo CLI
//!
//! Runs the marketplace scenarios, or appends to and inspects a configured
//! audit store directly.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- tamper-drill
//!   cargo run -p demo -- --config warden.toml append --admin adminA --action user_ban --target userX --detail reason=spam
//!   cargo run -p demo -- --config warden.toml verify --anchor-seq 3 --anchor-hash 9f2c…

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use warden_audit::{ChainVerifier, LogChain, StoreBackend, WardenConfig};
use warden_contracts::{
    entry::NewEntry,
    error::{WardenError, WardenResult},
    verify::TipAnchor,
};
use warden_ref_marketplace::scenarios::{
    concurrent_burst, moderation_shift, print_trail, tamper_drill,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// WARDEN: tamper-evident audit log for privileged admin actions.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "WARDEN admin audit log demo",
    long_about = "Runs WARDEN marketplace scenarios showing fail-closed admin auditing,\n\
                  tamper detection and concurrent appends, or operates on a\n\
                  configured audit store."
)]
struct Cli {
    /// TOML config selecting the audit store. Required by the store
    /// subcommands, which need a durable backend.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three marketplace scenarios in sequence.
    RunAll,
    /// Scenario 1: Moderation Shift (one entry per admin action).
    ModerationShift,
    /// Scenario 2: Tamper Drill (edits, deletions, forged tip).
    TamperDrill,
    /// Scenario 3: Concurrent Burst (parallel writers, one chain).
    ConcurrentBurst,
    /// Append one entry to the configured store.
    Append(AppendArgs),
    /// Print every stored entry.
    List {
        /// Print full JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Verify the configured store.
    Verify(VerifyArgs),
    /// Print the current tip as an anchor for later `verify`.
    Anchor,
}

#[derive(Args)]
struct AppendArgs {
    #[arg(long)]
    admin: String,
    #[arg(long)]
    action: String,
    #[arg(long)]
    target: Option<String>,
    /// `key=value`; values that parse as JSON are stored as JSON.
    #[arg(long = "detail", value_parser = parse_detail)]
    details: Vec<(String, Value)>,
}

#[derive(Args)]
struct VerifyArgs {
    #[arg(long, requires = "anchor_hash")]
    anchor_seq: Option<u64>,
    #[arg(long, requires = "anchor_seq")]
    anchor_hash: Option<String>,
}

fn parse_detail(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.trim().is_empty() {
        return Err(format!("empty detail key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunAll => {
            print_banner();
            run_all()
        }
        Command::ModerationShift => {
            print_banner();
            moderation_shift::run_scenario()
        }
        Command::TamperDrill => {
            print_banner();
            tamper_drill::run_scenario()
        }
        Command::ConcurrentBurst => {
            print_banner();
            concurrent_burst::run_scenario()
        }
        Command::Append(args) => open_chain(cli.config.as_deref()).and_then(|c| append(&c, args)),
        Command::List { json } => open_chain(cli.config.as_deref()).and_then(|c| list(&c, json)),
        Command::Verify(args) => open_chain(cli.config.as_deref()).and_then(|c| verify(c, args)),
        Command::Anchor => open_chain(cli.config.as_deref()).and_then(|c| anchor(&c)),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> WardenResult<()> {
    moderation_shift::run_scenario()?;
    tamper_drill::run_scenario()?;
    concurrent_burst::run_scenario()?;
    println!("All selected scenarios completed successfully.");
    Ok(())
}

// ── Store commands ────────────────────────────────────────────────────────────

fn open_chain(config: Option<&Path>) -> WardenResult<Arc<LogChain>> {
    Ok(Arc::new(store_config(config)?.open_chain()?))
}

/// Load the config for a store subcommand.
///
/// An in-memory log would vanish when the process exits, so only durable
/// backends are accepted.
fn store_config(path: Option<&Path>) -> WardenResult<WardenConfig> {
    let path = path.ok_or_else(|| WardenError::Config {
        reason: "store subcommands need --config <path> with store.backend = \"jsonl\"".to_string(),
    })?;
    let config = WardenConfig::from_file(path)?;
    if config.store.backend == StoreBackend::Memory {
        return Err(WardenError::Config {
            reason: format!(
                "'{}' selects the in-memory backend; store subcommands need store.backend = \"jsonl\"",
                path.display()
            ),
        });
    }
    Ok(config)
}

fn append(chain: &LogChain, args: AppendArgs) -> WardenResult<()> {
    let mut request = NewEntry::new(args.admin, args.action);
    if let Some(target) = args.target {
        request = request.target(target);
    }
    for (key, value) in args.details {
        request = request.detail(key, value);
    }

    let entry = chain.append(request)?;
    println!("{}", to_json(&entry)?);
    Ok(())
}

fn list(chain: &LogChain, json: bool) -> WardenResult<()> {
    let entries = chain.list()?;
    if json {
        println!("{}", to_json(&entries)?);
    } else if entries.is_empty() {
        println!("  (empty audit log)");
    } else {
        print_trail(&entries);
    }
    Ok(())
}

fn verify(chain: Arc<LogChain>, args: VerifyArgs) -> WardenResult<()> {
    let verifier = ChainVerifier::new(chain);
    let result = match (args.anchor_seq, args.anchor_hash) {
        (Some(sequence), Some(hash)) => verifier.verify_with_anchor(&TipAnchor { sequence, hash })?,
        _ => verifier.verify()?,
    };

    println!("{}", to_json(&result)?);
    // A tampered log is a finding, not a failure to run.
    if !result.valid {
        std::process::exit(2);
    }
    Ok(())
}

fn anchor(chain: &LogChain) -> WardenResult<()> {
    match chain.anchor()? {
        Some(anchor) => println!("{}", to_json(&anchor)?),
        None => println!("  (empty audit log; nothing to anchor)"),
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> WardenResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| WardenError::storage(format!("failed to render JSON: {}", e)))
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("WARDEN — Tamper-evident Admin Audit Log");
    println!("Marketplace Reference Demo");
    println!("=======================================");
    println!();
    println!("Per privileged admin action:");
    println!("  [1] Caller must hold the admin role");
    println!("  [2] Mutation applied to a snapshot-backed state");
    println!("  [3] Entry sealed: SHA-256 over canonical fields + previous hash");
    println!("  [4] Conditional append on the current tip; failure rolls the mutation back");
    println!("  [5] Verifier re-walks the chain and reports the first broken link");
    println!();
}
