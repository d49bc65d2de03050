use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use dtl_contract::{DataTokenContract, Function, Response};
use dtl_crypto::fingerprint_public_key;
use dtl_store::{
    is_composite_key, split_composite_key, InMemoryLedger, SnapshotEntry, StaticContext, TxContext,
};
use dtl_types::{NewAccountRequest, TxTimestamp};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(state) = cli.state {
        config.state_path = state;
    }
    match cli.command {
        Command::Invoke(args) => cmd_invoke(&config, &cli.format, &args.function, &args.args),
        Command::Account(args) => cmd_account(&config, &cli.format, args.action),
        Command::State(args) => cmd_state(&config, &cli.format, args.action),
        Command::Functions => cmd_functions(&cli.format),
    }
}

/// Result of one invocation, as reported to the user.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub tx_id: String,
    pub timestamp: TxTimestamp,
    pub function: String,
    pub response: Response,
    /// Ledger height after commit; `None` when nothing was committed.
    pub height: Option<u64>,
}

/// Run one invocation in its own transaction against the state file.
///
/// The transaction commits, and the file is rewritten, only when the call
/// succeeds and buffered at least one write.
pub fn execute(config: &CliConfig, function: &str, args: &[String]) -> anyhow::Result<Outcome> {
    let ledger = InMemoryLedger::load(&config.state_path)
        .with_context(|| format!("loading state {}", config.state_path.display()))?;
    let ctx = context(config)?;
    let tx_id = ctx.tx_id().to_string();
    let timestamp = ctx.timestamp();

    let tx = ledger.begin();
    let response = DataTokenContract::with_config(&tx, ctx, config.contract.clone())
        .invoke(function, args);

    let height = if response.is_ok() && tx.pending_writes()? > 0 {
        let height = tx.commit()?;
        ledger
            .save(&config.state_path)
            .with_context(|| format!("saving state {}", config.state_path.display()))?;
        tracing::info!(tx = %tx_id, function, height, "committed");
        Some(height)
    } else {
        tx.rollback();
        None
    };

    Ok(Outcome {
        tx_id,
        timestamp,
        function: function.to_string(),
        response,
        height,
    })
}

fn context(config: &CliConfig) -> anyhow::Result<StaticContext> {
    let mut ctx = StaticContext::new(Uuid::now_v7().to_string(), TxTimestamp::now());
    if let Some(path) = &config.public_key_file {
        let fingerprint = fingerprint_public_key(&read_text(path)?)
            .with_context(|| format!("fingerprinting {}", path.display()))?;
        tracing::debug!(caller = %fingerprint.short_id(), "caller fingerprint");
        ctx = ctx.with_fingerprint(fingerprint);
    }
    Ok(ctx)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn payload_value(payload: &[u8]) -> Value {
    if payload.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(payload)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(payload).into_owned()))
}

fn display_time(ts: TxTimestamp) -> String {
    chrono::DateTime::from_timestamp(ts.seconds, ts.nanos)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.seconds.to_string())
}

fn report(outcome: Outcome, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "txId": outcome.tx_id,
                "time": display_time(outcome.timestamp),
                "function": outcome.function,
                "status": outcome.response.status,
                "message": outcome.response.message,
                "payload": payload_value(&outcome.response.payload),
                "height": outcome.height,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text if outcome.response.is_ok() => {
            println!(
                "{} {}  {}",
                "✓".green().bold(),
                outcome.function.bold(),
                outcome.tx_id.dimmed()
            );
            println!("  Time: {}", display_time(outcome.timestamp));
            match outcome.height {
                Some(height) => println!("  Committed at height {}", height.to_string().yellow()),
                None => println!("  {}", "read only".dimmed()),
            }
            let payload = payload_value(&outcome.response.payload);
            if !payload.is_null() {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
        }
        OutputFormat::Text => {}
    }
    if !outcome.response.is_ok() {
        anyhow::bail!("{} failed: {}", outcome.function, outcome.response.message);
    }
    Ok(())
}

fn cmd_invoke(
    config: &CliConfig,
    format: &OutputFormat,
    function: &str,
    args: &[String],
) -> anyhow::Result<()> {
    report(execute(config, function, args)?, format)
}

fn cmd_account(
    config: &CliConfig,
    format: &OutputFormat,
    action: AccountAction,
) -> anyhow::Result<()> {
    let (function, args) = account_invocation(action)?;
    report(execute(config, function.name(), &args)?, format)
}

/// Translate an account subcommand into a contract invocation.
fn account_invocation(action: AccountAction) -> anyhow::Result<(Function, Vec<String>)> {
    Ok(match action {
        AccountAction::Create { name, password, token, org, account_type, public_key } => {
            let public_key = match public_key {
                Some(path) => read_text(&path)?.trim().to_string(),
                None => String::new(),
            };
            let request = NewAccountRequest {
                name,
                password,
                account_type,
                org_name: org,
                public_key,
                token,
            };
            (Function::CreateAccount, vec![serde_json::to_string(&request)?])
        }
        AccountAction::Show { name } => (Function::ShowAccount, vec![name]),
        AccountAction::Freeze { name, thaw } => {
            (Function::FreezeAccount, vec![name, (!thaw).to_string()])
        }
    })
}

/// One committed key, split into its index and attributes when composite.
#[derive(Debug, Serialize)]
struct KeyEntry {
    index: Option<String>,
    attributes: Vec<String>,
    key: String,
    version: u64,
    value: Value,
}

fn key_entry(entry: SnapshotEntry) -> KeyEntry {
    let (index, attributes) = if is_composite_key(&entry.key) {
        match split_composite_key(&entry.key) {
            Ok((index, attributes)) => (Some(index), attributes),
            Err(_) => (None, Vec::new()),
        }
    } else {
        (None, Vec::new())
    };
    KeyEntry {
        index,
        attributes,
        key: entry.key.replace('\u{0}', "\\0"),
        version: entry.version,
        value: payload_value(entry.value.as_bytes()),
    }
}

fn cmd_state(config: &CliConfig, format: &OutputFormat, action: StateAction) -> anyhow::Result<()> {
    let ledger = InMemoryLedger::load(&config.state_path)
        .with_context(|| format!("loading state {}", config.state_path.display()))?;
    let snapshot = ledger.snapshot()?;

    match action {
        StateAction::Info => match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "height": snapshot.height, "keys": snapshot.entries.len() })
            ),
            OutputFormat::Text => {
                println!("State: {}", config.state_path.display().to_string().bold());
                println!("  Height: {}", snapshot.height.to_string().yellow());
                println!("  Keys: {}", snapshot.entries.len());
            }
        },
        StateAction::Dump { index } => {
            let entries: Vec<KeyEntry> = snapshot
                .entries
                .into_iter()
                .map(key_entry)
                .filter(|e| index.is_none() || e.index == index)
                .collect();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
                OutputFormat::Text => {
                    for e in &entries {
                        let label = match &e.index {
                            Some(index) => format!("{} {}", index.cyan(), e.attributes.join("/")),
                            None => e.key.clone(),
                        };
                        println!("{}  {}", label, format!("v{}", e.version).dimmed());
                        println!("  {}", e.value);
                    }
                    if entries.is_empty() {
                        println!("No keys.");
                    }
                }
            }
        }
    }
    Ok(())
}

fn cmd_functions(format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let listing: Vec<Value> = Function::ALL
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "name": f.name(),
                        "arity": f.arity(),
                        "mutating": f.is_mutating(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputFormat::Text => {
            for f in Function::ALL {
                let kind = if f.is_mutating() { "write".yellow() } else { "read".green() };
                println!("{} {} arg(s)  {}", format!("{:<20}", f.name()).bold(), f.arity(), kind);
            }
        }
    }
    Ok(())
}
