use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use extrato_core::{AccountId, DateRange, Money, StatementEntry, UserId};
use extrato_import::{
    find_batch_duplicates, MatchOutcome, ReconcileEngine, StatementFormat,
};

#[derive(Parser)]
#[command(name = "extrato", about = "Statement ingestion and ledger reconciliation")]
struct Cli {
    /// Path to the ledger database.
    #[arg(long, global = true, default_value = "extrato.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a statement file and print the canonical entries.
    Decode {
        file: PathBuf,
        /// Statement format: ofx, csv, xml or cnab.
        #[arg(long)]
        format: String,
    },
    /// Classify a statement against the recorded ledger.
    Reconcile {
        file: PathBuf,
        #[arg(long)]
        format: String,
        #[arg(long)]
        user: i64,
        /// Restrict matching to one account.
        #[arg(long)]
        account: Option<i64>,
        /// Date tolerance in days (0 = exact day).
        #[arg(long, default_value_t = 0)]
        window: i64,
    },
    /// Book the not-found entries of a statement into an account.
    Import {
        file: PathBuf,
        #[arg(long)]
        format: String,
        #[arg(long)]
        user: i64,
        #[arg(long)]
        account: i64,
        #[arg(long, default_value_t = 0)]
        window: i64,
    },
    /// Create an account to import into.
    AddAccount {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        name: String,
        /// Opening balance in cents.
        #[arg(long, default_value_t = 0)]
        balance: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Decode { file, format } => {
            let entries = decode_file(&file, &format)?;
            print_entries(&entries);
            warn_duplicates(&entries);
        }
        Command::Reconcile {
            file,
            format,
            user,
            account,
            window,
        } => {
            let entries = decode_file(&file, &format)?;
            let pool = extrato_storage::create_db(&cli.db).await?;
            let report = reconcile(
                &pool,
                UserId(user),
                account.map(AccountId),
                window,
                &entries,
            )
            .await?;
            for (entry, outcome) in entries.iter().zip(&report.outcomes) {
                println!("{}  {}", describe(entry), describe_outcome(outcome));
            }
            let s = report.summary;
            println!(
                "\n{} matched, {} ambiguous, {} to import",
                s.matched, s.ambiguous, s.not_found
            );
        }
        Command::Import {
            file,
            format,
            user,
            account,
            window,
        } => {
            let entries = decode_file(&file, &format)?;
            warn_duplicates(&entries);
            let pool = extrato_storage::create_db(&cli.db).await?;
            let user = UserId(user);
            let account = AccountId(account);

            let report = reconcile(&pool, user, Some(account), window, &entries).await?;
            let to_import: Vec<StatementEntry> = report
                .not_found_indexes()
                .into_iter()
                .map(|i| entries[i].clone())
                .collect();

            if to_import.is_empty() {
                println!("nothing to import: every entry is already recorded or ambiguous");
                return Ok(());
            }

            let outcome = extrato_storage::import_entries(&pool, user, account, &to_import)
                .await
                .context("import aborted, no entries were booked")?;
            println!(
                "booked {} entries (ledger ids: {:?})",
                outcome.imported, outcome.created_ids
            );
        }
        Command::AddAccount { user, name, balance } => {
            let pool = extrato_storage::create_db(&cli.db).await?;
            let account = extrato_storage::create_account(
                &pool,
                UserId(user),
                &name,
                Money::from_cents(balance),
            )
            .await?;
            println!("created account {} ({})", account.id, account.name);
        }
    }

    Ok(())
}

fn decode_file(path: &Path, format: &str) -> Result<Vec<StatementEntry>> {
    let format: StatementFormat = format.parse()?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let entries = extrato_import::decode(format, &content)
        .with_context(|| format!("decoding {} as {format}", path.display()))?;
    Ok(entries)
}

async fn reconcile(
    pool: &extrato_storage::DbPool,
    user: UserId,
    account: Option<AccountId>,
    window: i64,
    entries: &[StatementEntry],
) -> Result<extrato_import::ReconcileReport> {
    let Some(range) = DateRange::covering(entries.iter().map(|e| e.date), window) else {
        bail!("statement decoded to zero entries");
    };
    let ledger = extrato_storage::read_ledger_transactions(pool, user, account, &range).await?;
    Ok(ReconcileEngine::new(window).reconcile(entries, &ledger))
}

fn print_entries(entries: &[StatementEntry]) {
    for entry in entries {
        println!("{}", describe(entry));
    }
    println!("\n{} entries decoded", entries.len());
}

fn describe(entry: &StatementEntry) -> String {
    let doc = entry
        .document_ref
        .as_deref()
        .map(|d| format!(" [{d}]"))
        .unwrap_or_default();
    format!(
        "{}  {:>12}  {:7}  {}{}",
        entry.date, entry.amount.to_string(), entry.direction.to_string(), entry.description, doc
    )
}

fn describe_outcome(outcome: &MatchOutcome) -> String {
    match outcome {
        MatchOutcome::Matched { ledger_id } => format!("= ledger #{ledger_id}"),
        MatchOutcome::Ambiguous { candidate_ids } => {
            format!("? candidates {candidate_ids:?}")
        }
        MatchOutcome::NotFound => "+ new".to_string(),
    }
}

fn warn_duplicates(entries: &[StatementEntry]) {
    for (i, j) in find_batch_duplicates(entries) {
        tracing::warn!(
            "entries {} and {} share date, amount and direction; the bank may have exported a duplicate",
            i + 1,
            j + 1
        );
    }
}
