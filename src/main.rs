use anyhow::{Context, Result};
use chrono::Utc;
use std::env;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_import::{
    file_sha256, read_rows, Classifier, IdGenerator, ImportConfig, ImportEvent, ImportPlan,
    LedgerStore, ReconciliationPipeline, SqliteLedgerStore, TransactionType,
};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_import=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();

    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("import"), Some(config_path)) => run(Path::new(config_path), true),
        (Some("plan"), Some(config_path)) => run(Path::new(config_path), false),
        _ => {
            eprintln!("Usage:");
            eprintln!("   ledger-import import <config.toml>   import into the ledger");
            eprintln!("   ledger-import plan <config.toml>     dry run, nothing is written");
            std::process::exit(2);
        }
    }
}

fn run(config_path: &Path, commit: bool) -> Result<()> {
    println!("📥 Ledger Import v{} - spreadsheet → ledger", ledger_import::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Config
    let config = ImportConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    println!("✓ Config: owner {}, UTC{:+} min", config.owner_uid, config.timezone_offset_minutes);

    // 2. Source rows
    println!("\n📂 Reading {}...", config.source_path.display());
    let rows = read_rows(&config.source_path, config.has_header)?;
    println!("✓ Read {} rows", rows.len());

    // 3. Reference tables
    println!("\n🔧 Opening ledger {}...", config.database_path.display());
    let mut store = SqliteLedgerStore::open(&config.database_path)?;
    let references = store.load_references(config.owner_uid)?;
    println!("✓ References: {}", references.summary());

    // 4. Reconcile
    println!("\n⚖️  Reconciling...");
    let classifier = Classifier::new(config.transfer_categories.iter().cloned());
    let pipeline = ReconciliationPipeline::new(&config, &classifier, &references)?;
    let mut ids = IdGenerator::new(config.server_id);
    let plan = pipeline.run(&rows, &mut ids, Utc::now().timestamp())?;
    print_summary(&plan);

    if !commit {
        println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("✅ Dry run complete: nothing written");
        return Ok(());
    }

    // 5. Commit
    println!("\n💾 Writing {} transactions...", plan.transactions.len());
    let checksum = file_sha256(&config.source_path)?;
    let event = ImportEvent::new(
        config.owner_uid,
        &config.source_path.display().to_string(),
        &checksum,
        &plan.summary,
    )?;
    store
        .commit(config.owner_uid, &plan, &event)
        .context("Import rolled back")?;
    println!("✓ Committed (event {})", event.event_id);

    // 6. Verify
    println!("\n🔍 Verifying ledger...");
    let counts = store.verify_counts(config.owner_uid)?;
    for line in counts.lines() {
        println!("   {}", line);
    }
    println!("   Tag indexes: {}", counts.tag_indexes);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "🎉 Import complete: {} transactions, {} tag indexes",
        plan.summary.transactions, plan.summary.tag_indexes
    );

    Ok(())
}

fn print_summary(plan: &ImportPlan) {
    let summary = &plan.summary;

    println!("✓ Rows: {} total, {} parsed, {} skipped", summary.total_rows, summary.parsed, summary.skipped);
    for (reason, count) in &summary.skipped_by_reason {
        println!("   ⚠️  {}: {}", reason.as_str(), count);
    }

    for tx_type in [
        TransactionType::Income,
        TransactionType::Expense,
        TransactionType::TransferOut,
        TransactionType::TransferIn,
    ] {
        let count = plan
            .transactions
            .iter()
            .filter(|t| t.transaction_type == tx_type)
            .count();
        println!("   {}: {}", tx_type.as_str(), count);
    }

    println!(
        "✓ Transfers: {} rows, {} matched pairs, {} unmatched legs",
        summary.transfer_rows, summary.matched_transfers, summary.unmatched_transfers
    );
    println!("✓ Tag indexes: {}", summary.tag_indexes);
}
