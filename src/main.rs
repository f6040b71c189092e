use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clientbook_tools::extract::LedgerLayout;
use clientbook_tools::io::store::{DirectoryStore, persist_records};
use clientbook_tools::sync::{self, SourceFiles};
use clientbook_tools::{Result, ToolError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Reconcile(args) => execute_reconcile(args),
    }
}

fn execute_reconcile(args: ReconcileArgs) -> Result<()> {
    let files = args.source_files()?;
    if files.is_empty() {
        return Err(ToolError::InvalidWorkbook(
            "no source workbooks given; pass --v2/--v3/--v4/--ledger or --input".to_string(),
        ));
    }

    let layout = match &args.ledger_sheet {
        Some(name) => LedgerLayout::default().with_sheet_name(name.clone()),
        None => LedgerLayout::default(),
    };
    let now = sync::timestamp_now();
    let report = sync::reconcile_files(&files, &layout, &now);

    for failure in &report.failures {
        eprintln!("warning: {} source skipped: {}", failure.kind, failure.error);
    }
    for (kind, count) in &report.parsed {
        info!(%kind, records = count, "source parsed");
    }

    if let Some(path) = &args.csv {
        sync::export_csv(&report.clients, path)?;
    }
    if let Some(path) = &args.xlsx {
        sync::export_xlsx(&report.clients, path)?;
    }
    if let Some(path) = &args.json {
        sync::export_json(&report.clients, path)?;
    }
    if let Some(root) = &args.store {
        let mut store = DirectoryStore::open(root)?;
        let summary = persist_records(&report.clients, &mut store);
        for (key, reason) in &summary.failures {
            warn!(%key, %reason, "document not stored");
        }
        println!("persisted: {summary}");
    }

    println!("reconciled {} clients", report.clients.len());
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile legacy client workbooks into one canonical client list."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse the given workbooks, merge them and write the requested outputs.
    Reconcile(ReconcileArgs),
}

#[derive(clap::Args)]
struct ReconcileArgs {
    /// V2 per-tab client workbook.
    #[arg(long)]
    v2: Option<PathBuf>,

    /// V3 per-tab client workbook.
    #[arg(long)]
    v3: Option<PathBuf>,

    /// V4 per-tab client workbook.
    #[arg(long)]
    v4: Option<PathBuf>,

    /// Master accounting ledger workbook.
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Workbooks whose source is detected from the file name.
    #[arg(long = "input", num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Name of the ledger sheet, when it differs from the default.
    #[arg(long)]
    ledger_sheet: Option<String>,

    /// Write the flat export as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the flat export as an XLSX workbook.
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Write the canonical records as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Directory receiving one JSON document per client.
    #[arg(long)]
    store: Option<PathBuf>,
}

impl ReconcileArgs {
    fn source_files(&self) -> Result<SourceFiles> {
        let mut files = SourceFiles::default();
        for path in &self.inputs {
            files.assign(path.clone())?;
        }
        let explicit = [
            (&self.v2, &mut files.v2),
            (&self.v3, &mut files.v3),
            (&self.v4, &mut files.v4),
            (&self.ledger, &mut files.ledger),
        ];
        for (arg, slot) in explicit {
            if let Some(path) = arg {
                *slot = Some(path.clone());
            }
        }
        Ok(files)
    }
}
