//! Trellis CLI Entry Point

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trellis::{
    create_store, BeaconBase, Config, ImportSummary, Importer, LineStatus, WriteMode,
};

/// Trellis: Research Interview Graph Importer
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop and redefine the graph schema
    Schema {
        /// Confirm dropping every stored object
        #[arg(long)]
        force: bool,
    },
    /// Import a newline-delimited study record file
    Import {
        /// Path to the input file (overrides the configured path)
        input: Option<String>,
        /// Write mode: batched or immediate
        #[arg(short, long)]
        write_mode: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Trellis v{}", env!("CARGO_PKG_VERSION"));

    let config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };
    tracing::info!(
        backend = ?config.store.backend,
        url = %config.store.url,
        "Configuration loaded"
    );

    match args.command {
        Command::Schema { force } => run_schema(config, force).await,
        Command::Import { input, write_mode } => {
            run_import(config, input, write_mode, args.json).await
        }
    }
}

async fn run_schema(config: Config, force: bool) -> anyhow::Result<()> {
    if !force {
        bail!("schema definition drops all stored data; pass --force to confirm");
    }

    let store = create_store(&config)?;
    trellis::schema::define(store.as_ref()).await?;
    println!("Defined {} classes", trellis::schema::classes().len());
    Ok(())
}

async fn run_import(
    mut config: Config,
    input: Option<String>,
    write_mode: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(input) = input {
        config.import.input = input;
    }
    if let Some(mode) = write_mode {
        config.import.write_mode = match mode.as_str() {
            "batched" => WriteMode::Batched,
            "immediate" => WriteMode::Immediate,
            other => bail!("unknown write mode '{}', expected batched or immediate", other),
        };
    }

    let store = create_store(&config)?;
    let importer = Importer::new(
        store,
        config.import.write_mode,
        BeaconBase::new(&config.store.beacon_base),
    );
    let summary = importer.import_file(config.input_path()).await?;
    print_summary(&summary, json);
    Ok(())
}

fn print_summary(summary: &ImportSummary, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(summary).unwrap());
        return;
    }

    println!(
        "Imported {} lines in {}ms: {} succeeded, {} partial, {} failed",
        summary.lines.len(),
        summary.duration_ms,
        summary.succeeded(),
        summary.partial(),
        summary.failed()
    );
    println!(
        "  {} studies, {} pals, {} transcripts, {} nuggets, {} references",
        summary.totals.studies,
        summary.totals.pals,
        summary.totals.transcripts,
        summary.totals.nuggets,
        summary.totals.references
    );
    if summary.totals.missing_pals > 0 {
        println!(
            "  {} transcript pal links skipped (pal not found)",
            summary.totals.missing_pals
        );
    }
    for line in &summary.lines {
        match &line.status {
            LineStatus::Success => {}
            LineStatus::Partial { error } => {
                println!("  line {}: partial ({})", line.line, error)
            }
            LineStatus::Failed { error } => println!("  line {}: failed ({})", line.line, error),
        }
    }
}
