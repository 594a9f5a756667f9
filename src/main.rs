use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pinscraper::{
    config::normalize_iso, logging::init_logging, DatasetKind, DatasetService, Settings,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about = "Humanitarian needs-assessment ETL: workbooks → canonical snapshots")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and store pin/history/severity snapshots
    Precompute {
        /// Countries to process (default: every config in the config dir)
        #[arg(long = "country")]
        countries: Vec<String>,
        /// Delete existing snapshots first
        #[arg(long)]
        force: bool,
    },
    /// Load one dataset (through the cache) and print it
    Show {
        country: String,
        /// pin | history | severity
        kind: DatasetKind,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Print rows as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Print the configured sectors for a country
    Sectors { country: String },
    /// Delete cached snapshots for a country (all kinds unless given)
    Invalidate {
        country: String,
        kind: Option<DatasetKind>,
    },
}

fn main() -> Result<()> {
    init_logging("info,pinscraper=info");
    let cli = Cli::parse();
    let service = DatasetService::from_settings(&cli.settings);

    match cli.command {
        Command::Precompute { countries, force } => {
            info!(cache = %cli.settings.cache_dir.display(), force, "precompute");
            let summary = service.precompute(&countries, force)?;
            for c in &summary.countries {
                match &c.skipped {
                    Some(why) => println!("{}: skipped ({})", c.country, why),
                    None => {
                        for (kind, outcome) in &c.datasets {
                            println!("{} {:<8} {}", c.country, kind.as_str(), outcome);
                        }
                    }
                }
            }
            if summary.failed() > 0 {
                error!(failed = summary.failed(), "some datasets failed");
            }
        }
        Command::Show {
            country,
            kind,
            limit,
            json,
        } => {
            let table = service
                .load_dataset(&country, kind)
                .with_context(|| format!("loading {} for {}", kind, normalize_iso(&country)))?;
            if json {
                for row in table.to_json_rows().into_iter().take(limit) {
                    println!("{}", serde_json::to_string(&row)?);
                }
            } else {
                println!("{}", table.column_names().join(" | "));
                for row in table.rows().take(limit) {
                    let cells: Vec<String> = table
                        .columns()
                        .iter()
                        .map(|c| match (row.number(&c.name), row.text(&c.name)) {
                            (Some(n), _) => n.to_string(),
                            (None, Some(t)) => t.to_string(),
                            (None, None) => String::new(),
                        })
                        .collect();
                    println!("{}", cells.join(" | "));
                }
            }
            info!(rows = table.len(), shown = limit.min(table.len()), "done");
        }
        Command::Sectors { country } => {
            for sector in service.get_sectors(&country)? {
                println!("{}", sector);
            }
        }
        Command::Invalidate { country, kind } => {
            let kinds: Vec<DatasetKind> = match kind {
                Some(k) => vec![k],
                None => DatasetKind::ALL.to_vec(),
            };
            let mut removed = 0;
            for k in kinds {
                if service.cache().invalidate(&country, k)? {
                    removed += 1;
                }
            }
            if removed == 0 {
                bail!("no snapshots found for {}", normalize_iso(&country));
            }
            println!("removed {} snapshot(s) for {}", removed, normalize_iso(&country));
        }
    }
    Ok(())
}
