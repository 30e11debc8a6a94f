//! Office Security Report CLI
//!
//! Renders security reports from a JSON office store without the gateway.
//! Offices that have not been assessed yet are evaluated locally.
//!
//! Usage:
//!   office-report --store data/offices.json --office of-7 --format text
//!   office-report --store data/offices.json --format geojson --output map.geojson

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use perimeter_risk::assessment::current_or_local;
use perimeter_risk::{JsonFileRepository, OfficeRepository, SecurityReport};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Geojson,
}

#[derive(Parser, Debug)]
#[command(name = "office-report", about = "Render office perimeter security reports")]
struct Args {
    /// Path to the offices JSON store
    #[arg(short, long, default_value = "data/offices.json")]
    store: PathBuf,

    /// Only report on this office id
    #[arg(long)]
    office: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write freshly computed assessments back to the store
    #[arg(long)]
    save: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so reports can be piped
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let repo = JsonFileRepository::open(&args.store)?;
    let offices = match &args.office {
        Some(id) => vec![repo.get(id)?],
        None => repo.list()?,
    };
    if offices.is_empty() {
        bail!("No offices in {}", repo.path().display());
    }

    let mut reports = Vec::with_capacity(offices.len());
    for office in &offices {
        let assessment = match current_or_local(office) {
            Ok(record) => {
                if args.save && office.assessment.is_none() {
                    let saved = record.clone();
                    repo.update(&office.id, &mut |o: &mut perimeter_risk::Office| {
                        o.record_assessment(saved.clone());
                        Ok(())
                    })?;
                    info!("Saved assessment for {}", office.id);
                }
                Some(record)
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        };
        reports.push(SecurityReport::build(office, assessment));
    }

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    match args.format {
        Format::Text => {
            for report in &reports {
                writeln!(out, "{}", report)?;
            }
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &reports)?;
            writeln!(out)?;
        }
        Format::Geojson => {
            let features = reports
                .iter()
                .flat_map(|r| r.to_geojson().features)
                .collect();
            let collection = geojson::FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            };
            serde_json::to_writer_pretty(&mut out, &collection)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    info!("Rendered {} report(s)", reports.len());
    Ok(())
}
