//! `openhours`: decode, encode, normalise and compare opening-hours schedules.
//!
//! - `openhours decode "Mo-Fr 09:00-18:00; PH off" [--table]`
//! - `openhours encode schedule.json` (or `-` for stdin)
//! - `openhours normalize "Mo,Tu,We 09:00-18:00" [--periods]`
//! - `openhours compare "Mo-Fr 09:00-18:00" @reference.json [--json]`

use std::fs;
use std::io::{self, Read};

use anyhow::Context;
use clap::{Parser, Subcommand};
use openhours_core::model::DEFAULT_TIMEZONE;
use openhours_core::{
    Metadata, ScheduleDocument, compare, decode_with_metadata, encode, encode_periods, schema,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod display;

#[derive(Parser)]
#[command(name = "openhours")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Timezone recorded in decoded documents
    #[arg(long, global = true, env = "OPENHOURS_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode an OSM opening_hours string and print the schedule
    Decode {
        osm: String,

        /// Print one row per slot instead of JSON
        #[arg(long)]
        table: bool,

        /// Place identifier stored in the document metadata
        #[arg(long)]
        place_id: Option<String>,
    },

    /// Encode a JSON schedule document to OSM
    Encode {
        /// Path to the JSON document, or `-` for stdin
        input: String,
    },

    /// Decode then re-encode an OSM string
    Normalize {
        osm: String,

        /// Show the fragment produced for each period
        #[arg(long)]
        periods: bool,
    },

    /// Compare two schedules; each side is an OSM string or `@path.json`
    Compare {
        left: String,
        right: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let metadata = Metadata {
        timezone: cli.timezone,
        ..Metadata::default()
    };

    match cli.command {
        Command::Decode {
            osm,
            table,
            place_id,
        } => {
            let metadata = Metadata {
                place_id: place_id.unwrap_or_default(),
                ..metadata
            };
            let doc = decode_with_metadata(&osm, metadata);
            if table {
                let batch = schema::to_record_batch(&doc).context("building slot table")?;
                arrow::util::pretty::print_batches(&[batch])?;
            } else {
                println!("{}", doc.to_json_pretty()?);
            }
        }
        Command::Encode { input } => {
            let json = read_input(&input)?;
            let doc = ScheduleDocument::from_json(&json)
                .with_context(|| format!("parsing schedule document {input}"))?;
            println!("{}", encode(&doc));
        }
        Command::Normalize { osm, periods } => {
            let doc = decode_with_metadata(&osm, metadata);
            if periods {
                display::print_periods_card(&encode_periods(&doc));
            } else {
                println!("{}", encode(&doc));
            }
        }
        Command::Compare { left, right, json } => {
            let left_doc = load_side(&left, &metadata)?;
            let right_doc = load_side(&right, &metadata)?;
            let result = compare(&left_doc, &right_doc);
            info!(identical = result.identical, "comparison finished");
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                display::print_comparison_card(&left, &right, &result);
            }
        }
    }

    Ok(())
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading schedule from stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(input).with_context(|| format!("reading {input}"))
}

/// `@path.json` loads a JSON document; anything else is decoded as OSM.
fn load_side(arg: &str, metadata: &Metadata) -> anyhow::Result<ScheduleDocument> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let json = read_input(path)?;
            ScheduleDocument::from_json(&json)
                .with_context(|| format!("parsing schedule document {path}"))
        }
        None => Ok(decode_with_metadata(arg, metadata.clone())),
    }
}
