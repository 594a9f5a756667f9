use anyhow::{Context, Result};
use clap::Parser;
use parquet::file::metadata::RowGroupMetaData;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{fs::File, path::PathBuf};

/// Print a snapshot's key-value metadata, columns and row groups.
#[derive(Parser)]
#[command(author, version, about = "Inspect a pinscraper Parquet snapshot")]
struct Args {
    /// Path to a `<ISO>/{pin,hist,sev}.parquet` snapshot
    path: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let file = File::open(&args.path).with_context(|| format!("opening {}", args.path.display()))?;
    let reader = SerializedFileReader::new(file).context("reading Parquet footer")?;
    let meta = reader.metadata();
    let file_meta = meta.file_metadata();

    println!("=== Snapshot: {} ===", args.path.display());
    println!("Created by:     {}", file_meta.created_by().unwrap_or("<unknown>"));
    println!("Rows:           {}", file_meta.num_rows());
    println!("Row groups:     {}", meta.num_row_groups());
    println!(
        "Size on disk:   {} bytes",
        std::fs::metadata(&args.path)?.len()
    );
    println!();

    println!("=== Metadata ===");
    for kv in file_meta.key_value_metadata().into_iter().flatten() {
        // the embedded Arrow schema is binary noise here
        if kv.key == "ARROW:schema" {
            continue;
        }
        println!("{:<24} {}", kv.key, kv.value.as_deref().unwrap_or(""));
    }
    println!();

    println!("=== Columns ===");
    for col in file_meta.schema_descr().columns() {
        let logical = col
            .logical_type()
            .as_ref()
            .map_or("<none>".to_string(), |lt| format!("{:?}", lt));
        println!(
            "- {:<30} | Physical: {:<10} | Logical: {}",
            col.name(),
            format!("{:?}", col.physical_type()),
            logical
        );
    }
    println!();

    for idx in 0..meta.num_row_groups() {
        print_row_group(idx, meta.row_group(idx));
    }
    Ok(())
}

fn print_row_group(idx: usize, rg: &RowGroupMetaData) {
    println!("--- Row Group {} ({} rows) ---", idx, rg.num_rows());
    for col in rg.columns() {
        let nulls = col
            .statistics()
            .and_then(|s| s.null_count_opt())
            .map_or("?".to_string(), |n| n.to_string());
        println!(
            "  {:<30} {:?}, {} bytes compressed, {} nulls",
            col.column_descr().name(),
            col.compression(),
            col.compressed_size(),
            nulls
        );
    }
    println!();
}
