//! Implementation of `rs-numbers` subcommand.
//!
//! Writes one row per VCF record with the identifiers, no annotation or
//! genotype expansion.

use std::io::Write;

use noodles_vcf as vcf;
use thousands::Separable;

use crate::common::{self, io::open_read_maybe_gz, CHROM_WIDTH};
use crate::convert::{check_table_name, record::VariantRecord};
use crate::sql::{BatchWriter, Column, TableSchema, Value};

/// Command line arguments for `rs-numbers` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "convert VCF identifiers to SQL script", long_about = None)]
pub struct Args {
    /// Path to input VCF file, may be gzip compressed.
    pub path_in: String,
    /// Path to output SQL file, the extension is forced to `.sql`.
    pub path_out: String,
    /// Remove an existing output file without waiting.
    #[arg(short, long)]
    pub force: bool,
    /// Seconds to wait before removing an existing output file.
    #[arg(long, default_value_t = 10)]
    pub grace_secs: u64,
    /// Number of rows per INSERT statement.
    #[arg(long, default_value_t = 1_000)]
    pub batch_size: usize,
    /// Name of the table; derived from output file name by default.
    #[arg(long)]
    pub table_name: Option<String>,
}

pub fn build_schema(table: &str) -> TableSchema {
    TableSchema {
        name: table.to_string(),
        columns: vec![
            Column::new("chrom", "CHAR(2)"),
            Column::new("pos", "INT"),
            Column::new("ref", "TEXT"),
            Column::new("alt", "TEXT"),
            Column::new("rs_number", "TEXT"),
        ],
    }
}

/// Write one row per record; returns records read and rows written.
pub fn process_records<I, W>(
    records: I,
    writer: &mut BatchWriter<W>,
) -> Result<(usize, usize), anyhow::Error>
where
    I: IntoIterator<Item = Result<VariantRecord, anyhow::Error>>,
    W: Write,
{
    let mut count_records = 0;
    let mut count_rows = 0;
    for record in records {
        let record = record?;
        count_records += 1;
        if record.chrom.len() > CHROM_WIDTH {
            tracing::warn!(
                "skipping record {} with chromosome {}",
                count_records.separate_with_commas(),
                &record.chrom
            );
            continue;
        }

        let alt = record.alternatives.join(",");
        let values = [
            Value::Text(&record.chrom),
            Value::Integer(record.pos as i64),
            Value::Text(&record.reference),
            Value::Text(&alt),
            Value::Text(record.id.as_deref().unwrap_or_default()),
        ];
        count_rows += 1;
        if writer.push_row(&values)? {
            tracing::debug!(
                "wrote {} rows to SQL",
                writer.summary().rows.separate_with_commas()
            );
        }
    }
    Ok((count_records, count_rows))
}

/// Main entry point for `rs-numbers` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    let path_out = common::sql_output_path(&args.path_out);
    let table_name = match &args.table_name {
        Some(table_name) => table_name.clone(),
        None => common::table_name_from_path(&path_out)?,
    };
    check_table_name(&table_name)?;

    let mut input_reader = open_read_maybe_gz(&args.path_in)
        .map_err(|e| anyhow::anyhow!("could not open input file {}: {}", &args.path_in, e))
        .map(vcf::Reader::new)?;
    let input_header = input_reader
        .read_header()
        .map_err(|e| anyhow::anyhow!("problem reading VCF header: {}", e))?;

    common::remove_existing_output(
        &path_out,
        args.force,
        std::time::Duration::from_secs(args.grace_secs),
    )?;

    let mut writer = BatchWriter::new(
        common::io::open_write(&path_out)?,
        build_schema(&table_name),
        args.batch_size,
    )?;
    writer.write_schema(&[])?;

    let records = input_reader.records(&input_header).map(|record| {
        record
            .map(|record| VariantRecord::site_from_vcf(&record))
            .map_err(|e| anyhow::anyhow!("problem reading VCF record: {}", e))
    });
    let (count_records, count_rows) = process_records(records, &mut writer)?;
    let (_, summary) = writer.finish(&[])?;

    tracing::info!(
        "wrote {} of {} records with {} INSERT statements",
        count_rows.separate_with_commas(),
        count_records.separate_with_commas(),
        summary.inserts.separate_with_commas()
    );
    tracing::info!(
        "All of `rs-numbers` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
