//! Implementation of `convert` subcommand.

use std::io::Write;

use noodles_vcf as vcf;
use thousands::Separable;

use crate::common::{self, io::open_read_maybe_gz, CHROM_WIDTH};
use crate::sql::{migrate, BatchWriter, Column, TableSchema};

pub mod annotation;
pub mod codes;
pub mod genotype;
pub mod header;
pub mod record;
pub mod row;

use codes::CodeTables;
use header::Metadata;
use record::{VariantRecord, VcfKeys};
use row::{Deduplicator, OutputRow, CORE_COLUMNS};

/// Command line arguments for `convert` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "convert annotated VCF to SQL script", long_about = None)]
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
    #[arg(long, default_value_t = 10_000)]
    pub batch_size: usize,
    /// Name of the table; derived from output file name by default.
    #[arg(long)]
    pub table_name: Option<String>,
    /// INFO key of the per-transcript annotation.
    #[arg(long, default_value = "CSQ")]
    pub info_key: String,
    /// FORMAT key of the confidence flag; value 0 marks low confidence.
    #[arg(long, default_value = "FI")]
    pub confidence_key: String,
    /// Also create and seed the `symbols` and `consequences` tables.
    #[arg(long)]
    pub seed_reference_tables: bool,
    /// Maximal number of variants to process; optional.
    #[arg(long)]
    pub max_var_count: Option<usize>,
}

/// Column types of the fixed columns, same order as `CORE_COLUMNS`.
const CORE_TYPES: &[&str] = &[
    "VARCHAR(2)",
    "INT",
    "TEXT",
    "TEXT",
    "TEXT",
    "TEXT",
    "INT[]",
    "TEXT",
    "TEXT",
    "TEXT",
    "TEXT",
];

/// Build the table schema: fixed columns, then one text column per sample.
pub fn build_schema(table: &str, samples: &[String]) -> TableSchema {
    let mut columns = CORE_COLUMNS
        .iter()
        .zip(CORE_TYPES.iter())
        .map(|(name, sql_type)| Column::new(name, sql_type))
        .collect::<Vec<_>>();
    columns.extend(samples.iter().map(|name| Column::quoted(name, "TEXT")));
    TableSchema {
        name: table.to_string(),
        columns,
    }
}

/// Ensure `name` can be used unquoted as table name.
pub fn check_table_name(name: &str) -> Result<(), anyhow::Error> {
    let valid_start = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        anyhow::bail!("invalid table name {:?}", name);
    }
    Ok(())
}

/// Counters collected while processing variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Records read from the input.
    pub records: usize,
    /// Records skipped because of their chromosome name.
    pub skipped: usize,
    /// Rows passed to the writer.
    pub rows: usize,
    /// Annotation rows dropped as duplicates.
    pub duplicates: usize,
}

/// Process the variants from `records` into `writer`.
///
/// The writer must have emitted its schema already.
pub fn process_variants<I, W>(
    records: I,
    metadata: &Metadata,
    codes: &CodeTables,
    writer: &mut BatchWriter<W>,
    max_var_count: Option<usize>,
) -> Result<Counters, anyhow::Error>
where
    I: IntoIterator<Item = Result<VariantRecord, anyhow::Error>>,
    W: Write,
{
    let expander = annotation::Expander::new(metadata.indexes, codes);
    let mut counters = Counters::default();

    for record in records {
        let record = record?;
        counters.records += 1;

        if record.chrom.len() > CHROM_WIDTH {
            tracing::warn!(
                "skipping record {} at {}:{}, chromosome name is longer than {} characters",
                counters.records.separate_with_commas(),
                &record.chrom,
                record.pos,
                CHROM_WIDTH
            );
            counters.skipped += 1;
        } else if let Some(payload) = record.annotations.as_ref() {
            let genotypes = genotype::AlleleMap::new(&record).encode_all(&record);
            let mut dedup = Deduplicator::new();
            for entry in expander.expand(payload) {
                match dedup.accept(OutputRow::new(&record, entry, &genotypes)) {
                    Some(row) => {
                        counters.rows += 1;
                        if writer.push_row(&row.values())? {
                            tracing::debug!(
                                "wrote {} rows, {} variants processed",
                                writer.summary().rows.separate_with_commas(),
                                counters.records.separate_with_commas()
                            );
                        }
                    }
                    None => counters.duplicates += 1,
                }
            }
        }

        if let Some(max_var_count) = max_var_count {
            if counters.records >= max_var_count {
                tracing::warn!(
                    "Stopping after {} records as requested by --max-var-count",
                    counters.records
                );
                break;
            }
        }
    }

    Ok(counters)
}

/// Main entry point for `convert` sub command.
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
    let codes = CodeTables::new()?;
    let keys = VcfKeys::new(&args.info_key, &args.confidence_key)?;

    tracing::info!("opening input file...");
    let mut input_reader = open_read_maybe_gz(&args.path_in)
        .map_err(|e| anyhow::anyhow!("could not open input file {}: {}", &args.path_in, e))
        .map(vcf::Reader::new)?;
    let input_header = input_reader
        .read_header()
        .map_err(|e| anyhow::anyhow!("problem reading VCF header: {}", e))?;
    let metadata = Metadata::from_header(&input_header, &args.info_key)
        .map_err(|e| anyhow::anyhow!("problem with annotation header: {}", e))?;
    tracing::info!(
        "{} samples, {} annotation fields",
        metadata.samples.len(),
        metadata.format.len()
    );
    tracing::debug!("field indexes = {:?}", &metadata.indexes);

    common::remove_existing_output(
        &path_out,
        args.force,
        std::time::Duration::from_secs(args.grace_secs),
    )?;

    tracing::info!("writing {:?} into table {}", &path_out, &table_name);
    let mut writer = BatchWriter::new(
        common::io::open_write(&path_out)?,
        build_schema(&table_name, &metadata.samples),
        args.batch_size,
    )?;
    let reference = migrate::ReferenceTables::default();
    let seed = if args.seed_reference_tables {
        reference.seed_statements(&codes.consequences)
    } else {
        Vec::new()
    };
    writer.write_schema(&seed)?;

    let start = std::time::Instant::now();
    let records = input_reader.records(&input_header).map(|record| {
        record
            .map_err(|e| anyhow::anyhow!("problem reading VCF record: {}", e))
            .and_then(|record| VariantRecord::from_vcf(&record, &keys))
    });
    let counters = process_variants(records, &metadata, &codes, &mut writer, args.max_var_count)?;
    common::trace_rss_now();

    let migration = migrate::Migration::new(&table_name, reference);
    let (_, summary) = writer.finish(&migration.statements())?;
    tracing::info!(
        "... processed {} records ({} skipped) into {} rows ({} duplicates dropped) \
         with {} INSERT statements in {:?}",
        counters.records.separate_with_commas(),
        counters.skipped.separate_with_commas(),
        summary.rows.separate_with_commas(),
        counters.duplicates.separate_with_commas(),
        summary.inserts.separate_with_commas(),
        start.elapsed()
    );

    tracing::info!(
        "All of `convert` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
