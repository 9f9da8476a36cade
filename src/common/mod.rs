//! Common functionality.

use std::path::{Path, PathBuf};

use byte_unit::{Byte, UnitType};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Helper to print the current memory resident set size via `tracing`.
pub fn trace_rss_now() {
    let rss = procfs::process::Process::myself()
        .and_then(|me| me.stat())
        .map(|stat| stat.rss * procfs::page_size());
    match rss {
        Ok(rss) => tracing::debug!(
            "RSS now: {:.2}",
            Byte::from_u64(rss).get_appropriate_unit(UnitType::Binary)
        ),
        Err(e) => tracing::trace!("could not determine RSS: {}", e),
    }
}

/// Width of the `chrom` column.
pub const CHROM_WIDTH: usize = 2;

/// Output scripts always carry this extension.
pub const SQL_EXTENSION: &str = "sql";

/// Force the `.sql` extension onto `path`.
pub fn sql_output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if path.extension().and_then(|ext| ext.to_str()) == Some(SQL_EXTENSION) {
        path.to_path_buf()
    } else {
        path.with_extension(SQL_EXTENSION)
    }
}

/// Derive the table name from the output file name.
///
/// Uses the file name up to the first `.`, with `-` replaced by `_`.
pub fn table_name_from_path<P: AsRef<Path>>(path: P) -> Result<String, anyhow::Error> {
    let file_name = path
        .as_ref()
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("cannot derive table name from {:?}", path.as_ref()))?;
    let stem = file_name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        anyhow::bail!("cannot derive table name from {:?}", path.as_ref());
    }
    Ok(stem.replace('-', "_"))
}

/// Remove a pre-existing file at `path`.
///
/// Without `force`, waits `grace` first so the user can still cancel.
pub fn remove_existing_output(
    path: &Path,
    force: bool,
    grace: std::time::Duration,
) -> Result<(), anyhow::Error> {
    if !path.exists() {
        return Ok(());
    }
    if force {
        tracing::info!("output file {:?} already exists, removing...", path);
    } else {
        tracing::warn!(
            "output file {:?} exists, removing in {:?}; Ctrl+C to cancel, use --force to skip waiting",
            path,
            grace
        );
        std::thread::sleep(grace);
    }
    std::fs::remove_file(path)
        .map_err(|e| anyhow::anyhow!("could not remove output file {:?}: {}", path, e))
}
