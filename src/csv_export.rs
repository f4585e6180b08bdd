#![forbid(unsafe_code)]

//! CSV output of exported rows.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;

use crate::details::{COLUMNS, VideoRecord};
use crate::error::Result;

/// `youtube_export_YYYYmmdd_HHMMSS.csv` for the given instant.
pub fn default_output_name(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("youtube_export_{}.csv", now.format("%Y%m%d_%H%M%S")))
}

/// Writes the header and one row per record. The header is written even when
/// `records` is empty.
pub fn write_records<W: Write>(writer: W, records: &[VideoRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for record in records {
        csv_writer.write_record(record.to_row())?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv(path: &Path, records: &[VideoRecord]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_records(file, records)?;
    info!("wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
