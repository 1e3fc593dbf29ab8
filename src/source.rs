// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Delimited-text source — turns the website CSV into records.
//!
//! ```text
//! website_name,category,country,launch_year,...,rating   <- header, discarded
//! Example,Search,US,1998,1000000,alice,...,5             <- one record
//! "Acme, Inc.",Retail,DE,2004,...                        <- quoted commas stay in one field
//! ,,,,,,,,,                                              <- dropped
//! ```
//!
//! Malformed rows (wrong column count, any empty column, undecodable bytes,
//! an unterminated quote) are dropped one line at a time, never reported as
//! errors. Fields are stored trimmed.

use std::path::Path;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{SiteError, Result};
use crate::record::Record;

/// Parse CSV bytes into records, in file order.
///
/// The input is split on `\n` first and every line is read as one CSV record,
/// so quoting works within a line but an unterminated quote only costs its own
/// row. Fields are trimmed and a whitespace-only field counts as empty. Lines
/// that are not valid UTF-8 are dropped.
pub fn parse(data: impl AsRef<[u8]>) -> Vec<Record> {
    let mut records = Vec::new();
    let mut dropped = 0usize;

    // Line 1 is the header.
    for (idx, line) in data.as_ref().split(|&b| b == b'\n').enumerate().skip(1) {
        let line_no = idx + 1;
        let row = match read_line(line) {
            None => continue,
            Some(Ok(r)) => r,
            Some(Err(e)) => {
                debug!(line = line_no, error = %e, "Dropping undecodable row");
                dropped += 1;
                continue;
            }
        };
        let columns: Vec<&str> = row.iter().collect();
        match Record::from_columns(Uuid::new_v4(), columns.as_slice()) {
            Some(record) => records.push(record),
            None => {
                debug!(line = line_no, columns = columns.len(), "Dropping malformed row");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        info!(kept = records.len(), dropped, "Parsed website source");
    }
    records
}

/// Read a single line as one CSV record. `None` for a blank line.
fn read_line(line: &[u8]) -> Option<std::result::Result<csv::StringRecord, csv::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line);
    reader.into_records().next()
}

/// Read the whole source file. This is the only step that suspends.
pub async fn fetch(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SiteError::Source(format!("Cannot read {}: {e}", path.display())))
}
