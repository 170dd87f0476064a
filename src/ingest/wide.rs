// Reader for exported wide matrices
//
// Inverse of the matrix exporter: first column is the participant id, the
// remaining headers are condition names. Blank cells and literal markers
// come back as missing, never as zero.

use crate::condition::ConditionLabel;
use crate::ingest::{open, parse_number, Result};
use crate::wide::WideMatrix;
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Parse a wide matrix from any reader
pub fn parse_wide_matrix<R: Read>(reader: R) -> Result<WideMatrix> {
    let mut reader = ReaderBuilder::new().from_reader(reader);
    let headers = reader.headers()?.clone();
    let columns: Vec<ConditionLabel> = headers
        .iter()
        .skip(1)
        .map(ConditionLabel::from_header)
        .collect();

    let mut participants = Vec::new();
    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record?;
        participants.push(record.get(0).unwrap_or("").to_string());
        cells.push(record.iter().skip(1).map(parse_number).collect());
    }

    Ok(WideMatrix::from_parts(participants, columns, cells))
}

/// Read a wide matrix CSV from `path`
pub fn read_wide_matrix(path: &Path) -> Result<WideMatrix> {
    parse_wide_matrix(open(path)?)
}
