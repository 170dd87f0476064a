// Questionnaire sheet reader
//
// One row per participant, one column per question and condition. Headers
// are long literal question texts that may carry stray whitespace or
// non-breaking spaces, so lookups tolerate both.

use crate::ingest::{open, parse_number, IngestError, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Participant id columns tried in order
pub const DEFAULT_ID_COLUMNS: &[&str] = &["参与者编号", "ID"];

const NBSP: char = '\u{a0}';

/// Header plus string rows of a questionnaire export
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionnaireSheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl QuestionnaireSheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parse a sheet from any reader; short rows are padded with blanks
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    /// Read the sheet at `path`; a sheet without rows is an error
    pub fn read(path: &Path) -> Result<Self> {
        let sheet = Self::parse(open(path)?)?;
        if sheet.rows.is_empty() {
            return Err(IngestError::Empty(path.display().to_string()));
        }
        tracing::info!(
            path = %path.display(),
            rows = sheet.rows.len(),
            columns = sheet.headers.len(),
            "loaded questionnaire"
        );
        Ok(sheet)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Locate a column by name
    ///
    /// Exact match on trimmed headers first, then a match with every NBSP
    /// replaced by a plain space on both sides.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        if let Some(i) = self.headers.iter().position(|h| h.trim() == wanted) {
            return Some(i);
        }
        let wanted = wanted.replace(NBSP, " ");
        let wanted = wanted.trim();
        self.headers
            .iter()
            .position(|h| h.replace(NBSP, " ").trim() == wanted)
    }

    /// Raw cell text
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Numeric value of `name` in `row`; `None` if the column is absent or
    /// the cell does not parse
    pub fn numeric(&self, row: usize, name: &str) -> Option<f64> {
        self.find_column(name)
            .and_then(|col| parse_number(self.cell(row, col)))
    }

    /// Participant id per row
    ///
    /// Uses the first of `id_columns` present in the sheet; rows without an
    /// id column (or with a blank id) get their 1-based row number.
    pub fn participant_ids(&self, id_columns: &[String]) -> Vec<String> {
        let id_col = id_columns.iter().find_map(|name| self.find_column(name));
        if id_col.is_none() {
            tracing::warn!("no participant id column found; using row numbers");
        }

        (0..self.rows.len())
            .map(|row| {
                let id = id_col.map(|col| self.cell(row, col).trim()).unwrap_or("");
                if id.is_empty() {
                    (row + 1).to_string()
                } else {
                    id.to_string()
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_column_trims_headers() {
        let sheet = QuestionnaireSheet::new(ids(&[" Nausea ", "Headache"]), vec![]);
        assert_eq!(sheet.find_column("Nausea"), Some(0));
        assert_eq!(sheet.find_column("Headache "), Some(1));
        assert_eq!(sheet.find_column("Sweating"), None);
    }

    #[test]
    fn test_find_column_nbsp_tolerant() {
        let header = "AUDITORY FEEDBACK:\u{a0}How helpful was this feedback mode?";
        let sheet = QuestionnaireSheet::new(ids(&[header]), vec![]);
        // Plain space in the query, NBSP in the header
        assert_eq!(
            sheet.find_column("AUDITORY FEEDBACK: How helpful was this feedback mode?"),
            Some(0)
        );
        // NBSP in the query, plain space in the header
        let sheet = QuestionnaireSheet::new(
            ids(&["AUDITORY FEEDBACK: How helpful was this feedback mode?"]),
            vec![],
        );
        assert_eq!(sheet.find_column(header), Some(0));
    }

    #[test]
    fn test_numeric_coerces_bad_cells() {
        let csv = "ID,Nausea,Headache\n1,2,\n2,n/a,3\n";
        let sheet = QuestionnaireSheet::parse(csv.as_bytes()).unwrap();
        assert_eq!(sheet.numeric(0, "Nausea"), Some(2.0));
        assert_eq!(sheet.numeric(0, "Headache"), None);
        assert_eq!(sheet.numeric(1, "Nausea"), None);
        assert_eq!(sheet.numeric(1, "Missing column"), None);
    }

    #[test]
    fn test_participant_ids_preferred_column() {
        let csv = "ID,参与者编号,Nausea\n9, p01 ,1\n8,p02,2\n";
        let sheet = QuestionnaireSheet::parse(csv.as_bytes()).unwrap();
        let id_columns = ids(DEFAULT_ID_COLUMNS);
        assert_eq!(sheet.participant_ids(&id_columns), vec!["p01", "p02"]);
    }

    #[test]
    fn test_participant_ids_fallback_to_row_number() {
        let csv = "Nausea\n1\n2\n3\n";
        let sheet = QuestionnaireSheet::parse(csv.as_bytes()).unwrap();
        assert_eq!(
            sheet.participant_ids(&ids(DEFAULT_ID_COLUMNS)),
            vec!["1", "2", "3"]
        );
    }

    #[test]
    fn test_short_rows_padded() {
        let csv = "ID,Nausea,Headache\n1,2\n";
        let sheet = QuestionnaireSheet::parse(csv.as_bytes()).unwrap();
        assert_eq!(sheet.cell(0, 2), "");
        assert_eq!(sheet.numeric(0, "Headache"), None);
    }
}
