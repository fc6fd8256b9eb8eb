//! Statement file reading
//!
//! Statements are header-less CSV files with five positional fields:
//! date, name, debit, credit, running balance.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::TransactionRecord;

const FIELD_COUNT: usize = 5;

/// Statement files in `dir`, in directory-listing order.
///
/// Hidden files and subdirectories are skipped. The order is whatever the
/// filesystem returns; it is deliberately not sorted.
pub fn list_statements(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !entry.file_type()?.is_file() {
            debug!("Skipping {}", entry.path().display());
            continue;
        }
        paths.push(entry.path());
    }

    Ok(paths)
}

/// Read every row of a statement file.
///
/// The outer error means the whole file is unusable; inner errors are
/// per-row and leave the other rows intact.
pub fn read_statement(path: &Path) -> Result<Vec<Result<TransactionRecord>>> {
    let file = File::open(path).map_err(|e| Error::FileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_statement(file).map_err(|e| Error::FileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Parse statement rows from any reader
pub fn parse_statement<R: Read>(reader: R) -> Result<Vec<Result<TransactionRecord>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let line = index + 1;
        match result {
            Ok(record) => rows.push(parse_row(&record, line)),
            Err(e) if e.is_io_error() => return Err(Error::Csv(e)),
            Err(e) => rows.push(Err(Error::MalformedRow(format!("line {}: {}", line, e)))),
        }
    }

    Ok(rows)
}

fn parse_row(record: &StringRecord, line: usize) -> Result<TransactionRecord> {
    if record.len() != FIELD_COUNT {
        return Err(Error::MalformedRow(format!(
            "line {}: expected {} fields, found {}",
            line,
            FIELD_COUNT,
            record.len()
        )));
    }

    let malformed = |reason: String| Error::MalformedRow(format!("line {}: {}", line, reason));

    let date = parse_date(&record[0]).map_err(malformed)?;
    // Verbatim: banks pad names and the category cache stores them padded
    let name = record[1].to_string();
    let debit = parse_amount(&record[2]).map_err(malformed)?;
    let credit = parse_amount(&record[3]).map_err(malformed)?;
    let running_balance = parse_amount(&record[4]).map_err(malformed)?;

    Ok(TransactionRecord {
        date,
        name,
        debit,
        credit,
        running_balance,
        category: None,
    })
}

/// Parse a statement date in any of the accepted formats
pub fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d",  // 2024-01-15
        "%m/%d/%y",  // 01/15/24, tried first since %Y also accepts two digits
        "%m/%d/%Y",  // 01/15/2024
        "%m-%d-%Y",  // 01-15-2024
        "%d/%m/%Y",  // 15/01/2024 (European)
        "%b %d, %Y", // Jan 15, 2024
        "%d-%b-%Y",  // 15-Jan-2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(format!("Unable to parse date: {}", s))
}

/// Parse an amount cell, handling currency symbols, commas and parentheses.
///
/// An empty cell or `NaN` means no amount.
pub fn parse_amount(s: &str) -> std::result::Result<Option<f64>, String> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }

    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(Some(amount)),
        _ => Err(format!("Unable to parse amount: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-15").unwrap(), date(2024, 1, 15));
        assert_eq!(parse_date("01/15/2024").unwrap(), date(2024, 1, 15));
        assert_eq!(parse_date("01/15/24").unwrap(), date(2024, 1, 15));
        assert_eq!(parse_date("Jan 15, 2024").unwrap(), date(2024, 1, 15));
        assert_eq!(parse_date("15-Jan-2024").unwrap(), date(2024, 1, 15));
        assert_eq!(parse_date(" 2023-12-25 ").unwrap(), date(2023, 12, 25));
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), Some(1234.56));
        assert_eq!(parse_amount("(50.00)").unwrap(), Some(-50.0));
        assert_eq!(parse_amount("45.20").unwrap(), Some(45.2));
        assert_eq!(parse_amount("").unwrap(), None);
        assert_eq!(parse_amount("  ").unwrap(), None);
        assert_eq!(parse_amount("NaN").unwrap(), None);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_parse_statement_rows() {
        let data = "\
2023-07-15,FORTINOS,45.20,,1000.00
2023-01-02,PAYROLL DEPOSIT,,2500.00,3500.00
";
        let rows = parse_statement(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.date, date(2023, 7, 15));
        assert_eq!(first.name, "FORTINOS");
        assert_eq!(first.debit, Some(45.2));
        assert_eq!(first.credit, None);
        assert_eq!(first.running_balance, Some(1000.0));
        assert!(first.category.is_none());

        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.debit, None);
        assert_eq!(second.credit, Some(2500.0));
    }

    #[test]
    fn test_bad_rows_do_not_poison_file() {
        let data = "\
not-a-date,FORTINOS,45.20,,
2023-07-15,TOO,FEW
2023-07-16,NOFRILLS,12.00,,
2023-07-17,MYSTERY,abc,,
";
        let rows = parse_statement(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(matches!(rows[0], Err(Error::MalformedRow(_))));
        assert!(matches!(rows[1], Err(Error::MalformedRow(_))));
        assert_eq!(rows[2].as_ref().unwrap().name, "NOFRILLS");
        assert!(matches!(rows[3], Err(Error::MalformedRow(_))));
    }

    #[test]
    fn test_quoted_names_with_commas() {
        let data = "07/15/2023,\"AMZN MKTP CA, SEATTLE\",$21.99,,\n";
        let rows = parse_statement(data.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.name, "AMZN MKTP CA, SEATTLE");
        assert_eq!(row.debit, Some(21.99));
    }

    #[test]
    fn test_padded_names_are_kept() {
        let data = "2023-03-01,ACCT BAL REBATE     ,,5.00,\n";
        let rows = parse_statement(data.as_bytes()).unwrap();
        assert_eq!(rows[0].as_ref().unwrap().name, "ACCT BAL REBATE     ");
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_statement(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, Error::FileUnreadable { .. }));
    }

    #[test]
    fn test_list_statements_skips_hidden_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.csv", "b.csv", ".hidden.csv"] {
            let mut f = File::create(dir.path().join(name)).unwrap();
            writeln!(f, "2023-07-15,X,1.00,,").unwrap();
        }
        fs::create_dir(dir.path().join("archive")).unwrap();

        let mut names: Vec<String> = list_statements(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }
}
