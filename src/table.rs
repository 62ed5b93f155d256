use crate::error::PlotError;
use log::{debug, warn};
use serde::Deserialize;
use std::path::Path;

/// How the cells of the data columns are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    Decimal,
    Hex,
}

/// A column selected either by position or by its cleaned header.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

/// The csv content, kept as text per column and parsed on demand.
#[derive(Debug, Clone)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub columns: Vec<Vec<String>>,
}

impl DataTable {
    /// Reads a csv with a header row, cleaning the header names with the given rules.
    /// Rows with a different number of fields than the header are an error.
    pub fn from_csv(fin: &Path, cleanup_rules: &[String]) -> Result<DataTable, PlotError> {
        let csv_err = |source| PlotError::Csv {
            path: fin.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(fin)
            .map_err(csv_err)?;
        let raw_headers = reader.headers().map_err(csv_err)?.clone();
        let headers: Vec<String> = raw_headers
            .iter()
            .map(|h| clean_header(h, cleanup_rules))
            .collect();
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            for (column, cell) in columns.iter_mut().zip(record.iter()) {
                column.push(cell.to_string());
            }
        }
        let table = DataTable { headers, columns };
        table.warn_duplicates();
        debug!(
            "loaded {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            fin.display()
        );
        Ok(table)
    }

    /// number of rows
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn warn_duplicates(&self) {
        for (i, h) in self.headers.iter().enumerate() {
            if self.headers[..i].contains(h) {
                warn!("duplicate column name '{}' after header cleanup", h);
            }
        }
    }

    /// Maps the selection to absolute column indices.
    /// Indices count from `first_data_column`, names match the cleaned headers.
    /// An empty selection takes every column from `first_data_column` on.
    pub fn resolve_columns(
        &self,
        selection: &[ColumnRef],
        first_data_column: usize,
    ) -> Result<Vec<usize>, PlotError> {
        let data_headers = self.headers.get(first_data_column..).unwrap_or(&[]);
        let count = data_headers.len();
        if selection.is_empty() {
            return Ok((first_data_column..first_data_column + count).collect());
        }
        selection
            .iter()
            .map(|c| match c {
                ColumnRef::Index(i) if *i < count => Ok(first_data_column + i),
                ColumnRef::Index(i) => Err(PlotError::ColumnIndexOutOfRange { index: *i, count }),
                ColumnRef::Name(name) => data_headers
                    .iter()
                    .position(|h| h == name)
                    .map(|p| first_data_column + p)
                    .ok_or_else(|| PlotError::UnknownColumn {
                        name: name.clone(),
                        available: data_headers.join(", "),
                    }),
            })
            .collect()
    }

    /// Parses a column to f64, unparsable cells become NAN.
    pub fn numeric_column(&self, idx: usize, format: ValueFormat) -> Vec<f64> {
        let mut invalid = 0usize;
        let values: Vec<f64> = self.columns[idx]
            .iter()
            .map(|cell| {
                let parsed = match format {
                    ValueFormat::Decimal => cell.parse::<f64>().ok(),
                    ValueFormat::Hex => parse_hex(cell).map(|v| v as f64),
                };
                parsed.unwrap_or_else(|| {
                    invalid += 1;
                    f64::NAN
                })
            })
            .collect();
        if invalid > 0 {
            warn!(
                "column '{}': {} invalid value(s) replaced with NAN",
                self.headers[idx], invalid
            );
        }
        values
    }
}

/// Removes every occurrence of each rule, in order, and trims the result.
pub fn clean_header(name: &str, rules: &[String]) -> String {
    let mut cleaned = name.to_string();
    for rule in rules.iter().filter(|r| !r.is_empty()) {
        cleaned = cleaned.replace(rule.as_str(), "");
    }
    cleaned.trim().to_string()
}

/// Parses a hexadecimal integer with optional sign and `0x` prefix.
pub fn parse_hex(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || digits.starts_with(|c: char| c == '+' || c == '-') {
        return None;
    }
    let v = i64::from_str_radix(&digits, 16).ok()?;
    Some(if negative { -v } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable {
            headers: vec!["Sample".into(), "T1".into(), "T2".into()],
            columns: vec![
                vec!["0".into(), "1".into()],
                vec!["1.5".into(), "x".into()],
                vec!["0x1F".into(), "ff".into()],
            ],
        }
    }

    #[test]
    fn header_cleanup() {
        let rules = vec!["Ave. (C)".to_string(), "(C)".to_string()];
        assert_eq!(clean_header(" T1 Ave. (C) ", &rules), "T1");
        assert_eq!(clean_header("T2 (C)", &rules), "T2");
        assert_eq!(clean_header("Sample", &[]), "Sample");
    }

    #[test]
    fn hex_values() {
        assert_eq!(parse_hex("0x1F"), Some(31));
        assert_eq!(parse_hex("ff"), Some(255));
        assert_eq!(parse_hex("-0X10"), Some(-16));
        assert_eq!(parse_hex(" 7fff "), Some(32767));
        assert_eq!(parse_hex("0x"), None);
        assert_eq!(parse_hex("--1"), None);
        assert_eq!(parse_hex("zz"), None);
    }

    #[test]
    fn numeric_columns() {
        let t = table();
        let v = t.numeric_column(1, ValueFormat::Decimal);
        assert_eq!(v[0], 1.5);
        assert!(v[1].is_nan());
        assert_eq!(t.numeric_column(2, ValueFormat::Hex), vec![31., 255.]);
    }

    #[test]
    fn column_selection() {
        let t = table();
        assert_eq!(t.resolve_columns(&[], 1).unwrap(), vec![1, 2]);
        assert_eq!(t.resolve_columns(&[], 0).unwrap(), vec![0, 1, 2]);
        let sel = vec![ColumnRef::Index(1), ColumnRef::Name("T1".into())];
        assert_eq!(t.resolve_columns(&sel, 1).unwrap(), vec![2, 1]);
    }

    #[test]
    fn unknown_columns_are_errors() {
        let t = table();
        match t.resolve_columns(&[ColumnRef::Name("T9".into())], 1) {
            Err(PlotError::UnknownColumn { name, available }) => {
                assert_eq!(name, "T9");
                assert_eq!(available, "T1, T2");
            }
            other => panic!("unexpected {:?}", other),
        }
        match t.resolve_columns(&[ColumnRef::Index(2)], 1) {
            Err(PlotError::ColumnIndexOutOfRange { index: 2, count: 2 }) => {}
            other => panic!("unexpected {:?}", other),
        }
        // the sample column is not a data column
        assert!(t.resolve_columns(&[ColumnRef::Name("Sample".into())], 1).is_err());
    }
}
