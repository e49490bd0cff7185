//! Load cash-flow series from CSV
//!
//! Columns: `amount`, and optionally `date` (YYYY-MM-DD). A file either dates
//! every row or none of them.

use std::error::Error;
use std::path::Path;

use chrono::NaiveDate;
use csv::Reader;
use serde_json::{json, Value};

use crate::validation::{parse_date, DATE_FORMAT};

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(default)]
    date: Option<String>,
    amount: f64,
}

/// Cash flows read from a file, ready to merge into request arguments
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCashFlows {
    pub values: Vec<f64>,
    pub dates: Option<Vec<NaiveDate>>,
}

impl LoadedCashFlows {
    /// Write `values` (and `dates`, when present) into a JSON argument object
    pub fn merge_into(&self, arguments: &mut Value) -> Result<(), Box<dyn Error>> {
        let object = arguments
            .as_object_mut()
            .ok_or("arguments must be a JSON object")?;

        object.insert("values".to_string(), json!(self.values));
        if let Some(ref dates) = self.dates {
            let dates: Vec<String> = dates
                .iter()
                .map(|d| d.format(DATE_FORMAT).to_string())
                .collect();
            object.insert("dates".to_string(), json!(dates));
        }

        Ok(())
    }
}

/// Load cash flows from a CSV file
pub fn load_cash_flows<P: AsRef<Path>>(path: P) -> Result<LoadedCashFlows, Box<dyn Error>> {
    let reader = Reader::from_path(path)?;
    read_rows(reader)
}

/// Load cash flows from any reader (e.g., string buffer, stdin)
pub fn load_cash_flows_from_reader<R: std::io::Read>(reader: R) -> Result<LoadedCashFlows, Box<dyn Error>> {
    read_rows(Reader::from_reader(reader))
}

fn read_rows<R: std::io::Read>(mut reader: Reader<R>) -> Result<LoadedCashFlows, Box<dyn Error>> {
    let mut values = Vec::new();
    let mut dates = Vec::new();
    let mut undated_rows = 0;

    for (index, result) in reader.deserialize().enumerate() {
        let row: CsvRow = result?;
        values.push(row.amount);

        match row.date.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let date = parse_date(text)
                    .ok_or_else(|| format!("row {}: invalid date '{}'", index + 1, text))?;
                dates.push(date);
            }
            _ => undated_rows += 1,
        }
    }

    if !dates.is_empty() && undated_rows > 0 {
        return Err(format!(
            "{} of {} rows have no date; date every row or none",
            undated_rows,
            values.len()
        )
        .into());
    }

    Ok(LoadedCashFlows {
        values,
        dates: if dates.is_empty() { None } else { Some(dates) },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_dated_flows() {
        let csv = "date,amount\n2016-01-01,-10000\n2016-02-01,2000\n2016-05-01,2400\n";
        let loaded = load_cash_flows_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(loaded.values, vec![-10000.0, 2000.0, 2400.0]);
        let dates = loaded.dates.unwrap();
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2016, 2, 1).unwrap());
    }

    #[test]
    fn test_load_periodic_flows() {
        let csv = "amount\n-100\n39\n59\n55\n20\n";
        let loaded = load_cash_flows_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(loaded.values.len(), 5);
        assert!(loaded.dates.is_none());
    }

    #[test]
    fn test_partially_dated_file_rejected() {
        let csv = "date,amount\n2016-01-01,-100\n,50\n";
        assert!(load_cash_flows_from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_bad_date_rejected() {
        let csv = "date,amount\n01/02/2016,-100\n";
        let err = load_cash_flows_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_unpadded_date_rejected() {
        let csv = "date,amount\n2016-1-1,-100\n2016-02-01,50\n";
        let err = load_cash_flows_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'2016-1-1'"));
    }

    #[test]
    fn test_merge_into_arguments() {
        let csv = "date,amount\n2016-01-01,-100\n2017-01-01,110\n";
        let loaded = load_cash_flows_from_reader(csv.as_bytes()).unwrap();
        let mut arguments = json!({"rate": 0.05});
        loaded.merge_into(&mut arguments).unwrap();
        assert_eq!(
            arguments,
            json!({"rate": 0.05, "values": [-100.0, 110.0], "dates": ["2016-01-01", "2017-01-01"]})
        );
    }
}
