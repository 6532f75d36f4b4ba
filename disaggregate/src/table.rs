use std::collections::HashMap;
use std::io::Read;

use anyhow::{Context, Result};

/// A CSV table with a header row, kept as raw strings and parsed on access. Every input the
/// disaggregation stage consumes (probability tables, matrix descriptors, trip lists) is read
/// into one of these.
pub struct Table {
    name: String,
    columns: HashMap<String, usize>,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    pub fn load(path: &str) -> Result<Table> {
        let file = fs_err::File::open(path)?;
        Table::from_reader(path, file)
    }

    /// `name` only shows up in error messages.
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Table> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()
            .with_context(|| format!("reading the header of {}", name))?
            .iter()
            .map(|x| x.to_string())
            .collect();
        let mut columns = HashMap::new();
        for (idx, col) in headers.iter().enumerate() {
            // Keep the first occurrence of a duplicated column name
            columns.entry(col.clone()).or_insert(idx);
        }
        let mut rows = Vec::new();
        for rec in csv_reader.records() {
            rows.push(rec.with_context(|| format!("reading {}", name))?);
        }
        Ok(Table {
            name: name.to_string(),
            columns,
            headers,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, col: &str) -> bool {
        self.columns.contains_key(col)
    }

    /// The position of a column, if it exists.
    pub fn column(&self, col: &str) -> Option<usize> {
        self.columns.get(col).cloned()
    }

    pub fn require_column(&self, col: &str) -> Result<usize> {
        self.column(col)
            .ok_or_else(|| anyhow!("{} has no {} column", self.name, col))
    }

    pub fn str_at(&self, row: usize, col: usize) -> Result<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or_else(|| anyhow!("{} row {} has no column {}", self.name, row + 1, col))
    }

    pub fn f64_at(&self, row: usize, col: usize) -> Result<f64> {
        let raw = self.str_at(row, col)?;
        raw.parse::<f64>().with_context(|| {
            format!(
                "{} row {} column {}: {} isn't a number",
                self.name,
                row + 1,
                self.headers[col],
                raw
            )
        })
    }

    /// Numeric columns are sometimes written as decimals even when they hold ids, so this
    /// truncates towards zero like a plain cast would.
    pub fn i64_at(&self, row: usize, col: usize) -> Result<i64> {
        Ok(self.f64_at(row, col)? as i64)
    }

    pub fn i32_at(&self, row: usize, col: usize) -> Result<i32> {
        Ok(self.f64_at(row, col)? as i32)
    }

    /// True if every value in a column parses as a number. Some trip lists put labels in
    /// columns that other lists use for codes.
    pub fn is_numeric_column(&self, col: usize) -> bool {
        self.rows
            .iter()
            .all(|r| r.get(col).map_or(false, |x| x.parse::<f64>().is_ok()))
    }

    /// Parses an entire column as numbers.
    pub fn f64_column(&self, col: &str) -> Result<Vec<f64>> {
        let idx = self.require_column(col)?;
        (0..self.num_rows()).map(|row| self.f64_at(row, idx)).collect()
    }

    pub fn i32_column(&self, col: &str) -> Result<Vec<i32>> {
        let idx = self.require_column(col)?;
        (0..self.num_rows()).map(|row| self.i32_at(row, idx)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Table {
        Table::from_reader("test", csv.as_bytes()).unwrap()
    }

    #[test]
    fn typed_access() {
        let t = table("TOD, Factors, label\n1, 0.25, EA\n2,0.75,AM\n");
        assert_eq!(2, t.num_rows());
        assert!(t.has_column("Factors"));
        assert!(!t.has_column("factors"));
        assert_eq!(vec![1, 2], t.i32_column("TOD").unwrap());
        assert_eq!(vec![0.25, 0.75], t.f64_column("Factors").unwrap());
        assert_eq!("AM", t.str_at(1, 2).unwrap());
    }

    #[test]
    fn ids_written_as_decimals() {
        let t = table("hh_id\n1234.0\n-7.9\n");
        assert_eq!(1234, t.i64_at(0, 0).unwrap());
        assert_eq!(-7, t.i32_at(1, 0).unwrap());
    }

    #[test]
    fn numeric_columns() {
        let t = table("tripMode,MODE,TRIPS\n1,S2,0.5\n2,lightTruck,1\n");
        assert!(t.is_numeric_column(0));
        assert!(!t.is_numeric_column(1));
        assert!(t.is_numeric_column(2));
        assert!(!t.is_numeric_column(3));
    }

    #[test]
    fn bad_values_are_errors() {
        let t = table("TOD,Factors\n1,abc\n");
        assert!(t.f64_column("Factors").is_err());
        assert!(t.f64_column("Probability").is_err());
        assert!(t.str_at(5, 0).is_err());
    }
}
