//! Column-ordered table of dynamically typed cells.
//!
//! Training logs from different runs do not share a schema: some carry
//! `loss`, some only `loss_x`/`loss_u`, some lack `epoch`. [`Table`] keeps
//! every column it reads and lets the merge step reconcile them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Writer};

use crate::utils::error::{ReportError, Result};

/// Strings read as a missing value, compared case-insensitively
const NA_VALUES: [&str; 9] = ["na", "n/a", "nan", "-nan", "null", "none", "<na>", "#n/a", "nil"];

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Infer a cell from a raw CSV field
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Missing;
        }

        let lower = trimmed.to_ascii_lowercase();
        if NA_VALUES.contains(&lower.as_str()) {
            return Cell::Missing;
        }
        match lower.as_str() {
            "true" => return Cell::Bool(true),
            "false" => return Cell::Bool(false),
            _ => {}
        }

        match trimmed.parse::<f64>() {
            Ok(v) => Cell::number(v),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    /// Number cell; NaN is stored as `Missing`
    pub fn number(v: f64) -> Self {
        if v.is_nan() {
            Cell::Missing
        } else {
            Cell::Number(v)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric coercion: anything that is not a number becomes `Missing`
    pub fn coerce_numeric(&self) -> Cell {
        match self {
            Cell::Number(v) => Cell::Number(*v),
            Cell::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) => Cell::number(v),
                Err(_) => Cell::Missing,
            },
            Cell::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
            Cell::Missing => Cell::Missing,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Bool(true) => write!(f, "True"),
            Cell::Bool(false) => write!(f, "False"),
        }
    }
}

/// A rectangular table: every row has one cell per column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Read a CSV file with a header row
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
            .map_err(|e| ReportError::TableParse(path.to_path_buf(), e.to_string()))
    }

    /// Read CSV with a header row from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Err(ReportError::Table("no columns to parse".to_string()));
        }
        let mut table = Table::new(dedupe_headers(headers.iter()));

        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() > table.columns.len() {
                return Err(ReportError::Table(format!(
                    "row {} has {} fields, expected at most {}",
                    line + 1,
                    record.len(),
                    table.columns.len()
                )));
            }
            let mut row: Vec<Cell> = record.iter().map(Cell::parse).collect();
            row.resize(table.columns.len(), Cell::Missing);
            table.rows.push(row);
        }

        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Cell at `row` in column `name`
    pub fn get(&self, row: usize, name: &str) -> Option<&Cell> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Insert a new column at `position`
    pub fn insert_column(&mut self, position: usize, name: &str, values: Vec<Cell>) -> Result<()> {
        if self.has_column(name) {
            return Err(ReportError::Table(format!("column '{}' already exists", name)));
        }
        if values.len() != self.rows.len() {
            return Err(ReportError::Table(format!(
                "column '{}' has {} values, table has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        let position = position.min(self.columns.len());
        self.columns.insert(position, name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(position, value);
        }
        Ok(())
    }

    /// Append a new column after the existing ones
    pub fn push_column(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        let end = self.columns.len();
        self.insert_column(end, name, values)
    }

    /// Replace a column's values, or append the column when absent
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        match self.column_index(name) {
            Some(idx) => {
                if values.len() != self.rows.len() {
                    return Err(ReportError::Table(format!(
                        "column '{}' has {} values, table has {} rows",
                        name,
                        values.len(),
                        self.rows.len()
                    )));
                }
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
                Ok(())
            }
            None => self.push_column(name, values),
        }
    }

    /// Apply `f` to every cell of a column; no-op when the column is absent
    pub fn map_column<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Cell) -> Cell,
    {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                row[idx] = f(&row[idx]);
            }
        }
    }

    /// Stack tables vertically. Columns are the union of all inputs in order
    /// of first appearance; cells a table does not have are `Missing`.
    pub fn concat(tables: &[Table]) -> Table {
        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for table in tables {
            for name in &table.columns {
                if !positions.contains_key(name) {
                    positions.insert(name.clone(), columns.len());
                    columns.push(name.clone());
                }
            }
        }

        let mut out = Table::new(columns);
        for table in tables {
            let mapping: Vec<usize> = table.columns.iter().map(|c| positions[c]).collect();
            for row in &table.rows {
                let mut merged = vec![Cell::Missing; out.columns.len()];
                for (cell, &target) in row.iter().zip(&mapping) {
                    merged[target] = cell.clone();
                }
                out.rows.push(merged);
            }
        }
        out
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = Writer::from_writer(writer);
        if self.columns.is_empty() {
            return Ok(());
        }
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(file)
    }
}

/// Rename repeated headers `a, a` to `a, a.1`
fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for header in headers {
        let mut name = header.to_string();
        let mut n = 0;
        while used.contains(&name) {
            n += 1;
            name = format!("{}.{}", header, n);
        }
        used.insert(name.clone());
        out.push(name);
    }
    out
}
