use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::error::{EtlError, Result};

/// Column-ordered table of JSON cells.
///
/// This is the shape every extractor emits and every batch persists:
/// columns are discovered from the data in first-appearance order, and a
/// cell a row never had is null. Rows always have exactly one cell per
/// column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble from prebuilt parts. Rows shorter than the column list are
    /// null-padded, longer ones truncated.
    pub fn from_parts(columns: Vec<String>, mut rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, Value::Null);
        }
        Self { columns, rows }
    }

    /// Build a table from a slice of JSON values, one row per value.
    ///
    /// Columns are the union of object keys across the slice. A value that
    /// is not an object still takes up a row, with every cell null.
    pub fn from_objects(values: &[Value]) -> Self {
        let mut table = Table::new();
        for value in values {
            let mut row = vec![Value::Null; table.columns.len()];
            if let Value::Object(map) = value {
                for (key, cell) in map {
                    let idx = match table.columns.iter().position(|c| c == key) {
                        Some(idx) => idx,
                        None => {
                            table.columns.push(key.clone());
                            table.columns.len() - 1
                        }
                    };
                    if idx >= row.len() {
                        row.resize(idx + 1, Value::Null);
                    }
                    row[idx] = cell.clone();
                }
            }
            table.rows.push(row);
        }
        let width = table.columns.len();
        for row in &mut table.rows {
            row.resize(width, Value::Null);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Append another table's columns to the right of this one, aligning
    /// rows by position. Row counts must match.
    pub fn hcat(&mut self, other: Table) -> Result<()> {
        if self.rows.len() != other.rows.len() {
            return Err(EtlError::ExtractionError {
                message: format!(
                    "cannot join columns: {} rows vs {} rows",
                    self.rows.len(),
                    other.rows.len()
                ),
            });
        }
        self.columns.extend(other.columns);
        for (row, extra) in self.rows.iter_mut().zip(other.rows) {
            row.extend(extra);
        }
        Ok(())
    }

    /// Stack tables vertically into one, unioning columns in
    /// first-appearance order; cells a source table never had are null.
    ///
    /// Duplicate column names are kept apart by occurrence, so a table
    /// whose name appears twice lines up with the matching occurrence in
    /// the other tables. An empty input slice is an error, deliberately:
    /// flushing an accumulator nothing was ever appended to should warn,
    /// not silently write an empty batch.
    pub fn vcat(tables: &[Table]) -> Result<Table> {
        if tables.is_empty() {
            return Err(EtlError::BatchError {
                message: "nothing to concatenate".to_string(),
            });
        }

        // Column identity is (name, nth occurrence of that name).
        let mut idents: Vec<(String, usize)> = Vec::new();
        for table in tables {
            let mut seen: HashMap<&str, usize> = HashMap::new();
            for column in &table.columns {
                let counter = seen.entry(column.as_str()).or_insert(0);
                let occurrence = *counter;
                *counter += 1;
                if !idents
                    .iter()
                    .any(|(name, occ)| name == column && *occ == occurrence)
                {
                    idents.push((column.clone(), occurrence));
                }
            }
        }

        let mut out = Table {
            columns: idents.iter().map(|(name, _)| name.clone()).collect(),
            rows: Vec::new(),
        };
        for table in tables {
            let mut seen: HashMap<&str, usize> = HashMap::new();
            let mut source_idx: Vec<Option<usize>> = vec![None; idents.len()];
            for (i, column) in table.columns.iter().enumerate() {
                let counter = seen.entry(column.as_str()).or_insert(0);
                let occurrence = *counter;
                *counter += 1;
                if let Some(pos) = idents
                    .iter()
                    .position(|(name, occ)| name == column && *occ == occurrence)
                {
                    source_idx[pos] = Some(i);
                }
            }
            for row in &table.rows {
                out.rows.push(
                    source_idx
                        .iter()
                        .map(|idx| {
                            idx.and_then(|i| row.get(i)).cloned().unwrap_or(Value::Null)
                        })
                        .collect(),
                );
            }
        }
        Ok(out)
    }

    /// Null out every cell that is an empty or whitespace-only string.
    pub fn replace_blank_with_null(&mut self, blank: &Regex) {
        for row in &mut self.rows {
            for cell in row {
                if let Value::String(s) = cell {
                    if blank.is_match(s) {
                        *cell = Value::Null;
                    }
                }
            }
        }
    }
}

/// The interaction a tweet expresses toward another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RType {
    Retweet = 1,
    Quote = 2,
    Reply = 3,
    Mention = 4,
}

impl RType {
    /// Numeric code persisted in the edge batches.
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for RType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RType::Retweet => "retweet",
            RType::Quote => "quote",
            RType::Reply => "reply",
            RType::Mention => "mention",
        };
        write!(f, "{}", name)
    }
}

/// One directed interaction between two users, attributed to the tweet
/// that expressed it. Source is the author whose content was acted on for
/// retweets, quotes and replies; for mentions it is the mentioning user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub src_user_id: String,
    pub tar_user_id: String,
    pub tweet_id: String,
    pub rtype: RType,
}

/// On-disk encoding of flushed batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    #[default]
    Json,
    Csv,
}

impl SinkFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SinkFormat::Json => "json",
            SinkFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// What one aggregation run did, returned to the caller after the last
/// flush.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub files_seen: usize,
    pub files_parsed: usize,
    pub not_loaded: Vec<String>,
    pub batches_written: usize,
    pub elapsed_secs: f64,
}
