use regex::Regex;

use crate::core::parse::FileExtract;
use crate::domain::model::{SinkFormat, Table};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};

/// Files per flush window when nothing else is configured.
pub const DEFAULT_AGG_INTERVAL: usize = 1000;

/// Whether file index `i` of `total` closes a flush window. The last file
/// always does, so a partial window still reaches the sink.
pub fn is_flush_boundary(interval: usize, i: usize, total: usize) -> bool {
    (i + 1) % interval == 0 || i + 1 == total
}

/// The five batch accumulators and their flush behavior.
///
/// Four of them receive a table from every parsed file; the
/// referenced-tweets one only hears from files that carried an
/// `includes.tweets` section, so its flushes can be skipped entirely.
pub struct BatchSet {
    tweets: Vec<Table>,
    users: Vec<Table>,
    media: Vec<Table>,
    ref_tweets: Vec<Table>,
    edges: Vec<Table>,
    blank: Regex,
}

impl BatchSet {
    pub fn new() -> Self {
        Self {
            tweets: Vec::new(),
            users: Vec::new(),
            media: Vec::new(),
            ref_tweets: Vec::new(),
            edges: Vec::new(),
            blank: Regex::new(r"^\s*$").expect("blank-cell pattern"),
        }
    }

    /// Take in one file's extraction output, all five parts together or
    /// none of them.
    pub fn append(&mut self, extract: FileExtract) {
        self.tweets.push(extract.tweets);
        self.users.push(extract.users);
        self.media.push(extract.media);
        if let Some(table) = extract.ref_tweets {
            self.ref_tweets.push(table);
        }
        self.edges.push(extract.edges);
    }

    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
            && self.users.is_empty()
            && self.media.is_empty()
            && self.ref_tweets.is_empty()
            && self.edges.is_empty()
    }

    /// Flush every accumulator: concatenate, null out blank cells, encode
    /// and persist as `{kind}_{index}.{ext}`. Returns how many batches
    /// reached the sink.
    ///
    /// Failures stay local to their accumulator. An accumulator that
    /// cannot be concatenated is left as it was; one whose batch fails to
    /// encode or persist is cleared anyway, since the batch was already
    /// handed off.
    pub async fn flush<S: Storage>(
        &mut self,
        storage: &S,
        format: SinkFormat,
        index: usize,
    ) -> usize {
        let Self {
            tweets,
            users,
            media,
            ref_tweets,
            edges,
            blank,
        } = self;

        let mut written = 0;
        for (kind, tables) in [
            ("tweets", tweets),
            ("users", users),
            ("media", media),
            ("ref", ref_tweets),
            ("edges", edges),
        ] {
            written += flush_one(storage, format, index, kind, tables, blank).await;
        }
        written
    }
}

impl Default for BatchSet {
    fn default() -> Self {
        Self::new()
    }
}

async fn flush_one<S: Storage>(
    storage: &S,
    format: SinkFormat,
    index: usize,
    kind: &str,
    tables: &mut Vec<Table>,
    blank: &Regex,
) -> usize {
    let mut batch = match Table::vcat(tables) {
        Ok(batch) => batch,
        Err(_) => {
            tracing::warn!("cannot concat {} batch of {} tables", kind, tables.len());
            return 0;
        }
    };
    tables.clear();
    batch.replace_blank_with_null(blank);

    let name = format!("{}_{}.{}", kind, index, format.extension());
    let bytes = match encode_batch(&batch, format) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("cannot encode {} batch {}: {}", kind, name, e);
            return 0;
        }
    };
    match storage.write_file(&name, &bytes).await {
        Ok(()) => {
            tracing::info!("saved {} rows of {} to {}", batch.n_rows(), kind, name);
            1
        }
        Err(e) => {
            tracing::warn!("cannot save {} batch to {}: {}", kind, name, e);
            0
        }
    }
}

/// Render one concatenated batch in the configured sink format.
pub fn encode_batch(batch: &Table, format: SinkFormat) -> Result<Vec<u8>> {
    match format {
        SinkFormat::Json => Ok(serde_json::to_vec(batch)?),
        SinkFormat::Csv => encode_csv(batch),
    }
}

fn encode_csv(batch: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if !batch.columns().is_empty() {
        writer.write_record(batch.columns())?;
        for row in batch.rows() {
            writer.write_record(row.iter().map(csv_cell))?;
        }
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::BatchError {
            message: format!("csv writer: {}", e),
        })
}

/// CSV rendering of one cell: null is the empty field, strings go out
/// as-is, anything else as its JSON text.
fn csv_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
