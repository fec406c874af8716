use serde_json::Value;

/// A tweet's resolved references: the id of the tweet it replied to,
/// quoted, or retweeted, with the empty string standing in for "none".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefRecord {
    pub replied_to: String,
    pub quoted: String,
    pub retweeted: String,
}

/// Column names of the resolved-reference block appended to tweet tables.
pub const REF_COLUMNS: [&str; 3] = ["replied_to", "quoted", "retweeted"];

impl RefRecord {
    pub fn is_empty(&self) -> bool {
        self.replied_to.is_empty() && self.quoted.is_empty() && self.retweeted.is_empty()
    }

    /// The record as one table row, in [`REF_COLUMNS`] order.
    pub fn row(&self) -> Vec<Value> {
        vec![
            Value::from(self.replied_to.clone()),
            Value::from(self.quoted.clone()),
            Value::from(self.retweeted.clone()),
        ]
    }
}

/// Resolve a tweet's raw `referenced_tweets` value into a [`RefRecord`].
///
/// Total by construction: a missing or non-array value, or any entry
/// without string `type` and `id` fields, yields the all-empty record
/// rather than an error. Entries with a type name outside the three known
/// ones are dropped. Several entries of the same type keep the last one.
pub fn resolve_refs(raw: Option<&Value>) -> RefRecord {
    let entries = match raw {
        Some(Value::Array(entries)) => entries,
        _ => return RefRecord::default(),
    };

    let mut record = RefRecord::default();
    for entry in entries {
        let rtype = entry.get("type").and_then(Value::as_str);
        let id = entry.get("id").and_then(Value::as_str);
        let (rtype, id) = match (rtype, id) {
            (Some(rtype), Some(id)) => (rtype, id),
            _ => return RefRecord::default(),
        };
        match rtype {
            "replied_to" => record.replied_to = id.to_string(),
            "quoted" => record.quoted = id.to_string(),
            "retweeted" => record.retweeted = id.to_string(),
            _ => {}
        }
    }
    record
}
