use serde_json::Value;

use crate::core::edges::collect_edges;
use crate::core::refs::{resolve_refs, RefRecord, REF_COLUMNS};
use crate::domain::model::Table;
use crate::utils::error::{EtlError, Result};

/// Everything one cached response contributes to the batch accumulators.
///
/// `ref_tweets` is optional on purpose: a response without an
/// `includes.tweets` section contributes nothing to that accumulator,
/// while a missing users or media section still contributes an empty
/// table.
#[derive(Debug, Clone)]
pub struct FileExtract {
    pub tweets: Table,
    pub users: Table,
    pub media: Table,
    pub ref_tweets: Option<Table>,
    pub edges: Table,
}

/// Parse one cached search response into its per-file tables and edges.
pub fn process_response(response: &Value, file: &str) -> Result<FileExtract> {
    let data = tweet_section(response)?;

    let refs: Vec<RefRecord> = data
        .iter()
        .map(|tweet| resolve_refs(tweet.get("referenced_tweets")))
        .collect();

    let tweets = parse_tweets(data, &refs)?;
    let users = parse_users(response, Some(file))?;
    let media = parse_media(response, Some(file))?;
    let ref_tweets = parse_ref_tweets(response, Some(file))?;
    let edges = collect_edges(data, &refs, &tweets, ref_tweets.as_ref());

    Ok(FileExtract {
        tweets,
        users,
        media,
        ref_tweets,
        edges,
    })
}

fn tweet_section(response: &Value) -> Result<&Vec<Value>> {
    match response.get("data") {
        Some(Value::Array(data)) => Ok(data),
        Some(_) => Err(EtlError::ExtractionError {
            message: "data section is not an array".to_string(),
        }),
        None => Err(EtlError::ExtractionError {
            message: "response has no data section".to_string(),
        }),
    }
}

/// Build a tweet table: the raw fields, the flattened public metrics, and,
/// when any tweet in the slice carries references, the resolved reference
/// columns. `refs` must line up with `data` row for row.
pub fn parse_tweets(data: &[Value], refs: &[RefRecord]) -> Result<Table> {
    let mut table = Table::from_objects(data);
    table.hcat(explode_metrics(data))?;

    if data.iter().any(|tweet| tweet.get("referenced_tweets").is_some()) {
        let ref_table = Table::from_parts(
            REF_COLUMNS.iter().map(|c| c.to_string()).collect(),
            refs.iter().map(RefRecord::row).collect(),
        );
        table.hcat(ref_table)?;
    }

    Ok(table)
}

/// The `includes.users` section as a table, metrics flattened like
/// tweets. A response without one contributes an empty table.
pub fn parse_users(response: &Value, file: Option<&str>) -> Result<Table> {
    let section = match response.get("includes").and_then(|i| i.get("users")) {
        Some(section) => section,
        None => {
            match file {
                Some(file) => tracing::info!("no users in response {}", file),
                None => tracing::info!("no users in response"),
            }
            return Ok(Table::new());
        }
    };
    let users = match section {
        Value::Array(users) => users,
        _ => {
            return Err(EtlError::ExtractionError {
                message: "includes.users is not an array".to_string(),
            })
        }
    };

    let mut table = Table::from_objects(users);
    table.hcat(explode_metrics(users))?;
    Ok(table)
}

/// The `includes.media` section as a table, fields taken as they come.
pub fn parse_media(response: &Value, file: Option<&str>) -> Result<Table> {
    let section = match response.get("includes").and_then(|i| i.get("media")) {
        Some(section) => section,
        None => {
            match file {
                Some(file) => tracing::info!("no media in response {}", file),
                None => tracing::info!("no media in response"),
            }
            return Ok(Table::new());
        }
    };
    match section {
        Value::Array(media) => Ok(Table::from_objects(media)),
        _ => Err(EtlError::ExtractionError {
            message: "includes.media is not an array".to_string(),
        }),
    }
}

/// The `includes.tweets` side-table, run through the same tweet extractor
/// as the primary section. `None` when the response has no such section.
pub fn parse_ref_tweets(response: &Value, file: Option<&str>) -> Result<Option<Table>> {
    let section = match response.get("includes").and_then(|i| i.get("tweets")) {
        Some(section) => section,
        None => {
            match file {
                Some(file) => tracing::info!("no referenced tweets in response {}", file),
                None => tracing::info!("no referenced tweets in response"),
            }
            return Ok(None);
        }
    };
    let data = match section {
        Value::Array(data) => data,
        _ => {
            return Err(EtlError::ExtractionError {
                message: "includes.tweets is not an array".to_string(),
            })
        }
    };

    let refs: Vec<RefRecord> = data
        .iter()
        .map(|tweet| resolve_refs(tweet.get("referenced_tweets")))
        .collect();
    parse_tweets(data, &refs).map(Some)
}

/// One column per metric name found under any row's `public_metrics`,
/// null where a row has no such metric or no metrics object at all.
fn explode_metrics(data: &[Value]) -> Table {
    let metrics: Vec<Value> = data
        .iter()
        .map(|row| row.get("public_metrics").cloned().unwrap_or(Value::Null))
        .collect();
    Table::from_objects(&metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> Value {
        json!({
            "data": [
                {
                    "id": "200",
                    "author_id": "u2",
                    "text": "RT @alice nice graph",
                    "public_metrics": {"retweet_count": 0, "like_count": 2},
                    "referenced_tweets": [{"type": "retweeted", "id": "100"}]
                },
                {
                    "id": "201",
                    "author_id": "u3",
                    "text": "standalone",
                    "public_metrics": {"retweet_count": 5}
                }
            ],
            "includes": {
                "users": [
                    {"id": "u2", "username": "bob", "public_metrics": {"followers_count": 7}}
                ],
                "tweets": [
                    {"id": "100", "author_id": "u1", "public_metrics": {"retweet_count": 9}}
                ],
                "media": [
                    {"media_key": "3_1", "type": "photo"}
                ]
            }
        })
    }

    #[test]
    fn tweets_get_metrics_and_reference_columns() {
        let response = sample_response();
        let data = match response.get("data") {
            Some(Value::Array(data)) => data.clone(),
            _ => unreachable!(),
        };
        let refs: Vec<RefRecord> = data
            .iter()
            .map(|t| resolve_refs(t.get("referenced_tweets")))
            .collect();
        let table = parse_tweets(&data, &refs).unwrap();

        assert_eq!(table.get(0, "retweet_count"), Some(&json!(0)));
        assert_eq!(table.get(0, "like_count"), Some(&json!(2)));
        assert_eq!(table.get(1, "like_count"), Some(&Value::Null));
        assert_eq!(table.get(0, "retweeted"), Some(&json!("100")));
        assert_eq!(table.get(1, "retweeted"), Some(&json!("")));
        // The nested metrics object itself stays as a raw column.
        assert!(table.column_index("public_metrics").is_some());
    }

    #[test]
    fn reference_columns_appear_only_when_someone_references() {
        let data = vec![json!({"id": "1", "author_id": "a", "text": "plain"})];
        let refs = vec![RefRecord::default()];
        let table = parse_tweets(&data, &refs).unwrap();
        assert!(table.column_index("retweeted").is_none());
        assert!(table.column_index("replied_to").is_none());
    }

    #[test]
    fn tweets_without_metrics_still_take_a_row() {
        let data = vec![
            json!({"id": "1", "public_metrics": {"like_count": 3}}),
            json!({"id": "2"}),
        ];
        let refs = vec![RefRecord::default(), RefRecord::default()];
        let table = parse_tweets(&data, &refs).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.get(1, "like_count"), Some(&Value::Null));
    }

    #[test]
    fn users_are_extracted_with_flattened_metrics() {
        let table = parse_users(&sample_response(), None).unwrap();
        assert_eq!(table.n_rows(), 1);
        assert_eq!(table.get(0, "username"), Some(&json!("bob")));
        assert_eq!(table.get(0, "followers_count"), Some(&json!(7)));
    }

    #[test]
    fn missing_users_section_gives_an_empty_table() {
        let response = json!({"data": []});
        let table = parse_users(&response, None).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn malformed_users_section_is_an_extraction_error() {
        let response = json!({"data": [], "includes": {"users": "nope"}});
        assert!(parse_users(&response, None).is_err());
    }

    #[test]
    fn media_fields_pass_through_untouched() {
        let table = parse_media(&sample_response(), None).unwrap();
        assert_eq!(table.get(0, "media_key"), Some(&json!("3_1")));
        assert_eq!(table.get(0, "type"), Some(&json!("photo")));
    }

    #[test]
    fn ref_tweets_are_absent_without_an_includes_section() {
        let response = json!({"data": []});
        assert!(parse_ref_tweets(&response, None).unwrap().is_none());
    }

    #[test]
    fn process_response_assembles_the_full_extract() {
        let extract = process_response(&sample_response(), "resp_0.json").unwrap();
        assert_eq!(extract.tweets.n_rows(), 2);
        assert_eq!(extract.users.n_rows(), 1);
        assert_eq!(extract.media.n_rows(), 1);
        assert_eq!(extract.ref_tweets.as_ref().map(Table::n_rows), Some(1));
        // One retweet edge: u1 retweeted-by u2.
        assert_eq!(extract.edges.n_rows(), 1);
        assert_eq!(extract.edges.get(0, "src_user_id"), Some(&json!("u1")));
        assert_eq!(extract.edges.get(0, "tar_user_id"), Some(&json!("u2")));
    }

    #[test]
    fn response_without_data_is_rejected() {
        assert!(process_response(&json!({"includes": {}}), "x.json").is_err());
        assert!(process_response(&json!({"data": "oops"}), "x.json").is_err());
    }
}
