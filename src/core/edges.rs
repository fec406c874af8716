use std::collections::HashMap;

use serde_json::Value;

use crate::core::refs::RefRecord;
use crate::domain::model::{Edge, RType, Table};

/// Column names of the persisted edge tables.
pub const EDGE_COLUMNS: [&str; 4] = ["src_user_id", "tar_user_id", "tweet_id", "rtype"];

/// Tweet id to author id lookup over a tweet table's `id` and `author_id`
/// columns. Rows where either cell is missing or not a string cannot be
/// indexed and are skipped; duplicate ids keep the last row.
#[derive(Debug, Default)]
pub struct AuthorIndex {
    authors: HashMap<String, String>,
}

impl AuthorIndex {
    pub fn from_table(table: &Table) -> Self {
        let mut authors = HashMap::new();
        if let (Some(id_col), Some(author_col)) =
            (table.column_index("id"), table.column_index("author_id"))
        {
            for row in table.rows() {
                let id = row.get(id_col).and_then(Value::as_str);
                let author = row.get(author_col).and_then(Value::as_str);
                if let (Some(id), Some(author)) = (id, author) {
                    authors.insert(id.to_string(), author.to_string());
                }
            }
        }
        Self { authors }
    }

    pub fn get(&self, tweet_id: &str) -> Option<&str> {
        self.authors.get(tweet_id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

/// First index that knows the tweet wins.
fn lookup_author<'a>(indices: &[&'a AuthorIndex], tweet_id: &str) -> Option<&'a str> {
    indices.iter().find_map(|index| index.get(tweet_id))
}

fn referenced_edge(
    tweet_id: &str,
    author_id: &str,
    target_tweet_id: &str,
    rtype: RType,
    tweets: &AuthorIndex,
    ref_tweets: &AuthorIndex,
) -> Option<Edge> {
    // The side-table is consulted first: referenced content usually lives
    // there rather than among the query matches.
    let src = lookup_author(&[ref_tweets, tweets], target_tweet_id)?;
    Some(Edge {
        src_user_id: src.to_string(),
        tar_user_id: author_id.to_string(),
        tweet_id: tweet_id.to_string(),
        rtype,
    })
}

/// Edge from the retweeted tweet's author to the retweeting user. `None`
/// when neither index knows the retweeted tweet.
pub fn retweet_edge(
    tweet_id: &str,
    author_id: &str,
    retweeted_id: &str,
    tweets: &AuthorIndex,
    ref_tweets: &AuthorIndex,
) -> Option<Edge> {
    referenced_edge(tweet_id, author_id, retweeted_id, RType::Retweet, tweets, ref_tweets)
}

/// Edge from the quoted tweet's author to the quoting user. `None` when
/// neither index knows the quoted tweet.
pub fn quote_edge(
    tweet_id: &str,
    author_id: &str,
    quoted_id: &str,
    tweets: &AuthorIndex,
    ref_tweets: &AuthorIndex,
) -> Option<Edge> {
    referenced_edge(tweet_id, author_id, quoted_id, RType::Quote, tweets, ref_tweets)
}

/// Edge from the user replied to, to the replying user. The replied-to id
/// comes straight off the tweet, so this always produces an edge.
pub fn reply_edge(tweet_id: &str, author_id: &str, in_reply_to_user_id: &str) -> Edge {
    Edge {
        src_user_id: in_reply_to_user_id.to_string(),
        tar_user_id: author_id.to_string(),
        tweet_id: tweet_id.to_string(),
        rtype: RType::Reply,
    }
}

/// One edge per entry under `entities.mentions` with a string id, from
/// the mentioning user to each mentioned user.
pub fn mention_edges(tweet_id: &str, author_id: &str, entities: &Value) -> Vec<Edge> {
    let mut edges = Vec::new();
    if let Some(Value::Array(mentions)) = entities.get("mentions") {
        for mention in mentions {
            if let Some(id) = mention.get("id").and_then(Value::as_str) {
                edges.push(Edge {
                    src_user_id: author_id.to_string(),
                    tar_user_id: id.to_string(),
                    tweet_id: tweet_id.to_string(),
                    rtype: RType::Mention,
                });
            }
        }
    }
    edges
}

/// Every interaction edge the tweets of one response produce, as the
/// 4-column edge table. Header columns are present even when no tweet
/// interacted with anyone.
///
/// `refs` must line up with `data` row for row. Author lookups for
/// retweets and quotes consult the `includes.tweets` side-table before
/// the primary tweet table.
pub fn collect_edges(
    data: &[Value],
    refs: &[RefRecord],
    tweet_table: &Table,
    ref_table: Option<&Table>,
) -> Table {
    let tweets = AuthorIndex::from_table(tweet_table);
    let ref_tweets = ref_table.map(AuthorIndex::from_table).unwrap_or_default();

    let mut edges = Vec::new();
    for (tweet, record) in data.iter().zip(refs) {
        let tweet_id = tweet.get("id").and_then(Value::as_str).unwrap_or("");
        let author_id = tweet.get("author_id").and_then(Value::as_str).unwrap_or("");

        if !record.retweeted.is_empty() {
            if let Some(edge) =
                retweet_edge(tweet_id, author_id, &record.retweeted, &tweets, &ref_tweets)
            {
                edges.push(edge);
            }
        }
        if !record.quoted.is_empty() {
            if let Some(edge) =
                quote_edge(tweet_id, author_id, &record.quoted, &tweets, &ref_tweets)
            {
                edges.push(edge);
            }
        }
        if let Some(reply_to) = tweet.get("in_reply_to_user_id").and_then(Value::as_str) {
            edges.push(reply_edge(tweet_id, author_id, reply_to));
        }
        if let Some(entities) = tweet.get("entities") {
            edges.extend(mention_edges(tweet_id, author_id, entities));
        }
    }

    edges_to_table(&edges)
}

/// Render edges as the persisted 4-column table, `rtype` as its numeric
/// code.
pub fn edges_to_table(edges: &[Edge]) -> Table {
    Table::from_parts(
        EDGE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        edges
            .iter()
            .map(|edge| {
                vec![
                    Value::from(edge.src_user_id.clone()),
                    Value::from(edge.tar_user_id.clone()),
                    Value::from(edge.tweet_id.clone()),
                    Value::from(edge.rtype.value()),
                ]
            })
            .collect(),
    )
}
