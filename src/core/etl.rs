use std::time::Instant;

use chrono::Utc;

use crate::core::aggregate::{is_flush_boundary, BatchSet};
use crate::core::parse::process_response;
use crate::domain::model::RunSummary;
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// How many files a debug run looks at before stopping.
pub const DEBUG_FILE_LIMIT: usize = 10;

/// Drives one aggregation run: list the cached responses, parse them one
/// at a time and flush the accumulated batches at every window boundary.
pub struct AggregateEngine<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    monitor: SystemMonitor,
}

impl<S: Storage, C: ConfigProvider> AggregateEngine<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self::new_with_monitoring(storage, config, false)
    }

    pub fn new_with_monitoring(storage: S, config: C, monitor_enabled: bool) -> Self {
        Self {
            storage,
            config,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Aggregate every cached response into persisted batches.
    ///
    /// A file that fails to load or parse is logged and skipped; the run
    /// itself only fails when the cache cannot be listed at all.
    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        self.monitor.log_stats("Aggregation started");

        tracing::info!(
            "aggregating {} -> {}",
            self.config.cache_dir(),
            self.config.save_dir()
        );

        let mut files = self.storage.list_files().await?;
        files.retain(|name| name.ends_with(".json"));
        if self.config.debug_mode() {
            files.truncate(DEBUG_FILE_LIMIT);
            tracing::info!("debug mode: processing at most {} files", DEBUG_FILE_LIMIT);
        }
        tracing::info!("{} files to process", files.len());

        let interval = self.config.agg_interval().max(1);
        let format = self.config.sink_format();
        let mut batches = BatchSet::new();
        let mut not_loaded = Vec::new();
        let mut files_parsed = 0;
        let mut batches_written = 0;

        for (i, file) in files.iter().enumerate() {
            match self.load_response(file).await {
                Ok(response) => match process_response(&response, file) {
                    Ok(extract) => {
                        batches.append(extract);
                        files_parsed += 1;
                    }
                    Err(e) => tracing::warn!("cannot parse response {}: {}", file, e),
                },
                Err(e) => {
                    tracing::warn!("cannot load {}: {}", file, e);
                    not_loaded.push(file.clone());
                }
            }

            if is_flush_boundary(interval, i, files.len()) {
                tracing::info!("iter {}: {:.2}s elapsed", i, start.elapsed().as_secs_f64());
                batches_written += batches.flush(&self.storage, format, i).await;
                self.monitor.log_stats("Batch flushed");
            }
        }

        self.monitor.log_final_stats();
        let summary = RunSummary {
            started_at,
            files_seen: files.len(),
            files_parsed,
            not_loaded,
            batches_written,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        tracing::info!(
            "aggregation finished: {}/{} files parsed, {} batches written, {} not loaded",
            summary.files_parsed,
            summary.files_seen,
            summary.batches_written,
            summary.not_loaded.len()
        );
        Ok(summary)
    }

    async fn load_response(&self, file: &str) -> Result<serde_json::Value> {
        let bytes = self.storage.read_file(file).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SinkFormat;
    use crate::utils::error::EtlError;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryStorage {
        cache: HashMap<String, Vec<u8>>,
        written: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryStorage {
        fn new() -> Self {
            Self {
                cache: HashMap::new(),
                written: Mutex::new(HashMap::new()),
            }
        }

        fn put(&mut self, name: &str, body: serde_json::Value) {
            self.cache.insert(name.to_string(), body.to_string().into_bytes());
        }

        fn put_raw(&mut self, name: &str, body: &str) {
            self.cache.insert(name.to_string(), body.as_bytes().to_vec());
        }

        fn written_names(&self) -> Vec<String> {
            let mut names: Vec<String> = self.written.lock().unwrap().keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MemoryStorage {
        async fn list_files(&self) -> Result<Vec<String>> {
            let mut names: Vec<String> = self.cache.keys().cloned().collect();
            names.sort();
            Ok(names)
        }

        async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
            self.cache.get(name).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    name.to_string(),
                ))
            })
        }

        async fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
            self.written
                .lock()
                .unwrap()
                .insert(name.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct TestConfig {
        agg_interval: usize,
        debug_mode: bool,
    }

    impl ConfigProvider for TestConfig {
        fn cache_dir(&self) -> &str {
            "mem://cache"
        }

        fn save_dir(&self) -> &str {
            "mem://save"
        }

        fn agg_interval(&self) -> usize {
            self.agg_interval
        }

        fn sink_format(&self) -> SinkFormat {
            SinkFormat::Json
        }

        fn debug_mode(&self) -> bool {
            self.debug_mode
        }
    }

    fn response(id: &str, author: &str) -> serde_json::Value {
        json!({"data": [{"id": id, "author_id": author, "text": "t"}]})
    }

    #[tokio::test]
    async fn batches_are_flushed_at_interval_and_at_the_end() {
        let mut storage = MemoryStorage::new();
        storage.put("a.json", response("1", "u1"));
        storage.put("b.json", response("2", "u2"));
        storage.put("c.json", response("3", "u3"));

        let engine = AggregateEngine::new(
            storage,
            TestConfig {
                agg_interval: 2,
                debug_mode: false,
            },
        );
        let summary = engine.run().await.unwrap();

        assert_eq!(summary.files_seen, 3);
        assert_eq!(summary.files_parsed, 3);
        assert!(summary.not_loaded.is_empty());
        // Window of two closes at index 1, the final file flushes at 2.
        let names = engine.storage.written_names();
        assert!(names.contains(&"tweets_1.json".to_string()));
        assert!(names.contains(&"tweets_2.json".to_string()));
        assert!(!names.contains(&"tweets_0.json".to_string()));
    }

    #[tokio::test]
    async fn unreadable_files_are_reported_not_fatal() {
        let mut storage = MemoryStorage::new();
        storage.put_raw("bad.json", "{ not json");
        storage.put("good.json", response("1", "u1"));

        let engine = AggregateEngine::new(
            storage,
            TestConfig {
                agg_interval: 1000,
                debug_mode: false,
            },
        );
        let summary = engine.run().await.unwrap();

        assert_eq!(summary.files_seen, 2);
        assert_eq!(summary.files_parsed, 1);
        assert_eq!(summary.not_loaded, vec!["bad.json".to_string()]);
        assert!(engine
            .storage
            .written_names()
            .contains(&"tweets_1.json".to_string()));
    }

    #[tokio::test]
    async fn files_that_parse_but_do_not_extract_are_skipped() {
        let mut storage = MemoryStorage::new();
        storage.put("odd.json", json!({"includes": {}}));

        let engine = AggregateEngine::new(
            storage,
            TestConfig {
                agg_interval: 1000,
                debug_mode: false,
            },
        );
        let summary = engine.run().await.unwrap();

        assert_eq!(summary.files_parsed, 0);
        assert!(summary.not_loaded.is_empty());
        assert_eq!(summary.batches_written, 0);
        assert!(engine.storage.written_names().is_empty());
    }

    #[tokio::test]
    async fn non_json_files_are_not_picked_up() {
        let mut storage = MemoryStorage::new();
        storage.put("a.json", response("1", "u1"));
        storage.put_raw("notes.txt", "not a response");

        let engine = AggregateEngine::new(
            storage,
            TestConfig {
                agg_interval: 1000,
                debug_mode: false,
            },
        );
        let summary = engine.run().await.unwrap();
        assert_eq!(summary.files_seen, 1);
        assert_eq!(summary.files_parsed, 1);
    }

    #[tokio::test]
    async fn debug_mode_caps_the_run_at_ten_files() {
        let mut storage = MemoryStorage::new();
        for i in 0..12 {
            storage.put(&format!("r{:02}.json", i), response(&i.to_string(), "u"));
        }

        let engine = AggregateEngine::new(
            storage,
            TestConfig {
                agg_interval: 1000,
                debug_mode: true,
            },
        );
        let summary = engine.run().await.unwrap();

        assert_eq!(summary.files_seen, DEBUG_FILE_LIMIT);
        assert_eq!(summary.files_parsed, DEBUG_FILE_LIMIT);
        // Final flush lands on the truncated list's last index.
        assert!(engine
            .storage
            .written_names()
            .contains(&"tweets_9.json".to_string()));
    }

    #[tokio::test]
    async fn empty_cache_is_a_quiet_successful_run() {
        let engine = AggregateEngine::new(
            MemoryStorage::new(),
            TestConfig {
                agg_interval: 1000,
                debug_mode: false,
            },
        );
        let summary = engine.run().await.unwrap();
        assert_eq!(summary.files_seen, 0);
        assert_eq!(summary.batches_written, 0);
    }
}
