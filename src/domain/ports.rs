use crate::domain::model::SinkFormat;
use crate::utils::error::Result;

/// File-shaped storage seam. Reads come from the cache of search
/// responses, writes go to the batch sink; where those actually live is
/// the implementation's business.
pub trait Storage: Send + Sync {
    fn list_files(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn read_file(&self, name: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        name: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Settings an aggregation run needs, independent of whether they came
/// from command-line flags or a TOML file.
pub trait ConfigProvider: Send + Sync {
    fn cache_dir(&self) -> &str;
    fn save_dir(&self) -> &str;
    fn agg_interval(&self) -> usize;
    fn sink_format(&self) -> SinkFormat;
    fn debug_mode(&self) -> bool;
}
