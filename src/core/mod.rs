pub mod aggregate;
pub mod edges;
pub mod etl;
pub mod parse;
pub mod refs;

pub use crate::domain::model::{Edge, RType, RunSummary, SinkFormat, Table};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
