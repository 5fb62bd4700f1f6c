pub mod config;
pub mod logging;
pub mod merge;
pub mod reshape;
pub mod table;

pub use config::{MergeConfig, UploadConfig};
pub use table::{Record, Table, Value};
