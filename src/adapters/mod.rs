// Adapters layer: 外部系統的實作 (本機檔案、http 來源)

pub mod source;

pub use source::{fetch_remote, SourceLocation};
