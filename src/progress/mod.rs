//! 令牌刷新任务的进度仓库

pub mod store;

pub use store::ProgressUpdate;
