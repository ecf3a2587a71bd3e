//! 下载流程模块入口。
//!
//! 子模块：
//! - `models`    ：尺寸选择、保存目标、批量结果
//! - `pattern`   ：文件名模板
//! - `actions`   ：批量下载的生命周期钩子
//! - `downloader`：单图 / 漫画下载
//! - `progress`  ：CLI 进度条

pub mod actions;
pub mod downloader;
pub mod models;
pub mod pattern;
pub mod progress;

pub use actions::DownloadActions;
pub use models::{BatchReport, Destination, ImageSize};
pub use pattern::{Pattern, Segment, image_name};
