//! 网络层入口。
//!
//! 子模块：
//! - `document` ：抓回来的页面（原始文本 + 解析后的 HTML）与表单
//! - `transport`：Session 依赖的传输接口
//! - `network`  ：基于 reqwest blocking 的默认实现（带 Cookie）

pub mod document;
pub mod network;
pub mod transport;

pub use document::{Document, Form};
pub use network::{WebConfig, WebTransport};
pub use transport::Transport;
