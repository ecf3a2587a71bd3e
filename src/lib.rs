//! pixiv 客户端：登录、延迟抓取的实体、收藏分页与图片下载。
//!
//! 代码结构（读代码入口）：
//! - `session`         ：登录态与实体工厂，所有请求都经过它
//! - `entity`          ：作品 / 用户 / 收藏页，首次读取属性时才抓取
//! - `page_collection` ：把收藏列表的分页拉平成一条迭代器
//! - `download`        ：单图与漫画下载、文件名模板、下载钩子
//! - `network_parser`  ：传输接口与默认的 reqwest 实现
//! - `base_system`     ：配置 / 日志 / 文件名等基础设施

pub mod base_system;
pub mod download;
pub mod entity;
pub mod error;
pub mod network_parser;
pub mod page_collection;
pub mod session;

pub use download::{BatchReport, Destination, DownloadActions, ImageSize, Pattern, Segment};
pub use entity::{BookmarkItem, BookmarkList, Illust, Member};
pub use error::{PixivError, Result};
pub use network_parser::{Document, Form, Transport, WebConfig, WebTransport};
pub use page_collection::Bookmarks;
pub use session::{ROOT_URL, Session};
