//! Session 使用的传输接口。

use std::io::Write;

use super::document::{Document, Form};
use crate::error::Result;

/// 阻塞式 HTTP 传输。
///
/// 实现方负责 Cookie、重定向以及二进制（图片）响应的处理；
/// 非 2xx 状态必须以错误返回，不能当成正常页面交给调用方。
pub trait Transport {
    fn get(&self, url: &str) -> Result<Document>;

    fn submit(&self, form: &Form) -> Result<Document>;

    /// 把 `url` 的内容写入 `sink`，返回写入的字节数。
    fn download(&self, url: &str, referer: Option<&str>, sink: &mut dyn Write) -> Result<u64>;
}
