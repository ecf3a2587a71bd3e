//! 批量下载的生命周期钩子。
//!
//! ```ignore
//! let actions = DownloadActions::new()
//!     .before_each(|url, n| { println!("{n}: {url}"); Ok(()) })
//!     .on_error(|err| { eprintln!("{err}"); Ok(()) });
//! ```

use crate::error::{PixivError, Result};

type UrlHook<'a> = Box<dyn FnMut(&str, usize) -> Result<()> + 'a>;
type ErrorHook<'a> = Box<dyn FnMut(PixivError) -> Result<()> + 'a>;

/// 三个可选钩子，一次批量下载内不变。
///
/// - `before_each` 报错会直接中止整批，不经过 `on_error`
/// - 下载与 `after_each` 的错误交给 `on_error`：返回 `Ok(())` 继续下一张，
///   返回 `Err` 则中止；没有 `on_error` 时错误直接中止整批
#[derive(Default)]
pub struct DownloadActions<'a> {
    before_each: Option<UrlHook<'a>>,
    after_each: Option<UrlHook<'a>>,
    on_error: Option<ErrorHook<'a>>,
}

impl<'a> DownloadActions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_each<F>(mut self, f: F) -> Self
    where
        F: FnMut(&str, usize) -> Result<()> + 'a,
    {
        self.before_each = Some(Box::new(f));
        self
    }

    pub fn after_each<F>(mut self, f: F) -> Self
    where
        F: FnMut(&str, usize) -> Result<()> + 'a,
    {
        self.after_each = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnMut(PixivError) -> Result<()> + 'a,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn has_on_error(&self) -> bool {
        self.on_error.is_some()
    }

    pub(crate) fn run_before(&mut self, url: &str, index: usize) -> Result<()> {
        match self.before_each.as_mut() {
            Some(hook) => hook(url, index),
            None => Ok(()),
        }
    }

    pub(crate) fn run_after(&mut self, url: &str, index: usize) -> Result<()> {
        match self.after_each.as_mut() {
            Some(hook) => hook(url, index),
            None => Ok(()),
        }
    }

    pub(crate) fn recover(&mut self, err: PixivError) -> Result<()> {
        match self.on_error.as_mut() {
            Some(hook) => hook(err),
            None => Err(err),
        }
    }
}
