//! 延迟抓取的实体。
//!
//! `Lazy<K>` 只保存键和抓取函数；第一次读取属性时才通过绑定的 Session
//! 抓页面、解析并缓存。抓取或解析失败不会写入缓存，下次访问会重新请求。

use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use tracing::debug;

use crate::error::{PixivError, Result};
use crate::network_parser::Document;
use crate::session::Session;

/// 一类实体：键、来源 URL 以及从页面提取属性的方式。
pub trait EntityKind {
    type Key: Clone + Eq + Hash + fmt::Debug;
    type Attrs;

    const NAME: &'static str;

    /// 由键计算页面地址（纯函数）。
    fn url(key: &Self::Key) -> String;

    fn extract(key: &Self::Key, doc: &Document) -> Result<Self::Attrs>;
}

pub type Fetcher = Rc<dyn Fn(&Session) -> Result<Document>>;

pub struct Lazy<K: EntityKind> {
    key: K::Key,
    fetch: Fetcher,
    cache: OnceCell<K::Attrs>,
    session: Option<Session>,
}

impl<K: EntityKind> Lazy<K> {
    /// 未绑定的实体；`fetch` 在第一次读取属性时以绑定的 Session 调用。
    pub fn new<F>(key: K::Key, fetch: F) -> Self
    where
        F: Fn(&Session) -> Result<Document> + 'static,
    {
        Self {
            key,
            fetch: Rc::new(fetch),
            cache: OnceCell::new(),
            session: None,
        }
    }

    /// 以 `K::url(key)` 为来源的未绑定实体。
    pub fn from_key(key: K::Key) -> Self {
        let url = K::url(&key);
        Self::new(key, move |session| session.fetch(&url))
    }

    pub fn bind(mut self, session: &Session) -> Self {
        self.session = Some(session.clone());
        self
    }

    pub fn key(&self) -> &K::Key {
        &self.key
    }

    pub fn url(&self) -> String {
        K::url(&self.key)
    }

    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(PixivError::NotBound)
    }

    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    pub fn attrs(&self) -> Result<&K::Attrs> {
        if let Some(attrs) = self.cache.get() {
            return Ok(attrs);
        }
        let session = self.session()?;
        debug!("抓取 {} {:?}", K::NAME, self.key);
        let doc = (self.fetch)(session)?;
        let attrs = K::extract(&self.key, &doc)?;
        Ok(self.cache.get_or_init(|| attrs))
    }
}

impl<K: EntityKind> Clone for Lazy<K>
where
    K::Attrs: Clone,
{
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            fetch: Rc::clone(&self.fetch),
            cache: self.cache.clone(),
            session: self.session.clone(),
        }
    }
}

impl<K: EntityKind> PartialEq for Lazy<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: EntityKind> Eq for Lazy<K> {}

impl<K: EntityKind> Hash for Lazy<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<K: EntityKind> fmt::Debug for Lazy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::NAME)
            .field("key", &self.key)
            .field("bound", &self.is_bound())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
