//! 登录态与实体工厂。
//!
//! `Session` 独占传输句柄和当前登录用户 ID；所有实体都通过它抓页面。
//! 句柄以 `Rc` 共享，只能在单线程里使用。

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::entity::{BookmarkKey, BookmarkList, Illust, Member};
use crate::error::{PixivError, Result};
use crate::network_parser::{Document, Transport};
use crate::page_collection::Bookmarks;

pub const ROOT_URL: &str = "https://www.pixiv.net";

static RE_SIGNAL: OnceLock<Regex> = OnceLock::new();
static RE_TRAILING_ID: OnceLock<Regex> = OnceLock::new();

/// 登录成功后页面上一定会出现的“登出”入口。
pub fn logged_in_signal() -> &'static Regex {
    RE_SIGNAL.get_or_init(|| Regex::new(r"(?i)logout").expect("compile RE_SIGNAL"))
}

fn re_trailing_id() -> &'static Regex {
    RE_TRAILING_ID.get_or_init(|| Regex::new(r"(\d+)$").expect("compile RE_TRAILING_ID"))
}

#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

struct SessionInner {
    transport: Box<dyn Transport>,
    member_id: OnceCell<u64>,
}

impl Session {
    /// 未登录的 Session。
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                transport: Box::new(transport),
                member_id: OnceCell::new(),
            }),
        }
    }

    pub fn with_credentials(
        transport: impl Transport + 'static,
        pixiv_id: &str,
        password: &str,
    ) -> Result<Self> {
        let session = Self::new(transport);
        session.login(pixiv_id, password)?;
        Ok(session)
    }

    /// 接管一个已经登录的传输句柄，并通过 mypage 校验登录态。
    pub fn adopt(transport: impl Transport + 'static) -> Result<Self> {
        let session = Self::new(transport);
        session.ensure_logged_in()?;
        Ok(session)
    }

    pub fn member_id(&self) -> Option<u64> {
        self.inner.member_id.get().copied()
    }

    pub fn is_logged_in(&self) -> bool {
        self.member_id().is_some()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub fn login(&self, pixiv_id: &str, password: &str) -> Result<()> {
        let doc = self.transport().get(&format!("{ROOT_URL}/index.php"))?;
        if doc.contains_signal(logged_in_signal()) {
            debug!("已处于登录状态，跳过表单提交");
            if !self.is_logged_in() {
                self.ensure_logged_in()?;
            }
            return Ok(());
        }

        let Some(mut form) = doc.form_with_action("/login.php")? else {
            warn!("首页没有找到登录表单: {}", doc.url());
            return Err(PixivError::LoginFailed(
                "login form is not available".to_string(),
            ));
        };
        form.set("pixiv_id", pixiv_id);
        form.set("pass", password);

        let doc = self.transport().submit(&form)?;
        if !doc.contains_signal(logged_in_signal()) {
            return Err(PixivError::LoginFailed(
                "credentials were rejected".to_string(),
            ));
        }
        self.record_member_id(&doc)
    }

    fn ensure_logged_in(&self) -> Result<()> {
        let doc = self.transport().get(&format!("{ROOT_URL}/mypage.php"))?;
        if !doc.contains_signal(logged_in_signal()) {
            return Err(PixivError::LoginFailed(
                "existing session is not authenticated".to_string(),
            ));
        }
        self.record_member_id(&doc)
    }

    fn record_member_id(&self, doc: &Document) -> Result<()> {
        let member_id = member_id_from_mypage(doc)?;
        if self.inner.member_id.set(member_id).is_err() {
            debug!("member_id 已记录，忽略重复写入");
        } else {
            info!("登录成功，member_id={}", member_id);
        }
        Ok(())
    }

    /// 所有实体抓取都走这里；登录之后若页面失去登录标记则直接报错。
    pub fn fetch(&self, url: &str) -> Result<Document> {
        let doc = self.transport().get(url)?;
        if self.is_logged_in() && !doc.contains_signal(logged_in_signal()) {
            warn!("登录态已失效: {}", url);
            return Err(PixivError::SessionExpired {
                url: url.to_string(),
            });
        }
        Ok(doc)
    }

    fn resolve_member_id(&self, member_id: Option<u64>) -> Result<u64> {
        member_id
            .or_else(|| self.member_id())
            .ok_or(PixivError::NotLoggedIn)
    }

    pub fn illust(&self, illust_id: u64) -> Illust {
        Illust::from_key(illust_id).bind(self)
    }

    /// `member_id` 为 `None` 时取当前登录用户。
    pub fn member(&self, member_id: Option<u64>) -> Result<Member> {
        let member_id = self.resolve_member_id(member_id)?;
        Ok(Member::from_key(member_id).bind(self))
    }

    /// `member_id` 为 `None` 时取当前登录用户，`page_num` 默认第 1 页。
    pub fn bookmark_list(
        &self,
        member_id: Option<u64>,
        page_num: Option<u32>,
    ) -> Result<BookmarkList> {
        let member_id = self.resolve_member_id(member_id)?;
        let page_num = page_num.unwrap_or(1);
        if page_num == 0 {
            return Err(PixivError::InvalidArgument(
                "page_num starts at 1".to_string(),
            ));
        }
        Ok(BookmarkList::from_key(BookmarkKey { member_id, page_num }).bind(self))
    }

    pub fn bookmarks(&self, list: BookmarkList, include_deleted: bool) -> Bookmarks {
        Bookmarks::new(self.clone(), list.bind(self), include_deleted)
    }

    pub fn member_bookmarks(
        &self,
        member_id: Option<u64>,
        include_deleted: bool,
    ) -> Result<Bookmarks> {
        let list = self.bookmark_list(member_id, None)?;
        Ok(self.bookmarks(list, include_deleted))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("member_id", &self.member_id())
            .finish_non_exhaustive()
    }
}

fn member_id_from_mypage(doc: &Document) -> Result<u64> {
    let href = doc
        .select_attr(".profile_area a", "href")?
        .ok_or_else(|| PixivError::LoginFailed("profile link not found".to_string()))?;
    re_trailing_id()
        .captures(href.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(|| PixivError::LoginFailed(format!("no member id in `{href}`")))
}
