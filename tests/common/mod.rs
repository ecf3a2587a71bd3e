//! 集成测试共用的内存传输层：按 URL 返回固定页面，并记录每一次请求。

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use pixiv_dl::network_parser::Form;
use pixiv_dl::{Document, PixivError, Result, Transport};

pub const ROOT: &str = "https://www.pixiv.net";

#[derive(Default)]
struct StubState {
    pages: HashMap<String, String>,
    images: HashMap<String, Vec<u8>>,
    broken_downloads: HashSet<String>,
    login_response: Option<String>,
    gets: Vec<String>,
    submits: Vec<Form>,
    downloads: Vec<(String, Option<String>)>,
}

/// 克隆出来的句柄共享同一份状态，测试里留一份用来断言。
#[derive(Clone, Default)]
pub struct StubTransport {
    state: Rc<RefCell<StubState>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: impl Into<String>, body: impl Into<String>) -> &Self {
        self.state.borrow_mut().pages.insert(url.into(), body.into());
        self
    }

    pub fn image(&self, url: impl Into<String>, bytes: &[u8]) -> &Self {
        self.state
            .borrow_mut()
            .images
            .insert(url.into(), bytes.to_vec());
        self
    }

    /// 写出一部分字节后报错，模拟传输中断。
    pub fn broken_download(&self, url: impl Into<String>) -> &Self {
        self.state.borrow_mut().broken_downloads.insert(url.into());
        self
    }

    pub fn login_response(&self, body: impl Into<String>) -> &Self {
        self.state.borrow_mut().login_response = Some(body.into());
        self
    }

    pub fn get_count(&self, url: &str) -> usize {
        self.state
            .borrow()
            .gets
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn gets(&self) -> Vec<String> {
        self.state.borrow().gets.clone()
    }

    pub fn submits(&self) -> Vec<Form> {
        self.state.borrow().submits.clone()
    }

    pub fn downloads(&self) -> Vec<(String, Option<String>)> {
        self.state.borrow().downloads.clone()
    }
}

impl Transport for StubTransport {
    fn get(&self, url: &str) -> Result<Document> {
        let mut state = self.state.borrow_mut();
        state.gets.push(url.to_string());
        match state.pages.get(url) {
            Some(body) => Ok(Document::parse(url, body.clone())),
            None => Err(not_found(url)),
        }
    }

    fn submit(&self, form: &Form) -> Result<Document> {
        let mut state = self.state.borrow_mut();
        state.submits.push(form.clone());
        match &state.login_response {
            Some(body) => Ok(Document::parse(form.action.clone(), body.clone())),
            None => Err(not_found(&form.action)),
        }
    }

    fn download(&self, url: &str, referer: Option<&str>, sink: &mut dyn Write) -> Result<u64> {
        let mut state = self.state.borrow_mut();
        state
            .downloads
            .push((url.to_string(), referer.map(str::to_string)));

        if state.broken_downloads.contains(url) {
            sink.write_all(b"partial").map_err(|e| io_error(url, e))?;
            return Err(io_error(
                url,
                io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"),
            ));
        }
        let Some(bytes) = state.images.get(url) else {
            return Err(not_found(url));
        };
        sink.write_all(bytes).map_err(|e| io_error(url, e))?;
        Ok(bytes.len() as u64)
    }
}

fn not_found(url: &str) -> PixivError {
    PixivError::Http {
        status: 404,
        url: url.to_string(),
    }
}

fn io_error(url: &str, source: io::Error) -> PixivError {
    PixivError::Io {
        path: PathBuf::from(url),
        source,
    }
}

// ---- 页面样本 ----

pub const INDEX_LOGGED_OUT: &str = r#"<html><body>
  <form action="/login.php" method="post">
    <input type="hidden" name="mode" value="login">
    <input type="text" name="pixiv_id" value="">
    <input type="password" name="pass" value="">
    <input type="submit" value="Login">
  </form>
</body></html>"#;

pub const INDEX_WITHOUT_FORM: &str = "<html><body><p>maintenance</p></body></html>";

pub const LOGIN_REJECTED: &str = r#"<html><body><p class="error">wrong password</p></body></html>"#;

pub fn mypage(member_id: u64) -> String {
    format!(
        r#"<html><body>
  <div class="profile_area"><a href="/member.php?id={member_id}">me</a></div>
  <a href="/logout.php">Logout</a>
</body></html>"#
    )
}

pub fn illust_url(illust_id: u64) -> String {
    format!("{ROOT}/member_illust.php?mode=medium&illust_id={illust_id}")
}

pub fn bookmark_url(member_id: u64, page: u32) -> String {
    format!("{ROOT}/bookmark.php?id={member_id}&rest=show&p={page}")
}

pub fn medium_image_url(illust_id: u64) -> String {
    format!("https://i1.pixiv.net/img01/img/artist/{illust_id}_m.jpg?999")
}

/// 作品页；`pages` 为 `Some(n)` 时是 n 页的漫画。
pub fn illust_page(illust_id: u64, member_id: u64, title: &str, pages: Option<u32>) -> String {
    let meta = match pages {
        Some(n) => format!("<li>複数枚投稿 {n}P</li>"),
        None => "<li>2013年5月1日</li>".to_string(),
    };
    format!(
        r#"<html><body>
  <a href="/logout.php">logout</a>
  <div class="profile-unit">
    <a class="user-link" href="/member.php?id={member_id}"><h1 class="user">artist</h1></a>
  </div>
  <div class="work-info">
    <ul class="meta">{meta}</ul>
    <h1 class="title">{title}</h1>
  </div>
  <div class="works_display"><img src="{}"></div>
</body></html>"#,
        medium_image_url(illust_id)
    )
}

pub enum Entry {
    Work(u64),
    Deleted,
}

pub fn bookmark_page(entries: &[Entry], has_next: bool) -> String {
    let items: String = entries
        .iter()
        .map(|entry| match entry {
            Entry::Work(id) => format!(
                r#"<li><a href="member_illust.php?mode=medium&amp;illust_id={id}"><h1 class="work_title">work {id}</h1></a></li>"#
            ),
            Entry::Deleted => {
                r#"<li class="deleted"><img src="/images/limit_unknown_s.png"></li>"#.to_string()
            }
        })
        .collect();
    let pager = if has_next {
        r#"<div class="pager"><a rel="next" href="?p=next">next</a></div>"#
    } else {
        ""
    };
    format!(
        r#"<html><body><a href="/logout.php">logout</a>
  <ul class="display_works">{items}</ul>{pager}
</body></html>"#
    )
}

/// 通过 mypage 接管一个已登录的 Session。
pub fn logged_in(stub: &StubTransport, member_id: u64) -> pixiv_dl::Session {
    stub.page(format!("{ROOT}/mypage.php"), mypage(member_id));
    match pixiv_dl::Session::adopt(stub.clone()) {
        Ok(session) => session,
        Err(err) => panic!("adopt failed: {err}"),
    }
}
