//! 作品页（illust）。

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::lazy::{EntityKind, Lazy};
use crate::base_system::paths::safe_fs_name;
use crate::error::{PixivError, Result};
use crate::network_parser::Document;
use crate::session::ROOT_URL;

pub struct IllustPage;

pub type Illust = Lazy<IllustPage>;

#[derive(Debug, Clone, Serialize)]
pub struct IllustAttrs {
    pub illust_id: u64,
    pub member_id: u64,
    pub member_name: String,
    pub title: String,
    pub caption: Option<String>,
    pub tags: Vec<String>,
    pub small_image_url: String,
    pub medium_image_url: String,
    pub original_image_url: String,
    /// 仅漫画（多图）作品有页数。
    pub num_pages: Option<u32>,
}

static RE_SIZE_SUFFIX: OnceLock<Regex> = OnceLock::new();
static RE_EXT: OnceLock<Regex> = OnceLock::new();
static RE_MEMBER_ID: OnceLock<Regex> = OnceLock::new();
static RE_PAGES: OnceLock<Regex> = OnceLock::new();

fn re_size_suffix() -> &'static Regex {
    RE_SIZE_SUFFIX
        .get_or_init(|| Regex::new(r"_m(\.\w+(?:\?\d+)?)$").expect("compile RE_SIZE_SUFFIX"))
}

fn re_ext() -> &'static Regex {
    RE_EXT.get_or_init(|| Regex::new(r"\.\w+$").expect("compile RE_EXT"))
}

fn re_member_id() -> &'static Regex {
    RE_MEMBER_ID.get_or_init(|| Regex::new(r"[?&]id=(\d+)").expect("compile RE_MEMBER_ID"))
}

fn re_pages() -> &'static Regex {
    RE_PAGES.get_or_init(|| Regex::new(r"(\d+)\s*P\b").expect("compile RE_PAGES"))
}

impl EntityKind for IllustPage {
    type Key = u64;
    type Attrs = IllustAttrs;

    const NAME: &'static str = "Illust";

    fn url(illust_id: &u64) -> String {
        format!("{ROOT_URL}/member_illust.php?mode=medium&illust_id={illust_id}")
    }

    fn extract(illust_id: &u64, doc: &Document) -> Result<IllustAttrs> {
        let medium_image_url = doc
            .select_attr(".works_display img", "src")?
            .ok_or_else(|| PixivError::parse("illust", "medium image not found"))?;

        let (small_image_url, original_image_url) = if re_size_suffix().is_match(&medium_image_url)
        {
            (
                re_size_suffix()
                    .replace(&medium_image_url, "_s$1")
                    .into_owned(),
                re_size_suffix().replace(&medium_image_url, "$1").into_owned(),
            )
        } else {
            (medium_image_url.clone(), medium_image_url.clone())
        };

        let member_href = doc
            .select_attr(".profile-unit a.user-link", "href")?
            .ok_or_else(|| PixivError::parse("illust", "member link not found"))?;
        let member_id = re_member_id()
            .captures(&member_href)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .ok_or_else(|| PixivError::parse("illust", format!("bad member link `{member_href}`")))?;

        let num_pages = doc
            .select_texts(".work-info .meta li")?
            .iter()
            .find_map(|text| re_pages().captures(text).and_then(|c| c[1].parse().ok()));

        Ok(IllustAttrs {
            illust_id: *illust_id,
            member_id,
            member_name: doc
                .select_text(".profile-unit .user")?
                .unwrap_or_default(),
            title: doc.select_text(".work-info .title")?.unwrap_or_default(),
            caption: doc.select_text(".work-info .caption")?,
            tags: doc.select_texts(".tags .tag .text")?,
            small_image_url,
            medium_image_url,
            original_image_url,
            num_pages,
        })
    }
}

impl Lazy<IllustPage> {
    /// 键本身，不需要抓取。
    pub fn illust_id(&self) -> u64 {
        *self.key()
    }

    pub fn member_id(&self) -> Result<u64> {
        Ok(self.attrs()?.member_id)
    }

    pub fn member_name(&self) -> Result<&str> {
        Ok(&self.attrs()?.member_name)
    }

    pub fn title(&self) -> Result<&str> {
        Ok(&self.attrs()?.title)
    }

    pub fn caption(&self) -> Result<Option<&str>> {
        Ok(self.attrs()?.caption.as_deref())
    }

    pub fn tags(&self) -> Result<&[String]> {
        Ok(&self.attrs()?.tags)
    }

    pub fn small_image_url(&self) -> Result<&str> {
        Ok(&self.attrs()?.small_image_url)
    }

    pub fn medium_image_url(&self) -> Result<&str> {
        Ok(&self.attrs()?.medium_image_url)
    }

    pub fn original_image_url(&self) -> Result<&str> {
        Ok(&self.attrs()?.original_image_url)
    }

    pub fn num_pages(&self) -> Result<Option<u32>> {
        Ok(self.attrs()?.num_pages)
    }

    pub fn is_manga(&self) -> Result<bool> {
        Ok(self.num_pages()?.is_some())
    }

    /// 原图地址，漫画按页序展开（`xxx.jpg` → `xxx_p0.jpg`, `xxx_p1.jpg` …）。
    pub fn original_image_urls(&self) -> Result<Vec<String>> {
        let attrs = self.attrs()?;
        let Some(pages) = attrs.num_pages else {
            return Ok(vec![attrs.original_image_url.clone()]);
        };
        (0..pages)
            .map(|n| manga_page_url(&attrs.original_image_url, n))
            .collect()
    }

    pub fn original_image_referer(&self) -> Result<String> {
        let mode = if self.is_manga()? { "manga" } else { "big" };
        Ok(format!(
            "{ROOT_URL}/member_illust.php?mode={mode}&illust_id={}",
            self.illust_id()
        ))
    }
}

/// 在扩展名前插入 `_p{page}`，查询串原样接回去。
fn manga_page_url(original: &str, page: u32) -> Result<String> {
    let (path, query) = match original.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (original, None),
    };
    let ext = re_ext()
        .find(path)
        .ok_or_else(|| PixivError::parse("illust", format!("no extension in `{original}`")))?;

    let mut url = format!("{}_p{page}{}", &path[..ext.start()], ext.as_str());
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    Ok(url)
}

/// 文件名模板可读取的属性。
pub type AttrGetter = fn(&Illust) -> Result<String>;

fn attr_illust_id(illust: &Illust) -> Result<String> {
    Ok(illust.illust_id().to_string())
}

fn attr_member_id(illust: &Illust) -> Result<String> {
    Ok(illust.member_id()?.to_string())
}

fn attr_member_name(illust: &Illust) -> Result<String> {
    Ok(illust.member_name()?.to_string())
}

fn attr_safe_member_name(illust: &Illust) -> Result<String> {
    Ok(safe_fs_name(illust.member_name()?, "_", 80))
}

fn attr_title(illust: &Illust) -> Result<String> {
    Ok(illust.title()?.to_string())
}

fn attr_safe_title(illust: &Illust) -> Result<String> {
    Ok(safe_fs_name(illust.title()?, "_", 120))
}

fn attr_num_pages(illust: &Illust) -> Result<String> {
    Ok(illust.num_pages()?.unwrap_or(1).to_string())
}

static ILLUST_ATTRS: [(&str, AttrGetter); 8] = [
    ("illust_id", attr_illust_id),
    ("id", attr_illust_id),
    ("member_id", attr_member_id),
    ("member_name", attr_member_name),
    ("safe_member_name", attr_safe_member_name),
    ("title", attr_title),
    ("safe_title", attr_safe_title),
    ("num_pages", attr_num_pages),
];

pub fn illust_attr(name: &str) -> Option<(&'static str, AttrGetter)> {
    ILLUST_ATTRS.iter().find(|(n, _)| *n == name).copied()
}

pub fn illust_attr_names() -> impl Iterator<Item = &'static str> {
    ILLUST_ATTRS.iter().map(|(n, _)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANGA_PAGE: &str = r#"<html><body>
      <div class="profile-unit">
        <a class="user-link" href="/member.php?id=77"><h1 class="user">Some/Artist</h1></a>
      </div>
      <div class="work-info">
        <ul class="meta"><li>2013年5月1日 12:00</li><li>複数枚投稿 3P</li></ul>
        <h1 class="title">Sketches</h1>
        <p class="caption">hello</p>
      </div>
      <ul class="tags"><li class="tag"><a class="text">cat</a></li><li class="tag"><a class="text">dog</a></li></ul>
      <div class="works_display"><a href="member_illust.php?mode=manga&illust_id=42">
        <img src="https://i1.pixiv.net/img01/img/artist/42_m.png?1367377200"></a></div>
    </body></html>"#;

    #[test]
    fn extracts_manga_attributes() {
        let doc = Document::parse(IllustPage::url(&42), MANGA_PAGE);
        let attrs = IllustPage::extract(&42, &doc).unwrap();
        assert_eq!(attrs.member_id, 77);
        assert_eq!(attrs.member_name, "Some/Artist");
        assert_eq!(attrs.title, "Sketches");
        assert_eq!(attrs.caption.as_deref(), Some("hello"));
        assert_eq!(attrs.tags, vec!["cat", "dog"]);
        assert_eq!(attrs.num_pages, Some(3));
        assert_eq!(
            attrs.small_image_url,
            "https://i1.pixiv.net/img01/img/artist/42_s.png?1367377200"
        );
        assert_eq!(
            attrs.original_image_url,
            "https://i1.pixiv.net/img01/img/artist/42.png?1367377200"
        );
    }

    #[test]
    fn missing_image_is_a_parse_error() {
        let doc = Document::parse(IllustPage::url(&1), "<html></html>");
        assert!(matches!(
            IllustPage::extract(&1, &doc),
            Err(PixivError::Parse { what: "illust", .. })
        ));
    }

    #[test]
    fn manga_page_suffix_goes_before_the_extension() {
        assert_eq!(
            manga_page_url("https://i1.pixiv.net/a/42.png?1367377200", 2).unwrap(),
            "https://i1.pixiv.net/a/42_p2.png?1367377200"
        );
        assert_eq!(
            manga_page_url("https://i1.pixiv.net/a/42.png?v=abc", 0).unwrap(),
            "https://i1.pixiv.net/a/42_p0.png?v=abc"
        );
        assert_eq!(
            manga_page_url("https://i1.pixiv.net/a/42.jpg", 1).unwrap(),
            "https://i1.pixiv.net/a/42_p1.jpg"
        );
    }

    #[test]
    fn manga_url_without_extension_is_a_parse_error() {
        assert!(matches!(
            manga_page_url("https://i1.pixiv.net/a/42?1.2", 0),
            Err(PixivError::Parse { what: "illust", .. })
        ));
    }

    #[test]
    fn attribute_table_lookup() {
        assert!(illust_attr("title").is_some());
        assert_eq!(illust_attr("id").map(|(n, _)| n), Some("id"));
        assert!(illust_attr("image_name").is_none());
        assert!(illust_attr("__send__").is_none());
        assert!(illust_attr_names().any(|n| n == "safe_title"));
    }
}
