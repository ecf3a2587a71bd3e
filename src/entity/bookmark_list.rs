//! 收藏列表的单页。

use std::sync::OnceLock;

use regex::Regex;
use scraper::ElementRef;

use super::lazy::{EntityKind, Lazy};
use crate::error::{PixivError, Result};
use crate::network_parser::Document;
use crate::network_parser::document::selector;
use crate::session::ROOT_URL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookmarkKey {
    pub member_id: u64,
    pub page_num: u32,
}

impl BookmarkKey {
    pub fn next_page(self) -> Self {
        Self {
            member_id: self.member_id,
            page_num: self.page_num + 1,
        }
    }
}

/// 收藏列表中的一项。已删除的作品用 `Deleted` 占位，和解析失败区分开。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkItem {
    Illust { illust_id: u64, title: String },
    Deleted,
}

#[derive(Debug, Clone)]
pub struct BookmarkAttrs {
    pub items: Vec<BookmarkItem>,
    pub has_next: bool,
    pub total_count: Option<usize>,
}

pub struct BookmarkPage;

pub type BookmarkList = Lazy<BookmarkPage>;

static RE_ILLUST_ID: OnceLock<Regex> = OnceLock::new();

fn re_illust_id() -> &'static Regex {
    RE_ILLUST_ID.get_or_init(|| Regex::new(r"illust_id=(\d+)").expect("compile RE_ILLUST_ID"))
}

impl EntityKind for BookmarkPage {
    type Key = BookmarkKey;
    type Attrs = BookmarkAttrs;

    const NAME: &'static str = "BookmarkList";

    fn url(key: &BookmarkKey) -> String {
        format!(
            "{ROOT_URL}/bookmark.php?id={}&rest=show&p={}",
            key.member_id, key.page_num
        )
    }

    fn extract(_key: &BookmarkKey, doc: &Document) -> Result<BookmarkAttrs> {
        let entries = selector(".display_works li")?;
        let link = selector(r#"a[href*="illust_id="]"#)?;
        let title = selector(".work_title, h1")?;
        let deleted_img = selector(r#"img[src*="limit_unknown"], img[src*="deleted"]"#)?;

        let mut items = Vec::new();
        for (idx, entry) in doc.html().select(&entries).enumerate() {
            let id = entry
                .select(&link)
                .filter_map(|a| a.value().attr("href"))
                .find_map(|href| re_illust_id().captures(href))
                .and_then(|caps| caps[1].parse::<u64>().ok());

            match id {
                Some(illust_id) => items.push(BookmarkItem::Illust {
                    illust_id,
                    title: entry.select(&title).next().map(text_of).unwrap_or_default(),
                }),
                None if is_deleted(entry, &deleted_img) => items.push(BookmarkItem::Deleted),
                None => {
                    return Err(PixivError::parse(
                        "bookmark list",
                        format!("entry #{idx} is neither an illust nor a deleted work"),
                    ));
                }
            }
        }

        let has_next = doc.select_first(r#".pager a[rel="next"], .pages .next a"#)?.is_some();
        let total_count = doc.select_text(".count-badge")?.and_then(|t| {
            let digits: String = t.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        });

        Ok(BookmarkAttrs {
            items,
            has_next,
            total_count,
        })
    }
}

fn is_deleted(entry: ElementRef<'_>, deleted_img: &scraper::Selector) -> bool {
    entry
        .value()
        .attr("class")
        .is_some_and(|c| c.split_whitespace().any(|c| c == "deleted"))
        || entry.select(deleted_img).next().is_some()
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

impl Lazy<BookmarkPage> {
    pub fn member_id(&self) -> u64 {
        self.key().member_id
    }

    pub fn page_num(&self) -> u32 {
        self.key().page_num
    }

    pub fn items(&self) -> Result<&[BookmarkItem]> {
        Ok(&self.attrs()?.items)
    }

    pub fn has_next(&self) -> Result<bool> {
        Ok(self.attrs()?.has_next)
    }

    /// 下一页的页码；没有下一页时为 `None`。
    pub fn next_page_num(&self) -> Result<Option<u32>> {
        Ok(self.has_next()?.then(|| self.page_num() + 1))
    }

    pub fn total_count(&self) -> Result<Option<usize>> {
        Ok(self.attrs()?.total_count)
    }

    pub fn illust_ids(&self) -> Result<Vec<u64>> {
        Ok(self
            .items()?
            .iter()
            .filter_map(|item| match item {
                BookmarkItem::Illust { illust_id, .. } => Some(*illust_id),
                BookmarkItem::Deleted => None,
            })
            .collect())
    }
}
