//! 跨页遍历收藏列表。
//!
//! 把分页隐藏起来，对外是一条惰性、只走一遍的序列：当前页用完才去抓下一页，
//! 没有下一页就结束。

use std::collections::HashSet;
use std::iter::FusedIterator;

use tracing::debug;

use crate::entity::{BookmarkItem, BookmarkList, Illust};
use crate::error::Result;
use crate::session::Session;

pub struct Bookmarks {
    session: Session,
    current: BookmarkList,
    index: usize,
    include_deleted: bool,
    done: bool,
}

impl Bookmarks {
    pub(crate) fn new(session: Session, start: BookmarkList, include_deleted: bool) -> Self {
        Self {
            session,
            current: start,
            index: 0,
            include_deleted,
            done: false,
        }
    }

    /// 当前游标所在页码。
    pub fn page_num(&self) -> u32 {
        self.current.page_num()
    }

    /// 丢掉已删除占位，只保留作品。
    pub fn present(self) -> impl Iterator<Item = Result<Illust>> {
        self.filter_map(Result::transpose)
    }

    /// 翻页期间列表可能整体后移，同一作品会在下一页再出现一次；
    /// 这里只保留每个作品第一次出现的位置，已删除占位和错误原样放行。
    pub fn unique(self) -> impl Iterator<Item = Result<Option<Illust>>> {
        let mut seen = HashSet::new();
        self.filter(move |item| match item {
            Ok(Some(illust)) => {
                let fresh = seen.insert(illust.illust_id());
                if !fresh {
                    debug!("跳过重复收藏 illust_id={}", illust.illust_id());
                }
                fresh
            }
            _ => true,
        })
    }
}

impl Iterator for Bookmarks {
    /// `Ok(None)` 是已删除作品的占位，只在 `include_deleted` 时出现。
    type Item = Result<Option<Illust>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let (item, has_next) = match self.current.attrs() {
                Ok(attrs) => (attrs.items.get(self.index).cloned(), attrs.has_next),
                Err(err) => {
                    // 抓页失败：在这一页第一项的位置报错，然后结束
                    self.done = true;
                    return Some(Err(err));
                }
            };

            match item {
                Some(BookmarkItem::Illust { illust_id, .. }) => {
                    self.index += 1;
                    return Some(Ok(Some(self.session.illust(illust_id))));
                }
                Some(BookmarkItem::Deleted) => {
                    self.index += 1;
                    if self.include_deleted {
                        return Some(Ok(None));
                    }
                }
                None if has_next => {
                    let next = self.current.key().next_page();
                    debug!("收藏列表翻页: member_id={} p={}", next.member_id, next.page_num);
                    self.current = BookmarkList::from_key(next).bind(&self.session);
                    self.index = 0;
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

impl FusedIterator for Bookmarks {}
