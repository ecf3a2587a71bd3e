//! 站点实体：作品、用户、收藏列表。
//!
//! 都是 `Lazy<K>` 的特化，由 `Session` 的工厂方法创建并绑定。

pub mod bookmark_list;
pub mod illust;
pub mod lazy;
pub mod member;

pub use bookmark_list::{BookmarkAttrs, BookmarkItem, BookmarkKey, BookmarkList, BookmarkPage};
pub use illust::{AttrGetter, Illust, IllustAttrs, IllustPage, illust_attr, illust_attr_names};
pub use lazy::{EntityKind, Fetcher, Lazy};
pub use member::{Member, MemberAttrs, MemberPage};
