//! 用户主页：名字、头像与作品数。

use serde::Serialize;

use super::lazy::{EntityKind, Lazy};
use crate::error::{PixivError, Result};
use crate::network_parser::Document;
use crate::session::ROOT_URL;

pub struct MemberPage;

pub type Member = Lazy<MemberPage>;

#[derive(Debug, Clone, Serialize)]
pub struct MemberAttrs {
    pub member_id: u64,
    pub name: String,
    pub avatar_url: Option<String>,
    pub works_count: Option<usize>,
}

impl EntityKind for MemberPage {
    type Key = u64;
    type Attrs = MemberAttrs;

    const NAME: &'static str = "Member";

    fn url(member_id: &u64) -> String {
        format!("{ROOT_URL}/member.php?id={member_id}")
    }

    fn extract(member_id: &u64, doc: &Document) -> Result<MemberAttrs> {
        let name = doc
            .select_text(".profile-unit .user")?
            .ok_or_else(|| PixivError::parse("member", "user name not found"))?;
        let works_count = doc
            .select_text(".count-badge")?
            .and_then(|t| {
                let digits: String = t.chars().filter(char::is_ascii_digit).collect();
                digits.parse().ok()
            });

        Ok(MemberAttrs {
            member_id: *member_id,
            name,
            avatar_url: doc.select_attr(".profile-unit img.user-image", "src")?,
            works_count,
        })
    }
}

impl Lazy<MemberPage> {
    pub fn member_id(&self) -> u64 {
        *self.key()
    }

    pub fn name(&self) -> Result<&str> {
        Ok(&self.attrs()?.name)
    }

    pub fn avatar_url(&self) -> Result<Option<&str>> {
        Ok(self.attrs()?.avatar_url.as_deref())
    }

    pub fn works_count(&self) -> Result<Option<usize>> {
        Ok(self.attrs()?.works_count)
    }
}
