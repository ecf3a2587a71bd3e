//! 文件名模板。
//!
//! 模板是一串片段，逐个求值后直接拼接成路径：
//! - `ImageName`：图片 URL 的文件名，数字查询串折进扩展名（`a.jpg?123` → `a.jpg.123`）
//! - `Attr`：从作品上读取的属性（见 `illust_attr`）
//! - `Call`：调用方提供的函数
//! - `Literal`：原样保留

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use crate::entity::{AttrGetter, Illust, illust_attr, illust_attr_names};
use crate::error::{PixivError, Result};

/// 保留字：取图片 URL 的文件名。
pub const IMAGE_NAME: &str = "image_name";

pub type SegmentFn = Rc<dyn Fn(&Illust) -> Result<String>>;

#[derive(Clone)]
pub enum Segment {
    Literal(String),
    ImageName,
    Attr {
        name: &'static str,
        get: AttrGetter,
    },
    Call(SegmentFn),
}

impl Segment {
    /// 按名字查属性表；`image_name` 是保留字。
    pub fn attr(name: &str) -> Result<Self> {
        if name == IMAGE_NAME {
            return Ok(Segment::ImageName);
        }
        match illust_attr(name) {
            Some((name, get)) => Ok(Segment::Attr { name, get }),
            None => Err(PixivError::InvalidArgument(format!(
                "unknown attribute `{name}` (expected one of: {}, {IMAGE_NAME})",
                illust_attr_names().collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    fn resolve(&self, illust: &Illust, url: &str) -> Result<String> {
        match self {
            Segment::Literal(text) => Ok(text.clone()),
            Segment::ImageName => Ok(image_name(url)),
            Segment::Attr { get, .. } => get(illust),
            Segment::Call(f) => f(illust),
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Segment::ImageName => f.write_str("ImageName"),
            Segment::Attr { name, .. } => f.debug_tuple("Attr").field(name).finish(),
            Segment::Call(_) => f.write_str("Call(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 在模板最前面加上目录，生成的路径落到 `dir` 之下。
    pub fn under(mut self, dir: &Path) -> Self {
        let mut prefix = dir.to_string_lossy().into_owned();
        if !prefix.is_empty()
            && !prefix.ends_with(std::path::MAIN_SEPARATOR)
            && !prefix.ends_with('/')
        {
            prefix.push(std::path::MAIN_SEPARATOR);
        }
        self.segments.insert(0, Segment::Literal(prefix));
        self
    }

    pub fn literal(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Literal(text.into()));
        self
    }

    pub fn image_name(mut self) -> Self {
        self.segments.push(Segment::ImageName);
        self
    }

    pub fn attr(mut self, name: &str) -> Result<Self> {
        self.segments.push(Segment::attr(name)?);
        Ok(self)
    }

    pub fn call<F>(mut self, f: F) -> Self
    where
        F: Fn(&Illust) -> Result<String> + 'static,
    {
        self.segments.push(Segment::Call(Rc::new(f)));
        self
    }

    /// 解析配置里的字符串模板，例如 `{member_id}/{illust_id}_{image_name}`。
    /// `{{` 与 `}}` 表示字面量花括号。
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(PixivError::InvalidArgument(format!(
                                    "unclosed `{{` in pattern `{template}`"
                                )));
                            }
                            Some(c) => name.push(c),
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::attr(name.trim())?);
                }
                '}' => {
                    return Err(PixivError::InvalidArgument(format!(
                        "unmatched `}}` in pattern `{template}`"
                    )));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    pub fn resolve(&self, illust: &Illust, url: &str) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            out.push_str(&segment.resolve(illust, url)?);
        }
        Ok(out)
    }
}

/// URL 的文件名部分。纯数字查询串作为额外扩展名保留，其它查询串丢弃。
pub fn image_name(url: &str) -> String {
    let url = url.split('#').next().unwrap_or(url);
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };
    let base = path.rsplit('/').next().unwrap_or(path);
    match query {
        Some(q) if !q.is_empty() && q.chars().all(|c| c.is_ascii_digit()) => {
            format!("{base}.{q}")
        }
        _ => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_name_folds_numeric_query() {
        assert_eq!(image_name("https://x/foo.jpg?999"), "foo.jpg.999");
        assert_eq!(image_name("https://x/a/b/foo.png"), "foo.png");
        assert_eq!(image_name("https://x/foo.png?v=abc"), "foo.png");
        assert_eq!(image_name("https://x/foo.png?"), "foo.png");
        assert_eq!(image_name("foo.gif#frag"), "foo.gif");
    }

    #[test]
    fn parse_splits_literals_and_tokens() {
        let pattern = Pattern::parse("{member_id}/{{x}}_{id}-{image_name}").unwrap();
        let shape: Vec<String> = pattern
            .segments()
            .iter()
            .map(|s| format!("{s:?}"))
            .collect();
        assert_eq!(
            shape,
            vec![
                r#"Attr("member_id")"#,
                r#"Literal("/{x}_")"#,
                r#"Attr("id")"#,
                r#"Literal("-")"#,
                "ImageName",
            ]
        );
    }

    #[test]
    fn parse_rejects_bad_templates() {
        for bad in ["{nope}", "{title", "title}", "{ti{tle}"] {
            assert!(
                matches!(Pattern::parse(bad), Err(PixivError::InvalidArgument(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn under_prefixes_directory() {
        let pattern = Pattern::parse("{image_name}").unwrap().under(Path::new("out"));
        let shape: Vec<String> = pattern
            .segments()
            .iter()
            .map(|s| format!("{s:?}"))
            .collect();
        let prefix = format!("out{}", std::path::MAIN_SEPARATOR);
        assert_eq!(
            shape,
            vec![format!("Literal({prefix:?})"), "ImageName".to_string()]
        );
    }

    #[test]
    fn builder_rejects_unknown_attribute() {
        assert!(Pattern::new().attr("password").is_err());
        assert!(matches!(
            Pattern::new().attr(IMAGE_NAME).unwrap().segments(),
            [Segment::ImageName]
        ));
    }
}
