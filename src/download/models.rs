//! 下载相关的数据模型定义。

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use super::pattern::Pattern;
use crate::error::PixivError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Small,
    Medium,
    #[default]
    Original,
}

impl FromStr for ImageSize {
    type Err = PixivError;

    /// 接受 `s`/`small`、`m`/`medium`、`o`/`original`（不区分大小写）。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "small" => Ok(ImageSize::Small),
            "m" | "medium" => Ok(ImageSize::Medium),
            "o" | "original" => Ok(ImageSize::Original),
            other => Err(PixivError::InvalidArgument(format!(
                "unknown size `{other}`"
            ))),
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageSize::Small => "small",
            ImageSize::Medium => "medium",
            ImageSize::Original => "original",
        };
        f.write_str(name)
    }
}

/// 单图下载的保存目标。
pub enum Destination<'a> {
    /// 直接写入调用方给的 writer，不碰文件系统。
    Sink(&'a mut dyn Write),
    Path(PathBuf),
    /// 按模板生成路径。
    Pattern(&'a Pattern),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub downloaded: usize,
    pub failed: usize,
}
