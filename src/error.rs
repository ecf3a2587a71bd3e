//! 统一错误类型。
//!
//! 库内所有操作都返回 `PixivError`；二进制入口再用 anyhow 包一层上下文。

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixivError {
    /// 凭据被拒、登录表单缺失，或返回页面里没有登录成功的标记。
    #[error("login failed: {0}")]
    LoginFailed(String),
    /// 实体还没有 `bind` 到任何 Session 就被访问了属性。
    #[error("entity is not bound to a session")]
    NotBound,
    /// 需要当前用户 ID 的操作，但 Session 尚未登录。
    #[error("session is not logged in")]
    NotLoggedIn,
    /// 登录后某次请求拿回来的页面已不再是登录状态。
    #[error("session expired while fetching {url}")]
    SessionExpired { url: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to parse {what}: {detail}")]
    Parse { what: &'static str, detail: String },
    #[error("http {status} for {url}")]
    Http { status: u16, url: String },
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected content type `{content_type}` for {url}")]
    UnexpectedContent { url: String, content_type: String },
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl PixivError {
    pub(crate) fn parse(what: &'static str, detail: impl Into<String>) -> Self {
        PixivError::Parse {
            what,
            detail: detail.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PixivError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = PixivError> = std::result::Result<T, E>;
