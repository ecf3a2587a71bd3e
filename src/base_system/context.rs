//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `config.yml` 的字段元信息。

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{ConfigSpec, FieldMeta};
use crate::download::{ImageSize, Pattern};
use crate::error::Result;
use crate::network_parser::WebConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // 账号
    #[serde(default)]
    pub pixiv_id: String,
    #[serde(default)]
    pub password: String,

    // 保存
    #[serde(default)]
    pub save_path: String,
    #[serde(default = "default_image_size")]
    pub image_size: String,
    #[serde(default = "default_illust_pattern")]
    pub illust_pattern: String,
    #[serde(default = "default_manga_pattern")]
    pub manga_pattern: String,

    // 行为
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default = "default_true")]
    pub continue_on_error: bool,

    // 网络
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pixiv_id: String::new(),
            password: String::new(),
            save_path: String::new(),
            image_size: default_image_size(),
            illust_pattern: default_illust_pattern(),
            manga_pattern: default_manga_pattern(),
            include_deleted: false,
            continue_on_error: default_true(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 10] = [
            FieldMeta {
                name: "pixiv_id",
                description: "pixiv 登录账号（邮箱或 pixiv ID）",
            },
            FieldMeta {
                name: "password",
                description: "登录密码（留空时读取环境变量 PIXIV_PASSWORD）",
            },
            FieldMeta {
                name: "save_path",
                description: "保存路径（留空为当前目录）",
            },
            FieldMeta {
                name: "image_size",
                description: "单图下载尺寸, 可选: [small, medium, original]",
            },
            FieldMeta {
                name: "illust_pattern",
                description: "单图文件名模板\n可用: {illust_id} {member_id} {member_name} {safe_member_name} {title} {safe_title} {num_pages} {image_name}",
            },
            FieldMeta {
                name: "manga_pattern",
                description: "漫画（多图）文件名模板，可用字段同上",
            },
            FieldMeta {
                name: "include_deleted",
                description: "遍历收藏时是否保留已删除作品的占位（仅影响计数与日志）",
            },
            FieldMeta {
                name: "continue_on_error",
                description: "漫画某一页下载失败时是否继续下载后续页面",
            },
            FieldMeta {
                name: "request_timeout",
                description: "请求超时时间（秒）",
            },
            FieldMeta {
                name: "user_agent",
                description: "请求使用的 User-Agent",
            },
        ];
        &FIELDS
    }
}

impl Config {
    pub fn default_save_dir(&self) -> PathBuf {
        if self.save_path.trim().is_empty() {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        } else {
            PathBuf::from(&self.save_path)
        }
    }

    pub fn image_size(&self) -> Result<ImageSize> {
        self.image_size.parse()
    }

    /// 单图模板，已挂到保存目录下。
    pub fn illust_pattern(&self) -> Result<Pattern> {
        Ok(Pattern::parse(&self.illust_pattern)?.under(&self.default_save_dir()))
    }

    pub fn manga_pattern(&self) -> Result<Pattern> {
        Ok(Pattern::parse(&self.manga_pattern)?.under(&self.default_save_dir()))
    }

    pub fn web_config(&self) -> WebConfig {
        let mut web = WebConfig {
            request_timeout: Duration::from_secs(self.request_timeout.max(1)),
            ..WebConfig::default()
        };
        if !self.user_agent.trim().is_empty() {
            web.user_agent = self.user_agent.clone();
        }
        web
    }

    /// 配置里的密码优先，其次环境变量 `PIXIV_PASSWORD`。
    pub fn resolve_password(&self) -> Option<String> {
        if !self.password.is_empty() {
            return Some(self.password.clone());
        }
        std::env::var("PIXIV_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty())
    }
}

fn default_true() -> bool {
    true
}

fn default_image_size() -> String {
    "original".to_string()
}

fn default_illust_pattern() -> String {
    "{member_id}/{illust_id}_{image_name}".to_string()
}

fn default_manga_pattern() -> String {
    "{member_id}/{illust_id}/{image_name}".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    WebConfig::default().user_agent
}
