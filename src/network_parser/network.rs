use std::io::Write;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, CONNECTION, CONTENT_TYPE, HeaderMap, HeaderValue, REFERER, USER_AGENT,
};
use tracing::{debug, warn};

use super::document::{Document, Form};
use super::transport::Transport;
use crate::error::{PixivError, Result};

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36".to_string(),
        }
    }
}

/// reqwest blocking 客户端，自带 Cookie 容器，登录态保存在这里。
pub struct WebTransport {
    client: Client,
    config: WebConfig,
}

impl WebTransport {
    pub fn new(config: WebConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        // 未启用 gzip 解码，要求服务端直接返回原始字节
        default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        default_headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .default_headers(default_headers)
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn page_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(USER_AGENT, self.user_agent());
        headers
    }

    fn user_agent(&self) -> HeaderValue {
        HeaderValue::from_str(&self.config.user_agent)
            .unwrap_or(HeaderValue::from_static("Mozilla/5.0"))
    }

    fn into_document(resp: Response) -> Result<Document> {
        let resp = check_status(resp)?;
        let url = resp.url().to_string();
        let body = resp.text()?;
        Ok(Document::parse(url, body))
    }
}

impl Transport for WebTransport {
    fn get(&self, url: &str) -> Result<Document> {
        debug!("GET {}", url);
        let resp = self.client.get(url).headers(self.page_headers()).send()?;
        Self::into_document(resp)
    }

    fn submit(&self, form: &Form) -> Result<Document> {
        debug!("提交表单: {} {}", form.method, form.action);
        let req = if form.method.eq_ignore_ascii_case("GET") {
            self.client.get(&form.action).query(&form.fields)
        } else {
            self.client.post(&form.action).form(&form.fields)
        };
        let resp = req.headers(self.page_headers()).send()?;
        Self::into_document(resp)
    }

    fn download(&self, url: &str, referer: Option<&str>, sink: &mut dyn Write) -> Result<u64> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("image/*,*/*;q=0.8"));
        headers.insert(USER_AGENT, self.user_agent());
        if let Some(referer) = referer {
            match HeaderValue::from_str(referer) {
                Ok(v) => {
                    headers.insert(REFERER, v);
                }
                Err(_) => warn!("Referer 含非法字符，已忽略: {}", referer),
            }
        }

        debug!("下载 {} (referer: {:?})", url, referer);
        let resp = self.client.get(url).headers(headers).send()?;
        let mut resp = check_status(resp)?;

        // 图片地址被重定向回 HTML 页面，通常意味着登录态已失效
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if content_type.starts_with("text/") {
            return Err(PixivError::UnexpectedContent {
                url: url.to_string(),
                content_type,
            });
        }

        let written = resp.copy_to(sink)?;
        debug!("下载完成 {} ({} bytes)", url, written);
        Ok(written)
    }
}

fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(PixivError::Http {
            status: status.as_u16(),
            url: resp.url().to_string(),
        })
    }
}
