//! 页面文档与表单。

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{PixivError, Result};

/// 一次 GET/POST 拿回来的 HTML 页面。
pub struct Document {
    url: String,
    body: String,
    html: Html,
}

impl Document {
    pub fn parse(url: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let html = Html::parse_document(&body);
        Self {
            url: url.into(),
            body,
            html,
        }
    }

    /// 最终 URL（跟随重定向之后）。
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn contains_signal(&self, signal: &Regex) -> bool {
        signal.is_match(&self.body)
    }

    pub fn select_first(&self, css: &str) -> Result<Option<ElementRef<'_>>> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).next())
    }

    pub fn select_attr(&self, css: &str, attr: &str) -> Result<Option<String>> {
        Ok(self
            .select_first(css)?
            .and_then(|el| el.value().attr(attr))
            .map(|v| v.to_string()))
    }

    /// 第一个匹配元素的文本（去掉首尾空白，空串视为不存在）。
    pub fn select_text(&self, css: &str) -> Result<Option<String>> {
        Ok(self
            .select_first(css)?
            .map(element_text)
            .filter(|s| !s.is_empty()))
    }

    pub fn select_texts(&self, css: &str) -> Result<Vec<String>> {
        let sel = selector(css)?;
        Ok(self
            .html
            .select(&sel)
            .map(element_text)
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// 找 action 与 `action` 相同的第一个表单（相对/绝对写法都认）。
    pub fn form_with_action(&self, action: &str) -> Result<Option<Form>> {
        let forms = selector("form")?;
        let inputs = selector("input[name]")?;
        let base = Url::parse(&self.url).ok();

        for form in self.html.select(&forms) {
            let raw_action = form.value().attr("action").unwrap_or_default();
            let resolved = match &base {
                Some(base) => base
                    .join(raw_action)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| raw_action.to_string()),
                None => raw_action.to_string(),
            };
            let path_matches = Url::parse(&resolved)
                .map(|u| u.path() == action)
                .unwrap_or(false);
            if raw_action != action && !path_matches {
                continue;
            }

            let mut fields = Vec::new();
            for input in form.select(&inputs) {
                let el = input.value();
                let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                if (kind == "checkbox" || kind == "radio") && el.attr("checked").is_none() {
                    continue;
                }
                if let Some(name) = el.attr("name") {
                    fields.push((name.to_string(), el.attr("value").unwrap_or("").to_string()));
                }
            }

            let method = form
                .value()
                .attr("method")
                .unwrap_or("post")
                .to_ascii_uppercase();
            return Ok(Some(Form {
                action: resolved,
                method,
                fields,
            }));
        }
        Ok(None)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// 待提交的表单：目标地址、方法与字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub action: String,
    pub method: String,
    pub fields: Vec<(String, String)>,
}

impl Form {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// 覆盖同名字段；不存在则追加。
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PixivError::parse("selector", format!("{css}: {e:?}")))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"<html><body>
        <form action="/search.php"><input name="word" value=""></form>
        <form action="/login.php" method="post">
          <input type="hidden" name="mode" value="login">
          <input type="text" name="pixiv_id" value="">
          <input type="password" name="pass">
          <input type="checkbox" name="skip" value="1">
        </form></body></html>"#;

    #[test]
    fn finds_login_form_and_resolves_action() {
        let doc = Document::parse("https://www.pixiv.net/index.php", LOGIN_PAGE);
        let mut form = doc.form_with_action("/login.php").unwrap().unwrap();
        assert_eq!(form.action, "https://www.pixiv.net/login.php");
        assert_eq!(form.method, "POST");
        assert_eq!(form.get("mode"), Some("login"));
        assert_eq!(form.get("skip"), None);

        form.set("pixiv_id", "alice");
        form.set("pass", "secret");
        assert_eq!(form.get("pixiv_id"), Some("alice"));
        assert_eq!(form.get("pass"), Some("secret"));
        assert_eq!(form.fields.len(), 3);
    }

    #[test]
    fn missing_form_is_none() {
        let doc = Document::parse("https://www.pixiv.net/index.php", "<p>nothing</p>");
        assert!(doc.form_with_action("/login.php").unwrap().is_none());
    }

    #[test]
    fn select_helpers_trim_text() {
        let doc = Document::parse(
            "https://www.pixiv.net/",
            r#"<ul><li class="t"> a </li><li class="t">b</li><li class="t"> </li></ul>
               <a class="l" href="/member.php?id=7">x</a>"#,
        );
        assert_eq!(doc.select_text("li.t").unwrap().as_deref(), Some("a"));
        assert_eq!(doc.select_texts("li.t").unwrap(), vec!["a", "b"]);
        assert_eq!(
            doc.select_attr("a.l", "href").unwrap().as_deref(),
            Some("/member.php?id=7")
        );
        assert!(doc.select_first("[[").is_err());
    }
}
