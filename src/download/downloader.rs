//! 单图与漫画（多图）下载。

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::actions::DownloadActions;
use super::models::{BatchReport, Destination, ImageSize};
use super::pattern::Pattern;
use crate::entity::Illust;
use crate::error::{PixivError, Result};
use crate::session::Session;

impl Session {
    /// 下载作品的一张图。
    ///
    /// Referer：小图不带，中图用作品页，原图用原图专用页。
    pub fn download_illust(
        &self,
        illust: &Illust,
        destination: Destination<'_>,
        size: ImageSize,
    ) -> Result<u64> {
        let (url, referer) = match size {
            ImageSize::Small => (illust.small_image_url()?.to_string(), None),
            ImageSize::Medium => (illust.medium_image_url()?.to_string(), Some(illust.url())),
            ImageSize::Original => (
                illust.original_image_url()?.to_string(),
                Some(illust.original_image_referer()?),
            ),
        };

        match destination {
            Destination::Sink(sink) => self.transport().download(&url, referer.as_deref(), sink),
            Destination::Path(path) => self.download_to_path(&url, referer.as_deref(), &path),
            Destination::Pattern(pattern) => {
                let path = PathBuf::from(pattern.resolve(illust, &url)?);
                self.download_to_path(&url, referer.as_deref(), &path)
            }
        }
    }

    /// 按顺序下载作品的全部原图，每张图完成（含钩子）后才开始下一张。
    pub fn download_manga(
        &self,
        illust: &Illust,
        pattern: &Pattern,
        mut actions: DownloadActions<'_>,
    ) -> Result<BatchReport> {
        let urls = illust.original_image_urls()?;
        let referer = illust.original_image_referer()?;
        let mut report = BatchReport {
            total: urls.len(),
            ..BatchReport::default()
        };
        info!(
            "开始下载 illust_id={} 共 {} 张",
            illust.illust_id(),
            urls.len()
        );

        for (n, url) in urls.iter().enumerate() {
            actions.run_before(url, n)?;

            let step = self
                .download_page(illust, pattern, url, &referer)
                .and_then(|_| actions.run_after(url, n));

            match step {
                Ok(()) => report.downloaded += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!("第 {} 张下载失败 ({}): {}", n, url, err);
                    actions.recover(err)?;
                }
            }
        }

        info!(
            "illust_id={} 下载结束: 成功 {} / 失败 {}",
            illust.illust_id(),
            report.downloaded,
            report.failed
        );
        Ok(report)
    }

    fn download_page(
        &self,
        illust: &Illust,
        pattern: &Pattern,
        url: &str,
        referer: &str,
    ) -> Result<u64> {
        let path = PathBuf::from(pattern.resolve(illust, url)?);
        self.download_to_path(url, Some(referer), &path)
    }

    /// 先建父目录再写文件；失败时删掉写了一半的文件。
    fn download_to_path(&self, url: &str, referer: Option<&str>, path: &Path) -> Result<u64> {
        ensure_parent_dir(path)?;
        let file = File::create(path).map_err(|e| PixivError::io(path, e))?;
        let mut writer = BufWriter::new(file);

        let result = self
            .transport()
            .download(url, referer, &mut writer)
            .and_then(|n| {
                writer.flush().map_err(|e| PixivError::io(path, e))?;
                Ok(n)
            });

        match result {
            Ok(n) => {
                debug!("已保存 {}", path.display());
                Ok(n)
            }
            Err(err) => {
                drop(writer);
                if let Err(e) = fs::remove_file(path) {
                    debug!("清理残留文件失败(忽略): {} {}", path.display(), e);
                }
                Err(err)
            }
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| PixivError::io(parent, e))?;
    }
    Ok(())
}
