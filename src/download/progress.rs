//! CLI 进度条：把批量下载钩子接到 indicatif 上。

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::warn;

use super::actions::DownloadActions;
use super::pattern::image_name;

pub fn batch_bar(total: u64, prefix: &str) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template(
        "{prefix} [{elapsed_precise}] {wide_bar} {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("##-");
    bar.set_style(style);
    bar.set_prefix(prefix.to_string());
    bar
}

/// 每张图开始时显示文件名、完成或失败时推进一格。
///
/// `continue_on_error` 为 false 时不装 `on_error`，第一个错误就中止整批。
pub fn bar_actions(bar: &ProgressBar, continue_on_error: bool) -> DownloadActions<'_> {
    let actions = DownloadActions::new()
        .before_each(move |url, _| {
            bar.set_message(image_name(url));
            Ok(())
        })
        .after_each(move |_, _| {
            bar.inc(1);
            Ok(())
        });

    if continue_on_error {
        actions.on_error(move |err| {
            bar.suspend(|| warn!("跳过失败的图片: {}", err));
            bar.inc(1);
            Ok(())
        })
    } else {
        actions
    }
}
