//! pixiv-dl 命令行入口。
//!
//! 负责：加载 `config.yml`、初始化日志、登录，然后分发到各个子命令。

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use pixiv_dl::base_system::config::load_or_create;
use pixiv_dl::base_system::context::Config;
use pixiv_dl::base_system::logging::{LogOptions, LogSystem};
use pixiv_dl::download::progress::{bar_actions, batch_bar};
use pixiv_dl::{Destination, Illust, ImageSize, Session, WebTransport};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "pixiv-dl", version = VERSION)]
#[command(about = "pixiv illustration / manga / bookmark downloader")]
struct Cli {
    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 数据目录路径（存放 config.yml 和 logs）
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 指定配置文件（优先于 --data-dir）
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 以 JSON 输出作品信息
    Info { illust_id: u64 },
    /// 以 JSON 输出用户信息（省略 ID 时为当前登录用户）
    Member { member_id: Option<u64> },
    /// 下载单张图片
    Illust {
        illust_id: u64,
        /// small / medium / original，默认取配置
        #[arg(long)]
        size: Option<String>,
    },
    /// 下载漫画（多图）作品的全部页面
    Manga { illust_id: u64 },
    /// 下载收藏列表中的全部作品
    Bookmarks {
        /// 用户 ID，省略时为当前登录用户
        #[arg(long)]
        member: Option<u64>,
        #[arg(long, default_value_t = false)]
        include_deleted: bool,
        /// 最多处理多少个条目
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log = LogSystem::init(
        LogOptions {
            debug: cli.debug,
            ..LogOptions::default()
        },
        cli.data_dir.as_deref(),
    )
    .context("初始化日志失败")?;

    let config = load_or_create::<Config>(cli.config.as_deref(), cli.data_dir.as_deref())
        .context("读取配置失败")?;

    // 参数错误要在任何网络请求之前暴露
    let size = download_size(&cli.command, &config)?;

    let session = login(&config)?;

    match cli.command {
        Command::Info { illust_id } => {
            let illust = session.illust(illust_id);
            println!("{}", serde_json::to_string_pretty(illust.attrs()?)?);
        }
        Command::Member { member_id } => {
            let member = session.member(member_id)?;
            println!("{}", serde_json::to_string_pretty(member.attrs()?)?);
        }
        Command::Illust { illust_id, .. } => {
            let illust = session.illust(illust_id);
            download_single(&session, &illust, &config, size.unwrap_or_default())?;
        }
        Command::Manga { illust_id } => {
            let illust = session.illust(illust_id);
            download_all_pages(&session, &illust, &config)?;
        }
        Command::Bookmarks {
            member,
            include_deleted,
            limit,
        } => {
            download_bookmarks(
                &session,
                &config,
                member,
                include_deleted || config.include_deleted,
                limit,
                size.unwrap_or_default(),
            )?;
        }
    }
    Ok(())
}

/// 只有会下载单图的子命令才读取尺寸，配置里的坏值不影响 `info` / `member`。
fn download_size(command: &Command, config: &Config) -> Result<Option<ImageSize>> {
    let size = match command {
        Command::Illust { size: Some(s), .. } => s.parse::<ImageSize>()?,
        Command::Illust { .. } | Command::Bookmarks { .. } => config.image_size()?,
        Command::Info { .. } | Command::Member { .. } | Command::Manga { .. } => return Ok(None),
    };
    Ok(Some(size))
}

fn login(config: &Config) -> Result<Session> {
    if config.pixiv_id.trim().is_empty() {
        bail!("请先在 config.yml 中填写 pixiv_id");
    }
    let password = config
        .resolve_password()
        .context("未设置密码：请填写 config.yml 的 password 或环境变量 PIXIV_PASSWORD")?;

    let transport = WebTransport::new(config.web_config()).context("初始化 HTTP 客户端失败")?;
    let session = Session::with_credentials(transport, config.pixiv_id.trim(), &password)
        .context("登录失败")?;
    info!(target: "startup", "pixiv-dl v{} 已登录", VERSION);
    Ok(session)
}

fn download_single(
    session: &Session,
    illust: &Illust,
    config: &Config,
    size: ImageSize,
) -> Result<()> {
    let pattern = config.illust_pattern()?;
    let bytes = session
        .download_illust(illust, Destination::Pattern(&pattern), size)
        .with_context(|| format!("下载失败: illust_id={}", illust.illust_id()))?;
    info!(
        "illust_id={} ({}) 已保存, {} bytes",
        illust.illust_id(),
        size,
        bytes
    );
    Ok(())
}

fn download_all_pages(session: &Session, illust: &Illust, config: &Config) -> Result<()> {
    let pattern = config.manga_pattern()?;
    let total = illust.original_image_urls()?.len() as u64;
    let bar = batch_bar(total, &format!("illust {}", illust.illust_id()));

    let report = session.download_manga(
        illust,
        &pattern,
        bar_actions(&bar, config.continue_on_error),
    );
    bar.finish_and_clear();

    let report = report.with_context(|| format!("下载中止: illust_id={}", illust.illust_id()))?;
    if report.failed > 0 {
        warn!(
            "illust_id={} 有 {} / {} 页下载失败",
            illust.illust_id(),
            report.failed,
            report.total
        );
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct BookmarkSummary {
    done: usize,
    failed: usize,
    deleted: usize,
}

fn download_bookmarks(
    session: &Session,
    config: &Config,
    member_id: Option<u64>,
    include_deleted: bool,
    limit: Option<usize>,
    size: ImageSize,
) -> Result<BookmarkSummary> {
    let bookmarks = session.member_bookmarks(member_id, include_deleted)?;
    let mut summary = BookmarkSummary::default();

    for entry in bookmarks.unique().take(limit.unwrap_or(usize::MAX)) {
        let Some(illust) = entry.context("获取收藏列表失败")? else {
            summary.deleted += 1;
            continue;
        };

        let result = illust
            .is_manga()
            .with_context(|| format!("读取作品信息失败: illust_id={}", illust.illust_id()))
            .and_then(|manga| {
                if manga {
                    download_all_pages(session, &illust, config)
                } else {
                    download_single(session, &illust, config, size)
                }
            });
        match result {
            Ok(()) => summary.done += 1,
            Err(err) if config.continue_on_error => {
                summary.failed += 1;
                warn!("{:#}", err);
            }
            Err(err) => return Err(err),
        }
    }

    info!(
        "收藏下载完成: 成功 {}，失败 {}，已删除 {}",
        summary.done, summary.failed, summary.deleted
    );
    Ok(summary)
}
