use std::path::PathBuf;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::{mask_automation, Fingerprint};
use crate::error::BrowserError;
use crate::utils::logging::truncate_text;

/// 启动参数
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// 是否无头模式
    pub headless: bool,
    /// Chrome 可执行文件路径，为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<PathBuf>,
}

/// 启动一个新的浏览器进程并打开空白页
pub async fn launch_browser(options: &LaunchOptions) -> Result<(Browser, Page), BrowserError> {
    info!(
        "🚀 启动浏览器 ({})...",
        if options.headless { "无头" } else { "有界面" }
    );

    let fingerprint = Fingerprint::random();
    info!(
        "使用 User-Agent: {}",
        truncate_text(&fingerprint.user_agent, 80)
    );

    let mut builder = BrowserConfig::builder();
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head().window_size(
            fingerprint.window_size.0,
            fingerprint.window_size.1,
        )
    };
    if let Some(path) = &options.chrome_executable {
        builder = builder.chrome_executable(path);
    }

    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-extensions".to_string(),
        "--disable-plugins".to_string(),
    ];
    args.extend(fingerprint.to_args(options.headless));

    let config = builder.args(args).build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        BrowserError::LaunchFailed(e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        BrowserError::LaunchFailed(e.to_string())
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        e
    })?;
    mask_automation(&page).await?;

    info!("✅ 浏览器已就绪");
    Ok((browser, page))
}
