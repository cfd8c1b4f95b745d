//! 浏览器会话管理
//!
//! 两种获取页面的方式：
//! - `connect_to_browser_and_page` 连接一个已开启远程调试的浏览器
//! - `launch_browser` 自行启动一个新的 Chrome 进程

pub mod connection;
pub mod launcher;
pub mod user_agent;

use chromiumoxide::Page;
use tracing::debug;

use crate::error::BrowserError;

pub use connection::connect_to_browser_and_page;
pub use launcher::{launch_browser, LaunchOptions};
pub use user_agent::Fingerprint;

/// 隐藏 navigator.webdriver 标记
const MASK_WEBDRIVER_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined }); true";

/// 在当前文档上隐藏自动化标记
pub async fn mask_automation(page: &Page) -> Result<(), BrowserError> {
    page.evaluate(MASK_WEBDRIVER_JS).await?;
    debug!("已隐藏 navigator.webdriver");
    Ok(())
}
