/// 日志工具模块
///
/// 提供日志初始化和运行过程中的格式化输出
use std::path::Path;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::models::JobSearchRequest;
use crate::orchestrator::RunReport;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，未设置时按 `verbose` 选择 debug / info。
/// 重复初始化会被忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// 截断过长的文本（按字符）
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 职位自动申请模式");
    if config.launch_browser {
        info!(
            "🌐 浏览器: 自动启动 ({})",
            if config.headless { "无头" } else { "有界面" }
        );
    } else {
        info!("🌐 浏览器: 连接调试端口 {}", config.browser_debug_port);
    }
    info!("📋 运行计划: {}", config.run_plan_file.display());
    info!("👤 候选人资料: {}", config.profile_file.display());
    info!("{}", "=".repeat(60));
}

/// 记录单个搜索开始
pub fn log_search_start(index: usize, total: usize, request: &JobSearchRequest) {
    info!("\n{}", "─".repeat(60));
    info!("🔍 开始第 {}/{} 个搜索: {}", index, total, request);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(report: &RunReport, saved_to: Option<&Path>) {
    let total = report.application_results.len();
    let succeeded = report.succeeded();

    info!("\n{}", "=".repeat(60));
    info!("📊 运行完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🔐 登录: {}", if report.authenticated { "成功" } else { "失败" });
    info!("🔍 找到职位: {}", report.found_jobs.len());
    info!("🧹 过滤后: {}", report.filtered_jobs.len());
    info!("✅ 申请成功: {}/{}", succeeded, total);
    info!("❌ 申请失败: {}", total - succeeded);
    if !report.errors.is_empty() {
        info!("⚠️ 运行错误: {}", report.errors.len());
    }
    info!("{}", "=".repeat(60));
    if let Some(path) = saved_to {
        info!("\n结果已保存至: {}", path.display());
    }
}
