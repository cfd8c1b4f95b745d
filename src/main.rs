use anyhow::Result;
use auto_job_apply::utils::logging;
use auto_job_apply::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let report = App::initialize(config).await?.run().await?;

    if !report.authenticated {
        anyhow::bail!(
            "登录失败: {}",
            report.auth_error.as_deref().unwrap_or("未知原因")
        );
    }

    Ok(())
}
