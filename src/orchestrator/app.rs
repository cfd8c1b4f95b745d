//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动或连接浏览器、创建 JsExecutor 与 ChromeTarget
//! 2. **加载输入**：运行计划、候选人资料、站点选择器
//! 3. **组装能力**：LLM 答案生成器与职位过滤器
//! 4. **执行运行**：委托 `RunProcessor`
//! 5. **保存结果**：写入结果目录并输出统计
//!
//! 只有本模块持有 Browser。

use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser::{self, LaunchOptions};
use crate::config::{Config, SiteSelectors};
use crate::infrastructure::{AutomationTarget, ChromeTarget, JsExecutor, Pacing};
use crate::models::{load_profile, load_run_plan, load_selectors};
use crate::orchestrator::run_processor::{RunInput, RunProcessor, RunReport};
use crate::services::{
    AcceptAll, AnswerGenerator, JobFilter, LlmAnswerGenerator, LlmJobFilter, LlmService,
    ReportWriter,
};
use crate::utils::logging::{log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    target: Arc<ChromeTarget>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let (browser, page) = if config.launch_browser {
            let options = LaunchOptions {
                headless: config.headless,
                chrome_executable: config.chrome_executable.clone(),
            };
            browser::launch_browser(&options).await?
        } else {
            browser::connect_to_browser_and_page(config.browser_debug_port, None).await?
        };

        // 创建 JsExecutor（持有 page）
        let executor = JsExecutor::new(page);
        let target = Arc::new(ChromeTarget::new(
            executor,
            Pacing {
                scale: config.pacing_scale,
            },
        ));

        Ok(Self {
            config,
            _browser: browser,
            target,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunReport> {
        let plan = load_run_plan(&self.config.run_plan_file)
            .await
            .context("加载运行计划失败")?;
        let profile = load_profile(&self.config.profile_file)
            .await
            .context("加载候选人资料失败")?;
        let selectors = match &self.config.selectors_file {
            Some(path) => load_selectors(path).await.context("加载选择器配置失败")?,
            None => SiteSelectors::default(),
        };
        let (email, password) = self.config.credentials()?;

        if !self.config.has_llm() {
            anyhow::bail!("未配置 LLM_API_KEY，无法生成表单答案");
        }
        let llm = Arc::new(LlmService::new(&self.config));
        info!("🤖 使用模型: {}", llm.model_name());

        let generator: Arc<dyn AnswerGenerator> = Arc::new(LlmAnswerGenerator::new(Arc::clone(&llm)));
        let filter: Arc<dyn JobFilter> = if self.config.filter_jobs {
            Arc::new(LlmJobFilter::new(Arc::clone(&llm)))
        } else {
            info!("已关闭职位过滤，所有搜索结果都会申请");
            Arc::new(AcceptAll)
        };

        let processor = RunProcessor::new(selectors, self.config.flow_settings(), generator, filter);
        let input = RunInput {
            email,
            password,
            searches: plan.searches,
            profile,
        };

        let target: Arc<dyn AutomationTarget> = self.target.clone();
        let report = processor.run(&input, target).await;

        let writer = ReportWriter::new(&self.config.results_dir);
        let saved = match writer.write(&report).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("⚠️ 保存运行结果失败: {}", e);
                None
            }
        };

        print_final_stats(&report, saved.as_deref());
        Ok(report)
    }
}
