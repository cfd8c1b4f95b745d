//! # Auto Job Apply
//!
//! 一个用于自动化职位搜索与一键申请的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `AutomationTarget` - 导航、定位、等待、点击、输入、读属性、停顿
//! - `ChromeTarget` - 基于 `JsExecutor` 的真实浏览器实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心页面流程
//! - `AnswerGenerator` - 为单个表单问题生成答案（带超时与重试）
//! - `JobFilter` - 判断职位是否与候选人资料匹配
//! - `option_resolver` - 把自由文本答案映射到某个选项
//! - `ReportWriter` - 保存运行结果
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/engine` - 有向图步骤引擎，支持条件分支与步数上限
//! - `AuthFlow` - 登录流程（打开登录页 → 填写 → 提交 → 校验）
//! - `SearchFlow` - 分页搜索流程（构造查询 → 提取 → 翻页）
//! - `ApplyFlow` / `JobFlow` - 批量申请与单个职位申请流程
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 管理浏览器资源，加载输入，保存结果
//! - `orchestrator/run_processor` - 登录 → 搜索 → 过滤 → 申请
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::{Config, FlowSettings, SiteSelectors};
pub use error::{AppError, AppResult, BrowserError, TargetResult, WorkflowError};
pub use infrastructure::{AutomationTarget, ChromeTarget, ElementHandle, JsExecutor, Locator};
pub use models::{
    ApplicationRequest, ApplicationResult, AuthResult, JobResult, JobSearchRequest, Profile,
};
pub use orchestrator::{App, RunInput, RunProcessor, RunReport};
pub use workflow::{ApplyFlow, AuthFlow, SearchFlow, Workflow};
