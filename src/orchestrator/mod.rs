//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理浏览器资源（Browser、JsExecutor、ChromeTarget）
//! - 加载运行计划、候选人资料、选择器
//! - 保存运行结果并输出统计
//!
//! ### `run_processor` - 单次运行处理器
//! - 登录 → 搜索 → 过滤 → 申请
//! - 汇总结果，不因单项失败中止
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser)
//!     ↓
//! run_processor (处理 Vec<JobSearchRequest>)
//!     ↓
//! workflow::{AuthFlow, SearchFlow, ApplyFlow}
//!     ↓
//! services (能力层：answer / filter / resolver / report)
//!     ↓
//! infrastructure (基础设施：AutomationTarget)
//! ```

pub mod app;
pub mod run_processor;

pub use app::App;
pub use run_processor::{RunInput, RunProcessor, RunReport, SearchSummary};
