//! 单次运行处理器 - 编排层
//!
//! ## 职责
//!
//! 按顺序串起一次完整运行：
//!
//! 1. **登录**：失败则立即返回，不执行任何搜索和申请
//! 2. **搜索**：依次执行运行计划里的每个搜索，单个搜索失败不影响其他搜索
//! 3. **过滤**：逐个判断职位是否值得申请，判断失败时保留该职位
//! 4. **申请**：每个职位使用发现它的那次搜索的期望月薪
//!
//! 不去重：同一个职位出现在多个搜索中时会被申请多次，由调用方在运行计划里避免。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{FlowSettings, SiteSelectors};
use crate::infrastructure::AutomationTarget;
use crate::models::{ApplicationRequest, ApplicationResult, JobResult, JobSearchRequest, Profile};
use crate::services::answer::AnswerGenerator;
use crate::services::job_filter::JobFilter;
use crate::utils::logging::log_search_start;
use crate::workflow::{ApplyFlow, AuthFlow, SearchFlow};

/// 一次运行的输入
#[derive(Debug, Clone)]
pub struct RunInput {
    pub email: String,
    pub password: String,
    pub searches: Vec<JobSearchRequest>,
    pub profile: Profile,
}

/// 单个搜索的摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub request: JobSearchRequest,
    pub found: usize,
    pub pages_visited: u32,
    pub errors: Vec<String>,
}

/// 一次运行的完整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: String,
    pub finished_at: String,
    pub authenticated: bool,
    pub auth_error: Option<String>,
    pub searches: Vec<SearchSummary>,
    pub found_jobs: Vec<JobResult>,
    pub filtered_jobs: Vec<JobResult>,
    pub application_results: Vec<ApplicationResult>,
    pub errors: Vec<String>,
}

impl RunReport {
    fn started() -> Self {
        Self {
            started_at: now(),
            finished_at: String::new(),
            authenticated: false,
            auth_error: None,
            searches: Vec::new(),
            found_jobs: Vec::new(),
            filtered_jobs: Vec::new(),
            application_results: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = now();
        self
    }

    /// 申请成功的数量
    pub fn succeeded(&self) -> usize {
        self.application_results.iter().filter(|r| r.success).count()
    }
}

fn now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 单次运行处理器
pub struct RunProcessor {
    auth: AuthFlow,
    search: SearchFlow,
    apply: ApplyFlow,
    filter: Arc<dyn JobFilter>,
}

impl RunProcessor {
    pub fn new(
        selectors: SiteSelectors,
        settings: FlowSettings,
        generator: Arc<dyn AnswerGenerator>,
        filter: Arc<dyn JobFilter>,
    ) -> Self {
        Self {
            auth: AuthFlow::new(selectors.auth, settings.clone()),
            search: SearchFlow::new(selectors.search, settings.clone()),
            apply: ApplyFlow::new(selectors.apply, settings, generator),
            filter,
        }
    }

    /// 执行一次完整运行，任何单项失败都只记录在结果里
    pub async fn run(&self, input: &RunInput, target: Arc<dyn AutomationTarget>) -> RunReport {
        let mut report = RunReport::started();

        // ========== 登录 ==========
        let auth = self
            .auth
            .authenticate(&input.email, &input.password, Arc::clone(&target))
            .await;
        report.authenticated = auth.authenticated;
        report.auth_error = auth.error;
        if !report.authenticated {
            warn!("❌ 登录失败，本次运行不执行搜索和申请");
            return report.finish();
        }

        // ========== 搜索 ==========
        // (职位, 期望月薪)
        let mut found: Vec<(JobResult, u32)> = Vec::new();
        for (i, request) in input.searches.iter().enumerate() {
            log_search_start(i + 1, input.searches.len(), request);
            let outcome = self
                .search
                .search_detailed(request, Arc::clone(&target))
                .await;
            for error in &outcome.errors {
                report
                    .errors
                    .push(format!("搜索 '{}' @ '{}': {}", request.title, request.location, error));
            }
            report.searches.push(SearchSummary {
                request: request.clone(),
                found: outcome.jobs.len(),
                pages_visited: outcome.pages_visited,
                errors: outcome.errors,
            });
            found.extend(
                outcome
                    .jobs
                    .into_iter()
                    .map(|job| (job, request.monthly_compensation)),
            );
        }
        report.found_jobs = found.iter().map(|(job, _)| job.clone()).collect();
        info!("🔍 所有搜索完成，共找到 {} 个职位", found.len());

        // ========== 过滤 ==========
        let mut kept: Vec<(JobResult, u32)> = Vec::new();
        for (job, compensation) in found {
            match self.filter.matches(&input.profile, &job).await {
                Ok(true) => kept.push((job, compensation)),
                Ok(false) => info!("职位 {} 与候选人资料不匹配，跳过", job.job_id),
                Err(e) => {
                    warn!("职位 {} 过滤失败，默认保留: {}", job.job_id, e);
                    report
                        .errors
                        .push(format!("职位 {} 过滤失败，默认保留: {}", job.job_id, e));
                    kept.push((job, compensation));
                }
            }
        }
        report.filtered_jobs = kept.iter().map(|(job, _)| job.clone()).collect();
        info!(
            "🧹 过滤后保留 {}/{} 个职位",
            report.filtered_jobs.len(),
            report.found_jobs.len()
        );

        // ========== 申请 ==========
        let requests: Vec<ApplicationRequest> = kept
            .into_iter()
            .map(|(job, monthly_compensation)| ApplicationRequest {
                job_id: job.job_id,
                monthly_compensation,
            })
            .collect();

        if requests.is_empty() {
            info!("没有需要申请的职位");
            return report.finish();
        }

        report.application_results = self
            .apply
            .apply(&requests, &input.profile, Arc::clone(&target))
            .await;

        report.finish()
    }
}
