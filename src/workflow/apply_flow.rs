//! 批量申请流程 - 流程层
//!
//! init → select_next → (continue: process_one → record_result → select_next | finish: 结束)
//!
//! `process_one` 为每个职位单独构建一条 [`JobFlow`] 并执行。
//! 单个职位失败只影响它自己的结果，输出条数总是等于输入条数。

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{info, warn};

use crate::config::{ApplySelectors, FlowSettings};
use crate::infrastructure::AutomationTarget;
use crate::models::{ApplicationRequest, ApplicationResult, Profile};
use crate::services::answer::AnswerGenerator;
use crate::workflow::engine::{Workflow, END};
use crate::workflow::job_flow::{JobCtx, JobFlow};

/// 批量申请的只读上下文
pub struct ApplyCtx {
    pub target: Arc<dyn AutomationTarget>,
    pub selectors: Arc<ApplySelectors>,
    pub settings: FlowSettings,
    pub generator: Arc<dyn AnswerGenerator>,
    pub profile: Arc<Profile>,
    pub requests: Vec<ApplicationRequest>,
}

/// 批量申请的状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyState {
    /// 下一个要处理的请求序号
    pub index: usize,
    pub total: usize,
    /// 刚处理完、尚未记录的结果
    pub pending: Option<ApplicationResult>,
    pub results: Vec<ApplicationResult>,
}

/// 还有请求未处理时继续
pub fn has_next(state: &ApplyState) -> &'static str {
    if state.index < state.total {
        "continue"
    } else {
        "finish"
    }
}

fn init<'a>(ctx: &'a ApplyCtx, mut state: ApplyState) -> BoxFuture<'a, ApplyState> {
    async move {
        state.index = 0;
        state.total = ctx.requests.len();
        state.pending = None;
        state.results = Vec::with_capacity(ctx.requests.len());
        info!("📝 开始申请 {} 个职位", state.total);
        state
    }
    .boxed()
}

fn select_next<'a>(_ctx: &'a ApplyCtx, state: ApplyState) -> BoxFuture<'a, ApplyState> {
    async move { state }.boxed()
}

fn process_one<'a>(ctx: &'a ApplyCtx, mut state: ApplyState) -> BoxFuture<'a, ApplyState> {
    async move {
        let Some(request) = ctx.requests.get(state.index) else {
            return state;
        };

        let job_ctx = JobCtx {
            target: Arc::clone(&ctx.target),
            selectors: Arc::clone(&ctx.selectors),
            settings: ctx.settings.clone(),
            generator: Arc::clone(&ctx.generator),
            profile: Arc::clone(&ctx.profile),
            request: request.clone(),
            position: state.index + 1,
            total: state.total,
        };

        let result = JobFlow::new().run(&job_ctx).await;
        state.pending = Some(result);
        state
    }
    .boxed()
}

fn record_result<'a>(ctx: &'a ApplyCtx, mut state: ApplyState) -> BoxFuture<'a, ApplyState> {
    async move {
        let result = match state.pending.take() {
            Some(result) => result,
            None => {
                let job_id = ctx
                    .requests
                    .get(state.index)
                    .map(|r| r.job_id.clone())
                    .unwrap_or_default();
                ApplicationResult::failed(job_id, "申请未执行")
            }
        };
        state.results.push(result);
        state.index += 1;
        state
    }
    .boxed()
}

/// 批量申请流程
pub struct ApplyFlow {
    selectors: Arc<ApplySelectors>,
    settings: FlowSettings,
    generator: Arc<dyn AnswerGenerator>,
}

impl ApplyFlow {
    pub fn new(
        selectors: ApplySelectors,
        settings: FlowSettings,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            selectors: Arc::new(selectors),
            settings,
            generator,
        }
    }

    fn workflow(request_count: usize) -> Workflow<ApplyCtx, ApplyState> {
        Workflow::new("apply")
            .register("init", init)
            .register("select_next", select_next)
            .register("process_one", process_one)
            .register("record_result", record_result)
            .set_entry("init")
            .edge("init", "select_next")
            .conditional_edge(
                "select_next",
                has_next,
                &[("continue", "process_one"), ("finish", END)],
            )
            .edge("process_one", "record_result")
            .edge("record_result", "select_next")
            .with_step_limit(request_count * 3 + 10)
    }

    /// 依次申请所有职位，返回与请求一一对应的结果
    pub async fn apply(
        &self,
        requests: &[ApplicationRequest],
        profile: &Profile,
        target: Arc<dyn AutomationTarget>,
    ) -> Vec<ApplicationResult> {
        let ctx = ApplyCtx {
            target,
            selectors: Arc::clone(&self.selectors),
            settings: self.settings.clone(),
            generator: Arc::clone(&self.generator),
            profile: Arc::new(profile.clone()),
            requests: requests.to_vec(),
        };

        let mut results = match Self::workflow(requests.len())
            .run(&ctx, ApplyState::default())
            .await
        {
            Ok(state) => state.results,
            Err(e) => {
                warn!("❌ 申请流程配置错误: {}", e);
                return requests
                    .iter()
                    .map(|r| ApplicationResult::failed(r.job_id.clone(), e.to_string()))
                    .collect();
            }
        };

        // 结果条数必须与请求条数一致
        for request in requests.iter().skip(results.len()) {
            results.push(ApplicationResult::failed(request.job_id.clone(), "申请未执行"));
        }
        results.truncate(requests.len());

        let succeeded = results.iter().filter(|r| r.success).count();
        info!("📊 申请结束: 成功 {}/{}", succeeded, results.len());
        results
    }
}
