//! 单个职位申请流程 - 流程层
//!
//! navigate_to_item → open_form → analyze_form → fill_form → submit_form
//!
//! 任一步骤失败后，后续步骤直接跳过，结果记录为失败。
//! 提交后等不到确认信息时仍按成功处理，并附带一条提示。

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::config::{ApplySelectors, FlowSettings};
use crate::error::{BrowserError, TargetResult};
use crate::infrastructure::{locate_first, AutomationTarget, PaceWindow};
use crate::models::{ApplicationRequest, ApplicationResult, FormQuestion, Profile, QuestionKind};
use crate::services::answer::{generate_with_budget, AnswerGenerator, AnswerRequest};
use crate::services::option_resolver::resolve_index;
use crate::utils::logging::truncate_text;
use crate::workflow::engine::{Workflow, END};
use crate::workflow::form_reader;

const PACE_AFTER_NAVIGATE: PaceWindow = PaceWindow::millis(2000, 4000);
const PACE_AFTER_OPEN: PaceWindow = PaceWindow::millis(3000, 5000);
const PACE_AFTER_ANSWER: PaceWindow = PaceWindow::millis(1000, 2000);
const PACE_AFTER_SUBMIT: PaceWindow = PaceWindow::millis(3000, 5000);

/// 提交后未检测到确认信息时的提示
pub const NO_CONFIRMATION_WARNING: &str = "已提交，但未检测到确认信息";

/// 单个职位申请的只读上下文
pub struct JobCtx {
    pub target: Arc<dyn AutomationTarget>,
    pub selectors: Arc<ApplySelectors>,
    pub settings: FlowSettings,
    pub generator: Arc<dyn AnswerGenerator>,
    pub profile: Arc<Profile>,
    pub request: ApplicationRequest,
    /// 在整批申请中的序号（从 1 开始，仅用于日志）
    pub position: usize,
    pub total: usize,
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[申请 {}/{} 职位#{}]",
            self.position, self.total, self.request.job_id
        )
    }
}

/// 单个职位申请的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    pub success: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub last_step: String,
    pub questions: Vec<FormQuestion>,
    pub answers: BTreeMap<String, String>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            success: false,
            error: None,
            warning: None,
            last_step: "starting".to_string(),
            questions: Vec::new(),
            answers: BTreeMap::new(),
        }
    }
}

impl JobState {
    fn fail(&mut self, step: &str, error: String) {
        self.success = false;
        self.error = Some(error);
        self.last_step = step.to_string();
    }
}

fn navigate_to_item<'a>(ctx: &'a JobCtx, mut state: JobState) -> BoxFuture<'a, JobState> {
    async move {
        if state.error.is_some() {
            return state;
        }
        let url = ctx.selectors.job_url(&ctx.request.job_id);
        info!("{} 🌐 打开职位页面: {}", ctx, url);

        let result = async {
            ctx.target.navigate(&url).await?;
            ctx.target
                .wait_for(&ctx.selectors.page_ready, ctx.settings.wait_timeout)
                .await
        }
        .await;
        ctx.target.pace(PACE_AFTER_NAVIGATE).await;

        match result {
            Ok(_) => state.last_step = "navigated_to_job".to_string(),
            Err(e) => state.fail("navigation_failed", format!("打开职位页面失败: {}", e)),
        }
        state
    }
    .boxed()
}

fn open_form<'a>(ctx: &'a JobCtx, mut state: JobState) -> BoxFuture<'a, JobState> {
    async move {
        if state.error.is_some() {
            return state;
        }
        let found = locate_first(ctx.target.as_ref(), &ctx.selectors.open_form).await;
        let button = match found {
            Ok(Some((index, button))) => {
                debug!(
                    "{} 第 {} 个定位方式找到申请按钮: {}",
                    ctx, index + 1, ctx.selectors.open_form[index]
                );
                button
            }
            Ok(None) => {
                warn!("{} ⚠️ 未找到申请按钮，跳过", ctx);
                state.fail("apply_button_not_found", "未找到申请按钮".to_string());
                return state;
            }
            Err(e) => {
                state.fail("apply_button_not_found", format!("查找申请按钮失败: {}", e));
                return state;
            }
        };

        if let Err(e) = ctx.target.click(&button).await {
            state.fail("apply_click_failed", format!("点击申请按钮失败: {}", e));
            return state;
        }
        ctx.target.pace(PACE_AFTER_OPEN).await;
        state.last_step = "form_opened".to_string();
        state
    }
    .boxed()
}

fn analyze_form<'a>(ctx: &'a JobCtx, mut state: JobState) -> BoxFuture<'a, JobState> {
    async move {
        if state.error.is_some() {
            return state;
        }
        let result: TargetResult<Vec<FormQuestion>> = async {
            ctx.target
                .wait_for(&ctx.selectors.form_container, ctx.settings.wait_timeout)
                .await?;
            form_reader::analyze_form(ctx.target.as_ref(), &ctx.selectors).await
        }
        .await;

        match result {
            Ok(questions) => {
                info!("{} 📋 表单中发现 {} 个问题", ctx, questions.len());
                state.questions = questions;
                state.last_step = "form_analyzed".to_string();
            }
            Err(e) => state.fail("form_analysis_failed", format!("读取申请表单失败: {}", e)),
        }
        state
    }
    .boxed()
}

/// 把答案填进页面，返回实际记录的答案
async fn apply_answer(
    ctx: &JobCtx,
    question: &FormQuestion,
    answer: &str,
) -> Result<String, String> {
    match question.kind {
        QuestionKind::FreeText => {
            ctx.target
                .type_text(&question.element, answer)
                .await
                .map_err(|e| e.to_string())?;
            Ok(answer.to_string())
        }
        QuestionKind::SingleSelect | QuestionKind::RadioGroup => {
            let index = resolve_index(answer, &question.options)
                .ok_or_else(|| "没有可选的选项".to_string())?;
            let choice = question
                .choices
                .get(index)
                .ok_or_else(|| format!("选项 {} 没有对应的元素", index))?;
            ctx.target.click(choice).await.map_err(|e| e.to_string())?;
            Ok(question.options[index].clone())
        }
    }
}

async fn answer_question(ctx: &JobCtx, question: &FormQuestion) -> Result<String, String> {
    let request = AnswerRequest {
        profile: &ctx.profile,
        question: &question.prompt,
        kind: question.kind,
        options: &question.options,
        monthly_compensation: ctx.request.monthly_compensation,
    };

    let answer = match generate_with_budget(
        ctx.generator.as_ref(),
        &request,
        ctx.settings.answer_budget,
    )
    .await
    {
        Ok(answer) => answer,
        Err(e) => match &ctx.settings.fallback_answer {
            Some(fallback) => {
                warn!("{} 生成答案失败，使用默认答案: {}", ctx, e);
                fallback.clone()
            }
            None => return Err(e.to_string()),
        },
    };

    apply_answer(ctx, question, &answer).await
}

fn fill_form<'a>(ctx: &'a JobCtx, mut state: JobState) -> BoxFuture<'a, JobState> {
    async move {
        if state.error.is_some() {
            return state;
        }
        for question in &state.questions {
            match answer_question(ctx, question).await {
                Ok(recorded) => {
                    debug!(
                        "{} {} -> {}",
                        ctx,
                        truncate_text(&question.prompt, 40),
                        truncate_text(&recorded, 40)
                    );
                    state.answers.insert(question.prompt.clone(), recorded);
                    ctx.target.pace(PACE_AFTER_ANSWER).await;
                }
                Err(message) => {
                    warn!(
                        "{} 填写问题 '{}' 失败: {}",
                        ctx,
                        truncate_text(&question.prompt, 40),
                        message
                    );
                    state
                        .answers
                        .insert(question.prompt.clone(), format!("Error: {}", message));
                }
            }
        }
        state.last_step = "form_filled".to_string();
        state
    }
    .boxed()
}

fn submit_form<'a>(ctx: &'a JobCtx, mut state: JobState) -> BoxFuture<'a, JobState> {
    async move {
        if state.error.is_some() {
            return state;
        }
        let button = match locate_first(ctx.target.as_ref(), &ctx.selectors.submit).await {
            Ok(Some((_, button))) => button,
            Ok(None) => {
                state.fail("submit_button_not_found", "未找到提交按钮".to_string());
                return state;
            }
            Err(e) => {
                state.fail("submit_button_not_found", format!("查找提交按钮失败: {}", e));
                return state;
            }
        };

        if let Err(e) = ctx.target.click(&button).await {
            state.fail("application_submit_failed", format!("点击提交按钮失败: {}", e));
            return state;
        }
        ctx.target.pace(PACE_AFTER_SUBMIT).await;

        match ctx
            .target
            .wait_for(&ctx.selectors.confirmation, ctx.settings.wait_timeout)
            .await
        {
            Ok(_) => {
                state.success = true;
                state.last_step = "application_submitted".to_string();
            }
            Err(e) => {
                if !matches!(e, BrowserError::Timeout { .. }) {
                    debug!("{} 等待确认信息出错: {}", ctx, e);
                }
                state.success = true;
                state.warning = Some(NO_CONFIRMATION_WARNING.to_string());
                state.last_step = "application_submitted_no_confirmation".to_string();
            }
        }
        state
    }
    .boxed()
}

/// 单个职位申请流程
pub struct JobFlow {
    workflow: Workflow<JobCtx, JobState>,
}

impl Default for JobFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl JobFlow {
    pub fn new() -> Self {
        let workflow = Workflow::new("apply_job")
            .register("navigate_to_item", navigate_to_item)
            .register("open_form", open_form)
            .register("analyze_form", analyze_form)
            .register("fill_form", fill_form)
            .register("submit_form", submit_form)
            .set_entry("navigate_to_item")
            .edge("navigate_to_item", "open_form")
            .edge("open_form", "analyze_form")
            .edge("analyze_form", "fill_form")
            .edge("fill_form", "submit_form")
            .edge("submit_form", END);
        Self { workflow }
    }

    /// 执行单个职位的申请，总会返回一条结果
    pub async fn run(&self, ctx: &JobCtx) -> ApplicationResult {
        match self.workflow.run(ctx, JobState::default()).await {
            Ok(state) => {
                if state.success {
                    info!("{} ✅ 申请完成 ({})", ctx, state.last_step);
                } else {
                    warn!(
                        "{} ❌ 申请失败 ({}): {}",
                        ctx,
                        state.last_step,
                        state.error.as_deref().unwrap_or("未知原因")
                    );
                }
                ApplicationResult {
                    job_id: ctx.request.job_id.clone(),
                    success: state.success,
                    error: state.error,
                    warning: state.warning,
                    answers: state.answers,
                    last_step: state.last_step,
                }
            }
            Err(e) => {
                warn!("{} ❌ 申请流程配置错误: {}", ctx, e);
                let mut result = ApplicationResult::failed(ctx.request.job_id.clone(), e.to_string());
                result.last_step = "workflow_failed".to_string();
                result
            }
        }
    }
}
