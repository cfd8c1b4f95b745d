//! 职位搜索流程 - 流程层
//!
//! build_query → navigate → extract_page → check_continuation
//!   → (continue: navigate_next_page → extract_page | finish: 结束)
//!
//! 三个停止条件任一满足即结束：
//! - 已收集数量达到上限
//! - 页码达到硬上限
//! - 没有可用的下一页（按钮缺失、禁用，或翻页失败）

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::{FlowSettings, SearchSelectors};
use crate::error::{ConfigError, TargetResult};
use crate::infrastructure::{locate_first, AutomationTarget, ElementHandle, PaceWindow};
use crate::models::{JobResult, JobSearchRequest};
use crate::workflow::engine::{Workflow, END};

const PACE_AFTER_SEARCH: PaceWindow = PaceWindow::millis(2000, 4000);
const PACE_AFTER_NEXT_PAGE: PaceWindow = PaceWindow::millis(3000, 5000);

/// 卡片中没有描述时使用的文本
pub const NO_DESCRIPTION: &str = "No description available";

/// 搜索流程运行期间的只读上下文
pub struct SearchCtx {
    pub target: Arc<dyn AutomationTarget>,
    pub request: JobSearchRequest,
    pub selectors: SearchSelectors,
    pub settings: FlowSettings,
    pub job_id_re: Regex,
}

impl SearchCtx {
    fn prefix(&self) -> String {
        format!("[搜索 '{}']", self.request.title)
    }
}

/// 搜索流程状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query_url: Option<String>,
    /// 当前页码，从 1 开始
    pub current_page: u32,
    /// 实际读取过的页数
    pub pages_visited: u32,
    pub limit: usize,
    pub max_pages: u32,
    pub collected: Vec<JobResult>,
    /// 最近一次检查时下一页按钮是否可用
    pub has_next_page: bool,
    /// 已无法继续浏览（打开或翻页失败）
    pub exhausted: bool,
    pub errors: Vec<String>,
}

impl SearchState {
    pub fn new(limit: usize, max_pages: u32) -> Self {
        Self {
            current_page: 1,
            limit,
            max_pages,
            ..Default::default()
        }
    }
}

/// 搜索结果与过程中的错误
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    pub jobs: Vec<JobResult>,
    pub pages_visited: u32,
    pub errors: Vec<String>,
}

/// 把搜索条件拼成查询地址，空的标题和地点不出现在参数里
pub fn build_query_url(
    selectors: &SearchSelectors,
    request: &JobSearchRequest,
) -> Result<String, ConfigError> {
    let mut url = selectors.base()?;
    {
        let mut pairs = url.query_pairs_mut();
        if !request.title.trim().is_empty() {
            pairs.append_pair(&selectors.keywords_param, request.title.trim());
        }
        if !request.location.trim().is_empty() {
            pairs.append_pair(&selectors.location_param, request.location.trim());
        }
        if request.easy_apply_only {
            let (name, value) = &selectors.easy_apply_param;
            pairs.append_pair(name, value);
        }
    }
    // 没有任何参数时去掉多余的 '?'
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url.to_string())
}

/// 从职位链接中提取编号
pub fn parse_job_id(re: &Regex, href: &str) -> Option<String> {
    re.captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty())
}

/// 是否继续翻页
pub fn should_continue(state: &SearchState) -> &'static str {
    if state.collected.len() < state.limit
        && state.current_page < state.max_pages
        && state.has_next_page
        && !state.exhausted
    {
        "continue"
    } else {
        "finish"
    }
}

fn build_query<'a>(ctx: &'a SearchCtx, mut state: SearchState) -> BoxFuture<'a, SearchState> {
    async move {
        match build_query_url(&ctx.selectors, &ctx.request) {
            Ok(url) => {
                debug!("{} 查询地址: {}", ctx.prefix(), url);
                state.query_url = Some(url);
            }
            Err(e) => {
                state.errors.push(format!("无法构建查询地址: {}", e));
                state.exhausted = true;
            }
        }
        state.current_page = 1;
        state
    }
    .boxed()
}

fn navigate<'a>(ctx: &'a SearchCtx, mut state: SearchState) -> BoxFuture<'a, SearchState> {
    async move {
        let Some(url) = state.query_url.clone() else {
            return state;
        };
        let result = async {
            ctx.target.navigate(&url).await?;
            ctx.target
                .wait_for(
                    std::slice::from_ref(&ctx.selectors.listing),
                    ctx.settings.wait_timeout,
                )
                .await
        }
        .await;

        if let Err(e) = result {
            warn!("{} 打开搜索结果失败: {}", ctx.prefix(), e);
            state.errors.push(format!("打开搜索结果失败: {}", e));
            state.exhausted = true;
        }
        ctx.target.pace(PACE_AFTER_SEARCH).await;
        state
    }
    .boxed()
}

/// 读取一张职位卡片，编号无法解析时返回 None
async fn read_card(ctx: &SearchCtx, card: &ElementHandle) -> TargetResult<Option<JobResult>> {
    let Some(link) = ctx
        .target
        .locate_within(card, &ctx.selectors.listing_link)
        .await?
    else {
        return Ok(None);
    };
    let href = ctx
        .target
        .read_attribute(&link, "href")
        .await?
        .unwrap_or_default();
    let Some(job_id) = parse_job_id(&ctx.job_id_re, &href) else {
        return Ok(None);
    };

    let description = match ctx
        .target
        .locate_within(card, &ctx.selectors.snippet)
        .await?
    {
        Some(snippet) => ctx.target.read_text(&snippet).await?.trim().to_string(),
        None => String::new(),
    };
    let description = if description.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        description
    };

    Ok(Some(JobResult {
        job_id,
        description,
    }))
}

fn extract_page<'a>(ctx: &'a SearchCtx, mut state: SearchState) -> BoxFuture<'a, SearchState> {
    async move {
        if state.exhausted {
            return state;
        }
        let cards = match ctx.target.locate_all(&ctx.selectors.listing).await {
            Ok(cards) => cards,
            Err(e) => {
                state.errors.push(format!("读取职位列表失败: {}", e));
                return state;
            }
        };

        state.pages_visited += 1;
        let before = state.collected.len();
        for card in &cards {
            if state.collected.len() >= state.limit {
                break;
            }
            match read_card(ctx, card).await {
                Ok(Some(job)) => state.collected.push(job),
                Ok(None) => debug!("{} 跳过无法识别的卡片 {}", ctx.prefix(), card),
                Err(e) => debug!("{} 读取卡片 {} 失败: {}", ctx.prefix(), card, e),
            }
        }

        info!(
            "{} 第 {} 页: {} 张卡片，收集 {} 个，累计 {}/{}",
            ctx.prefix(),
            state.current_page,
            cards.len(),
            state.collected.len() - before,
            state.collected.len(),
            state.limit
        );
        state
    }
    .boxed()
}

/// 下一页按钮存在、可用且没有 disabled 属性
async fn next_page_available(ctx: &SearchCtx) -> TargetResult<bool> {
    let Some((_, button)) = locate_first(ctx.target.as_ref(), &ctx.selectors.next_page).await?
    else {
        return Ok(false);
    };
    let enabled = ctx.target.is_enabled(&button).await?;
    let disabled_attr = ctx.target.read_attribute(&button, "disabled").await?;
    Ok(enabled && disabled_attr.is_none())
}

fn check_continuation<'a>(
    ctx: &'a SearchCtx,
    mut state: SearchState,
) -> BoxFuture<'a, SearchState> {
    async move {
        state.has_next_page = false;
        if state.exhausted
            || state.collected.len() >= state.limit
            || state.current_page >= state.max_pages
        {
            return state;
        }
        match next_page_available(ctx).await {
            Ok(available) => state.has_next_page = available,
            Err(e) => debug!("{} 检查下一页失败: {}", ctx.prefix(), e),
        }
        state
    }
    .boxed()
}

fn navigate_next_page<'a>(
    ctx: &'a SearchCtx,
    mut state: SearchState,
) -> BoxFuture<'a, SearchState> {
    async move {
        let result: TargetResult<bool> = async {
            let Some((_, button)) =
                locate_first(ctx.target.as_ref(), &ctx.selectors.next_page).await?
            else {
                return Ok(false);
            };
            ctx.target.click(&button).await?;
            ctx.target.pace(PACE_AFTER_NEXT_PAGE).await;
            ctx.target
                .wait_for(
                    std::slice::from_ref(&ctx.selectors.listing),
                    ctx.settings.wait_timeout,
                )
                .await?;
            Ok(true)
        }
        .await;

        match result {
            Ok(true) => {
                state.current_page += 1;
                debug!("{} 已翻到第 {} 页", ctx.prefix(), state.current_page);
            }
            Ok(false) => {
                state.errors.push("翻页失败: 未找到下一页按钮".to_string());
                state.exhausted = true;
            }
            Err(e) => {
                warn!("{} 翻页失败: {}", ctx.prefix(), e);
                state.errors.push(format!("翻页失败: {}", e));
                state.exhausted = true;
            }
        }
        state
    }
    .boxed()
}

/// 职位搜索流程
pub struct SearchFlow {
    selectors: SearchSelectors,
    settings: FlowSettings,
    workflow: Workflow<SearchCtx, SearchState>,
}

impl SearchFlow {
    pub fn new(selectors: SearchSelectors, settings: FlowSettings) -> Self {
        let workflow = Workflow::new("search")
            .register("build_query", build_query)
            .register("navigate", navigate)
            .register("extract_page", extract_page)
            .register("check_continuation", check_continuation)
            .register("navigate_next_page", navigate_next_page)
            .set_entry("build_query")
            .edge("build_query", "navigate")
            .edge("navigate", "extract_page")
            .edge("extract_page", "check_continuation")
            .conditional_edge(
                "check_continuation",
                should_continue,
                &[("continue", "navigate_next_page"), ("finish", END)],
            )
            .edge("navigate_next_page", "extract_page")
            .with_step_limit(selectors.page_cap() as usize * 3 + 10);

        Self {
            selectors,
            settings,
            workflow,
        }
    }

    /// 执行搜索，只返回收集到的职位
    pub async fn search(
        &self,
        request: &JobSearchRequest,
        target: Arc<dyn AutomationTarget>,
    ) -> Vec<JobResult> {
        self.search_detailed(request, target).await.jobs
    }

    /// 执行搜索，同时返回过程中的错误
    pub async fn search_detailed(
        &self,
        request: &JobSearchRequest,
        target: Arc<dyn AutomationTarget>,
    ) -> SearchOutcome {
        let job_id_re = match self.selectors.job_id_regex() {
            Ok(re) => re,
            Err(e) => {
                return SearchOutcome {
                    errors: vec![e.to_string()],
                    ..Default::default()
                }
            }
        };

        let ctx = SearchCtx {
            target,
            request: request.clone(),
            selectors: self.selectors.clone(),
            settings: self.settings.clone(),
            job_id_re,
        };
        let initial = SearchState::new(request.limit, self.selectors.page_cap());

        info!("{} 🔍 开始搜索 {}", ctx.prefix(), request);
        match self.workflow.run(&ctx, initial).await {
            Ok(state) => {
                info!(
                    "{} ✓ 搜索完成: {} 个职位, {} 页, {} 个错误",
                    ctx.prefix(),
                    state.collected.len(),
                    state.pages_visited,
                    state.errors.len()
                );
                SearchOutcome {
                    jobs: state.collected,
                    pages_visited: state.pages_visited,
                    errors: state.errors,
                }
            }
            Err(e) => {
                warn!("{} 搜索流程配置错误: {}", ctx.prefix(), e);
                SearchOutcome {
                    errors: vec![e.to_string()],
                    ..Default::default()
                }
            }
        }
    }
}
