//! 登录流程 - 流程层
//!
//! navigate_to_login → fill_credentials → submit → verify
//!
//! 任何一步失败都只记录到状态里，后续步骤直接跳过，
//! 最后的 verify 总会执行并给出 `authenticated=false`。
//!
//! verify 只看地址是否进入了已登录区域，重定向较慢时可能误判为失败。

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{info, warn};

use crate::config::{AuthSelectors, FlowSettings};
use crate::error::BrowserError;
use crate::infrastructure::{AutomationTarget, Locator, PaceWindow};
use crate::models::AuthResult;
use crate::workflow::engine::{Workflow, END};

const PACE_AFTER_NAVIGATE: PaceWindow = PaceWindow::millis(2000, 4000);
const PACE_AFTER_TYPING: PaceWindow = PaceWindow::millis(1000, 2000);
const PACE_AFTER_SUBMIT: PaceWindow = PaceWindow::millis(3000, 5000);

/// 登录流程运行期间的只读上下文
pub struct AuthCtx {
    pub target: Arc<dyn AutomationTarget>,
    pub selectors: AuthSelectors,
    pub settings: FlowSettings,
    pub email: String,
    pub password: String,
}

/// 登录流程状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub authenticated: bool,
    pub error: Option<String>,
}

fn navigate_to_login<'a>(ctx: &'a AuthCtx, mut state: AuthState) -> BoxFuture<'a, AuthState> {
    async move {
        if state.error.is_some() {
            return state;
        }
        info!("🔐 打开登录页: {}", ctx.selectors.login_url);
        if let Err(e) = ctx.target.navigate(&ctx.selectors.login_url).await {
            state.error = Some(format!("无法打开登录页: {}", e));
        }
        ctx.target.pace(PACE_AFTER_NAVIGATE).await;
        state
    }
    .boxed()
}

async fn type_into_field(ctx: &AuthCtx, field: &Locator, text: &str) -> Result<(), BrowserError> {
    let element = ctx
        .target
        .wait_for(std::slice::from_ref(field), ctx.settings.wait_timeout)
        .await?;
    ctx.target.type_text(&element, text).await?;
    ctx.target.pace(PACE_AFTER_TYPING).await;
    Ok(())
}

fn fill_credentials<'a>(ctx: &'a AuthCtx, mut state: AuthState) -> BoxFuture<'a, AuthState> {
    async move {
        if state.error.is_some() {
            return state;
        }
        let result = async {
            type_into_field(ctx, &ctx.selectors.email_field, &ctx.email).await?;
            type_into_field(ctx, &ctx.selectors.password_field, &ctx.password).await
        }
        .await;

        match result {
            Ok(()) => info!("✓ 已填写账号密码"),
            Err(BrowserError::Timeout { .. }) => {
                state.error = Some("未找到登录表单，页面结构可能已变化".to_string());
            }
            Err(e) => state.error = Some(format!("填写账号密码失败: {}", e)),
        }
        state
    }
    .boxed()
}

fn submit<'a>(ctx: &'a AuthCtx, mut state: AuthState) -> BoxFuture<'a, AuthState> {
    async move {
        if state.error.is_some() {
            return state;
        }
        let button = ctx
            .target
            .wait_for(
                std::slice::from_ref(&ctx.selectors.submit_button),
                ctx.settings.wait_timeout,
            )
            .await;

        match button {
            Ok(button) => {
                if let Err(e) = ctx.target.click(&button).await {
                    state.error = Some(format!("点击登录按钮失败: {}", e));
                }
                ctx.target.pace(PACE_AFTER_SUBMIT).await;
            }
            Err(BrowserError::Timeout { .. }) => {
                state.error = Some("未找到登录按钮".to_string());
            }
            Err(e) => state.error = Some(format!("点击登录按钮失败: {}", e)),
        }
        state
    }
    .boxed()
}

/// 地址进入已登录区域且不在登录页即视为成功
pub fn looks_authenticated(selectors: &AuthSelectors, url: &str) -> Result<bool, String> {
    let inside = selectors.authenticated_regex().map_err(|e| e.to_string())?;
    let login = selectors.login_regex().map_err(|e| e.to_string())?;
    Ok(inside.is_match(url) && !login.is_match(url))
}

fn verify<'a>(ctx: &'a AuthCtx, mut state: AuthState) -> BoxFuture<'a, AuthState> {
    async move {
        if state.error.is_some() {
            state.authenticated = false;
            return state;
        }
        let url = match ctx.target.current_url().await {
            Ok(url) => url,
            Err(e) => {
                state.authenticated = false;
                state.error = Some(format!("读取当前地址失败: {}", e));
                return state;
            }
        };

        match looks_authenticated(&ctx.selectors, &url) {
            Ok(true) => state.authenticated = true,
            Ok(false) => {
                state.authenticated = false;
                state.error = Some(format!("登录失败，仍停留在登录页: {}", url));
            }
            Err(e) => {
                state.authenticated = false;
                state.error = Some(format!("登录校验规则无效: {}", e));
            }
        }
        state
    }
    .boxed()
}

/// 登录流程
pub struct AuthFlow {
    selectors: AuthSelectors,
    settings: FlowSettings,
    workflow: Workflow<AuthCtx, AuthState>,
}

impl AuthFlow {
    pub fn new(selectors: AuthSelectors, settings: FlowSettings) -> Self {
        let workflow = Workflow::new("auth")
            .register("navigate_to_login", navigate_to_login)
            .register("fill_credentials", fill_credentials)
            .register("submit", submit)
            .register("verify", verify)
            .set_entry("navigate_to_login")
            .edge("navigate_to_login", "fill_credentials")
            .edge("fill_credentials", "submit")
            .edge("submit", "verify")
            .edge("verify", END);

        Self {
            selectors,
            settings,
            workflow,
        }
    }

    /// 执行登录，失败以 `authenticated=false` 返回
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        target: Arc<dyn AutomationTarget>,
    ) -> AuthResult {
        let ctx = AuthCtx {
            target,
            selectors: self.selectors.clone(),
            settings: self.settings.clone(),
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.workflow.run(&ctx, AuthState::default()).await {
            Ok(state) => {
                if state.authenticated {
                    info!("✅ 登录成功");
                } else {
                    warn!(
                        "❌ 登录失败: {}",
                        state.error.as_deref().unwrap_or("未知原因")
                    );
                }
                AuthResult {
                    authenticated: state.authenticated,
                    error: state.error,
                }
            }
            Err(e) => {
                warn!("❌ 登录流程配置错误: {}", e);
                AuthResult::failed(e.to_string())
            }
        }
    }
}
