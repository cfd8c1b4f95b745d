//! 集成测试共用的假页面与假答案生成器
//!
//! 假页面只认识"元素声明过的定位表达式"：某个元素能被 `Locator` 命中，
//! 当且仅当它的 `selectors` 中包含该表达式，或者 CSS 表达式恰好等于标签名。
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use auto_job_apply::config::{FlowSettings, SiteSelectors};
use auto_job_apply::error::{BrowserError, LlmError, TargetResult};
use auto_job_apply::infrastructure::{AutomationTarget, ElementHandle, Locator, PaceWindow};
use auto_job_apply::services::{AnswerBudget, AnswerGenerator, AnswerRequest};

pub const LOGIN_URL: &str = "https://site.test/login";
pub const SEARCH_URL: &str = "https://site.test/jobs/search/";
pub const HOME_URL: &str = "https://site.test/jobs/home";

type ClickHook = Arc<dyn Fn(&mut Dom) + Send + Sync>;
type NavigateHook = Arc<dyn Fn(&mut Dom, &str) + Send + Sync>;

/// 测试里用到的站点结构：默认定位方式 + 指向假站点的地址
pub fn test_selectors() -> SiteSelectors {
    let mut selectors = SiteSelectors::default();
    selectors.auth.login_url = LOGIN_URL.to_string();
    selectors.auth.authenticated_pattern = "/jobs/".to_string();
    selectors.auth.login_pattern = "/login".to_string();
    selectors.search.base_url = SEARCH_URL.to_string();
    selectors.apply.job_url_template = "https://site.test/jobs/view/{job_id}/".to_string();
    selectors
}

/// 很短的等待时间，让超时类测试快速结束
pub fn fast_settings() -> FlowSettings {
    FlowSettings {
        wait_timeout: Duration::from_millis(50),
        answer_budget: AnswerBudget {
            timeout: Duration::from_secs(1),
            max_attempts: 1,
        },
        fallback_answer: None,
    }
}

// ========== 假 DOM ==========

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    /// 事件记录里使用的名字
    pub name: String,
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub parent: Option<String>,
    pub selectors: Vec<String>,
}

impl FakeElement {
    pub fn new(name: &str, tag: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn matches(mut self, expression: &str) -> Self {
        self.selectors.push(expression.to_string());
        self
    }

    pub fn inside(mut self, parent: &ElementHandle) -> Self {
        self.parent = Some(parent.id().to_string());
        self
    }

    fn is_hit(&self, locator: &Locator) -> bool {
        let expression = locator.expression();
        if self.selectors.iter().any(|s| s == expression) {
            return true;
        }
        matches!(locator, Locator::Css(css) if css == &self.tag)
    }
}

#[derive(Default)]
pub struct Dom {
    pub url: String,
    order: Vec<String>,
    elements: HashMap<String, FakeElement>,
    click_hooks: HashMap<String, ClickHook>,
    next_id: usize,
}

impl Dom {
    /// 清空页面，之前的句柄全部失效
    pub fn clear(&mut self) {
        self.order.clear();
        self.elements.clear();
        self.click_hooks.clear();
    }

    pub fn add(&mut self, element: FakeElement) -> ElementHandle {
        self.next_id += 1;
        let id = self.next_id.to_string();
        self.order.push(id.clone());
        self.elements.insert(id.clone(), element);
        ElementHandle::new(id)
    }

    pub fn on_click<F>(&mut self, element: &ElementHandle, hook: F)
    where
        F: Fn(&mut Dom) + Send + Sync + 'static,
    {
        self.click_hooks
            .insert(element.id().to_string(), Arc::new(hook));
    }

    /// 按名字读取元素的属性
    pub fn attr_of(&self, name: &str, key: &str) -> Option<String> {
        self.elements
            .values()
            .find(|e| e.name == name)
            .and_then(|e| e.attrs.get(key).cloned())
    }

    fn get(&self, handle: &ElementHandle) -> TargetResult<&FakeElement> {
        self.elements
            .get(handle.id())
            .ok_or_else(|| BrowserError::StaleElement {
                handle: handle.id().to_string(),
            })
    }

    fn is_descendant(&self, id: &str, ancestor: &str) -> bool {
        let mut current = self.elements.get(id).and_then(|e| e.parent.clone());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.elements.get(&parent).and_then(|e| e.parent.clone());
        }
        false
    }

    fn find(&self, scope: Option<&str>, locator: &Locator) -> Vec<ElementHandle> {
        self.order
            .iter()
            .filter(|id| scope.map_or(true, |s| self.is_descendant(id, s)))
            .filter(|id| self.elements.get(*id).is_some_and(|e| e.is_hit(locator)))
            .map(|id| ElementHandle::new(id.clone()))
            .collect()
    }
}

// ========== 假页面 ==========

struct Inner {
    dom: Dom,
    navigate_hook: Option<NavigateHook>,
    /// 地址包含这些片段时导航失败
    unreachable: Vec<String>,
    events: Vec<String>,
}

/// 内存中的假页面
pub struct FakePage {
    inner: Mutex<Inner>,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                dom: Dom::default(),
                navigate_hook: None,
                unreachable: Vec::new(),
                events: Vec::new(),
            }),
        }
    }

    /// 每次导航时调用，`Dom::url` 已经更新为目标地址
    pub fn on_navigate<F>(&self, hook: F)
    where
        F: Fn(&mut Dom, &str) + Send + Sync + 'static,
    {
        self.inner.lock().unwrap().navigate_hook = Some(Arc::new(hook));
    }

    /// 之后所有包含 `fragment` 的地址都无法打开
    pub fn make_unreachable(&self, fragment: &str) {
        self.inner
            .lock()
            .unwrap()
            .unreachable
            .push(fragment.to_string());
    }

    pub fn with_dom<R>(&self, f: impl FnOnce(&mut Dom) -> R) -> R {
        f(&mut self.inner.lock().unwrap().dom)
    }

    pub fn events(&self) -> Vec<String> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("click:").map(str::to_string))
            .collect()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("navigate:").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl AutomationTarget for FakePage {
    async fn navigate(&self, url: &str) -> TargetResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(format!("navigate:{}", url));
        if inner.unreachable.iter().any(|f| url.contains(f.as_str())) {
            return Err(BrowserError::NavigationFailed {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        inner.dom.clear();
        inner.dom.url = url.to_string();
        if let Some(hook) = inner.navigate_hook.clone() {
            hook(&mut inner.dom, url);
        }
        Ok(())
    }

    async fn current_url(&self) -> TargetResult<String> {
        Ok(self.inner.lock().unwrap().dom.url.clone())
    }

    async fn locate_all(&self, locator: &Locator) -> TargetResult<Vec<ElementHandle>> {
        Ok(self.inner.lock().unwrap().dom.find(None, locator))
    }

    async fn locate_all_within(
        &self,
        scope: &ElementHandle,
        locator: &Locator,
    ) -> TargetResult<Vec<ElementHandle>> {
        let inner = self.inner.lock().unwrap();
        inner.dom.get(scope)?;
        Ok(inner.dom.find(Some(scope.id()), locator))
    }

    async fn parent(&self, element: &ElementHandle) -> TargetResult<Option<ElementHandle>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.dom.get(element)?.parent.clone().map(ElementHandle::new))
    }

    async fn click(&self, element: &ElementHandle) -> TargetResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let name = inner.dom.get(element)?.name.clone();
        inner.events.push(format!("click:{}", name));
        if let Some(hook) = inner.dom.click_hooks.get(element.id()).cloned() {
            hook(&mut inner.dom);
        }
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> TargetResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let name = inner.dom.get(element)?.name.clone();
        inner.events.push(format!("type:{}={}", name, text));
        if let Some(e) = inner.dom.elements.get_mut(element.id()) {
            e.attrs.insert("value".to_string(), text.to_string());
        }
        Ok(())
    }

    async fn read_attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> TargetResult<Option<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.dom.get(element)?.attrs.get(name).cloned())
    }

    async fn read_text(&self, element: &ElementHandle) -> TargetResult<String> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.dom.get(element)?.text.clone())
    }

    async fn is_enabled(&self, element: &ElementHandle) -> TargetResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(!inner.dom.get(element)?.attrs.contains_key("disabled"))
    }

    async fn pace(&self, _window: PaceWindow) {}
}

// ========== 页面脚本 ==========

/// 登录页：账号密码正确时跳到已登录区域，否则回到登录页
pub fn render_login(dom: &mut Dom, email: &'static str, password: &'static str) {
    dom.add(FakeElement::new("email", "input").matches("#session_key"));
    dom.add(FakeElement::new("password", "input").matches("#session_password"));
    let submit = dom.add(
        FakeElement::new("sign_in", "button")
            .matches("button[data-id='sign-in-form__submit-btn']"),
    );
    dom.on_click(&submit, move |dom| {
        let ok = dom.attr_of("email", "value").as_deref() == Some(email)
            && dom.attr_of("password", "value").as_deref() == Some(password);
        let url = if ok {
            HOME_URL.to_string()
        } else {
            format!("{}?error=1", LOGIN_URL)
        };
        dom.clear();
        dom.url = url;
    });
}

/// 一页搜索结果，`pages[index]` 是这一页的职位编号；后面还有页时显示下一页按钮
pub fn render_search_page(dom: &mut Dom, pages: Arc<Vec<Vec<String>>>, index: usize) {
    dom.clear();
    let Some(ids) = pages.get(index) else {
        return;
    };
    for id in ids {
        let card = dom.add(FakeElement::new(&format!("card-{}", id), "div").matches(".job-search-card"));
        dom.add(
            FakeElement::new(&format!("link-{}", id), "a")
                .attr("href", &format!("https://site.test/jobs/view/{}/?refId=x", id))
                .matches("h3 a")
                .inside(&card),
        );
        dom.add(
            FakeElement::new(&format!("snippet-{}", id), "p")
                .text(&format!("  Job {} description  ", id))
                .matches(".job-search-card__snippet")
                .inside(&card),
        );
    }
    if index + 1 < pages.len() {
        let next = dom.add(
            FakeElement::new("next_page", "button")
                .matches("button[aria-label='View next page']"),
        );
        dom.on_click(&next, move |dom| {
            render_search_page(dom, Arc::clone(&pages), index + 1)
        });
    }
}

/// 永远有下一页的搜索结果，每页两个职位
pub fn render_endless_page(dom: &mut Dom, page: usize) {
    dom.clear();
    for i in 0..2 {
        let id = format!("{}{}", page, i);
        let card = dom.add(FakeElement::new(&format!("card-{}", id), "div").matches(".job-search-card"));
        dom.add(
            FakeElement::new(&format!("link-{}", id), "a")
                .attr("href", &format!("/jobs/view/{}/", id))
                .matches("h3 a")
                .inside(&card),
        );
    }
    let next = dom.add(
        FakeElement::new("next_page", "button").matches("button[aria-label='View next page']"),
    );
    dom.on_click(&next, move |dom| render_endless_page(dom, page + 1));
}

/// 申请表单的行为
#[derive(Debug, Clone, Copy)]
pub struct FormScript {
    /// 是否有申请按钮
    pub has_apply_button: bool,
    /// 提交后是否出现确认信息
    pub confirms: bool,
    /// 申请按钮能被哪个 CSS 表达式找到
    pub apply_button: &'static str,
    /// 提交按钮能被哪个 CSS 表达式找到
    pub submit_button: &'static str,
}

impl Default for FormScript {
    fn default() -> Self {
        Self {
            has_apply_button: true,
            confirms: true,
            apply_button: "button[aria-label*='Easy Apply']",
            submit_button: "button[aria-label*='Submit application']",
        }
    }
}

/// 表单中的问题
pub const YEARS_QUESTION: &str = "Years of experience";
pub const RELOCATE_QUESTION: &str = "Willing to relocate?";
pub const REMOTE_QUESTION: &str = "Open to remote work?";

/// 职位详情页：点击申请按钮后弹出包含文本框、下拉框、单选组的表单
pub fn render_job_page(dom: &mut Dom, script: FormScript) {
    dom.add(FakeElement::new("body", "body"));
    if !script.has_apply_button {
        return;
    }
    let apply = dom.add(FakeElement::new("easy_apply", "button").matches(script.apply_button));
    dom.on_click(&apply, move |dom| render_form(dom, script));
}

pub fn render_form(dom: &mut Dom, script: FormScript) {
    let modal = dom.add(FakeElement::new("modal", "div").matches(".jobs-easy-apply-modal"));

    dom.add(
        FakeElement::new("years_label", "label")
            .text(YEARS_QUESTION)
            .matches("label[for='years']")
            .inside(&modal),
    );
    dom.add(
        FakeElement::new("years", "input")
            .attr("id", "years")
            .matches("input[type='text'], textarea")
            .inside(&modal),
    );
    // 没有任何标签的文本框会被忽略
    let token_box = dom.add(FakeElement::new("token_box", "div").inside(&modal));
    dom.add(
        FakeElement::new("hidden_token", "input")
            .matches("input[type='text'], textarea")
            .inside(&token_box),
    );

    let select_box = dom.add(FakeElement::new("relocate_box", "div").inside(&modal));
    dom.add(
        FakeElement::new("relocate_label", "label")
            .text(RELOCATE_QUESTION)
            .inside(&select_box),
    );
    let select = dom.add(FakeElement::new("relocate", "select").inside(&select_box));
    dom.add(FakeElement::new("relocate_placeholder", "option").text("  ").inside(&select));
    dom.add(FakeElement::new("relocate_yes", "option").text("Yes").inside(&select));
    dom.add(FakeElement::new("relocate_no", "option").text("No").inside(&select));

    let radio_box = dom.add(FakeElement::new("remote_box", "fieldset").inside(&modal));
    dom.add(
        FakeElement::new("remote_label", "label")
            .text(REMOTE_QUESTION)
            .inside(&radio_box),
    );
    for value in ["Yes", "No"] {
        dom.add(
            FakeElement::new(&format!("remote_{}", value.to_lowercase()), "input")
                .attr("name", "remote")
                .attr("value", value)
                .matches("input[type='radio']")
                .inside(&radio_box),
        );
    }

    let submit = dom.add(
        FakeElement::new("submit", "button")
            .matches(script.submit_button)
            .inside(&modal),
    );
    dom.on_click(&submit, move |dom| {
        if script.confirms {
            dom.add(
                FakeElement::new("confirmation", "div")
                    .matches(".artdeco-inline-feedback--success"),
            );
        }
    });
}

/// 从职位详情页地址中取出编号
pub fn job_id_from_url(url: &str) -> Option<String> {
    url.split("/jobs/view/")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .map(str::to_string)
}

// ========== 假答案生成器 ==========

/// 按问题返回固定答案，没有登记的问题返回错误
#[derive(Default)]
pub struct ScriptedGenerator {
    answers: HashMap<String, String>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedGenerator {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(q, a)| (q.to_string(), a.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 表单三个问题都能回答
    pub fn complete() -> Self {
        Self::new(&[
            (YEARS_QUESTION, "5"),
            (RELOCATE_QUESTION, "no"),
            (REMOTE_QUESTION, "Yes, fully remote"),
        ])
    }

    /// (问题, 期望月薪)
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn generate(&self, request: &AnswerRequest<'_>) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.question.to_string(), request.monthly_compensation));
        self.answers
            .get(request.question)
            .cloned()
            .ok_or_else(|| LlmError::MalformedOutput(format!("no answer for {}", request.question)))
    }
}
