//! 程序配置
//!
//! - `Config`：从环境变量读取的运行参数
//! - `FlowSettings`：流程层使用的超时与答案预算
//! - `SiteSelectors`：目标站点的页面结构，可由 TOML 文件覆盖

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::infrastructure::Locator;
use crate::services::answer::AnswerBudget;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口（连接已有浏览器时使用）
    pub browser_debug_port: u16,
    /// 是否自行启动浏览器，否则连接调试端口上的浏览器
    pub launch_browser: bool,
    /// 启动浏览器时是否无头
    pub headless: bool,
    /// Chrome 可执行文件路径
    pub chrome_executable: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 是否用 LLM 过滤职位
    pub filter_jobs: bool,
    // --- 站点账号 ---
    pub site_email: Option<String>,
    pub site_password: Option<String>,
    // --- 输入输出文件 ---
    pub run_plan_file: PathBuf,
    pub profile_file: PathBuf,
    pub selectors_file: Option<PathBuf>,
    pub results_dir: PathBuf,
    // --- 流程参数 ---
    /// 页面等待超时（秒）
    pub wait_timeout_secs: u64,
    /// 随机停顿缩放系数，0 表示关闭
    pub pacing_scale: f64,
    /// 单次生成答案的超时（秒）
    pub answer_timeout_secs: u64,
    /// 生成答案的最大尝试次数
    pub answer_max_attempts: u32,
    /// 生成答案失败时使用的默认答案
    pub fallback_answer: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            launch_browser: true,
            headless: false,
            chrome_executable: None,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            filter_jobs: true,
            site_email: None,
            site_password: None,
            run_plan_file: PathBuf::from("run_plan.toml"),
            profile_file: PathBuf::from("profile.json"),
            selectors_file: None,
            results_dir: PathBuf::from("results"),
            wait_timeout_secs: 10,
            pacing_scale: 1.0,
            answer_timeout_secs: 30,
            answer_max_attempts: 2,
            fallback_answer: None,
        }
    }
}

/// 读取并解析环境变量，不存在时返回 None
fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

/// 读取字符串环境变量，空字符串视为未设置
fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", "u16")?
                .unwrap_or(default.browser_debug_port),
            launch_browser: env_parse("LAUNCH_BROWSER", "bool")?.unwrap_or(default.launch_browser),
            headless: env_parse("HEADLESS", "bool")?.unwrap_or(default.headless),
            chrome_executable: env_string("CHROME_EXECUTABLE").map(PathBuf::from),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
            llm_api_key: env_string("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            filter_jobs: env_parse("FILTER_JOBS", "bool")?.unwrap_or(default.filter_jobs),
            site_email: env_string("SITE_EMAIL"),
            site_password: env_string("SITE_PASSWORD"),
            run_plan_file: env_string("RUN_PLAN_FILE")
                .map(PathBuf::from)
                .unwrap_or(default.run_plan_file),
            profile_file: env_string("PROFILE_FILE")
                .map(PathBuf::from)
                .unwrap_or(default.profile_file),
            selectors_file: env_string("SELECTORS_FILE").map(PathBuf::from),
            results_dir: env_string("RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.results_dir),
            wait_timeout_secs: env_parse("WAIT_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.wait_timeout_secs),
            pacing_scale: env_parse("PACING_SCALE", "f64")?.unwrap_or(default.pacing_scale),
            answer_timeout_secs: env_parse("ANSWER_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.answer_timeout_secs),
            answer_max_attempts: env_parse("ANSWER_MAX_ATTEMPTS", "u32")?
                .unwrap_or(default.answer_max_attempts),
            fallback_answer: env_string("FALLBACK_ANSWER"),
        })
    }

    /// 站点账号，缺失时报错
    pub fn credentials(&self) -> Result<(String, String), ConfigError> {
        let email = self
            .site_email
            .clone()
            .ok_or_else(|| ConfigError::EnvVarNotFound {
                var_name: "SITE_EMAIL".to_string(),
            })?;
        let password = self
            .site_password
            .clone()
            .ok_or_else(|| ConfigError::EnvVarNotFound {
                var_name: "SITE_PASSWORD".to_string(),
            })?;
        Ok((email, password))
    }

    /// 是否配置了 LLM
    pub fn has_llm(&self) -> bool {
        !self.llm_api_key.is_empty()
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
            answer_budget: AnswerBudget {
                timeout: Duration::from_secs(self.answer_timeout_secs),
                max_attempts: self.answer_max_attempts.max(1),
            },
            fallback_answer: self.fallback_answer.clone(),
        }
    }
}

/// 搜索最多翻到的页数
pub const MAX_PAGES: u32 = 10;

/// 流程层参数
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// 所有等待页面元素的上限
    pub wait_timeout: Duration,
    /// 生成答案的时间与重试预算
    pub answer_budget: AnswerBudget,
    /// 生成答案失败时使用的默认答案
    pub fallback_answer: Option<String>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Config::default().flow_settings()
    }
}

// ========== 站点选择器 ==========

/// 目标站点的全部页面结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub auth: AuthSelectors,
    pub search: SearchSelectors,
    pub apply: ApplySelectors,
}

impl SiteSelectors {
    /// 检查正则、地址与翻页上限是否合法
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.authenticated_regex()?;
        self.auth.login_regex()?;
        self.search.job_id_regex()?;
        self.search.base()?;
        if self.search.max_pages == 0 || self.search.max_pages > MAX_PAGES {
            return Err(ConfigError::InvalidSelectors(format!(
                "max_pages 必须在 1 到 {} 之间，当前为 {}",
                MAX_PAGES, self.search.max_pages
            )));
        }
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// 登录页结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSelectors {
    /// 登录入口
    pub login_url: String,
    pub email_field: Locator,
    pub password_field: Locator,
    pub submit_button: Locator,
    /// 已登录区域的地址规则
    pub authenticated_pattern: String,
    /// 登录页的地址规则
    pub login_pattern: String,
}

impl Default for AuthSelectors {
    fn default() -> Self {
        Self {
            login_url: "https://www.linkedin.com/jobs/".to_string(),
            email_field: Locator::css("#session_key"),
            password_field: Locator::css("#session_password"),
            submit_button: Locator::css("button[data-id='sign-in-form__submit-btn']"),
            authenticated_pattern: "/jobs/".to_string(),
            login_pattern: "/login".to_string(),
        }
    }
}

impl AuthSelectors {
    pub fn authenticated_regex(&self) -> Result<Regex, ConfigError> {
        compile(&self.authenticated_pattern)
    }

    pub fn login_regex(&self) -> Result<Regex, ConfigError> {
        compile(&self.login_pattern)
    }
}

/// 搜索结果页结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSelectors {
    pub base_url: String,
    pub keywords_param: String,
    pub location_param: String,
    /// 只看可快速申请职位的过滤参数 (名称, 值)
    pub easy_apply_param: (String, String),
    /// 每条职位卡片
    pub listing: Locator,
    /// 卡片内指向职位详情的链接
    pub listing_link: Locator,
    /// 卡片内的描述摘要
    pub snippet: Locator,
    /// 从链接中提取职位编号的正则，第一个捕获组为编号
    pub job_id_pattern: String,
    /// 下一页按钮，按顺序尝试
    pub next_page: Vec<Locator>,
    /// 最多翻到第几页，不超过 [`MAX_PAGES`]
    pub max_pages: u32,
}

impl Default for SearchSelectors {
    fn default() -> Self {
        Self {
            base_url: "https://www.linkedin.com/jobs/search/".to_string(),
            keywords_param: "keywords".to_string(),
            location_param: "location".to_string(),
            easy_apply_param: ("f_LF".to_string(), "f_AL".to_string()),
            listing: Locator::css(".job-search-card"),
            listing_link: Locator::css("h3 a"),
            snippet: Locator::css(".job-search-card__snippet"),
            job_id_pattern: r"/view/(\d+)".to_string(),
            next_page: vec![
                Locator::css("button[aria-label='View next page']"),
                Locator::css(".artdeco-pagination__button--next"),
            ],
            max_pages: MAX_PAGES,
        }
    }
}

impl SearchSelectors {
    pub fn job_id_regex(&self) -> Result<Regex, ConfigError> {
        compile(&self.job_id_pattern)
    }

    pub fn base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })
    }

    /// 实际使用的页数上限，限制在 1..=MAX_PAGES
    pub fn page_cap(&self) -> u32 {
        self.max_pages.clamp(1, MAX_PAGES)
    }
}

/// 职位详情页与申请表单结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplySelectors {
    /// 职位详情页地址，`{job_id}` 会被替换
    pub job_url_template: String,
    /// 详情页加载完成的标志
    pub page_ready: Vec<Locator>,
    /// 打开申请表单的按钮，按顺序尝试
    pub open_form: Vec<Locator>,
    /// 申请表单弹窗
    pub form_container: Vec<Locator>,
    pub text_fields: Locator,
    pub select_fields: Locator,
    pub select_option: Locator,
    pub radio_buttons: Locator,
    pub label: Locator,
    /// 提交按钮，按顺序尝试
    pub submit: Vec<Locator>,
    /// 提交成功的标志
    pub confirmation: Vec<Locator>,
}

impl Default for ApplySelectors {
    fn default() -> Self {
        Self {
            job_url_template: "https://www.linkedin.com/jobs/view/{job_id}/".to_string(),
            page_ready: vec![Locator::css("body")],
            open_form: vec![
                Locator::css("button[aria-label*='Easy Apply']"),
                Locator::css("button[data-control-name='jobdetails_topcard_inapply']"),
                Locator::css(".jobs-apply-button--top-card button"),
                Locator::css("button.jobs-apply-button"),
                Locator::xpath("//button[contains(text(), 'Easy Apply')]"),
            ],
            form_container: vec![
                Locator::css(".jobs-easy-apply-modal"),
                Locator::css(".artdeco-modal"),
            ],
            text_fields: Locator::css("input[type='text'], textarea"),
            select_fields: Locator::css("select"),
            select_option: Locator::css("option"),
            radio_buttons: Locator::css("input[type='radio']"),
            label: Locator::css("label"),
            submit: vec![
                Locator::css("button[aria-label*='Submit application']"),
                Locator::css("button[data-control-name='continue_unify']"),
                Locator::css("button.artdeco-button--primary"),
                Locator::xpath(
                    "//button[contains(text(), 'Submit') or contains(text(), 'Send application')]",
                ),
            ],
            confirmation: vec![
                Locator::css(".artdeco-inline-feedback--success"),
                Locator::css(".jobs-easy-apply-confirmation"),
                Locator::xpath("//*[contains(text(), 'Application sent')]"),
            ],
        }
    }
}

impl ApplySelectors {
    pub fn job_url(&self, job_id: &str) -> String {
        self.job_url_template.replace("{job_id}", job_id)
    }
}
