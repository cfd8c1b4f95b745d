use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 流程引擎配置错误
    #[error("流程错误: {0}")]
    Workflow(#[from] WorkflowError),
}

/// 浏览器相关错误
///
/// 同时也是 `AutomationTarget` 的错误类型：所有操作失败都以普通返回值体现
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 导航失败
    #[error("导航到 {url} 失败: {message}")]
    NavigationFailed { url: String, message: String },
    /// CDP 调用失败
    #[error("CDP 调用失败: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    /// 脚本返回了无法识别的结果
    #[error("脚本返回结果异常: {0}")]
    UnexpectedResponse(String),
    /// 元素句柄已失效（页面已跳转或元素被移除）
    #[error("元素已失效: {handle}")]
    StaleElement { handle: String },
    /// 元素不存在
    #[error("未找到元素: {locator}")]
    ElementNotFound { locator: String },
    /// 等待超时
    #[error("等待 {locators} 超时 ({waited_ms}ms)")]
    Timeout { waited_ms: u64, locators: String },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: async_openai::error::OpenAIError,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 调用超时
    #[error("LLM调用超时 ({timeout_ms}ms)")]
    Timeout { timeout_ms: u64 },
    /// 返回内容无法使用
    #[error("LLM返回内容无法解析: {0}")]
    MalformedOutput(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// 正则表达式无效
    #[error("无效的匹配规则 '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// URL 无效
    #[error("无效的 URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// 运行计划不合法
    #[error("运行计划不合法: {0}")]
    InvalidPlan(String),
    /// 站点选择器配置不合法
    #[error("站点选择器配置不合法: {0}")]
    InvalidSelectors(String),
}

/// 流程引擎错误
///
/// 只描述图本身配置错误；步骤内部的失败一律记录在状态里
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// 未设置入口步骤
    #[error("流程 {workflow} 未设置入口步骤")]
    MissingEntry { workflow: String },
    /// 步骤不存在
    #[error("流程 {workflow} 中不存在步骤 {step}")]
    UnknownStep { workflow: String, step: String },
    /// 步骤缺少出边
    #[error("流程 {workflow} 的步骤 {step} 没有出边")]
    MissingEdge { workflow: String, step: String },
    /// 条件分支返回了未登记的标签
    #[error("流程 {workflow} 的步骤 {step} 返回了未知分支 {label}")]
    UnknownRoute {
        workflow: String,
        step: String,
        label: String,
    },
    /// 超过最大步数
    #[error("流程 {workflow} 执行超过 {limit} 步，已中止")]
    StepLimitExceeded { workflow: String, limit: usize },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 自动化目标操作结果类型
pub type TargetResult<T> = Result<T, BrowserError>;
