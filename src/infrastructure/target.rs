//! 自动化目标 - 基础设施层
//!
//! 描述流程层需要的全部页面操作能力。真实实现是 [`ChromeTarget`]，
//! 测试里用内存中的假页面实现同一个 trait。
//!
//! [`ChromeTarget`]: crate::infrastructure::ChromeTarget

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::error::{BrowserError, TargetResult};

/// 轮询等待条件的间隔
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 元素定位方式
///
/// TOML 中写作 `{ css = "..." }` 或 `{ xpath = "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Locator::XPath(expression.into())
    }

    /// 定位表达式本身
    pub fn expression(&self) -> &str {
        match self {
            Locator::Css(s) | Locator::XPath(s) => s,
        }
    }

    /// 传给页面脚本的描述
    pub fn to_js(&self) -> JsonValue {
        match self {
            Locator::Css(s) => json!({ "kind": "css", "value": s }),
            Locator::XPath(s) => json!({ "kind": "xpath", "value": s }),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{}", s),
            Locator::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// 页面元素的不透明句柄
///
/// 只有产生它的自动化目标能解释其内容
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 模拟人工操作的随机停顿区间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaceWindow {
    pub min: Duration,
    pub max: Duration,
}

impl PaceWindow {
    pub const fn millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }
}

/// 自动化目标：一个有状态、类浏览器的远程会话
///
/// 职责：
/// - 只提供导航、定位、等待、点击、输入、读属性、停顿这些原子能力
/// - 所有失败都作为 `BrowserError` 返回
/// - 同一个实例同一时间只服务一个流程运行
#[async_trait]
pub trait AutomationTarget: Send + Sync {
    /// 打开指定地址
    async fn navigate(&self, url: &str) -> TargetResult<()>;

    /// 当前地址
    async fn current_url(&self) -> TargetResult<String>;

    /// 查找第一个匹配的元素
    async fn locate(&self, locator: &Locator) -> TargetResult<Option<ElementHandle>> {
        Ok(self.locate_all(locator).await?.into_iter().next())
    }

    /// 按文档顺序查找所有匹配的元素
    async fn locate_all(&self, locator: &Locator) -> TargetResult<Vec<ElementHandle>>;

    /// 在某个元素内部查找第一个匹配的元素
    async fn locate_within(
        &self,
        scope: &ElementHandle,
        locator: &Locator,
    ) -> TargetResult<Option<ElementHandle>> {
        Ok(self
            .locate_all_within(scope, locator)
            .await?
            .into_iter()
            .next())
    }

    /// 在某个元素内部查找所有匹配的元素
    async fn locate_all_within(
        &self,
        scope: &ElementHandle,
        locator: &Locator,
    ) -> TargetResult<Vec<ElementHandle>>;

    /// 父元素
    async fn parent(&self, element: &ElementHandle) -> TargetResult<Option<ElementHandle>>;

    async fn click(&self, element: &ElementHandle) -> TargetResult<()>;

    /// 清空后输入文本
    async fn type_text(&self, element: &ElementHandle, text: &str) -> TargetResult<()>;

    async fn read_attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> TargetResult<Option<String>>;

    /// 元素的可见文本
    async fn read_text(&self, element: &ElementHandle) -> TargetResult<String>;

    /// 元素是否可交互
    async fn is_enabled(&self, element: &ElementHandle) -> TargetResult<bool>;

    /// 阻塞一段随机时长，无论前一步成功与否都会执行
    async fn pace(&self, window: PaceWindow);

    /// 等待任意一个定位方式出现匹配元素，超时返回 `BrowserError::Timeout`
    async fn wait_for(
        &self,
        locators: &[Locator],
        timeout: Duration,
    ) -> TargetResult<ElementHandle> {
        let poll = async {
            loop {
                if let Some((_, element)) = locate_first(self, locators).await? {
                    return Ok(element);
                }
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Timeout {
                waited_ms: timeout.as_millis() as u64,
                locators: describe_locators(locators),
            }),
        }
    }
}

/// 按顺序尝试每一种定位方式，返回第一个命中的 (序号, 元素)
///
/// 单个定位方式出错只视为未命中，继续尝试下一个
pub async fn locate_first<T>(
    target: &T,
    locators: &[Locator],
) -> TargetResult<Option<(usize, ElementHandle)>>
where
    T: AutomationTarget + ?Sized,
{
    for (index, locator) in locators.iter().enumerate() {
        match target.locate(locator).await {
            Ok(Some(element)) => return Ok(Some((index, element))),
            Ok(None) => continue,
            Err(e) => {
                debug!("定位方式 {} 出错，尝试下一个: {}", locator, e);
                continue;
            }
        }
    }
    Ok(None)
}

/// 日志与错误信息里使用的定位方式摘要
pub fn describe_locators(locators: &[Locator]) -> String {
    locators
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// 转义 CSS 属性选择器中的单引号值
pub fn css_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_deserializes_from_toml_table() {
        #[derive(Deserialize)]
        struct Wrapper {
            items: Vec<Locator>,
        }

        let wrapper: Wrapper = toml::from_str(
            r#"items = [{ css = "button.apply" }, { xpath = "//button[contains(text(), 'Apply')]" }]"#,
        )
        .unwrap();

        assert_eq!(
            wrapper.items,
            vec![
                Locator::css("button.apply"),
                Locator::xpath("//button[contains(text(), 'Apply')]"),
            ]
        );
    }

    #[test]
    fn test_describe_locators_keeps_order() {
        let text = describe_locators(&[Locator::css("a"), Locator::xpath("//b")]);
        assert_eq!(text, "css:a | xpath://b");
    }

    #[test]
    fn test_css_attr_value_escapes_quotes() {
        assert_eq!(css_attr_value("it's"), "it\\'s");
        assert_eq!(css_attr_value("plain-id"), "plain-id");
    }

    /// 只会按表达式回答定位请求的目标，记录每一次查询
    struct ScriptedLocators {
        answers: Vec<(&'static str, Option<bool>)>,
        queried: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedLocators {
        /// `Some(true)` 命中，`Some(false)` 未命中，`None` 出错
        fn new(answers: Vec<(&'static str, Option<bool>)>) -> Self {
            Self {
                answers,
                queried: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn queried(&self) -> Vec<String> {
            self.queried.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AutomationTarget for ScriptedLocators {
        async fn navigate(&self, _url: &str) -> TargetResult<()> {
            Ok(())
        }

        async fn current_url(&self) -> TargetResult<String> {
            Ok(String::new())
        }

        async fn locate_all(&self, locator: &Locator) -> TargetResult<Vec<ElementHandle>> {
            let expression = locator.expression().to_string();
            self.queried.lock().unwrap().push(expression.clone());
            match self.answers.iter().find(|(e, _)| *e == expression) {
                Some((_, Some(true))) => Ok(vec![ElementHandle::new(expression)]),
                Some((_, None)) => Err(BrowserError::UnexpectedResponse("boom".to_string())),
                _ => Ok(Vec::new()),
            }
        }

        async fn locate_all_within(
            &self,
            _scope: &ElementHandle,
            locator: &Locator,
        ) -> TargetResult<Vec<ElementHandle>> {
            self.locate_all(locator).await
        }

        async fn parent(&self, _element: &ElementHandle) -> TargetResult<Option<ElementHandle>> {
            Ok(None)
        }

        async fn click(&self, _element: &ElementHandle) -> TargetResult<()> {
            Ok(())
        }

        async fn type_text(&self, _element: &ElementHandle, _text: &str) -> TargetResult<()> {
            Ok(())
        }

        async fn read_attribute(
            &self,
            _element: &ElementHandle,
            _name: &str,
        ) -> TargetResult<Option<String>> {
            Ok(None)
        }

        async fn read_text(&self, _element: &ElementHandle) -> TargetResult<String> {
            Ok(String::new())
        }

        async fn is_enabled(&self, _element: &ElementHandle) -> TargetResult<bool> {
            Ok(true)
        }

        async fn pace(&self, _window: PaceWindow) {}
    }

    #[tokio::test]
    async fn test_locate_first_skips_failing_locator_and_stops_at_first_hit() {
        let target = ScriptedLocators::new(vec![
            ("#missing", Some(false)),
            ("#broken", None),
            ("#third", Some(true)),
            ("#fourth", Some(true)),
        ]);
        let locators = [
            Locator::css("#missing"),
            Locator::css("#broken"),
            Locator::css("#third"),
            Locator::css("#fourth"),
        ];

        let (index, element) = locate_first(&target, &locators).await.unwrap().unwrap();

        assert_eq!(index, 2);
        assert_eq!(element.id(), "#third");
        assert_eq!(target.queried(), vec!["#missing", "#broken", "#third"]);
    }

    #[tokio::test]
    async fn test_locate_first_returns_none_when_all_miss_or_fail() {
        let target = ScriptedLocators::new(vec![("#broken", None)]);
        let locators = [Locator::css("#broken"), Locator::css("#missing")];

        let found = locate_first(&target, &locators).await.unwrap();

        assert!(found.is_none());
        assert_eq!(target.queried(), vec!["#broken", "#missing"]);
    }

    #[tokio::test]
    async fn test_wait_for_times_out_with_locator_summary() {
        let target = ScriptedLocators::new(Vec::new());
        let locators = [Locator::css("#never")];

        let err = target
            .wait_for(&locators, Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(matches!(err, BrowserError::Timeout { .. }));
        assert!(err.to_string().contains("css:#never"));
    }

    #[test]
    fn test_pace_window_millis() {
        let window = PaceWindow::millis(1500, 3000);
        assert_eq!(window.min, Duration::from_millis(1500));
        assert_eq!(window.max, Duration::from_secs(3));
    }
}
