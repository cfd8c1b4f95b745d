//! Chrome 自动化目标 - 基础设施层
//!
//! 基于 `JsExecutor` 实现 `AutomationTarget`：
//! - 元素查找全部在页面脚本里完成，命中的元素被打上 `data-ja-handle` 标记
//! - 已打过标记的元素复用原有编号，重复查找得到同一个句柄
//! - 点击和输入走 chromiumoxide 的原生输入事件，下拉选项走脚本

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value as JsonValue};
use tokio::time::sleep;
use tracing::debug;

use crate::error::{BrowserError, TargetResult};
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::target::{AutomationTarget, ElementHandle, Locator, PaceWindow};

/// 句柄属性名
const HANDLE_ATTR: &str = "data-ja-handle";

/// 每段脚本共用的辅助函数
///
/// 页面跳转后 window 上的计数器会丢失，因此每次调用都重新注入
const JS_PRELUDE: &str = r#"
const __ja = {
    resolve(loc, root) {
        const scope = root || document;
        if (loc.kind === 'css') {
            return Array.from(scope.querySelectorAll(loc.value));
        }
        const snap = document.evaluate(loc.value, scope, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        const out = [];
        for (let i = 0; i < snap.snapshotLength; i++) {
            const node = snap.snapshotItem(i);
            if (node && node.nodeType === 1) out.push(node);
        }
        return out;
    },
    stamp(el) {
        if (!el.dataset.jaHandle) {
            window.__jaSeq = (window.__jaSeq || 0) + 1;
            el.dataset.jaHandle = String(window.__jaSeq);
        }
        return el.dataset.jaHandle;
    },
    find(handle) {
        return document.querySelector('[data-ja-handle="' + handle + '"]');
    },
};
"#;

/// 随机停顿配置
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// 停顿时长缩放系数，0 表示关闭停顿
    pub scale: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Pacing {
    /// 在区间内随机取一个时长并按系数缩放
    pub fn sample(&self, window: PaceWindow) -> Duration {
        if self.scale <= 0.0 {
            return Duration::ZERO;
        }
        let min = window.min.as_secs_f64();
        let max = window.max.as_secs_f64().max(min);
        let secs = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        Duration::from_secs_f64(secs * self.scale)
    }
}

/// Chrome 自动化目标
pub struct ChromeTarget {
    executor: JsExecutor,
    pacing: Pacing,
}

impl ChromeTarget {
    pub fn new(executor: JsExecutor, pacing: Pacing) -> Self {
        Self { executor, pacing }
    }

    /// 句柄对应的 CSS 选择器
    fn handle_selector(handle: &ElementHandle) -> String {
        format!("[{}=\"{}\"]", HANDLE_ATTR, handle.id())
    }

    /// 在页面中执行带辅助函数的脚本，`args` 以 JSON 形式注入为 `args`
    async fn run_script(&self, args: JsonValue, body: &str) -> TargetResult<JsonValue> {
        let js_code = format!(
            "(() => {{ {} const args = {}; {} }})()",
            JS_PRELUDE, args, body
        );
        self.executor.eval(js_code).await
    }

    async fn query(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> TargetResult<Vec<ElementHandle>> {
        let args = json!({
            "scope": scope.map(|h| h.id().to_string()),
            "locator": locator.to_js(),
        });
        let result = self
            .run_script(
                args,
                r#"
                let root = null;
                if (args.scope !== null) {
                    root = __ja.find(args.scope);
                    if (!root) return { stale: true, handles: [] };
                }
                const handles = __ja.resolve(args.locator, root).map((el) => __ja.stamp(el));
                return { stale: false, handles };
                "#,
            )
            .await?;

        if result.get("stale").and_then(|v| v.as_bool()).unwrap_or(false) {
            return Err(BrowserError::StaleElement {
                handle: scope.map(|h| h.id().to_string()).unwrap_or_default(),
            });
        }

        let handles = result
            .get("handles")
            .and_then(|v| v.as_array())
            .ok_or_else(|| BrowserError::UnexpectedResponse(result.to_string()))?
            .iter()
            .filter_map(|v| v.as_str())
            .map(ElementHandle::new)
            .collect();
        Ok(handles)
    }

    /// 针对单个元素执行脚本，元素不存在时返回 StaleElement
    async fn on_element(
        &self,
        element: &ElementHandle,
        extra: JsonValue,
        body: &str,
    ) -> TargetResult<JsonValue> {
        let args = json!({ "handle": element.id(), "extra": extra });
        let script = format!(
            r#"
            const el = __ja.find(args.handle);
            if (!el) return {{ stale: true, value: null }};
            {}
            "#,
            body
        );
        let result = self.run_script(args, &script).await?;
        if result.get("stale").and_then(|v| v.as_bool()).unwrap_or(false) {
            return Err(BrowserError::StaleElement {
                handle: element.id().to_string(),
            });
        }
        Ok(result.get("value").cloned().unwrap_or(JsonValue::Null))
    }
}

#[async_trait]
impl AutomationTarget for ChromeTarget {
    async fn navigate(&self, url: &str) -> TargetResult<()> {
        debug!("导航到: {}", url);
        self.executor
            .page()
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> TargetResult<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }

    async fn locate_all(&self, locator: &Locator) -> TargetResult<Vec<ElementHandle>> {
        self.query(None, locator).await
    }

    async fn locate_all_within(
        &self,
        scope: &ElementHandle,
        locator: &Locator,
    ) -> TargetResult<Vec<ElementHandle>> {
        self.query(Some(scope), locator).await
    }

    async fn parent(&self, element: &ElementHandle) -> TargetResult<Option<ElementHandle>> {
        let value = self
            .on_element(
                element,
                JsonValue::Null,
                "const p = el.parentElement; return { stale: false, value: p ? __ja.stamp(p) : null };",
            )
            .await?;
        Ok(value.as_str().map(ElementHandle::new))
    }

    async fn click(&self, element: &ElementHandle) -> TargetResult<()> {
        // <option> 无法通过鼠标事件选中，直接设置所属下拉框的值
        let selected = self
            .on_element(
                element,
                JsonValue::Null,
                r#"
                if (el.tagName.toLowerCase() !== 'option') return { stale: false, value: false };
                const select = el.closest('select');
                if (select) {
                    select.value = el.value;
                    select.dispatchEvent(new Event('input', { bubbles: true }));
                    select.dispatchEvent(new Event('change', { bubbles: true }));
                } else {
                    el.selected = true;
                }
                return { stale: false, value: true };
                "#,
            )
            .await?;

        if selected.as_bool().unwrap_or(false) {
            return Ok(());
        }

        let native = self
            .executor
            .page()
            .find_element(Self::handle_selector(element))
            .await?;
        native.click().await?;
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> TargetResult<()> {
        self.on_element(
            element,
            JsonValue::Null,
            r#"
            if ('value' in el) {
                el.value = '';
                el.dispatchEvent(new Event('input', { bubbles: true }));
            }
            return { stale: false, value: true };
            "#,
        )
        .await?;

        let native = self
            .executor
            .page()
            .find_element(Self::handle_selector(element))
            .await?;
        native.click().await?;
        native.type_str(text).await?;
        Ok(())
    }

    async fn read_attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> TargetResult<Option<String>> {
        let value = self
            .on_element(
                element,
                json!(name),
                "return { stale: false, value: el.getAttribute(args.extra) };",
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn read_text(&self, element: &ElementHandle) -> TargetResult<String> {
        let value = self
            .on_element(
                element,
                JsonValue::Null,
                "return { stale: false, value: (el.innerText || el.textContent || '') };",
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn is_enabled(&self, element: &ElementHandle) -> TargetResult<bool> {
        let value = self
            .on_element(
                element,
                JsonValue::Null,
                "return { stale: false, value: !el.disabled && el.getAttribute('aria-disabled') !== 'true' };",
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn pace(&self, window: PaceWindow) {
        let delay = self.pacing.sample(window);
        if !delay.is_zero() {
            debug!("停顿 {}ms", delay.as_millis());
            sleep(delay).await;
        }
    }
}
