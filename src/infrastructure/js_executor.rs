//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{BrowserError, TargetResult};

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识职位 / 表单
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航、原生点击和输入）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// # 参数
    /// - `js_code`: 要执行的 JavaScript 代码
    pub async fn eval(&self, js_code: impl Into<String>) -> TargetResult<JsonValue> {
        let js_code = js_code.into();
        debug!("执行脚本，长度: {} 字符", js_code.len());
        let result = self.page.evaluate(js_code).await?;
        result
            .into_value()
            .map_err(|e| BrowserError::UnexpectedResponse(e.to_string()))
    }
}
