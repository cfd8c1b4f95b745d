//! 答案生成 - 业务能力层
//!
//! 定义表单答案生成能力的接口，并提供超时与重试包装。
//! 真实实现见 [`LlmAnswerGenerator`](crate::services::LlmAnswerGenerator)。

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::models::{Profile, QuestionKind};

/// 一次答案生成请求
#[derive(Debug, Clone, Copy)]
pub struct AnswerRequest<'a> {
    pub profile: &'a Profile,
    pub question: &'a str,
    pub kind: QuestionKind,
    /// 可选项，文本题为空
    pub options: &'a [String],
    pub monthly_compensation: u32,
}

/// 答案生成能力
///
/// 可能超时或返回无法使用的内容，调用方负责兜底
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, request: &AnswerRequest<'_>) -> Result<String, LlmError>;
}

/// 生成答案的时间与次数预算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerBudget {
    /// 单次调用的超时
    pub timeout: Duration,
    /// 最多尝试次数
    pub max_attempts: u32,
}

impl Default for AnswerBudget {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 2,
        }
    }
}

/// 清理模型输出：去掉推理块、首尾空白和成对引号
pub fn clean_answer(raw: &str) -> String {
    let without_think = match Regex::new(r"(?s)<think>.*?</think>") {
        Ok(re) => re.replace_all(raw, "").into_owned(),
        Err(_) => raw.to_string(),
    };
    let trimmed = without_think.trim();
    let unquoted = ['"', '\'', '`']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

/// 在预算内生成答案
///
/// 每次调用都有超时；失败、超时或清理后为空都会重试，直到用完次数
pub async fn generate_with_budget(
    generator: &dyn AnswerGenerator,
    request: &AnswerRequest<'_>,
    budget: AnswerBudget,
) -> Result<String, LlmError> {
    let attempts = budget.max_attempts.max(1);
    let mut last_error = LlmError::MalformedOutput("未尝试生成".to_string());

    for attempt in 1..=attempts {
        match timeout(budget.timeout, generator.generate(request)).await {
            Ok(Ok(raw)) => {
                let answer = clean_answer(&raw);
                if !answer.is_empty() {
                    debug!("第 {} 次尝试生成答案成功", attempt);
                    return Ok(answer);
                }
                last_error = LlmError::MalformedOutput(format!("答案为空: '{}'", raw));
            }
            Ok(Err(e)) => last_error = e,
            Err(_) => {
                last_error = LlmError::Timeout {
                    timeout_ms: budget.timeout.as_millis() as u64,
                }
            }
        }
        warn!(
            "生成答案失败 (第 {}/{} 次): {}",
            attempt, attempts, last_error
        );
    }

    Err(last_error)
}
