//! 职位过滤 - 业务能力层
//!
//! 判断一个职位是否值得申请。真实实现见
//! [`LlmJobFilter`](crate::services::LlmJobFilter)。

use async_trait::async_trait;

use crate::error::LlmError;
use crate::models::{JobResult, Profile};

/// 职位过滤能力
#[async_trait]
pub trait JobFilter: Send + Sync {
    /// 返回 true 表示保留该职位
    async fn matches(&self, profile: &Profile, job: &JobResult) -> Result<bool, LlmError>;
}

/// 保留所有职位
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl JobFilter for AcceptAll {
    async fn matches(&self, _profile: &Profile, _job: &JobResult) -> Result<bool, LlmError> {
        Ok(true)
    }
}

/// 解析 YES / NO 判断，只要回答里出现 YES 即视为保留
pub fn parse_decision(response: &str) -> bool {
    response.to_uppercase().contains("YES")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision() {
        assert!(parse_decision("YES"));
        assert!(parse_decision("  yes, strong match"));
        assert!(!parse_decision("NO"));
        assert!(!parse_decision(""));
    }

    #[test]
    fn test_accept_all() {
        let job = JobResult {
            job_id: "1".to_string(),
            description: "anything".to_string(),
        };
        let kept = tokio_test::block_on(AcceptAll.matches(&Profile::default(), &job));
        assert!(tokio_test::assert_ok!(kept));
    }
}
