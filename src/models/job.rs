use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

fn default_easy_apply_only() -> bool {
    true
}

/// 一次职位搜索请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSearchRequest {
    /// 职位名称关键词
    pub title: String,
    /// 地点
    pub location: String,
    /// 期望月薪
    pub monthly_compensation: u32,
    /// 最多收集多少个职位
    pub limit: usize,
    /// 是否只搜索可快速申请的职位
    #[serde(default = "default_easy_apply_only")]
    pub easy_apply_only: bool,
}

impl JobSearchRequest {
    pub fn new(
        title: impl Into<String>,
        location: impl Into<String>,
        monthly_compensation: u32,
        limit: usize,
    ) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
            monthly_compensation,
            limit,
            easy_apply_only: true,
        }
    }
}

impl fmt::Display for JobSearchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' @ '{}' (上限 {})",
            self.title, self.location, self.limit
        )
    }
}

/// 搜索得到的职位
///
/// 同一职位可能在不同搜索中重复出现，是否去重由调用方决定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    /// 列表中的描述摘要
    pub description: String,
}

/// 单个职位的申请请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub job_id: String,
    pub monthly_compensation: u32,
}

/// 单个职位的申请结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationResult {
    pub job_id: String,
    pub success: bool,
    pub error: Option<String>,
    /// 提示性信息，例如提交后未等到确认
    pub warning: Option<String>,
    /// 问题 -> 实际填写的答案
    pub answers: BTreeMap<String, String>,
    /// 最后完成的步骤
    pub last_step: String,
}

impl ApplicationResult {
    /// 整个申请未能执行时的失败记录
    pub fn failed(job_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            success: false,
            error: Some(error.into()),
            warning: None,
            answers: BTreeMap::new(),
            last_step: "not_started".to_string(),
        }
    }
}
