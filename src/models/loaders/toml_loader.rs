use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::config::SiteSelectors;
use crate::error::{AppResult, ConfigError, FileError};
use crate::models::job::JobSearchRequest;
use crate::models::profile::Profile;

/// 单次搜索允许的最大上限
pub const MAX_SEARCH_LIMIT: usize = 100;

/// 运行计划：一次运行要执行的全部搜索
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPlan {
    pub searches: Vec<JobSearchRequest>,
}

impl RunPlan {
    /// 检查运行计划是否合法
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.searches.is_empty() {
            return Err(ConfigError::InvalidPlan("至少需要一个搜索".to_string()));
        }
        for (i, search) in self.searches.iter().enumerate() {
            if search.monthly_compensation == 0 {
                return Err(ConfigError::InvalidPlan(format!(
                    "第 {} 个搜索的期望月薪必须大于 0",
                    i + 1
                )));
            }
            if search.limit == 0 || search.limit > MAX_SEARCH_LIMIT {
                return Err(ConfigError::InvalidPlan(format!(
                    "第 {} 个搜索的上限必须在 1 到 {} 之间，当前为 {}",
                    i + 1,
                    MAX_SEARCH_LIMIT,
                    search.limit
                )));
            }
        }
        Ok(())
    }
}

async fn read_file(path: &Path) -> Result<String, FileError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(FileError::NotFound { path: display });
    }
    fs::read_to_string(path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: display,
            source,
        })
}

/// 从 TOML 文件加载并校验运行计划
pub async fn load_run_plan(path: &Path) -> AppResult<RunPlan> {
    let content = read_file(path).await?;
    let plan: RunPlan = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
        path: path.display().to_string(),
        source,
    })?;
    plan.validate()?;
    tracing::info!("成功加载运行计划: {} 个搜索", plan.searches.len());
    Ok(plan)
}

/// 从 JSON 文件加载候选人资料
pub async fn load_profile(path: &Path) -> AppResult<Profile> {
    let content = read_file(path).await?;
    let profile: Profile =
        serde_json::from_str(&content).map_err(|source| FileError::JsonParseFailed {
            path: path.display().to_string(),
            source,
        })?;
    tracing::info!(
        "成功加载候选人资料: {} 项技能, {} 年经验",
        profile.skills.len(),
        profile.experience_years
    );
    Ok(profile)
}

/// 从 TOML 文件加载页面选择器，未写出的部分使用默认值
pub async fn load_selectors(path: &Path) -> AppResult<SiteSelectors> {
    let content = read_file(path).await?;
    let selectors: SiteSelectors =
        toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
    selectors.validate()?;
    tracing::info!("成功加载选择器配置: {}", path.display());
    Ok(selectors)
}
