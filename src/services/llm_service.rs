//! LLM 服务 - 业务能力层
//!
//! 只负责"LLM 回答"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Qwen, Doubao 等）

use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::models::{JobResult, Profile};
use crate::services::answer::{clean_answer, AnswerGenerator, AnswerRequest};
use crate::services::job_filter::{parse_decision, JobFilter};

/// 过滤职位时最多使用的描述字符数
const FILTER_DESCRIPTION_CHARS: usize = 2000;

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API
/// - 提供通用的 LLM 调用接口
/// - 不认识页面和表单元素
/// - 不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn api_error(&self, source: OpenAIError) -> LlmError {
        LlmError::ApiCallFailed {
            model: self.model_name.clone(),
            source,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 其他所有 LLM 相关功能都基于此函数。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（去掉首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| self.api_error(e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| self.api_error(e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(512u32)
            .build()
            .map_err(|e| self.api_error(e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.api_error(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

fn join(items: &[String]) -> String {
    items.join(", ")
}

/// 构建表单问题的提示词
pub fn build_answer_prompt(request: &AnswerRequest<'_>) -> String {
    let profile = request.profile;
    let options = if request.options.is_empty() {
        "None".to_string()
    } else {
        join(request.options)
    };

    format!(
        r#"You are an AI assistant helping to fill out a job application form.

Candidate Profile:
- Skills: {skills}
- Experience Years: {years}
- Previous Roles: {roles}
- Education: {education}
- Certifications: {certifications}
- Technologies: {technologies}
- Key Achievements: {achievements}

Form Question: {question}
Question Type: {kind}
Available Options: {options}
Expected Monthly Salary: ${salary}

Instructions:
1. If it's a salary question, use the expected monthly salary: ${salary}
2. If it's about experience, use the experience years: {years}
3. For skills/technology questions, reference the relevant skills and technologies
4. For education questions, use the education information
5. For multiple choice, select the most appropriate option from the available choices
6. For text fields, provide a concise, professional answer (max 200 characters)
7. For yes/no questions, answer based on the candidate's profile

Provide ONLY the answer value, nothing else. For multiple choice, provide the exact option text.

Question: {question}"#,
        skills = join(&profile.skills),
        years = profile.experience_years,
        roles = join(&profile.previous_roles),
        education = join(&profile.education),
        certifications = join(&profile.certifications),
        technologies = join(&profile.technologies),
        achievements = join(&profile.key_achievements),
        question = request.question,
        kind = request.kind,
        options = options,
        salary = request.monthly_compensation,
    )
}

/// 构建职位过滤的提示词，描述只取前 2000 个字符
pub fn build_filter_prompt(profile: &Profile, job: &JobResult) -> String {
    let description: String = job
        .description
        .chars()
        .take(FILTER_DESCRIPTION_CHARS)
        .collect();

    format!(
        r#"Analyze if this job description aligns with the candidate's CV profile.

Candidate Profile:
- Skills: {skills}
- Experience Years: {years}
- Previous Roles: {roles}
- Technologies: {technologies}
- Domains: {domains}

Job Description:
{description}

Respond with ONLY "YES" if the job aligns well with the candidate's profile, or "NO" if it doesn't.
Consider:
1. Skill overlap (at least 30% match)
2. Experience level appropriateness
3. Technology stack compatibility
4. Domain/industry relevance"#,
        skills = join(&profile.skills),
        years = profile.experience_years,
        roles = join(&profile.previous_roles),
        technologies = join(&profile.technologies),
        domains = join(&profile.domains),
        description = description,
    )
}

/// 基于 LLM 的表单答案生成器
pub struct LlmAnswerGenerator {
    service: Arc<LlmService>,
}

impl LlmAnswerGenerator {
    pub fn new(service: Arc<LlmService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, request: &AnswerRequest<'_>) -> Result<String, LlmError> {
        let prompt = build_answer_prompt(request);
        let response = self.service.send_to_llm(&prompt, None).await?;
        Ok(clean_answer(&response))
    }
}

/// 基于 LLM 的职位过滤器
pub struct LlmJobFilter {
    service: Arc<LlmService>,
}

impl LlmJobFilter {
    pub fn new(service: Arc<LlmService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobFilter for LlmJobFilter {
    async fn matches(&self, profile: &Profile, job: &JobResult) -> Result<bool, LlmError> {
        let prompt = build_filter_prompt(profile, job);
        let response = self.service.send_to_llm(&prompt, None).await?;
        let decision = parse_decision(&clean_answer(&response));
        debug!("职位 {} 过滤结果: {}", job.job_id, decision);
        Ok(decision)
    }
}
