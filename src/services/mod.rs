pub mod answer;
pub mod job_filter;
pub mod llm_service;
pub mod option_resolver;
pub mod report_writer;

pub use answer::{generate_with_budget, AnswerBudget, AnswerGenerator, AnswerRequest};
pub use job_filter::{AcceptAll, JobFilter};
pub use llm_service::{LlmAnswerGenerator, LlmJobFilter, LlmService};
pub use option_resolver::resolve;
pub use report_writer::ReportWriter;
