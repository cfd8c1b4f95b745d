pub mod auth;
pub mod form;
pub mod job;
pub mod loaders;
pub mod profile;

pub use auth::AuthResult;
pub use form::{FormQuestion, QuestionKind};
pub use job::{ApplicationRequest, ApplicationResult, JobResult, JobSearchRequest};
pub use loaders::{load_profile, load_run_plan, load_selectors, RunPlan};
pub use profile::Profile;
