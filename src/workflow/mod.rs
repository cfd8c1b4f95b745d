pub mod apply_flow;
pub mod auth_flow;
pub mod engine;
pub mod form_reader;
pub mod job_flow;
pub mod search_flow;

pub use apply_flow::ApplyFlow;
pub use auth_flow::AuthFlow;
pub use engine::{Workflow, END};
pub use job_flow::JobFlow;
pub use search_flow::{SearchFlow, SearchOutcome};
