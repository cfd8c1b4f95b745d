//! 基础设施层
//!
//! 持有稀缺资源（Page），只暴露能力，不认识职位和表单

pub mod chrome_target;
pub mod js_executor;
pub mod target;

pub use chrome_target::{ChromeTarget, Pacing};
pub use js_executor::JsExecutor;
pub use target::{
    css_attr_value, describe_locators, locate_first, AutomationTarget, ElementHandle, Locator,
    PaceWindow,
};
