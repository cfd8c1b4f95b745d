use serde::{Deserialize, Serialize};

/// 登录结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub authenticated: bool,
    pub error: Option<String>,
}

impl AuthResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            error: Some(error.into()),
        }
    }
}
