use std::fmt;

use serde::{Deserialize, Serialize};

use crate::infrastructure::ElementHandle;

/// 表单问题类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// 文本输入框
    FreeText,
    /// 下拉单选
    SingleSelect,
    /// 单选按钮组
    RadioGroup,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::FreeText => "text",
            QuestionKind::SingleSelect => "select",
            QuestionKind::RadioGroup => "radio",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 表单中发现的一个问题
///
/// - 文本框：`options` 与 `choices` 为空，`element` 是输入框
/// - 下拉框：`element` 是 select，`choices[i]` 是 `options[i]` 对应的 option
/// - 单选组：`element` 是第一个单选按钮，`choices[i]` 是 `options[i]` 对应的按钮
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormQuestion {
    pub prompt: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub element: ElementHandle,
    pub choices: Vec<ElementHandle>,
}

impl FormQuestion {
    pub fn free_text(prompt: impl Into<String>, element: ElementHandle) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::FreeText,
            options: Vec::new(),
            element,
            choices: Vec::new(),
        }
    }
}
