//! 表单读取 - 流程层辅助
//!
//! 从当前页面读出申请表单中的全部问题：文本框、下拉框、单选组。
//! 只读不写，同一表单读两次得到相同结果。

use tracing::debug;

use crate::config::ApplySelectors;
use crate::error::TargetResult;
use crate::infrastructure::{css_attr_value, AutomationTarget, ElementHandle, Locator};
use crate::models::{FormQuestion, QuestionKind};

async fn non_empty_attr(
    target: &dyn AutomationTarget,
    element: &ElementHandle,
    name: &str,
) -> Option<String> {
    target
        .read_attribute(element, name)
        .await
        .ok()
        .flatten()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn trimmed_text(target: &dyn AutomationTarget, element: &ElementHandle) -> Option<String> {
    target
        .read_text(element)
        .await
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// 通过 `label[for=id]` 查找关联的标签文本
async fn linked_label(target: &dyn AutomationTarget, element: &ElementHandle) -> Option<String> {
    let id = non_empty_attr(target, element, "id").await?;
    let locator = Locator::css(format!("label[for='{}']", css_attr_value(&id)));
    let label = target.locate(&locator).await.ok().flatten()?;
    trimmed_text(target, &label).await
}

/// 字段的可读标签
///
/// 依次尝试：关联的 label、父元素里的 label、placeholder、aria-label，都没有时返回空字符串
pub async fn field_label(
    target: &dyn AutomationTarget,
    selectors: &ApplySelectors,
    element: &ElementHandle,
) -> String {
    if let Some(text) = linked_label(target, element).await {
        return text;
    }

    if let Ok(Some(parent)) = target.parent(element).await {
        if let Ok(Some(label)) = target.locate_within(&parent, &selectors.label).await {
            if let Some(text) = trimmed_text(target, &label).await {
                return text;
            }
        }
    }

    if let Some(placeholder) = non_empty_attr(target, element, "placeholder").await {
        return placeholder;
    }

    non_empty_attr(target, element, "aria-label")
        .await
        .unwrap_or_default()
}

/// 单选按钮自身的选项文本
///
/// 依次尝试：关联的 label、父元素文本（不等于 value 时）、value 属性
pub async fn radio_label(target: &dyn AutomationTarget, radio: &ElementHandle) -> String {
    if let Some(text) = linked_label(target, radio).await {
        return text;
    }

    let value = non_empty_attr(target, radio, "value").await;

    if let Ok(Some(parent)) = target.parent(radio).await {
        if let Some(text) = trimmed_text(target, &parent).await {
            if Some(&text) != value.as_ref() {
                return text;
            }
        }
    }

    value.unwrap_or_default()
}

struct RadioGroup {
    name: String,
    question: FormQuestion,
}

/// 读取表单中的全部问题
///
/// 顺序：文本框、下拉框、单选组（按组名首次出现的顺序）。
/// 没有标签的文本框和下拉框会被跳过；单选组没有标签时使用 "Radio group: 组名"。
pub async fn analyze_form(
    target: &dyn AutomationTarget,
    selectors: &ApplySelectors,
) -> TargetResult<Vec<FormQuestion>> {
    let mut questions = Vec::new();

    // ========== 文本框 ==========
    for field in target.locate_all(&selectors.text_fields).await? {
        let label = field_label(target, selectors, &field).await;
        if label.is_empty() {
            debug!("跳过没有标签的文本框 {}", field);
            continue;
        }
        questions.push(FormQuestion::free_text(label, field));
    }

    // ========== 下拉框 ==========
    for select in target.locate_all(&selectors.select_fields).await? {
        let label = field_label(target, selectors, &select).await;
        let mut options = Vec::new();
        let mut choices = Vec::new();
        for option in target
            .locate_all_within(&select, &selectors.select_option)
            .await?
        {
            if let Some(text) = trimmed_text(target, &option).await {
                options.push(text);
                choices.push(option);
            }
        }
        if label.is_empty() {
            debug!("跳过没有标签的下拉框 {}", select);
            continue;
        }
        questions.push(FormQuestion {
            prompt: label,
            kind: QuestionKind::SingleSelect,
            options,
            element: select,
            choices,
        });
    }

    // ========== 单选组 ==========
    let mut groups: Vec<RadioGroup> = Vec::new();
    for radio in target.locate_all(&selectors.radio_buttons).await? {
        let name = target
            .read_attribute(&radio, "name")
            .await?
            .unwrap_or_default();

        let index = match groups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                let label = field_label(target, selectors, &radio).await;
                let prompt = if label.is_empty() {
                    format!("Radio group: {}", name)
                } else {
                    label
                };
                groups.push(RadioGroup {
                    name: name.clone(),
                    question: FormQuestion {
                        prompt,
                        kind: QuestionKind::RadioGroup,
                        options: Vec::new(),
                        element: radio.clone(),
                        choices: Vec::new(),
                    },
                });
                groups.len() - 1
            }
        };

        let option = radio_label(target, &radio).await;
        if !option.is_empty() {
            let question = &mut groups[index].question;
            question.options.push(option);
            question.choices.push(radio);
        }
    }
    questions.extend(groups.into_iter().map(|g| g.question));

    Ok(questions)
}
