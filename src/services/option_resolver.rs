//! 选项匹配 - 业务能力层
//!
//! 把一段自由文本答案映射到表单给出的固定选项上。纯函数，不做任何 I/O。
//!
//! 匹配顺序：
//! 1. 忽略大小写完全相等
//! 2. 忽略大小写互相包含（答案包含选项，或选项包含答案），取列表中第一个
//! 3. 都不满足时取第一个选项
//! 4. 没有选项时返回空字符串
//!
//! 同等条件下总是靠前的选项胜出。

/// 返回匹配到的选项序号，没有选项时返回 None
pub fn resolve_index(answer: &str, options: &[String]) -> Option<usize> {
    if options.is_empty() {
        return None;
    }

    let answer_lower = answer.to_lowercase();

    if let Some(i) = options
        .iter()
        .position(|option| option.to_lowercase() == answer_lower)
    {
        return Some(i);
    }

    if let Some(i) = options.iter().position(|option| {
        let option_lower = option.to_lowercase();
        answer_lower.contains(&option_lower) || option_lower.contains(&answer_lower)
    }) {
        return Some(i);
    }

    Some(0)
}

/// 返回匹配到的选项文本，没有选项时返回空字符串
pub fn resolve(answer: &str, options: &[String]) -> String {
    resolve_index(answer, options)
        .and_then(|i| options.get(i))
        .cloned()
        .unwrap_or_default()
}
