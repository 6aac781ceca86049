//! 从 LLM 文本中提取 JSON 对象
//!
//! 依次尝试 ```json ... ``` 代码块、无语言标注的 ``` 代码块、首个 '{' 到末个 '}' 之间的内容。

use serde_json::Value;

/// 提取并解析 JSON；找不到或解析失败返回错误消息（作为一次失败尝试的诊断）
pub fn extract_json(output: &str) -> Result<Value, String> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err("model output is empty".to_string());
    }

    let json_str = fenced_block(trimmed, "```json")
        .or_else(|| fenced_block(trimmed, "```"))
        .or_else(|| {
            let start = trimmed.find('{')?;
            let end = trimmed.rfind('}')?;
            (end > start).then(|| &trimmed[start..=end])
        })
        .ok_or_else(|| format!("no JSON object found in model output: {}", preview(trimmed)))?;

    serde_json::from_str(json_str).map_err(|e| format!("JSON parse error: {}: {}", e, preview(json_str)))
}

fn fenced_block<'a>(text: &'a str, fence: &str) -> Option<&'a str> {
    let start = text.find(fence)?;
    let rest = &text[start + fence.len()..];
    let end = rest.find("```")?;
    let block = rest[..end].trim();
    block.starts_with('{').then_some(block)
}

fn preview(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(extract_json(r#" {"a": 1} "#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_json_block() {
        let text = "Here is the plan:\n```json\n{\"a\": {\"b\": 2}}\n```\nGood luck!";
        assert_eq!(extract_json(text).unwrap(), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_bare_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_embedded_in_prose() {
        let text = "Sure! {\"a\": [1, 2]} Hope this helps.";
        assert_eq!(extract_json(text).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_no_json() {
        let err = extract_json("I cannot help with that.").unwrap_err();
        assert!(err.starts_with("no JSON object found"));
        assert!(extract_json("   ").is_err());
    }

    #[test]
    fn test_broken_json() {
        let err = extract_json("{\"a\": }").unwrap_err();
        assert!(err.starts_with("JSON parse error"));
    }

    #[test]
    fn test_long_output_is_truncated_in_error() {
        let text = format!("{{\"a\": \"{}\"", "x".repeat(500));
        let err = extract_json(&text).unwrap_err();
        assert!(err.len() < 400);
    }
}
