//! 模型响应解析
//!
//! 模型不保证只输出 JSON：常见情况是前后夹带说明文字，或者包在 Markdown 代码块里。
//! 解析按以下顺序逐层降级，每一层都是独立的纯函数：
//!
//! 1. ```` ```json ```` 代码块内部
//! 2. 任意代码块内部
//! 3. 整段文本
//!
//! 在选定的候选文本中，取第一个 `[` 到最后一个 `]` 之间的内容做 JSON 解码。
//! 解码失败时，再从每个 `[` 开始流式解码，取第一个能解出对象数组的位置。

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ExtractionError;

/// 从模型原始输出中提取结果对象数组
pub fn extract_result_array(text: &str) -> Result<Vec<Map<String, Value>>, ExtractionError> {
    let candidate = select_candidate(text);
    let literal = find_array_literal(candidate).ok_or(ExtractionError::NotFound)?;
    decode_array(literal).or_else(|err| first_decodable_array(candidate).ok_or(err))
}

/// 按优先级选出要扫描的文本
pub fn select_candidate(text: &str) -> &str {
    tagged_json_block(text)
        .or_else(|| any_fenced_block(text))
        .unwrap_or(text)
}

/// 第一个标注为 json 的代码块内部文本
pub fn tagged_json_block(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?si)```[ \t]*json[ \t]*\r?\n?(.*?)```").ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// 第一个代码块（任意标注或无标注）内部文本
pub fn any_fenced_block(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?s)```[A-Za-z0-9_+\-]*[ \t]*\r?\n?(.*?)```").ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// 贪婪匹配：第一个 `[` 到最后一个 `]`，可跨行
pub fn find_array_literal(candidate: &str) -> Option<&str> {
    let start = candidate.find('[')?;
    let end = candidate.rfind(']')?;
    (end > start).then(|| &candidate[start..=end])
}

/// 从每个 `[` 开始流式解码，忽略数组之后的多余文本
fn first_decodable_array(candidate: &str) -> Option<Vec<Map<String, Value>>> {
    candidate.match_indices('[').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&candidate[start..])
            .into_iter::<Vec<Map<String, Value>>>()
            .next()?
            .ok()
    })
}

/// 把数组字面量解码为对象列表
pub fn decode_array(literal: &str) -> Result<Vec<Map<String, Value>>, ExtractionError> {
    serde_json::from_str::<Vec<Map<String, Value>>>(literal).map_err(|e| {
        ExtractionError::ParseError {
            reason: e.to_string(),
        }
    })
}
