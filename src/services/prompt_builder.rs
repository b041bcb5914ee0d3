//! 批量评分提示词构建
//!
//! 纯函数：同一份答卷的所有题目拼成一个提示词，一次调用完成评分。

use std::fmt::Write;

use crate::error::{EngineResult, GradingError};
use crate::models::grading::{GradeRequestItem, RubricLevel};

/// 系统消息
pub const GRADER_SYSTEM_PROMPT: &str = "你是一名严谨、公正的阅卷专家，负责批改主观题（开放式问答）。\
    你必须严格依据参考答案、评分要点和评分细则给分，并且只按要求的 JSON 格式输出结果。";

/// 未提供参考答案时的评分说明
pub const NO_ANSWER_KEY_INSTRUCTION: &str =
    "未提供（请依据学科知识判断作答内容是否正确，按内容的准确性给分）";

/// 每道题要求模型输出的字段
pub const OUTPUT_FIELDS: [&str; 5] = ["score", "justification", "feedback", "strengths", "improvements"];

/// 构建批量评分提示词
///
/// 题号从 1 开始，与请求顺序一致。空列表属于调用方错误，返回 `InvalidInput`。
pub fn build_batch_prompt(items: &[GradeRequestItem]) -> EngineResult<String> {
    if items.is_empty() {
        return Err(GradingError::InvalidInput(
            "没有需要评分的题目".to_string(),
        ));
    }

    let mut prompt = String::new();
    prompt.push_str("请逐题评估下列学生作答。\n\n");

    for (index, item) in items.iter().enumerate() {
        push_question(&mut prompt, index + 1, item);
    }

    push_instructions(&mut prompt, items);

    Ok(prompt)
}

fn push_question(prompt: &mut String, number: usize, item: &GradeRequestItem) {
    let _ = writeln!(prompt, "### 第 {} 题", number);
    let _ = writeln!(prompt, "- 题目：{}", item.question_text.trim());
    let _ = writeln!(prompt, "- 满分：{}", item.max_score);

    match item.answer_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            let _ = writeln!(prompt, "- 参考答案：{}", key);
        }
        None => {
            let _ = writeln!(prompt, "- 参考答案：{}", NO_ANSWER_KEY_INSTRUCTION);
        }
    }

    if let Some(criteria) = item
        .grading_criteria
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        let _ = writeln!(prompt, "- 评分要点：{}", criteria);
    }

    if !item.rubric.is_empty() {
        prompt.push_str("- 评分细则（Rubric，请严格按档位给分）：\n");
        for level in &item.rubric {
            let _ = writeln!(prompt, "  {}", format_rubric_level(level));
        }
    }

    prompt.push_str("- 学生作答：\n");
    let _ = writeln!(prompt, "{}\n", item.student_answer.trim());
}

/// 评分细则的一行，原样嵌入
pub fn format_rubric_level(level: &RubricLevel) -> String {
    format!("- {} 分（{}）：{}", level.score, level.label, level.description)
}

fn push_instructions(prompt: &mut String, items: &[GradeRequestItem]) {
    let ranges = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("第 {} 题 0~{}", i + 1, item.max_score))
        .collect::<Vec<_>>()
        .join("，");

    let _ = write!(
        prompt,
        r#"【评分要求】
1. 每题得分必须在 0 到该题满分之间（含边界）：{ranges}。
2. 每题输出以下字段：
   - "score": 数字，该题得分
   - "justification": 逐项说明得分与扣分理由（如有评分细则，指出落在哪一档）
   - "feedback": 对作答的整体评价
   - "strengths": 作答中正确或出彩的地方
   - "improvements": 缺失或需要改进的地方
3. 只返回一个 JSON 数组，共 {count} 个元素，数组顺序与题号顺序一一对应（第 1 个元素对应第 1 题），不要输出任何其他内容。

示例格式：
[
  {{"score": 0, "justification": "", "feedback": "", "strengths": "", "improvements": ""}}
]
"#,
        ranges = ranges,
        count = items.len()
    );
}
