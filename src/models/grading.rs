//! 评分请求 / 结果类型
//!
//! 模型返回的松散 JSON 只在边界处（`GradeResult::from_model_object`）校验一次，
//! 下游代码只操作这里的强类型。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineResult, GradingError};
use crate::models::attempt_log::LogContext;
use crate::services::score_normalizer::normalize_score;

/// 兜底结果的反馈文本
pub const FALLBACK_FEEDBACK: &str = "grading failed";

/// 评分细则中的一个档位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricLevel {
    #[serde(default)]
    pub score: f64,
    /// 档位名称（如 "优秀"），兼容旧数据中的 `level` 字段
    #[serde(default, alias = "level")]
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// 单道题的评分请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRequestItem {
    pub question_text: String,
    pub student_answer: String,
    pub max_score: f64,
    #[serde(default)]
    pub answer_key: Option<String>,
    /// 通用评分要点（自由文本）
    #[serde(default)]
    pub grading_criteria: Option<String>,
    #[serde(default)]
    pub rubric: Vec<RubricLevel>,
}

impl GradeRequestItem {
    pub fn new(
        question_text: impl Into<String>,
        student_answer: impl Into<String>,
        max_score: f64,
    ) -> Self {
        Self {
            question_text: question_text.into(),
            student_answer: student_answer.into(),
            max_score,
            answer_key: None,
            grading_criteria: None,
            rubric: Vec::new(),
        }
    }

    pub fn with_answer_key(mut self, answer_key: impl Into<String>) -> Self {
        self.answer_key = Some(answer_key.into());
        self
    }

    pub fn with_grading_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.grading_criteria = Some(criteria.into());
        self
    }

    pub fn with_rubric(mut self, rubric: Vec<RubricLevel>) -> Self {
        self.rubric = rubric;
        self
    }
}

/// 单道题的评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    pub score: f64,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub strengths: Option<String>,
    #[serde(default)]
    pub improvements: Option<String>,
}

impl GradeResult {
    /// 评分失败时的兜底结果：0 分 + 明确的失败说明
    pub fn fallback() -> Self {
        Self {
            score: 0.0,
            justification: None,
            feedback: FALLBACK_FEEDBACK.to_string(),
            strengths: None,
            improvements: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.score == 0.0 && self.feedback == FALLBACK_FEEDBACK
    }

    /// 把模型返回的单个 JSON 对象转换为评分结果
    ///
    /// 分数按 `max_score` 截断；缺失的 feedback 为空串，其余可选字段为 `None`。
    pub fn from_model_object(object: &Map<String, Value>, max_score: f64) -> Self {
        Self {
            score: normalize_score(object.get("score"), max_score),
            justification: text_field(object, "justification"),
            feedback: text_field(object, "feedback").unwrap_or_default(),
            strengths: text_field(object, "strengths"),
            improvements: text_field(object, "improvements"),
        }
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(parts) => {
            // 模型偶尔把要点列表直接返回成数组
            let joined = parts
                .iter()
                .map(|p| p.as_str().map(str::to_string).unwrap_or_else(|| p.to_string()))
                .collect::<Vec<_>>()
                .join("\n");
            (!joined.trim().is_empty()).then_some(joined)
        }
        other => Some(other.to_string()),
    }
}

/// 一次批量评分调用：同一份答卷的所有题目
#[derive(Debug, Clone)]
pub struct BatchGradingCall {
    items: Vec<GradeRequestItem>,
    pub context: LogContext,
}

impl BatchGradingCall {
    pub fn new(items: Vec<GradeRequestItem>, context: LogContext) -> EngineResult<Self> {
        if items.is_empty() {
            return Err(GradingError::InvalidInput(
                "批量评分请求中没有任何题目".to_string(),
            ));
        }
        Ok(Self { items, context })
    }

    pub fn items(&self) -> &[GradeRequestItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
