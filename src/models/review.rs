//! 教师复核
//!
//! 教师逐题确认或修改分数。分数留空时沿用 AI 分，每个有变化的作答生成一条变更记录。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 教师对一道题的复核输入
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnswerReview {
    pub question_id: String,
    /// 为空时沿用 AI 分
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl AnswerReview {
    pub fn new(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            ..Self::default()
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

/// 单个作答的复核变更
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewChange {
    pub question_id: String,
    /// 之前的教师分，没有时为 AI 分
    pub old_score: Option<f64>,
    pub new_score: f64,
    pub old_feedback: Option<String>,
    pub new_feedback: Option<String>,
}

/// 一次复核的审计记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub timestamp: DateTime<Utc>,
    pub submission_id: String,
    pub reviewer: String,
    pub changes: Vec<ReviewChange>,
}

impl ReviewRecord {
    pub fn new(submission_id: impl Into<String>, reviewer: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            submission_id: submission_id.into(),
            reviewer: reviewer.into(),
            changes: Vec::new(),
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}
