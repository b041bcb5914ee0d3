//! 试卷 / 答卷记录
//!
//! 这些记录由外部持久层所有，评分引擎只读取题目定义，并回写答案上的 AI 字段。

use serde::{Deserialize, Serialize};

use crate::models::grading::{GradeResult, RubricLevel};
use crate::models::review::{AnswerReview, ReviewChange, ReviewRecord};

fn default_max_score() -> f64 {
    10.0
}

/// 试卷中的一道题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamQuestion {
    /// 题目ID（如 "q1"）
    pub id: String,
    pub text: String,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default)]
    pub answer_key: Option<String>,
    #[serde(default)]
    pub grading_criteria: Option<String>,
    #[serde(default)]
    pub rubric: Vec<RubricLevel>,
}

/// 试卷定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub title: String,
    pub questions: Vec<ExamQuestion>,
}

impl Exam {
    pub fn question(&self, question_id: &str) -> Option<&ExamQuestion> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn max_total(&self) -> f64 {
        self.questions.iter().map(|q| q.max_score).sum()
    }
}

/// 学生对一道题的作答，以及 AI / 教师的评分字段
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub answer_text: String,
    // --- AI 字段（重新评分时覆盖） ---
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub strengths: Option<String>,
    #[serde(default)]
    pub improvements: Option<String>,
    // --- 教师字段（评分引擎永不修改） ---
    #[serde(default)]
    pub teacher_score: Option<f64>,
    #[serde(default)]
    pub teacher_feedback: Option<String>,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, answer_text: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer_text: answer_text.into(),
            ..Self::default()
        }
    }

    /// 用 AI 评分结果覆盖 AI 字段，教师字段保持不变
    pub fn apply_grade(&mut self, result: GradeResult) {
        self.score = Some(result.score);
        self.justification = result.justification;
        self.feedback = Some(result.feedback);
        self.strengths = result.strengths;
        self.improvements = result.improvements;
    }

    /// 教师分优先，否则取 AI 分
    pub fn effective_score(&self) -> Option<f64> {
        self.teacher_score.or(self.score)
    }

    pub fn is_grading_failed(&self) -> bool {
        self.score == Some(0.0)
            && self.feedback.as_deref() == Some(crate::models::grading::FALLBACK_FEEDBACK)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Submitted,
    Graded,
    Reviewed,
}

/// 一份答卷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub exam_id: String,
    pub student_username: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    /// 本次 AI 评分的总分
    #[serde(default)]
    pub total_score: Option<f64>,
    /// 教师复核后的总分
    #[serde(default)]
    pub teacher_total_score: Option<f64>,
    #[serde(default)]
    pub status: SubmissionStatus,
}

impl Submission {
    /// 教师复核后的总分（教师分优先）
    pub fn effective_total(&self) -> f64 {
        self.answers.iter().filter_map(Answer::effective_score).sum()
    }

    pub fn failed_answer_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_grading_failed()).count()
    }

    /// 应用教师复核
    ///
    /// 每个作答都会得到教师分：复核里给了分数就用它，否则沿用 AI 分（没有 AI 分记 0）。
    /// 没有对应复核输入的作答按"分数和评语都留空"处理。完成后计算教师总分并标记为已复核。
    pub fn apply_teacher_review(
        &mut self,
        reviewer: &str,
        reviews: &[AnswerReview],
    ) -> ReviewRecord {
        let mut record = ReviewRecord::new(&self.id, reviewer);

        for answer in &mut self.answers {
            let review = reviews.iter().find(|r| r.question_id == answer.question_id);

            let new_score = review
                .and_then(|r| r.score)
                .or(answer.score)
                .unwrap_or(0.0);
            let new_feedback = review
                .and_then(|r| r.feedback.as_deref())
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string);

            if answer.teacher_score != Some(new_score) || answer.teacher_feedback != new_feedback {
                record.changes.push(ReviewChange {
                    question_id: answer.question_id.clone(),
                    old_score: answer.effective_score(),
                    new_score,
                    old_feedback: answer.teacher_feedback.clone(),
                    new_feedback: new_feedback.clone(),
                });
            }

            answer.teacher_score = Some(new_score);
            answer.teacher_feedback = new_feedback;
        }

        self.teacher_total_score = Some(self.effective_total());
        self.status = SubmissionStatus::Reviewed;

        record
    }
}
