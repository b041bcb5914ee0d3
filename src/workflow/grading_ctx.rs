//! 评分上下文
//!
//! 封装"我正在给哪个学生的哪份答卷评分，是首次评分还是重新评分"这一信息

use std::fmt::Display;

use crate::models::attempt_log::LogContext;
use crate::models::exam::{Exam, Submission};

/// 评分触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradingMode {
    /// 提交后自动触发的首次评分
    #[default]
    Initial,
    /// 教师触发的重新评分
    Regrade,
}

impl GradingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradingMode::Initial => "initial",
            GradingMode::Regrade => "regrade",
        }
    }
}

/// 答卷评分上下文
#[derive(Debug, Clone)]
pub struct GradingCtx {
    pub submission_id: String,
    pub exam_id: String,
    pub exam_title: String,
    pub student: String,
    pub mode: GradingMode,
}

impl GradingCtx {
    pub fn new(exam: &Exam, submission: &Submission, mode: GradingMode) -> Self {
        Self {
            submission_id: submission.id.clone(),
            exam_id: exam.id.clone(),
            exam_title: exam.title.clone(),
            student: submission.student_username.clone(),
            mode,
        }
    }

    /// 写入交互日志的上下文
    pub fn log_context(&self) -> LogContext {
        let mut context = LogContext::new();
        context.insert("submission_id".to_string(), self.submission_id.clone());
        context.insert("exam_id".to_string(), self.exam_id.clone());
        if !self.exam_title.is_empty() {
            context.insert("exam".to_string(), self.exam_title.clone());
        }
        context.insert("student".to_string(), self.student.clone());
        context.insert("action".to_string(), self.mode.as_str().to_string());
        context
    }
}

impl Display for GradingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[答卷 #{} 学生 {} {}]",
            self.submission_id,
            self.student,
            self.mode.as_str()
        )
    }
}
