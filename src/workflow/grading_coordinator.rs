//! 答卷评分流程 - 流程层
//!
//! 核心职责：定义"一份答卷"的完整评分流程
//!
//! 流程顺序：
//! 1. 按题目ID把答案与试卷题目配对，构建批量评分请求（找不到题目的答案不参与评分）
//! 2. 整份答卷只调用一次 `GradingClient`
//! 3. 按位置把结果写回对应答案（只覆盖 AI 字段，教师字段不动）
//! 4. 重新计算总分、更新状态，交给存储持久化
//!
//! 首次评分和教师触发的重新评分走同一条路径，只是日志上下文中的 `action` 不同。
//! 教师复核（`review_submission`）只改教师字段，并把变更写入审计记录。

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::exam::{Answer, Exam, Submission, SubmissionStatus};
use crate::models::grading::{GradeRequestItem, GradeResult};
use crate::models::review::{AnswerReview, ReviewRecord};
use crate::services::score_normalizer::clamp_score;
use crate::services::{GradingClient, SubmissionStore};
use crate::utils::logging::truncate_text;
use crate::workflow::grading_ctx::{GradingCtx, GradingMode};

/// 构建好的批量请求，以及每个请求项对应的答案下标
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    pub items: Vec<GradeRequestItem>,
    pub answer_indices: Vec<usize>,
}

impl PreparedBatch {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 答卷评分协调器
///
/// - 不持有限流器，只持有共享的 `GradingClient`
/// - 不关心 LLM 调用细节（重试、解析都在 client 内部）
pub struct GradingCoordinator {
    client: Arc<GradingClient>,
    store: Arc<dyn SubmissionStore>,
}

impl GradingCoordinator {
    pub fn new(client: Arc<GradingClient>, store: Arc<dyn SubmissionStore>) -> Self {
        Self { client, store }
    }

    /// 按题目ID把答案与题目配对
    pub fn build_batch(exam: &Exam, answers: &[Answer]) -> PreparedBatch {
        let mut batch = PreparedBatch::default();

        for (index, answer) in answers.iter().enumerate() {
            let Some(question) = exam.question(&answer.question_id) else {
                warn!(
                    "⚠️ 答案引用的题目 {} 不在试卷 {} 中，跳过评分",
                    answer.question_id, exam.id
                );
                continue;
            };

            batch.items.push(GradeRequestItem {
                question_text: question.text.clone(),
                student_answer: answer.answer_text.clone(),
                max_score: question.max_score,
                answer_key: question.answer_key.clone(),
                grading_criteria: question.grading_criteria.clone(),
                rubric: question.rubric.clone(),
            });
            batch.answer_indices.push(index);
        }

        batch
    }

    /// 对一份答卷评分并持久化
    pub async fn grade_submission(
        &self,
        exam: &Exam,
        mut submission: Submission,
        mode: GradingMode,
    ) -> Result<Submission> {
        let ctx = GradingCtx::new(exam, &submission, mode);
        info!("{} 📝 开始评分，共 {} 个作答", ctx, submission.answers.len());

        let batch = Self::build_batch(exam, &submission.answers);
        let mut total = 0.0;

        if batch.is_empty() {
            warn!("{} ⚠️ 没有可评分的作答", ctx);
        } else {
            for (item, &index) in batch.items.iter().zip(&batch.answer_indices) {
                info!(
                    "{} 题目 {}: {}",
                    ctx,
                    submission.answers[index].question_id,
                    truncate_text(&item.question_text, 40)
                );
            }

            let results = self
                .client
                .grade_batch(&batch.items, &ctx.log_context())
                .await
                .with_context(|| format!("{} 批量评分请求无效", ctx))?;

            total = merge_results(&mut submission.answers, &batch.answer_indices, results);
        }

        // 只统计本次评分的题目，未配对的旧分数不计入
        submission.total_score = Some(total);
        submission.status = SubmissionStatus::Graded;

        let failed = submission.failed_answer_count();
        if failed > 0 {
            warn!("{} ⚠️ {} 个作答评分失败，等待教师复核", ctx, failed);
        }

        self.store
            .save_grading(&submission)
            .await
            .with_context(|| format!("{} 保存评分结果失败", ctx))?;

        info!(
            "{} ✓ 评分完成，AI 总分 {}/{}",
            ctx,
            total,
            exam.max_total()
        );

        Ok(submission)
    }

    /// 教师复核一份答卷并持久化
    ///
    /// 教师给出的分数截断到对应题目的满分；有变更时追加一条审计记录。
    pub async fn review_submission(
        &self,
        exam: &Exam,
        mut submission: Submission,
        reviewer: &str,
        reviews: &[AnswerReview],
    ) -> Result<(Submission, ReviewRecord)> {
        let reviews: Vec<AnswerReview> = reviews
            .iter()
            .cloned()
            .map(|mut review| {
                if let (Some(score), Some(question)) =
                    (review.score, exam.question(&review.question_id))
                {
                    review.score = Some(clamp_score(score, question.max_score));
                }
                review
            })
            .collect();

        let record = submission.apply_teacher_review(reviewer, &reviews);

        self.store
            .save_grading(&submission)
            .await
            .with_context(|| format!("[答卷 {}] 保存复核结果失败", submission.id))?;

        if record.has_changes() {
            self.store
                .record_review(&record)
                .await
                .with_context(|| format!("[答卷 {}] 写入复核审计失败", submission.id))?;
        }

        info!(
            "[答卷 {}] ✓ 教师 {} 复核完成，{} 处修改，教师总分 {}/{}",
            submission.id,
            reviewer,
            record.changes.len(),
            submission.teacher_total_score.unwrap_or_default(),
            exam.max_total()
        );

        Ok((submission, record))
    }

    /// 在后台启动评分，立即返回任务句柄
    pub fn dispatch(
        self: &Arc<Self>,
        exam: Exam,
        submission: Submission,
        mode: GradingMode,
    ) -> JoinHandle<Result<Submission>> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.grade_submission(&exam, submission, mode).await })
    }
}

/// 把按位置对应的评分结果写回答案，返回写回分数之和
pub fn merge_results(
    answers: &mut [Answer],
    answer_indices: &[usize],
    results: Vec<GradeResult>,
) -> f64 {
    let mut total = 0.0;
    for (&index, result) in answer_indices.iter().zip(results) {
        if let Some(answer) = answers.get_mut(index) {
            total += result.score;
            answer.apply_grade(result);
        }
    }
    total
}
