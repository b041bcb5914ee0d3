//! # Exam Grading
//!
//! 一个用生成式 AI 批改主观题的评分引擎
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个能力都可以单独测试
//! - `prompt_builder` - 把一批题目拼成一个严格格式的提示词（纯函数）
//! - `response_extractor` - 从不可靠的模型输出中提取结果数组（纯函数）
//! - `score_normalizer` - 分数截断到 `[0, max_score]`（纯函数）
//! - `llm_service` - 外部 LLM 调用能力（`CompletionBackend`）
//! - `interaction_logger` - 每次尝试的审计日志，写入失败不影响评分
//! - `grading_client` - 限流 + 重试 + 兜底，组合以上能力完成一次批量评分
//! - `submission_store` - 评分结果的持久化边界
//!
//! ### ② 流程层（Workflow）
//! - `workflow/` - 定义"一份答卷"的完整评分流程
//! - `GradingCtx` - 上下文封装（答卷 / 学生 / 首次评分或重新评分）
//! - `GradingCoordinator` - 配对题目 → 一次批量评分 → 按位置合并 → 持久化
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量答卷处理器，加载、调度、统计
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{ApiError, EngineResult, ExtractionError, GradingError, LogError};
pub use models::{
    Answer, AnswerReview, AttemptLog, AttemptOutcome, BatchGradingCall, Exam, ExamQuestion,
    GradeRequestItem, GradeResult, LogContext, ReviewRecord, RubricLevel, Submission,
    SubmissionStatus,
};
pub use orchestrator::{App, ProcessingStats};
pub use services::{CompletionBackend, GradingClient, InteractionLogger, RetryPolicy};
pub use workflow::{GradingCoordinator, GradingCtx, GradingMode};
