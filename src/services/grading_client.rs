//! 批量评分客户端 - 业务能力层
//!
//! ## 职责
//!
//! 把一份答卷的所有题目合并为一次 LLM 调用，并保证调用方只会看到两种结果：
//! 与请求等长、按位置对应的评分结果（可能全部是兜底结果），或者 `InvalidInput`。
//!
//! ## 单次调用的状态流转
//!
//! ```text
//! Idle → AwaitingSlot → InFlight → Parsed  → Done
//!                                 → Invalid → (等待 backoff) → AwaitingSlot ...
//!                                           → 超过最大尝试次数 → 兜底结果
//! ```
//!
//! - **AwaitingSlot**：全局 `Semaphore` 限制同时在途的外部调用数量，
//!   许可只在外部调用期间持有，解析和 backoff 等待时都已释放
//! - **InFlight**：每次尝试恰好一次外部调用，提示词包含整批题目
//! - **Parsed**：提取出的数组长度与批次长度一致，逐项归一化
//! - **Invalid**：提取失败或长度不一致，固定间隔后重试

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{ApiError, EngineResult, ExtractionError, GradingError};
use crate::models::attempt_log::{AttemptLog, LogContext};
use crate::models::grading::{BatchGradingCall, GradeRequestItem, GradeResult};
use crate::services::interaction_logger::InteractionLogger;
use crate::services::llm_service::{CompletionBackend, OpenAiBackend};
use crate::services::prompt_builder::{build_batch_prompt, GRADER_SYSTEM_PROMPT};
use crate::services::response_extractor::extract_result_array;

/// 默认同时在途的外部调用数量
pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 5;

/// 重试策略：固定次数 + 固定间隔，不做指数退避
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多尝试次数（含第一次）
    pub max_attempts: u32,
    /// 两次尝试之间的等待时间
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// 批量评分客户端
///
/// 显式创建、显式持有；通过 `Arc` 共享给所有协调器，
/// 这样限流器的容量和生命周期都是可见的构造参数。
pub struct GradingClient {
    backend: Arc<dyn CompletionBackend>,
    limiter: Arc<Semaphore>,
    max_concurrent_calls: usize,
    logger: InteractionLogger,
    retry: RetryPolicy,
}

impl GradingClient {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        logger: InteractionLogger,
        max_concurrent_calls: usize,
    ) -> Self {
        let max_concurrent_calls = max_concurrent_calls.max(1);
        Self {
            backend,
            limiter: Arc::new(Semaphore::new(max_concurrent_calls)),
            max_concurrent_calls,
            logger,
            retry: RetryPolicy::default(),
        }
    }

    /// 按配置创建基于 OpenAI 兼容接口的客户端
    pub fn from_config(config: &Config, logger: InteractionLogger) -> Self {
        Self::new(
            Arc::new(OpenAiBackend::new(config)),
            logger,
            config.max_concurrent_calls,
        )
        .with_retry_policy(RetryPolicy {
            max_attempts: config.max_attempts,
            backoff: config.retry_delay(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            backoff: retry.backoff,
        };
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn max_concurrent_calls(&self) -> usize {
        self.max_concurrent_calls
    }

    /// 当前空闲的并发槽位
    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }

    /// 对一个批次评分
    ///
    /// 返回的结果与 `call.items()` 等长且按位置对应。所有单次尝试的错误都在内部消化，
    /// 超过最大尝试次数后返回兜底结果。
    pub async fn grade(&self, call: &BatchGradingCall) -> EngineResult<Vec<GradeResult>> {
        self.grade_batch(call.items(), &call.context).await
    }

    /// 对一组题目评分，空列表返回 `InvalidInput`（不重试）
    pub async fn grade_batch(
        &self,
        items: &[GradeRequestItem],
        context: &LogContext,
    ) -> EngineResult<Vec<GradeResult>> {
        let prompt = build_batch_prompt(items)?;
        let max_attempts = self.retry.max_attempts;

        info!(
            "🤖 开始批量评分: {} 道题, 模型: {}",
            items.len(),
            self.backend.model_name()
        );

        for attempt in 1..=max_attempts {
            match self.attempt(&prompt, items, context, attempt).await {
                Ok(results) => {
                    info!("✓ 批量评分完成 (第 {}/{} 次尝试)", attempt, max_attempts);
                    return Ok(results);
                }
                Err(e) => {
                    warn!("⚠️ 第 {}/{} 次评分尝试失败: {}", attempt, max_attempts, e);
                    if attempt < max_attempts {
                        sleep(self.retry.backoff).await;
                    }
                }
            }
        }

        error!(
            "❌ 批量评分在 {} 次尝试后仍失败，返回 {} 个兜底结果",
            max_attempts,
            items.len()
        );
        Ok(vec![GradeResult::fallback(); items.len()])
    }

    /// 单次尝试：等待槽位 → 外部调用 → 解析
    async fn attempt(
        &self,
        prompt: &str,
        items: &[GradeRequestItem],
        context: &LogContext,
        attempt: u32,
    ) -> EngineResult<Vec<GradeResult>> {
        let response = {
            let _permit = self
                .limiter
                .acquire()
                .await
                .map_err(|_| ApiError::LimiterClosed)?;
            debug!(
                "获得并发槽位 (剩余 {}/{})",
                self.limiter.available_permits(),
                self.max_concurrent_calls
            );
            self.backend.complete(GRADER_SYSTEM_PROMPT, prompt).await
        };

        let raw = match response {
            Ok(raw) => raw,
            Err(e) => {
                self.logger
                    .record(AttemptLog::api_error(context, attempt, items.len(), &e))
                    .await;
                return Err(GradingError::Api(e));
            }
        };

        match parse_batch_response(&raw, items) {
            Ok(results) => {
                self.logger
                    .record(AttemptLog::success(context, attempt, items.len(), &raw))
                    .await;
                Ok(results)
            }
            Err(e) => {
                self.logger
                    .record(AttemptLog::parse_error(context, attempt, items.len(), &raw, &e))
                    .await;
                Err(GradingError::Extraction(e))
            }
        }
    }
}

/// 解析模型输出，并校验结果数量与题目数量一致
///
/// 数量不一致时整体判为无效，既不截断也不补齐。
pub fn parse_batch_response(
    raw: &str,
    items: &[GradeRequestItem],
) -> Result<Vec<GradeResult>, ExtractionError> {
    let objects = extract_result_array(raw)?;

    if objects.len() != items.len() {
        return Err(ExtractionError::LengthMismatch {
            expected: items.len(),
            actual: objects.len(),
        });
    }

    Ok(objects
        .iter()
        .zip(items)
        .map(|(object, item)| GradeResult::from_model_object(object, item.max_score))
        .collect())
}
