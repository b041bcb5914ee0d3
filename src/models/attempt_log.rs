use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 日志上下文（自由键值对，如 submission_id / student / action）
pub type LogContext = BTreeMap<String, String>;

/// 单次尝试的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptOutcome {
    Success,
    ParseError,
    ApiError,
}

/// 一次 LLM 调用尝试的审计记录，只追加、不修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptLog {
    pub timestamp: DateTime<Utc>,
    pub context: LogContext,
    pub outcome: AttemptOutcome,
    /// 第几次尝试（从 1 开始）
    pub attempt: u32,
    /// 模型原始输出（成功 / 解析失败时记录）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub batch_size: usize,
}

impl AttemptLog {
    pub fn success(context: &LogContext, attempt: u32, batch_size: usize, raw: &str) -> Self {
        Self::new(context, AttemptOutcome::Success, attempt, batch_size, Some(raw), None)
    }

    pub fn parse_error(
        context: &LogContext,
        attempt: u32,
        batch_size: usize,
        raw: &str,
        error: impl ToString,
    ) -> Self {
        Self::new(
            context,
            AttemptOutcome::ParseError,
            attempt,
            batch_size,
            Some(raw),
            Some(error.to_string()),
        )
    }

    pub fn api_error(
        context: &LogContext,
        attempt: u32,
        batch_size: usize,
        error: impl ToString,
    ) -> Self {
        Self::new(
            context,
            AttemptOutcome::ApiError,
            attempt,
            batch_size,
            None,
            Some(error.to_string()),
        )
    }

    fn new(
        context: &LogContext,
        outcome: AttemptOutcome,
        attempt: u32,
        batch_size: usize,
        raw: Option<&str>,
        error: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            context: context.clone(),
            outcome,
            attempt,
            raw_response: raw.map(str::to_string),
            error,
            batch_size,
        }
    }
}
