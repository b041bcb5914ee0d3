//! 交互日志服务 - 业务能力层
//!
//! 只负责"把每次 LLM 尝试追加到日志存储"，尽力而为：
//! 写入失败只打一条警告，绝不影响评分结果。

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::LogError;
use crate::models::attempt_log::AttemptLog;

/// 只追加的日志存储
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append(&self, record: &AttemptLog) -> Result<(), LogError>;
}

/// 交互日志记录器
#[derive(Clone)]
pub struct InteractionLogger {
    sink: Arc<dyn LogSink>,
}

impl InteractionLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// 追加一条记录，任何错误都被吞掉
    pub async fn record(&self, record: AttemptLog) {
        match self.sink.append(&record).await {
            Ok(()) => debug!(
                "已记录交互日志: 第 {} 次尝试, 结果 {:?}",
                record.attempt, record.outcome
            ),
            Err(e) => warn!("⚠️ 交互日志写入失败（已忽略）: {}", e),
        }
    }
}

/// JSON Lines 文件存储：每条记录一行
pub struct JsonlFileSink {
    path: PathBuf,
}

impl JsonlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl LogSink for JsonlFileSink {
    async fn append(&self, record: &AttemptLog) -> Result<(), LogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

/// 进程内存储，供嵌入方查看最近的交互记录
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<AttemptLog>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AttemptLog> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn append(&self, record: &AttemptLog) -> Result<(), LogError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| LogError::Unavailable(e.to_string()))?;
        records.push(record.clone());
        Ok(())
    }
}
