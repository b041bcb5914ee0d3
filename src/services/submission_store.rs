//! 答卷存储 - 业务能力层
//!
//! 持久化属于外部协作方，这里只定义边界：评分完成后把整份答卷交给存储。

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::exam::Submission;
use crate::models::review::ReviewRecord;

/// 复核审计记录文件名（JSON Lines）
pub const REVIEW_AUDIT_FILE: &str = "review_audit.jsonl";

/// 评分结果的持久化接口
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn save_grading(&self, submission: &Submission) -> Result<()>;

    /// 追加一条教师复核的审计记录
    async fn record_review(&self, record: &ReviewRecord) -> Result<()>;
}

/// 每份答卷一个 JSON 文件：`<folder>/<submission_id>.json`
pub struct JsonDirStore {
    folder: PathBuf,
}

impl JsonDirStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn path_for(&self, submission_id: &str) -> PathBuf {
        let file_name: String = submission_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.folder.join(format!("{}.json", file_name))
    }

    pub fn review_audit_path(&self) -> PathBuf {
        self.folder.join(REVIEW_AUDIT_FILE)
    }
}

#[async_trait]
impl SubmissionStore for JsonDirStore {
    async fn save_grading(&self, submission: &Submission) -> Result<()> {
        tokio::fs::create_dir_all(&self.folder)
            .await
            .with_context(|| format!("无法创建输出目录: {}", self.folder.display()))?;

        let path = self.path_for(&submission.id);
        let content = serde_json::to_string_pretty(submission)?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("无法写入评分结果: {}", path.display()))?;

        debug!("评分结果已保存: {}", path.display());
        Ok(())
    }

    async fn record_review(&self, record: &ReviewRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.folder)
            .await
            .with_context(|| format!("无法创建输出目录: {}", self.folder.display()))?;

        let path = self.review_audit_path();
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("无法打开复核审计文件: {}", path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("复核记录已追加: {}", path.display());
        Ok(())
    }
}

/// 进程内存储
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<HashMap<String, Submission>>,
    reviews: Mutex<Vec<ReviewRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, submission_id: &str) -> Option<Submission> {
        self.saved
            .lock()
            .ok()
            .and_then(|saved| saved.get(submission_id).cloned())
    }

    pub fn len(&self) -> usize {
        self.saved.lock().map(|saved| saved.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reviews(&self) -> Vec<ReviewRecord> {
        self.reviews
            .lock()
            .map(|reviews| reviews.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn save_grading(&self, submission: &Submission) -> Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|e| anyhow::anyhow!("存储锁已损坏: {}", e))?;
        saved.insert(submission.id.clone(), submission.clone());
        Ok(())
    }

    async fn record_review(&self, record: &ReviewRecord) -> Result<()> {
        self.reviews
            .lock()
            .map_err(|e| anyhow::anyhow!("存储锁已损坏: {}", e))?
            .push(record.clone());
        Ok(())
    }
}
