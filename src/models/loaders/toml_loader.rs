use crate::models::exam::{Exam, Submission};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 一个待评分的 TOML 文件：试卷定义 + 学生答卷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionBundle {
    pub exam: Exam,
    pub submission: Submission,
    /// 为 true 时按"教师触发的重新评分"处理
    #[serde(default)]
    pub regrade: bool,
    #[serde(skip)]
    pub file_path: Option<String>,
}

/// 从 TOML 文件加载一份答卷
pub async fn load_submission_bundle(toml_file_path: &Path) -> Result<SubmissionBundle> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let mut bundle: SubmissionBundle = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    if bundle.submission.exam_id != bundle.exam.id {
        anyhow::bail!(
            "答卷 {} 引用的试卷 {} 与文件中的试卷 {} 不一致",
            bundle.submission.id,
            bundle.submission.exam_id,
            bundle.exam.id
        );
    }

    bundle.file_path = Some(toml_file_path.to_string_lossy().to_string());

    Ok(bundle)
}

/// 从文件夹中加载所有 TOML 答卷，按文件名排序
pub async fn load_all_submission_bundles(folder_path: &str) -> Result<Vec<SubmissionBundle>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut bundles = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_submission_bundle(&path).await {
            Ok(bundle) => {
                tracing::info!(
                    "成功加载答卷 {}（{} 个作答）",
                    bundle.submission.id,
                    bundle.submission.answers.len()
                );
                bundles.push(bundle);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(bundles)
}
