//! 批量答卷处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是命令行程序的入口，负责批量答卷的加载、调度和统计。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、创建交互日志、LLM 客户端和协调器
//! 2. **批量加载**：扫描并加载所有待评分的答卷（`Vec<SubmissionBundle>`）
//! 3. **并发调度**：每份答卷一个任务，全局并发由 `GradingClient` 的限流器控制
//! 4. **全局统计**：汇总成功 / 部分失败 / 失败数量
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一创建 `GradingClient` 的模块，容量来自配置
//! - **向下委托**：委托 `GradingCoordinator` 处理单份答卷
//! - **任务可追踪**：每个后台任务的句柄都会被等待，失败不会被静默丢弃

use crate::config::Config;
use crate::models::loaders::{load_all_submission_bundles, SubmissionBundle};
use crate::services::{GradingClient, InteractionLogger, JsonDirStore, JsonlFileSink};
use crate::utils::logging::{log_startup, log_submissions_loaded, print_final_stats};
use crate::workflow::{GradingCoordinator, GradingMode};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    coordinator: Arc<GradingCoordinator>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let config = config.validate().context("配置校验失败")?;

        log_startup(&config);

        let logger = InteractionLogger::new(Arc::new(JsonlFileSink::new(&config.attempt_log_file)));
        let client = Arc::new(GradingClient::from_config(&config, logger));
        let store = Arc::new(JsonDirStore::new(&config.output_folder));

        Ok(Self::with_coordinator(
            config,
            Arc::new(GradingCoordinator::new(client, store)),
        ))
    }

    /// 使用外部构建的协调器（便于替换 LLM 后端或存储）
    pub fn with_coordinator(config: Config, coordinator: Arc<GradingCoordinator>) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        let bundles = self.load_bundles().await?;

        if bundles.is_empty() {
            warn!("⚠️ 没有找到待评分的TOML文件，程序结束");
            return Ok(ProcessingStats::default());
        }

        log_submissions_loaded(bundles.len(), self.config.max_concurrent_calls);

        let stats = self.process_all(bundles).await;

        print_final_stats(
            stats.success,
            stats.degraded,
            stats.failed,
            &self.config.output_folder,
        );

        Ok(stats)
    }

    /// 加载答卷
    async fn load_bundles(&self) -> Result<Vec<SubmissionBundle>> {
        info!("\n📁 正在扫描待评分的答卷...");
        load_all_submission_bundles(&self.config.submissions_folder).await
    }

    /// 并发处理所有答卷
    pub async fn process_all(&self, bundles: Vec<SubmissionBundle>) -> ProcessingStats {
        let mut handles = Vec::with_capacity(bundles.len());

        for bundle in bundles {
            let mode = if bundle.regrade {
                GradingMode::Regrade
            } else {
                GradingMode::Initial
            };
            let submission_id = bundle.submission.id.clone();
            let handle = self
                .coordinator
                .dispatch(bundle.exam, bundle.submission, mode);
            handles.push((submission_id, handle));
        }

        let mut stats = ProcessingStats::default();

        for (submission_id, handle) in handles {
            match handle.await {
                Ok(Ok(submission)) if submission.failed_answer_count() == 0 => {
                    stats.success += 1;
                }
                Ok(Ok(submission)) => {
                    warn!(
                        "[答卷 {}] ⚠️ {} 个作答使用了兜底结果",
                        submission_id,
                        submission.failed_answer_count()
                    );
                    stats.degraded += 1;
                }
                Ok(Err(e)) => {
                    error!("[答卷 {}] ❌ 处理过程中发生错误: {:#}", submission_id, e);
                    stats.failed += 1;
                }
                Err(e) => {
                    error!("[答卷 {}] 任务执行失败: {}", submission_id, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    /// 所有作答都拿到了 AI 评分
    pub success: usize,
    /// 至少一个作答是兜底结果
    pub degraded: usize,
    /// 处理出错（如保存失败）
    pub failed: usize,
}

impl ProcessingStats {
    pub fn total(&self) -> usize {
        self.success + self.degraded + self.failed
    }
}
