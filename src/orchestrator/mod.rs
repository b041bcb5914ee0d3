//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量答卷的加载和调度，是命令行程序的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<SubmissionBundle>)
//!     ↓
//! workflow::GradingCoordinator (处理单份答卷)
//!     ↓
//! services::GradingClient (一次批量 LLM 调用：限流 / 重试 / 兜底)
//!     ↓
//! services (能力层：prompt / extractor / normalizer / logger / store)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源集中**：只有编排层创建 `GradingClient`，并发容量来自配置
//! 2. **向下依赖**：编排层 → workflow → services
//! 3. **无业务逻辑**：只做调度和统计，不做具体评分判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, ProcessingStats};
