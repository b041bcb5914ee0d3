/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`，详细模式下本 crate 为 `debug`。
/// 重复调用不会 panic。
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "exam_grading=debug,info"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - AI 批量阅卷模式");
    info!("🤖 模型: {} ({})", config.llm_model_name, config.llm_api_base_url);
    info!("🔑 API Key: {}", config.masked_api_key());
    info!("📊 最大并发调用数: {}", config.max_concurrent_calls);
    info!(
        "🔁 最多尝试 {} 次，间隔 {} 毫秒",
        config.max_attempts, config.retry_delay_ms
    );
    info!("{}", "=".repeat(60));
}

/// 记录答卷加载信息
pub fn log_submissions_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 份待评分的答卷", total);
    info!("📋 同时最多 {} 个 LLM 调用在途\n", max_concurrent);
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 全部作答评分成功的答卷数
/// - `degraded`: 存在兜底结果的答卷数
/// - `failed`: 处理出错的答卷数
/// - `output_folder`: 结果输出目录
pub fn print_final_stats(success: usize, degraded: usize, failed: usize, output_folder: &str) {
    let total = success + degraded + failed;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部评分完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("⚠️ 部分评分失败（待教师复核）: {}", degraded);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n评分结果已保存至: {}", output_folder);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
