use crate::error::ConfigError;
use std::time::Duration;
use tracing::warn;

/// API Key 的最小合理长度（只做长度检查，不校验正确性）
pub const MIN_API_KEY_LEN: usize = 30;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 评分引擎配置 ---
    /// 同时在途的 LLM 调用数量上限
    pub max_concurrent_calls: usize,
    /// 每个批次最多尝试次数（含第一次）
    pub max_attempts: u32,
    /// 两次尝试之间的固定等待时间（毫秒）
    pub retry_delay_ms: u64,
    // --- 文件 ---
    /// 待评分的 TOML 提交文件目录
    pub submissions_folder: String,
    /// 评分结果输出目录
    pub output_folder: String,
    /// 交互日志文件（JSON Lines）
    pub attempt_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-flash-latest".to_string(),
            max_concurrent_calls: 5,
            max_attempts: 3,
            retry_delay_ms: 1000,
            submissions_folder: "submissions".to_string(),
            output_folder: "graded".to_string(),
            attempt_log_file: "ai_logs.jsonl".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            max_concurrent_calls: std::env::var("MAX_CONCURRENT_CALLS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_calls),
            max_attempts: std::env::var("MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attempts),
            retry_delay_ms: std::env::var("RETRY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_delay_ms),
            submissions_folder: std::env::var("SUBMISSIONS_FOLDER").unwrap_or(default.submissions_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            attempt_log_file: std::env::var("ATTEMPT_LOG_FILE").unwrap_or(default.attempt_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 校验配置
    ///
    /// API Key 会先去除首尾空白；过短只给出警告，为空或并发/重试预算为 0 时报错。
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.llm_api_key = self.llm_api_key.trim().to_string();

        if self.llm_api_key.is_empty() {
            return Err(ConfigError::Missing {
                var_name: "LLM_API_KEY".to_string(),
            });
        }
        if self.llm_api_key.len() < MIN_API_KEY_LEN {
            warn!(
                "⚠️ API Key 长度只有 {} 个字符，看起来过短（通常不少于 {} 个字符）",
                self.llm_api_key.len(),
                MIN_API_KEY_LEN
            );
        }
        if self.max_concurrent_calls == 0 {
            return Err(ConfigError::Invalid {
                var_name: "MAX_CONCURRENT_CALLS".to_string(),
                value: "0".to_string(),
                reason: "至少需要 1 个并发槽位".to_string(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var_name: "MAX_ATTEMPTS".to_string(),
                value: "0".to_string(),
                reason: "至少需要尝试 1 次".to_string(),
            });
        }

        Ok(self)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 日志中显示的 Key 摘要（只保留首尾各 4 个字符）
    pub fn masked_api_key(&self) -> String {
        let key = self.llm_api_key.trim();
        let count = key.chars().count();
        if count <= 8 {
            return "*".repeat(count);
        }
        let head: String = key.chars().take(4).collect();
        let tail: String = key.chars().skip(count - 4).collect();
        format!("{}...{}", head, tail)
    }
}
