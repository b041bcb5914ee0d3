use thiserror::Error;

/// 评分引擎错误类型
///
/// 对外只会暴露 `InvalidInput`，其余错误都在 `GradingClient` 内部被重试吸收，
/// 最终转换为兜底评分结果。
#[derive(Debug, Error)]
pub enum GradingError {
    /// 调用方传入了空批次（调用方 bug，不重试）
    #[error("输入无效: {0}")]
    InvalidInput(String),
    /// 模型输出无法解析为长度匹配的结果数组
    #[error("结果解析失败: {0}")]
    Extraction(#[from] ExtractionError),
    /// 外部 API 调用失败
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
}

/// 模型响应解析错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// 找到了数组字面量，但无法解码
    #[error("JSON解析失败: {reason}")]
    ParseError { reason: String },
    /// 响应中没有任何数组字面量
    #[error("响应中未找到结果数组")]
    NotFound,
    /// 结果数量与题目数量不一致
    #[error("结果数量不匹配: 期望 {expected}，实际 {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// 外部 LLM API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络 / 传输 / 配额错误
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    RequestFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 并发限流器已关闭
    #[error("并发限流器已关闭")]
    LimiterClosed,
}

/// 交互日志写入错误（永远不会向上传播）
#[derive(Debug, Error)]
pub enum LogError {
    #[error("日志文件写入失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("日志序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("日志存储不可用: {0}")]
    Unavailable(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必填配置项为空
    #[error("配置项 {var_name} 不能为空")]
    Missing { var_name: String },
    /// 配置值超出允许范围
    #[error("配置项 {var_name} 的值 '{value}' 无效: {reason}")]
    Invalid {
        var_name: String,
        value: String,
        reason: String,
    },
}

// ========== 便捷构造函数 ==========

impl ApiError {
    /// 创建 API 调用失败错误
    pub fn request_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ApiError::RequestFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

impl GradingError {
    /// 该错误是否值得重试
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GradingError::InvalidInput(_))
    }
}

/// 评分引擎结果类型
pub type EngineResult<T> = Result<T, GradingError>;
