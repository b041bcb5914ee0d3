#![allow(dead_code)]

use async_trait::async_trait;
use exam_grading::error::{ApiError, LogError};
use exam_grading::models::AttemptLog;
use exam_grading::services::interaction_logger::{InteractionLogger, LogSink, MemorySink};
use exam_grading::services::CompletionBackend;
use exam_grading::{GradingClient, RetryPolicy};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 按脚本依次返回响应的后端；脚本用完后重复最后一条
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<&str, &str>>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: &str) -> Self {
        Self::new(vec![Ok(response)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _system_message: &str, user_message: &str) -> Result<String, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(user_message.to_string());

        let next = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            match script.pop_front() {
                Some(step) => {
                    *last = Some(step.clone());
                    step
                }
                None => last.clone().unwrap_or_else(|| Err("脚本为空".to_string())),
            }
        };

        next.map_err(|message| ApiError::request_failed("scripted", std::io::Error::other(message)))
    }
}

/// 记录同时在途调用数峰值的后端
pub struct ConcurrencyProbeBackend {
    response: String,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ConcurrencyProbeBackend {
    pub fn new(response: &str, delay: Duration) -> Self {
        Self {
            response: response.to_string(),
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for ConcurrencyProbeBackend {
    fn model_name(&self) -> &str {
        "probe"
    }

    async fn complete(&self, _system_message: &str, _user_message: &str) -> Result<String, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// 永远写入失败的日志存储
pub struct BrokenSink {
    pub attempts: AtomicUsize,
}

impl BrokenSink {
    pub fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LogSink for BrokenSink {
    async fn append(&self, _record: &AttemptLog) -> Result<(), LogError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(LogError::Unavailable("日志库不可用".to_string()))
    }
}

/// 测试用的快速重试策略
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff: Duration::from_millis(10),
    }
}

/// 创建带内存日志的客户端
pub fn client_with_memory_log(
    backend: Arc<dyn CompletionBackend>,
    capacity: usize,
) -> (GradingClient, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let client = GradingClient::new(backend, InteractionLogger::new(sink.clone()), capacity)
        .with_retry_policy(fast_retry());
    (client, sink)
}

/// 生成 n 个结果对象组成的 JSON 数组
pub fn results_json(scores: &[f64]) -> String {
    let items: Vec<serde_json::Value> = scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            serde_json::json!({
                "score": score,
                "justification": format!("第 {} 题评分理由", i + 1),
                "feedback": format!("第 {} 题反馈", i + 1),
                "strengths": "思路清晰",
                "improvements": "可补充例子"
            })
        })
        .collect();
    serde_json::to_string_pretty(&items).unwrap()
}
