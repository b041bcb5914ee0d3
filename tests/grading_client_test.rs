mod common;

use common::{
    client_with_memory_log, fast_retry, results_json, BrokenSink, ConcurrencyProbeBackend,
    ScriptedBackend,
};
use exam_grading::models::{AttemptOutcome, BatchGradingCall, FALLBACK_FEEDBACK};
use exam_grading::services::InteractionLogger;
use exam_grading::{GradeRequestItem, GradingClient, GradingError, LogContext, RetryPolicy};
use futures::future::join_all;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn items(n: usize) -> Vec<GradeRequestItem> {
    (1..=n)
        .map(|i| GradeRequestItem::new(format!("问题 {}", i), format!("回答 {}", i), 10.0))
        .collect()
}

fn context() -> LogContext {
    let mut context = LogContext::new();
    context.insert("submission_id".to_string(), "sub-test".to_string());
    context
}

#[tokio::test]
async fn test_success_preserves_length_and_order() {
    let backend = Arc::new(ScriptedBackend::always(&format!(
        "评分如下：\n```json\n{}\n```",
        results_json(&[9.0, 2.0, 6.5])
    )));
    let (client, sink) = client_with_memory_log(backend.clone(), 5);

    let results = client.grade_batch(&items(3), &context()).await.unwrap();

    assert_eq!(results.len(), 3);
    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![9.0, 2.0, 6.5]);
    assert_eq!(results[1].feedback, "第 2 题反馈");
    assert_eq!(backend.calls(), 1);

    let logs = sink.records();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].outcome, AttemptOutcome::Success);
    assert_eq!(logs[0].batch_size, 3);
    assert_eq!(logs[0].context["submission_id"], "sub-test");
    assert!(logs[0].raw_response.is_some());
}

#[tokio::test]
async fn test_whole_batch_sent_in_one_prompt() {
    let backend = Arc::new(ScriptedBackend::always(&results_json(&[1.0, 1.0])));
    let (client, _sink) = client_with_memory_log(backend.clone(), 5);

    client.grade_batch(&items(2), &context()).await.unwrap();

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("问题 1"));
    assert!(prompts[0].contains("问题 2"));
}

#[tokio::test]
async fn test_scores_clamped_to_item_max() {
    let backend = Arc::new(ScriptedBackend::always(
        r#"[{"score": 99, "feedback": "a"}, {"score": -3, "feedback": "b"}, {"score": "abc"}]"#,
    ));
    let (client, _sink) = client_with_memory_log(backend, 5);

    let results = client.grade_batch(&items(3), &context()).await.unwrap();

    assert_eq!(results[0].score, 10.0);
    assert_eq!(results[1].score, 0.0);
    assert_eq!(results[2].score, 0.0);
    assert_eq!(results[2].feedback, "");
}

#[tokio::test]
async fn test_length_mismatch_is_retried() {
    let short = results_json(&[5.0]);
    let full = results_json(&[5.0, 7.0]);
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(short.as_str()), Ok(full.as_str())]));
    let (client, sink) = client_with_memory_log(backend.clone(), 5);

    let results = client.grade_batch(&items(2), &context()).await.unwrap();

    assert_eq!(backend.calls(), 2);
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].score, 7.0);

    let outcomes: Vec<AttemptOutcome> = sink.records().iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![AttemptOutcome::ParseError, AttemptOutcome::Success]
    );
    assert_eq!(sink.records()[1].attempt, 2);
}

#[tokio::test]
async fn test_retry_exhaustion_returns_fallback() {
    let backend = Arc::new(ScriptedBackend::always("抱歉，我现在无法完成评分。"));
    let (client, sink) = client_with_memory_log(backend.clone(), 5);

    let results = client.grade_batch(&items(4), &context()).await.unwrap();

    assert_eq!(backend.calls(), 3);
    assert_eq!(results.len(), 4);
    for result in &results {
        assert_eq!(result.score, 0.0);
        assert_eq!(result.feedback, FALLBACK_FEEDBACK);
        assert!(result.is_fallback());
    }

    let logs = sink.records();
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|l| l.outcome == AttemptOutcome::ParseError));
    let attempts: Vec<u32> = logs.iter().map(|l| l.attempt).collect();
    assert_eq!(attempts, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_api_error_is_retried() {
    let good = results_json(&[8.0]);
    let backend = Arc::new(ScriptedBackend::new(vec![
        Err("429 Too Many Requests"),
        Ok(good.as_str()),
    ]));
    let (client, sink) = client_with_memory_log(backend.clone(), 5);

    let results = client.grade_batch(&items(1), &context()).await.unwrap();

    assert_eq!(backend.calls(), 2);
    assert_eq!(results[0].score, 8.0);

    let logs = sink.records();
    assert_eq!(logs[0].outcome, AttemptOutcome::ApiError);
    assert!(logs[0].raw_response.is_none());
    assert!(logs[0].error.as_deref().unwrap().contains("429"));
    assert_eq!(logs[1].outcome, AttemptOutcome::Success);
}

#[tokio::test]
async fn test_api_errors_exhaust_to_fallback() {
    let backend = Arc::new(ScriptedBackend::new(vec![Err("connection reset")]));
    let (client, _sink) = client_with_memory_log(backend.clone(), 5);

    let results = client.grade_batch(&items(2), &context()).await.unwrap();

    assert_eq!(backend.calls(), 3);
    assert!(results.iter().all(|r| r.is_fallback()));
}

#[tokio::test]
async fn test_empty_batch_is_invalid_input_and_not_sent() {
    let backend = Arc::new(ScriptedBackend::always(&results_json(&[1.0])));
    let (client, sink) = client_with_memory_log(backend.clone(), 5);

    let err = client.grade_batch(&[], &context()).await.unwrap_err();

    assert!(matches!(err, GradingError::InvalidInput(_)));
    assert!(!err.is_retryable());
    assert_eq!(backend.calls(), 0);
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_grade_batch_call() {
    let backend = Arc::new(ScriptedBackend::always(&results_json(&[3.0, 4.0])));
    let (client, _sink) = client_with_memory_log(backend, 5);

    let call = BatchGradingCall::new(items(2), context()).unwrap();
    let results = client.grade(&call).await.unwrap();

    assert_eq!(results.len(), call.len());
}

#[tokio::test]
async fn test_log_failure_never_fails_grading() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Ok("不是 JSON"),
        Ok(r#"[{"score": 6, "feedback": "ok"}]"#),
    ]));
    let sink = Arc::new(BrokenSink::new());
    let client = GradingClient::new(backend, InteractionLogger::new(sink.clone()), 5)
        .with_retry_policy(fast_retry());

    let results = client.grade_batch(&items(1), &context()).await.unwrap();

    assert_eq!(results[0].score, 6.0);
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrency_bound() {
    const CAPACITY: usize = 2;

    let backend = Arc::new(ConcurrencyProbeBackend::new(
        &results_json(&[5.0]),
        Duration::from_millis(100),
    ));
    let (client, _sink) = client_with_memory_log(backend.clone(), CAPACITY);
    let client = Arc::new(client);

    let batch = items(1);
    let calls = (0..=CAPACITY).map(|_| {
        let client = client.clone();
        let batch = batch.clone();
        async move { client.grade_batch(&batch, &LogContext::new()).await }
    });
    let outcomes = join_all(calls).await;

    assert_eq!(backend.calls(), CAPACITY + 1);
    assert_eq!(backend.peak(), CAPACITY);
    assert!(outcomes
        .iter()
        .all(|o| o.as_ref().map(|r| r[0].score == 5.0).unwrap_or(false)));
    assert_eq!(client.available_slots(), CAPACITY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_bound_across_spawned_tasks() {
    const CAPACITY: usize = 3;

    let backend = Arc::new(ConcurrencyProbeBackend::new(
        &results_json(&[1.0, 2.0]),
        Duration::from_millis(50),
    ));
    let (client, _sink) = client_with_memory_log(backend.clone(), CAPACITY);
    let client = Arc::new(client);

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.grade_batch(&items(2), &LogContext::new()).await })
        })
        .collect();

    for handle in handles {
        let results = handle.await.unwrap().unwrap();
        assert_eq!(results.len(), 2);
    }

    assert_eq!(backend.calls(), 10);
    assert!(backend.peak() <= CAPACITY);
}

#[tokio::test]
async fn test_slot_released_during_backoff() {
    let ok = results_json(&[6.0]);
    // 第一次调用（批次 A）失败，之后的调用都成功
    let backend = Arc::new(ScriptedBackend::new(vec![
        Err("503 Service Unavailable"),
        Ok(ok.as_str()),
    ]));
    let (client, sink) = client_with_memory_log(backend.clone(), 1);
    let client = Arc::new(client.with_retry_policy(RetryPolicy {
        max_attempts: 3,
        backoff: Duration::from_millis(500),
    }));

    let batch_a = {
        let client = client.clone();
        tokio::spawn(async move { client.grade_batch(&items(1), &LogContext::new()).await })
    };

    // 等批次 A 第一次失败并进入 backoff
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.calls(), 1);
    assert_eq!(client.available_slots(), 1);

    // 唯一的槽位此时空闲，批次 B 不必等到 A 的 backoff 结束
    let batch_b = tokio::time::timeout(
        Duration::from_millis(250),
        client.grade_batch(&items(1), &LogContext::new()),
    )
    .await
    .expect("批次 B 被批次 A 的 backoff 阻塞")
    .unwrap();
    assert_eq!(batch_b[0].score, 6.0);
    assert_eq!(backend.calls(), 2);

    let batch_a = batch_a.await.unwrap().unwrap();
    assert_eq!(batch_a[0].score, 6.0);
    assert_eq!(backend.calls(), 3);

    let outcomes: Vec<AttemptOutcome> = sink.records().iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            AttemptOutcome::ApiError,
            AttemptOutcome::Success,
            AttemptOutcome::Success
        ]
    );
}
