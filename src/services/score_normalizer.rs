//! 分数归一化
//!
//! 模型输出不可信：分数一律截断到 `[0, max_score]`，缺失或非数字按 0 分处理，永不报错。

use serde_json::Value;

/// 把模型给出的原始分数截断到 `[0, max_score]`
pub fn normalize_score(raw: Option<&Value>, max_score: f64) -> f64 {
    let ceiling = if max_score.is_finite() { max_score.max(0.0) } else { 0.0 };

    match raw.and_then(numeric_value) {
        Some(score) => clamp_score(score, ceiling),
        None => 0.0,
    }
}

/// `max(0, min(score, max_score))`，NaN 视为 0
pub fn clamp_score(score: f64, max_score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.min(max_score).max(0.0)
}

fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        // 模型偶尔会把分数写成字符串，如 "7" 或 "7.5"
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}
