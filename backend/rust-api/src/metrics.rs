use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Database Metrics (MongoDB)
    pub static ref DB_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "db_operations_total",
        "Total number of database operations",
        &["operation", "collection", "status"]
    )
    .unwrap();

    pub static ref DB_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "db_operation_duration_seconds",
        "Database operation duration in seconds",
        &["operation", "collection"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // Quiz Metrics
    pub static ref QUIZ_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_operations_total",
        "Total number of quiz operations by outcome",
        &["operation", "outcome"]
    )
    .unwrap();

    pub static ref QUESTION_REJECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "question_rejections_total",
        "Total number of rejected question payloads",
        &["reason"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track database operation with metrics
pub async fn track_db_operation<F, T>(
    operation: &str,
    collection: &str,
    future: F,
) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    DB_OPERATIONS_TOTAL
        .with_label_values(&[operation, collection, status])
        .inc();

    DB_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, collection])
        .observe(duration);

    result
}

/// Record the outcome of a quiz operation (`ok`, or an error kind)
pub fn record_quiz_operation(operation: &str, outcome: &str) {
    QUIZ_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Record a rejected question payload
pub fn record_question_rejection(reason: &str) {
    QUESTION_REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let _ = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
        let _ = QUIZ_OPERATIONS_TOTAL
            .with_label_values(&["create", "ok"])
            .get();
    }

    #[test]
    fn test_render_metrics() {
        record_quiz_operation("create", "variant");
        record_question_rejection("unknown_option");

        let output = render_metrics().unwrap();
        assert!(output.contains("quiz_operations_total"));
        assert!(output.contains("question_rejections_total"));
    }

    #[tokio::test]
    async fn test_track_db_operation_passes_result_through() {
        let ok: Result<u8, anyhow::Error> =
            track_db_operation("find", "quizzes", async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let before = DB_OPERATIONS_TOTAL
            .with_label_values(&["delete", "quizzes_test", "error"])
            .get();
        let err: Result<(), anyhow::Error> =
            track_db_operation("delete", "quizzes_test", async { Err(anyhow::anyhow!("down")) })
                .await;
        assert!(err.is_err());
        let after = DB_OPERATIONS_TOTAL
            .with_label_values(&["delete", "quizzes_test", "error"])
            .get();
        assert_eq!(after, before + 1);
    }
}
