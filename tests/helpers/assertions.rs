// tests/helpers/assertions.rs - Custom test assertions

use loadwatch::{ErrorHistoryStore, ErrorStatistics};

/// Assert two floats agree to within 1e-9
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "Expected {}, got {}",
        expected,
        actual
    );
}

/// Assert that a model holds exactly `expected` entries
pub async fn assert_model_entries(store: &ErrorHistoryStore, model: &str, expected: usize) {
    let history = store.get_model_history(model).await;
    assert_eq!(
        history.len(),
        expected,
        "Model {} should have {} entries, but had {}",
        model,
        expected,
        history.len()
    );
}

/// Assert that statistics are internally consistent
pub fn assert_stats_consistent(stats: &ErrorStatistics) {
    match (stats.min, stats.avg, stats.max) {
        (Some(min), Some(avg), Some(max)) => {
            assert!(stats.count > 0, "Non-empty aggregates need a positive count");
            assert!(min <= avg && avg <= max, "Expected min <= avg <= max");
        }
        (None, None, None) => assert_eq!(stats.count, 0),
        _ => panic!("Aggregates must be all present or all absent: {:?}", stats),
    }
    assert!(stats.above_threshold_count <= stats.count);
}
