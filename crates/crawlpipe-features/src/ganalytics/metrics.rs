//! Metrics derived from summed raw counters

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `100 * value / sessions`, 0 when there are no sessions
pub fn compute_percentage(value: f64, sessions: i64) -> f64 {
    if sessions == 0 {
        return 0.0;
    }
    round2(100.0 * value / sessions as f64)
}

/// `value / sessions`, 0 when there are no sessions
pub fn compute_average_value(value: f64, sessions: i64) -> f64 {
    if sessions == 0 {
        return 0.0;
    }
    round2(value / sessions as f64)
}
