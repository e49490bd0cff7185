//! Variable-rate compounding

/// Compound `principal` through each period rate in order.
///
/// An empty schedule leaves the principal unchanged.
pub fn future_value_with_schedule(principal: f64, rate_schedule: &[f64]) -> f64 {
    rate_schedule
        .iter()
        .fold(principal, |balance, &rate| balance + balance * rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fvschedule() {
        assert_eq!(
            future_value_with_schedule(10000.0, &[0.05, 0.05, 0.035, 0.035, 0.035]),
            12223.614571875
        );
        assert_abs_diff_eq!(future_value_with_schedule(100.0, &[0.04, 0.06, 0.05]), 115.752, epsilon = 1e-10);
    }

    #[test]
    fn test_empty_schedule() {
        assert_eq!(future_value_with_schedule(2500.0, &[]), 2500.0);
    }

    #[test]
    fn test_negative_rate_period() {
        assert_abs_diff_eq!(future_value_with_schedule(1000.0, &[0.10, -0.10]), 990.0, epsilon = 1e-10);
    }
}
