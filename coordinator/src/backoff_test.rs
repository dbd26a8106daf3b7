use super::*;

#[test]
fn delay_grows_linearly_with_the_attempt_number() {
    let policy = BackoffPolicy::new(Duration::from_millis(100), 5);
    assert_eq!(policy.delay_for(1), Some(Duration::from_millis(100)));
    assert_eq!(policy.delay_for(2), Some(Duration::from_millis(200)));
    assert_eq!(policy.delay_for(5), Some(Duration::from_millis(500)));
}

#[test]
fn attempts_past_the_cap_yield_none() {
    let policy = BackoffPolicy::new(Duration::from_millis(100), 5);
    assert_eq!(policy.delay_for(6), None);
    assert_eq!(policy.delay_for(u32::MAX), None);
}

#[test]
fn attempt_zero_is_not_a_valid_attempt() {
    let policy = BackoffPolicy::default();
    assert_eq!(policy.delay_for(0), None);
}

#[test]
fn default_policy_matches_the_documented_constants() {
    let policy = BackoffPolicy::default();
    assert_eq!(policy.max_attempts(), DEFAULT_MAX_ATTEMPTS);
    assert_eq!(policy.delay_for(1), Some(DEFAULT_BASE_DELAY));
    assert_eq!(
        policy.delay_for(DEFAULT_MAX_ATTEMPTS),
        Some(DEFAULT_BASE_DELAY.saturating_mul(DEFAULT_MAX_ATTEMPTS))
    );
}

#[test]
fn zero_attempt_policy_is_immediately_exhausted() {
    let policy = BackoffPolicy::new(Duration::from_millis(100), 0);
    assert_eq!(policy.delay_for(1), None);
}
