use super::*;

fn policy(max_retries: u32) -> ReconnectPolicy {
    ReconnectPolicy {
        max_retries,
        base_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(1000),
    }
}

#[test]
fn disabled_policy_never_retries() {
    let p = ReconnectPolicy::disabled();
    assert!(!p.is_enabled());
    assert_eq!(p.delay_for(1), None);
}

#[test]
fn ceiling_doubles_per_attempt() {
    let p = policy(5);
    assert_eq!(p.ceiling(1), Some(Duration::from_millis(100)));
    assert_eq!(p.ceiling(2), Some(Duration::from_millis(200)));
    assert_eq!(p.ceiling(3), Some(Duration::from_millis(400)));
    assert_eq!(p.ceiling(4), Some(Duration::from_millis(800)));
}

#[test]
fn ceiling_is_capped_at_max_delay() {
    let p = policy(10);
    assert_eq!(p.ceiling(5), Some(Duration::from_millis(1000)));
    assert_eq!(p.ceiling(10), Some(Duration::from_millis(1000)));
}

#[test]
fn ceiling_survives_huge_attempt_counts() {
    let p = policy(u32::MAX);
    assert_eq!(p.ceiling(200), Some(Duration::from_millis(1000)));
}

#[test]
fn attempts_past_max_retries_give_up() {
    let p = policy(3);
    assert!(p.ceiling(3).is_some());
    assert_eq!(p.ceiling(4), None);
    assert_eq!(p.delay_for(4), None);
}

#[test]
fn attempt_zero_is_not_a_retry() {
    assert_eq!(policy(3).ceiling(0), None);
}

#[test]
fn jittered_delay_stays_within_bounds() {
    let p = policy(5);
    for attempt in 1..=5 {
        let ceiling = p.ceiling(attempt).unwrap();
        for _ in 0..50 {
            let delay = p.delay_for(attempt).unwrap();
            assert!(delay >= ceiling / 2, "delay {delay:?} below half of {ceiling:?}");
            assert!(delay <= ceiling, "delay {delay:?} above {ceiling:?}");
        }
    }
}
