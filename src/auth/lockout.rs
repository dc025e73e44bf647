//! Account lockout state machine.
//!
//! Per user the machine is `Unlocked(attempts)` with failures pushing the
//! counter up until the threshold locks the account for a fixed window.
//! Expiry is lazy: `locked_until` is never proactively cleared, so the
//! unlock condition is always `now >= locked_until`, never the absence of
//! the field.

use time::{Duration, OffsetDateTime};

use crate::config::LockoutConfig;
use crate::users::repo::{User, UserStatus};

#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lock_duration: Duration,
}

impl From<&LockoutConfig> for LockoutPolicy {
    fn from(cfg: &LockoutConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            lock_duration: Duration::minutes(cfg.lock_minutes),
        }
    }
}

/// Pre-password check. Suspension takes precedence over the lock, and
/// both are decided before any hash verification happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Suspended,
    Locked,
    Open,
}

pub fn gate(user: &User, now: OffsetDateTime) -> Gate {
    if user.status == UserStatus::Suspended {
        return Gate::Suspended;
    }
    match user.locked_until {
        Some(until) if now < until => Gate::Locked,
        _ => Gate::Open,
    }
}

/// Outcome of one more failed password attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub attempts: i32,
    pub locked_until: Option<OffsetDateTime>,
}

pub fn record_failure(prior_attempts: i32, now: OffsetDateTime, policy: &LockoutPolicy) -> Failure {
    let attempts = prior_attempts + 1;
    let locked_until = if attempts >= policy.max_attempts as i32 {
        Some(now + policy.lock_duration)
    } else {
        None
    };
    Failure {
        attempts,
        locked_until,
    }
}

#[cfg(test)]
mod lockout_tests {
    use super::*;
    use crate::users::repo::Role;
    use time::macros::datetime;
    use uuid::Uuid;

    fn policy() -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: 5,
            lock_duration: Duration::minutes(15),
        }
    }

    fn user(status: UserStatus, attempts: i32, locked_until: Option<OffsetDateTime>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "KAB".into(),
            password_hash: "h".into(),
            role: Role::Student,
            status,
            login_attempts: attempts,
            locked_until,
            last_login: None,
            created_at: datetime!(2025-01-01 00:00 UTC),
        }
    }

    #[test]
    fn active_unlocked_account_is_open() {
        let now = datetime!(2025-06-01 12:00 UTC);
        assert_eq!(gate(&user(UserStatus::Active, 3, None), now), Gate::Open);
    }

    #[test]
    fn suspension_wins_over_lock() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let u = user(
            UserStatus::Suspended,
            5,
            Some(now + Duration::minutes(10)),
        );
        assert_eq!(gate(&u, now), Gate::Suspended);
    }

    #[test]
    fn future_lock_blocks() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let u = user(UserStatus::Active, 5, Some(now + Duration::minutes(1)));
        assert_eq!(gate(&u, now), Gate::Locked);
    }

    #[test]
    fn stale_lock_is_open_without_being_cleared() {
        let now = datetime!(2025-06-01 12:00 UTC);
        // locked_until still set in storage but in the past
        let u = user(UserStatus::Active, 5, Some(now - Duration::seconds(1)));
        assert_eq!(gate(&u, now), Gate::Open);
    }

    #[test]
    fn failures_below_threshold_only_count() {
        let now = datetime!(2025-06-01 12:00 UTC);
        for prior in 0..3 {
            let f = record_failure(prior, now, &policy());
            assert_eq!(f.attempts, prior + 1);
            assert_eq!(f.locked_until, None);
        }
    }

    #[test]
    fn fifth_failure_locks_for_fifteen_minutes() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let f = record_failure(4, now, &policy());
        assert_eq!(f.attempts, 5);
        assert_eq!(f.locked_until, Some(now + Duration::minutes(15)));
    }

    #[test]
    fn five_failures_then_wait_then_success_path() {
        let mut now = datetime!(2025-06-01 12:00 UTC);
        let policy = policy();

        // Five wrong passwords in a row.
        let mut u = user(UserStatus::Active, 0, None);
        for _ in 0..5 {
            assert_eq!(gate(&u, now), Gate::Open);
            let f = record_failure(u.login_attempts, now, &policy);
            u.login_attempts = f.attempts;
            if let Some(until) = f.locked_until {
                u.locked_until = Some(until);
            }
        }
        assert_eq!(u.login_attempts, 5);

        // Sixth attempt is rejected regardless of the password.
        assert_eq!(gate(&u, now), Gate::Locked);

        // One second short of the window: still locked.
        now += Duration::minutes(15) - Duration::seconds(1);
        assert_eq!(gate(&u, now), Gate::Locked);

        // Window elapsed: the gate opens even though locked_until is
        // still present in storage.
        now += Duration::seconds(1);
        assert_eq!(gate(&u, now), Gate::Open);
    }
}
