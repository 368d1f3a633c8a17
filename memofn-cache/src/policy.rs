//! Staleness policies.
//!
//! - [`NeverExpire`]: entries stay fresh until invalidated
//! - [`MaxAge`]: entries older than a fixed window are stale
//! - [`StampPolicy`]: entries carry a caller-defined stamp that is compared
//!   against a freshly computed one on every lookup

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use memofn_core::constants::SECONDS_PER_DAY;
use memofn_core::error::{MemoError, Result};
use memofn_core::traits::StalenessPolicy;
use memofn_core::types::{Args, EntryMeta, Value};

/// Computes a stamp from the arguments of a call.
pub type StampFn = dyn Fn(&Args) -> Result<Value> + Send + Sync;

/// Returns true when a stored stamp no longer matches the current one.
/// Called as `is_expired(stored, current)`.
pub type StampComparator = dyn Fn(&Value, &Value) -> bool + Send + Sync;

/// Entries never go stale.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverExpire;

impl StalenessPolicy for NeverExpire {
    fn is_stale(&self, _entry: &EntryMeta, _current: Option<&Value>, _now: DateTime<Utc>) -> Result<bool> {
        Ok(false)
    }
}

/// Entries are stale once they are older than a fixed window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxAge {
    max_age: Duration,
}

impl MaxAge {
    /// Window of `days` days; fractions are allowed.
    pub fn days(days: f64) -> Result<Self> {
        validate_days(days)?;
        let millis = (days * SECONDS_PER_DAY * 1000.0).round().min(i64::MAX as f64) as i64;
        Ok(Self {
            max_age: Duration::milliseconds(millis),
        })
    }

    /// Window of an explicit duration.
    pub fn from_duration(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// Returns the window.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Returns true if something created at `created_at` is too old at `now`.
    pub fn is_expired(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - created_at > self.max_age
    }
}

impl StalenessPolicy for MaxAge {
    fn is_stale(&self, entry: &EntryMeta, _current: Option<&Value>, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.is_expired(entry.created_at, now))
    }

    fn is_evictable(&self, entry: &EntryMeta, now: DateTime<Utc>) -> bool {
        self.is_expired(entry.created_at, now)
    }
}

/// Staleness decided by caller-supplied stamps.
///
/// The current stamp is computed once per lookup, before the callable runs,
/// and `is_expired(stored, current)` decides; the default comparator treats
/// any difference as stale. A new entry stores the current stamp, or the
/// expiration stamp computed after the run when one is configured. A typical current stamp is the digest of an input
/// file.
pub struct StampPolicy {
    current: Box<StampFn>,
    expiration: Option<Box<StampFn>>,
    is_expired: Box<StampComparator>,
}

impl StampPolicy {
    /// Creates a policy that recomputes whenever `current` changes.
    pub fn new<F>(current: F) -> Self
    where
        F: Fn(&Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            current: Box::new(current),
            expiration: None,
            is_expired: Box::new(|stored, current| stored != current),
        }
    }

    /// Stores a different stamp at write time than the one computed on lookup.
    pub fn with_expiration_stamp<F>(mut self, expiration: F) -> Self
    where
        F: Fn(&Args) -> Result<Value> + Send + Sync + 'static,
    {
        self.expiration = Some(Box::new(expiration));
        self
    }

    /// Replaces the comparator. It receives `(stored, current)`.
    pub fn with_comparator<C>(mut self, is_expired: C) -> Self
    where
        C: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.is_expired = Box::new(is_expired);
        self
    }
}

impl fmt::Debug for StampPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StampPolicy")
            .field("custom_expiration", &self.expiration.is_some())
            .finish_non_exhaustive()
    }
}

impl StalenessPolicy for StampPolicy {
    fn current_stamp(&self, args: &Args, _now: DateTime<Utc>) -> Result<Option<Value>> {
        (self.current)(args).map(Some)
    }

    fn stored_stamp(&self, args: &Args, current: Option<Value>) -> Result<Option<Value>> {
        match &self.expiration {
            Some(expiration) => expiration(args).map(Some),
            None => Ok(current),
        }
    }

    fn is_stale(&self, entry: &EntryMeta, current: Option<&Value>, _now: DateTime<Utc>) -> Result<bool> {
        Ok(match (&entry.stamp, current) {
            (Some(stored), Some(current)) => (self.is_expired)(stored, current),
            // Written under another policy; nothing to compare against.
            _ => true,
        })
    }
}

/// The default policy for an optional expiration window.
pub fn policy_for(expire_in_days: Option<f64>) -> Result<Arc<dyn StalenessPolicy>> {
    Ok(match expire_in_days {
        Some(days) => Arc::new(MaxAge::days(days)?),
        None => Arc::new(NeverExpire),
    })
}

pub(crate) fn validate_days(days: f64) -> Result<()> {
    if !days.is_finite() || days < 0.0 {
        return Err(MemoError::InvalidConfig(format!(
            "expire_in_days must be a finite, non-negative number, got {}",
            days
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn stale(policy: &dyn StalenessPolicy, entry: &EntryMeta, args: &Args, now: DateTime<Utc>) -> Result<bool> {
        let current = policy.current_stamp(args, now)?;
        policy.is_stale(entry, current.as_ref(), now)
    }

    fn write_stamp(policy: &dyn StalenessPolicy, args: &Args, now: DateTime<Utc>) -> Result<Option<Value>> {
        let current = policy.current_stamp(args, now)?;
        policy.stored_stamp(args, current)
    }

    fn meta(created_at: DateTime<Utc>, stamp: Option<Value>) -> EntryMeta {
        EntryMeta {
            created_at,
            last_accessed_at: created_at,
            stamp,
        }
    }

    #[test]
    fn test_never_expire() {
        let now = Utc::now();
        let old = meta(now - Duration::days(10_000), None);
        assert!(!stale(&NeverExpire, &old, &Args::new(), now).unwrap());
    }

    #[test_case(0.0, 0, false ; "zero window fresh at creation")]
    #[test_case(0.0, 1, true ; "zero window stale after a second")]
    #[test_case(1.0, 86_400, false ; "exactly one day is not past the window")]
    #[test_case(1.0, 86_401, true ; "one day and a second")]
    #[test_case(0.5, 43_201, true ; "fractional days")]
    fn test_max_age(days: f64, elapsed_secs: i64, expected: bool) {
        let policy = MaxAge::days(days).unwrap();
        let created = Utc::now();
        let now = created + Duration::seconds(elapsed_secs);
        assert_eq!(stale(&policy, &meta(created, None), &Args::new(), now).unwrap(), expected);
        assert_eq!(policy.is_evictable(&meta(created, None), now), expected);
    }

    #[test_case(-1.0 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(f64::INFINITY ; "infinite")]
    fn test_invalid_days_rejected(days: f64) {
        assert!(matches!(MaxAge::days(days), Err(MemoError::InvalidConfig(_))));
    }

    #[test]
    fn test_stamp_policy_defaults_to_inequality() {
        let policy = StampPolicy::new(|args: &Args| Ok(args.get(0).cloned().unwrap_or(Value::Null)));
        let now = Utc::now();
        let call = Args::new().arg("v1");

        let stamp = write_stamp(&policy, &call, now).unwrap();
        assert_eq!(stamp, Some(Value::from("v1")));

        let entry = meta(now, stamp);
        assert!(!stale(&policy, &entry, &call, now).unwrap());
        assert!(stale(&policy, &entry, &Args::new().arg("v2"), now).unwrap());
    }

    #[test]
    fn test_stamp_policy_custom_comparator_and_expiration() {
        // Stored stamp is a version number; stale once the current one is higher.
        let policy = StampPolicy::new(|args: &Args| Ok(args.get(0).cloned().unwrap_or(Value::Int(0))))
            .with_expiration_stamp(|_| Ok(Value::Int(5)))
            .with_comparator(|stored, current| current.compare(stored) == Some(std::cmp::Ordering::Greater));
        let now = Utc::now();

        let stamp = write_stamp(&policy, &Args::new().arg(1), now).unwrap();
        assert_eq!(stamp, Some(Value::Int(5)));

        let entry = meta(now, stamp);
        assert!(!stale(&policy, &entry, &Args::new().arg(5), now).unwrap());
        assert!(stale(&policy, &entry, &Args::new().arg(6), now).unwrap());
    }

    #[test]
    fn test_stamp_policy_without_stored_stamp_is_stale() {
        let policy = StampPolicy::new(|_| Ok(Value::from("x")));
        let now = Utc::now();
        assert!(stale(&policy, &meta(now, None), &Args::new(), now).unwrap());
    }

    #[test]
    fn test_stamp_errors_propagate() {
        let policy = StampPolicy::new(|_| Err(MemoError::Stamp("missing input".into())));
        let now = Utc::now();
        let err = stale(&policy, &meta(now, Some(Value::Null)), &Args::new(), now).unwrap_err();
        assert!(err.is_key_error());
    }

    #[test]
    fn test_stamp_entries_never_evictable() {
        let policy = StampPolicy::new(|_| Ok(Value::from("x")));
        let now = Utc::now();
        assert!(!policy.is_evictable(&meta(now - Duration::days(365), None), now));
        assert!(!NeverExpire.is_evictable(&meta(now - Duration::days(365), None), now));
    }

    #[test]
    fn test_policy_for() {
        let now = Utc::now();
        let entry = meta(now - Duration::days(3), None);
        assert!(!stale(&*policy_for(None).unwrap(), &entry, &Args::new(), now).unwrap());
        assert!(stale(&*policy_for(Some(2.0)).unwrap(), &entry, &Args::new(), now).unwrap());
        assert!(policy_for(Some(-2.0)).is_err());
    }
}
