//! Turns keyring facts about one key into a single health state.
//!
//! Evaluation is strictly sequential and stops at the first terminal outcome:
//!
//! 1. the key must exist locally, otherwise UNKNOWN
//! 2. the key is refreshed when enabled, a failure is UNKNOWN
//! 3. a revoked key is CRITICAL
//! 4. primary keys are checked in listing order; the first expired one is
//!    CRITICAL, the first one inside the warning window is WARNING
//! 5. otherwise OK
//!
//! Only the first problem among several matching primary keys is reported.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::CheckConfig;
use crate::keyring::KeyringAccessor;
use crate::types::{CheckResult, KeyExpiry};

const SECONDS_PER_DAY: i64 = 86_400;

/// Runs the key check described by `config` against `keyring`.
///
/// Keyring failures never escape as errors: they become an UNKNOWN result
/// carrying the underlying error text.
pub async fn evaluate<K>(config: &CheckConfig, keyring: &K) -> CheckResult
where
    K: KeyringAccessor + ?Sized,
{
    let keyid = config.key_id();

    if let Err(e) = keyring.exists(keyid).await {
        warn!(keyid, error = %e, "key existence check failed");
        return CheckResult::unknown(format!("cannot find key {}: {}", keyid, e));
    }

    if config.use_refresh() {
        debug!(keyid, "refreshing key");
        if let Err(e) = keyring.refresh(keyid).await {
            warn!(keyid, error = %e, "key refresh failed");
            return CheckResult::unknown(format!("failed to refresh key {}: {}", keyid, e));
        }
    }

    match keyring.is_revoked(keyid).await {
        Ok(true) => return CheckResult::critical(format!("key {} has been revoked", keyid)),
        Ok(false) => debug!(keyid, "no revocation found"),
        Err(e) => {
            return CheckResult::unknown(format!(
                "failed to check revocation of key {}: {}",
                keyid, e
            ));
        }
    }

    let records = match keyring.list_expiry(keyid).await {
        Ok(records) => records,
        Err(e) => {
            return CheckResult::unknown(format!(
                "failed to read expiration of key {}: {}",
                keyid, e
            ));
        }
    };

    debug!(keyid, count = records.len(), "checking primary key expiry");
    let (now, threshold) = (config.now(), config.warning_threshold());
    for record in &records {
        if let Some(result) = check_expiry(keyid, record, now, threshold) {
            return result;
        }
    }

    CheckResult::ok(format!("key {} is neither revoked nor expiring", keyid))
}

/// Outcome for a single primary key, or `None` when it is healthy.
fn check_expiry(
    keyid: &str,
    record: &KeyExpiry,
    now: DateTime<Utc>,
    warning_threshold: Option<DateTime<Utc>>,
) -> Option<CheckResult> {
    let expires_at = record.expires_at?;
    let label = describe(keyid, record);

    if expires_at <= now {
        return Some(CheckResult::critical(format!(
            "{} expired on {}",
            label,
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        )));
    }

    match warning_threshold {
        Some(threshold) if threshold > expires_at => {
            let days_left = (expires_at - now).num_seconds().div_euclid(SECONDS_PER_DAY);
            Some(CheckResult::warning(format!(
                "{} expires in {} days ({})",
                label,
                days_left,
                expires_at.format("%Y-%m-%d %H:%M:%S UTC")
            )))
        }
        _ => None,
    }
}

/// Names the matched primary key, adding its long ID when the selector differs.
fn describe(keyid: &str, record: &KeyExpiry) -> String {
    if record.key_id.is_empty() || keyid.eq_ignore_ascii_case(&record.key_id) {
        format!("key {}", keyid)
    } else {
        format!("key {} ({})", keyid, record.key_id)
    }
}
