use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use check_gpg_key::{
    CheckConfig, CheckResult, Error, GpgKeyring, KeyExpiry, KeyringAccessor, Result,
    ServiceState, evaluate,
};

/// Keyring returning canned answers and recording which queries ran.
#[derive(Default)]
struct FakeKeyring {
    missing: bool,
    refresh_fails: bool,
    revoked: bool,
    revocation_fails: bool,
    expiry: Vec<KeyExpiry>,
    expiry_fails: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeKeyring {
    fn with_expiry(expiry: Vec<KeyExpiry>) -> Self {
        Self {
            expiry,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl KeyringAccessor for FakeKeyring {
    async fn exists(&self, keyid: &str) -> Result<()> {
        self.record("exists");
        if self.missing {
            return Err(Error::KeyNotFound(keyid.to_string()));
        }
        Ok(())
    }

    async fn refresh(&self, _keyid: &str) -> Result<()> {
        self.record("refresh");
        if self.refresh_fails {
            return Err(Error::Gpg {
                status: 2,
                stderr: "gpg: keyserver refresh failed: No keyserver available".to_string(),
            });
        }
        Ok(())
    }

    async fn is_revoked(&self, _keyid: &str) -> Result<bool> {
        self.record("is_revoked");
        if self.revocation_fails {
            return Err(Error::PermissionDenied);
        }
        Ok(self.revoked)
    }

    async fn list_expiry(&self, _keyid: &str) -> Result<Vec<KeyExpiry>> {
        self.record("list_expiry");
        if self.expiry_fails {
            return Err(Error::MalformedOutput {
                line: "pub:f:4096:1:DEADBEEF12345678:1400000000:soon:".to_string(),
                reason: "expiration 'soon' is not an epoch timestamp".to_string(),
            });
        }
        Ok(self.expiry.clone())
    }
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn days_from_now(days: i64) -> DateTime<Utc> {
    now() + TimeDelta::days(days)
}

fn config() -> CheckConfig {
    CheckConfig::new("786C63F330D7CB92", now()).unwrap()
}

#[tokio::test]
async fn test_missing_key_is_unknown() {
    let keyring = FakeKeyring {
        missing: true,
        revoked: true,
        ..FakeKeyring::default()
    };

    let result = evaluate(&config(), &keyring).await;

    assert_eq!(result.state, ServiceState::Unknown);
    assert_eq!(result.exit_code(), 3);
    assert!(result.message.contains("key not found: 786C63F330D7CB92"));
    assert_eq!(keyring.calls(), ["exists"]);
}

#[tokio::test]
async fn test_refresh_failure_is_unknown() {
    let keyring = FakeKeyring {
        refresh_fails: true,
        revoked: true,
        ..FakeKeyring::default()
    };

    let result = evaluate(&config(), &keyring).await;

    assert_eq!(result.state, ServiceState::Unknown);
    assert!(result.message.contains("No keyserver available"));
    assert_eq!(keyring.calls(), ["exists", "refresh"]);
}

#[tokio::test]
async fn test_no_refresh_skips_refresh() {
    let keyring = FakeKeyring {
        refresh_fails: true,
        ..FakeKeyring::default()
    };

    let result = evaluate(&config().with_refresh(false), &keyring).await;

    assert_eq!(result.state, ServiceState::Ok);
    assert_eq!(keyring.calls(), ["exists", "is_revoked", "list_expiry"]);
}

#[tokio::test]
async fn test_revoked_key_is_critical_even_if_not_expiring() {
    let keyring = FakeKeyring {
        revoked: true,
        expiry: vec![KeyExpiry::expiring_at("786C63F330D7CB92", days_from_now(400))],
        ..FakeKeyring::default()
    };

    let result = evaluate(&config().with_warning_days(10).unwrap(), &keyring).await;

    assert_eq!(
        result,
        CheckResult::critical("key 786C63F330D7CB92 has been revoked")
    );
    assert_eq!(result.exit_code(), 2);
    assert_eq!(keyring.calls(), ["exists", "refresh", "is_revoked"]);
}

#[tokio::test]
async fn test_revocation_reported_before_expiry() {
    let keyring = FakeKeyring {
        revoked: true,
        expiry: vec![KeyExpiry::expiring_at("786C63F330D7CB92", days_from_now(-30))],
        ..FakeKeyring::default()
    };

    let result = evaluate(&config().with_warning_days(10).unwrap(), &keyring).await;

    assert_eq!(
        result,
        CheckResult::critical("key 786C63F330D7CB92 has been revoked")
    );
    assert_eq!(result.exit_code(), 2);
    assert_eq!(keyring.calls(), ["exists", "refresh", "is_revoked"]);
}

#[tokio::test]
async fn test_revocation_lookup_failure_is_unknown() {
    let keyring = FakeKeyring {
        revocation_fails: true,
        ..FakeKeyring::default()
    };

    let result = evaluate(&config(), &keyring).await;

    assert_eq!(result.state, ServiceState::Unknown);
    assert!(result.message.contains("permission denied"));
}

#[tokio::test]
async fn test_expired_key_is_critical_with_date() {
    let keyring = FakeKeyring::with_expiry(vec![KeyExpiry::expiring_at(
        "786C63F330D7CB92",
        days_from_now(-3),
    )]);

    let result = evaluate(&config(), &keyring).await;

    assert_eq!(result.state, ServiceState::Critical);
    assert_eq!(
        result.message,
        "key 786C63F330D7CB92 expired on 2023-11-11 22:13:20 UTC"
    );
}

#[tokio::test]
async fn test_expiring_key_within_threshold_is_warning() {
    let keyring = FakeKeyring::with_expiry(vec![KeyExpiry::expiring_at(
        "786C63F330D7CB92",
        days_from_now(5),
    )]);

    let result = evaluate(&config().with_warning_days(10).unwrap(), &keyring).await;

    assert_eq!(result.state, ServiceState::Warning);
    assert_eq!(result.exit_code(), 1);
    assert!(
        result.message.contains("expires in 5 days"),
        "{}",
        result.message
    );
}

#[tokio::test]
async fn test_key_outside_threshold_is_ok() {
    let keyring = FakeKeyring::with_expiry(vec![KeyExpiry::expiring_at(
        "786C63F330D7CB92",
        days_from_now(20),
    )]);

    let result = evaluate(&config().with_warning_days(10).unwrap(), &keyring).await;

    assert_eq!(result.state, ServiceState::Ok);
    assert_eq!(result.exit_code(), 0);
}

#[tokio::test]
async fn test_expiring_key_without_threshold_is_ok() {
    let keyring = FakeKeyring::with_expiry(vec![KeyExpiry::expiring_at(
        "786C63F330D7CB92",
        days_from_now(1),
    )]);

    let result = evaluate(&config(), &keyring).await;

    assert_eq!(result.state, ServiceState::Ok);
}

#[tokio::test]
async fn test_never_expiring_key_is_ok() {
    let keyring =
        FakeKeyring::with_expiry(vec![KeyExpiry::never_expires("786C63F330D7CB92")]);

    let result = evaluate(&config().with_warning_days(3650).unwrap(), &keyring).await;

    assert_eq!(result.state, ServiceState::Ok);
}

#[tokio::test]
async fn test_no_records_is_ok() {
    let keyring = FakeKeyring::default();

    let result = evaluate(&config(), &keyring).await;

    assert_eq!(result.state, ServiceState::Ok);
}

#[tokio::test]
async fn test_expiry_lookup_failure_is_unknown() {
    let keyring = FakeKeyring {
        expiry_fails: true,
        ..FakeKeyring::default()
    };

    let result = evaluate(&config(), &keyring).await;

    assert_eq!(result.state, ServiceState::Unknown);
    assert!(result.message.contains("not an epoch timestamp"));
}

#[tokio::test]
async fn test_first_problem_wins_across_matching_keys() {
    let keyring = FakeKeyring::with_expiry(vec![
        KeyExpiry::never_expires("1111111111111111"),
        KeyExpiry::expiring_at("2222222222222222", days_from_now(5)),
        KeyExpiry::expiring_at("3333333333333333", days_from_now(-1)),
    ]);
    let config = CheckConfig::new("release@example.org", now())
        .unwrap()
        .with_warning_days(10)
        .unwrap();

    let result = evaluate(&config, &keyring).await;

    assert_eq!(result.state, ServiceState::Warning);
    assert!(
        result.message.contains("2222222222222222"),
        "{}",
        result.message
    );
}

#[tokio::test]
async fn test_healthy_first_key_does_not_hide_later_expiry() {
    let keyring = FakeKeyring::with_expiry(vec![
        KeyExpiry::expiring_at("1111111111111111", days_from_now(100)),
        KeyExpiry::expiring_at("2222222222222222", days_from_now(-1)),
    ]);

    let result = evaluate(&config().with_warning_days(10).unwrap(), &keyring).await;

    assert_eq!(result.state, ServiceState::Critical);
    assert!(result.message.contains("2222222222222222"));
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let keyring = FakeKeyring::with_expiry(vec![KeyExpiry::expiring_at(
        "786C63F330D7CB92",
        days_from_now(7),
    )]);
    let config = config()
        .with_refresh(false)
        .with_warning_days(14)
        .unwrap();

    let first = evaluate(&config, &keyring).await;
    let second = evaluate(&config, &keyring).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_accessor_as_trait_object() {
    let keyring: Box<dyn KeyringAccessor> = Box::new(FakeKeyring::default());

    let result = evaluate(&config(), keyring.as_ref()).await;

    assert_eq!(result.state, ServiceState::Ok);
}

#[tokio::test]
#[ignore]
async fn test_real_keyring_missing_key() {
    let keyring = GpgKeyring::new();
    let result = keyring.exists("0000000000000000000000000000000000000000").await;

    assert!(matches!(result, Err(Error::KeyNotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_real_keyring_empty_homedir() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = CheckConfig::new("DEADBEEF", Utc::now())
        .unwrap()
        .with_homedir(dir.path())
        .unwrap()
        .with_refresh(false);

    let result = evaluate(&config, &config.keyring()).await;

    assert_eq!(result.state, ServiceState::Unknown);
}
