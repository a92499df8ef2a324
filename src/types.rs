use chrono::{DateTime, Utc};

/// Expiration data for one primary key matched by a key selector.
///
/// A selector such as an e-mail address can match more than one primary key,
/// in which case the keyring reports one record per key, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExpiry {
    /// Long key ID from the listing. Empty if gpg did not report one.
    pub key_id: String,
    /// `None` means the key never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl KeyExpiry {
    pub fn never_expires(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            expires_at: None,
        }
    }

    pub fn expiring_at(key_id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            key_id: key_id.into(),
            expires_at: Some(expires_at),
        }
    }
}

/// Health state reported to the monitoring framework.
///
/// Values follow the Nagios plugin conventions. `Dependent` exists for
/// completeness and is never produced by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
    Dependent,
}

impl ServiceState {
    /// Plugin exit code for this state.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
            Self::Dependent => 4,
        }
    }

    /// Upper-case word that prefixes the status line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
            Self::Dependent => "DEPENDENT",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a single key check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub state: ServiceState,
    pub message: String,
}

impl CheckResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(ServiceState::Ok, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ServiceState::Warning, message)
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(ServiceState::Critical, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ServiceState::Unknown, message)
    }

    fn new(state: ServiceState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}
