use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Validates a key selector before passing it to gpg.
///
/// Accepted formats:
/// - 8, 16 or 40 hex characters, optionally with a "0x" prefix
/// - Any other selector gpg understands (e-mail address, user ID substring,
///   v5 fingerprint)
///
/// Key IDs of 8, 16 or 40 hex characters are normalized to uppercase without
/// prefix. Other selectors are returned unchanged. Selectors starting with '-' are rejected since gpg would
/// read them as options.
pub fn validate_keyid(keyid: &str) -> Result<String> {
    if keyid.trim().is_empty() {
        return Err(Error::InvalidKeyId {
            keyid: keyid.to_string(),
            reason: "key ID cannot be empty".to_string(),
        });
    }

    if keyid.starts_with('-') {
        return Err(Error::InvalidKeyId {
            keyid: keyid.to_string(),
            reason: "key ID must not start with '-'".to_string(),
        });
    }

    if keyid.chars().any(char::is_control) {
        return Err(Error::InvalidKeyId {
            keyid: keyid.to_string(),
            reason: "key ID must not contain control characters".to_string(),
        });
    }

    let unprefixed = keyid
        .strip_prefix("0x")
        .or_else(|| keyid.strip_prefix("0X"))
        .unwrap_or(keyid);

    let is_key_id = matches!(unprefixed.len(), 8 | 16 | 40)
        && unprefixed.chars().all(|c| c.is_ascii_hexdigit());
    if is_key_id {
        return Ok(unprefixed.to_uppercase());
    }

    Ok(keyid.to_string())
}

/// Validates the `-w` argument: a whole, non-negative number of days.
pub fn validate_warning_days(value: &str) -> Result<u32> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidWarningDays {
            value: value.to_string(),
            reason: "must be a non-negative integer".to_string(),
        });
    }

    value.parse().map_err(|_| Error::InvalidWarningDays {
        value: value.to_string(),
        reason: "value is out of range".to_string(),
    })
}

/// Validates the `--refresh-timeout` argument: a positive number of seconds.
pub fn validate_timeout_secs(value: &str) -> Result<u64> {
    let invalid = |reason: &str| Error::InvalidTimeout {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("must be a positive integer"));
    }

    match value.parse::<u64>() {
        Ok(0) => Err(invalid("must be a positive integer")),
        Ok(secs) => Ok(secs),
        Err(_) => Err(invalid("value is out of range")),
    }
}

/// Validates a GnuPG home directory: it must exist and be a directory.
pub fn validate_homedir(path: &Path) -> Result<PathBuf> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(path.to_path_buf()),
        Ok(_) => Err(Error::InvalidHomedir {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(e) => Err(Error::InvalidHomedir {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
