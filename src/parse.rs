use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::KeyExpiry;

/// Field index of the key ID in `pub` records.
const KEYID_FIELD: usize = 4;
/// Field index of the expiration date in `pub` records.
const EXPIRES_FIELD: usize = 6;

/// Extracts one [`KeyExpiry`] per `pub` record of a `--list-keys --with-colons`
/// listing, in listing order.
///
/// A missing or empty expiration field means the key never expires. A
/// non-numeric one is treated as unparseable output.
pub fn parse_expiry_records(output: &str) -> Result<Vec<KeyExpiry>> {
    let mut records = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split(':').collect();

        match fields[0] {
            "pub" => {
                let key_id = fields.get(KEYID_FIELD).copied().unwrap_or_default();
                let expires_at = match fields.get(EXPIRES_FIELD) {
                    Some(raw) => parse_timestamp(raw).map_err(|reason| Error::MalformedOutput {
                        line: line.to_string(),
                        reason,
                    })?,
                    None => None,
                };

                debug!(key_id, ?expires_at, "found primary key record");
                records.push(KeyExpiry {
                    key_id: key_id.to_string(),
                    expires_at,
                });
            }
            "fpr" | "uid" | "sub" | "ssb" | "uat" | "rev" | "tru" | "grp" | "sig" => {}
            record_type if !record_type.is_empty() => {
                debug!(record_type, "skipping unknown GPG record type");
            }
            _ => {}
        }
    }

    Ok(records)
}

/// Reports whether a `--check-sigs --with-colons` listing contains a
/// revocation signature record.
pub fn parse_revocation(output: &str) -> bool {
    output.lines().any(|line| {
        let revoked = line.split(':').next() == Some("rev");
        if revoked {
            debug!(line, "found revocation signature");
        }
        revoked
    })
}

fn parse_timestamp(s: &str) -> std::result::Result<Option<DateTime<Utc>>, String> {
    if s.is_empty() {
        return Ok(None);
    }

    let ts: i64 = s
        .parse()
        .map_err(|_| format!("expiration '{}' is not an epoch timestamp", s))?;

    DateTime::from_timestamp(ts, 0)
        .map(Some)
        .ok_or_else(|| format!("expiration '{}' is out of range", s))
}
