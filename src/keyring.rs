use std::path::PathBuf;
use std::process::{ExitStatus, Output};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};
use crate::parse::{parse_expiry_records, parse_revocation};
use crate::types::KeyExpiry;

/// Queries the evaluator needs from a keyring.
///
/// [`GpgKeyring`] answers them by running `gpg`. Tests substitute a fake
/// returning canned records.
#[async_trait]
pub trait KeyringAccessor: Send + Sync {
    /// Fails with [`Error::KeyNotFound`] if the key is not in the local keyring.
    async fn exists(&self, keyid: &str) -> Result<()>;

    /// Fetches current key data from the configured keyservers.
    async fn refresh(&self, keyid: &str) -> Result<()>;

    /// Whether any revocation signature is present on the key.
    async fn is_revoked(&self, keyid: &str) -> Result<bool>;

    /// One record per primary key matching `keyid`, in the order gpg lists them.
    async fn list_expiry(&self, keyid: &str) -> Result<Vec<KeyExpiry>>;
}

/// Keyring backed by the `gpg` command line tool.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> check_gpg_key::Result<()> {
/// use check_gpg_key::{GpgKeyring, KeyringAccessor};
///
/// let keyring = GpgKeyring::new().with_homedir("/var/lib/monitoring/gnupg");
/// for record in keyring.list_expiry("786C63F330D7CB92").await? {
///     println!("{} expires {:?}", record.key_id, record.expires_at);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct GpgKeyring {
    gpg_homedir: Option<PathBuf>,
    refresh_timeout: Option<Duration>,
}

impl GpgKeyring {
    /// Creates a keyring using gpg's default home directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets a specific GnuPG home directory instead of gpg's default.
    #[must_use]
    pub fn with_homedir(mut self, path: impl Into<PathBuf>) -> Self {
        self.gpg_homedir = Some(path.into());
        self
    }

    /// Abandons [`refresh`](KeyringAccessor::refresh) after `timeout`.
    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    fn gpg(&self) -> Command {
        let mut cmd = Command::new("gpg");
        cmd.env("LC_ALL", "C").arg("--batch");
        if let Some(homedir) = &self.gpg_homedir {
            cmd.arg(format!("--homedir={}", homedir.display()));
        }
        cmd.kill_on_drop(true);
        cmd
    }

    async fn run_gpg(&self, args: &[&str], keyid: &str) -> Result<Output> {
        debug!(?args, keyid, homedir = ?self.gpg_homedir, "running gpg");

        let output = self.gpg().args(args).arg("--").arg(keyid).output().await?;

        if !output.status.success() {
            return Err(self.check_error(output.status, &output.stderr, keyid));
        }

        Ok(output)
    }

    async fn list_with_colons(&self, listing: &str, keyid: &str) -> Result<String> {
        let output = self.run_gpg(&[listing, "--with-colons"], keyid).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn check_error(&self, status: ExitStatus, stderr: &[u8], keyid: &str) -> Error {
        let homedir = self
            .gpg_homedir
            .as_ref()
            .map(|p| p.display().to_string());
        check_gpg_error(homedir.as_deref(), status, stderr, keyid)
    }
}

#[async_trait]
impl KeyringAccessor for GpgKeyring {
    async fn exists(&self, keyid: &str) -> Result<()> {
        let listing = self.list_with_colons("--list-keys", keyid).await?;
        if listing.lines().any(|line| line.starts_with("pub:")) {
            Ok(())
        } else {
            Err(Error::KeyNotFound(keyid.to_string()))
        }
    }

    async fn refresh(&self, keyid: &str) -> Result<()> {
        let refresh = self.run_gpg(&["--refresh-keys"], keyid);

        match self.refresh_timeout {
            Some(timeout) => tokio::time::timeout(timeout, refresh)
                .await
                .map_err(|_| Error::Timeout(timeout.as_secs()))?
                .map(drop),
            None => refresh.await.map(drop),
        }
    }

    async fn is_revoked(&self, keyid: &str) -> Result<bool> {
        let listing = self.list_with_colons("--check-sigs", keyid).await?;
        Ok(parse_revocation(&listing))
    }

    async fn list_expiry(&self, keyid: &str) -> Result<Vec<KeyExpiry>> {
        let listing = self.list_with_colons("--list-keys", keyid).await?;
        parse_expiry_records(&listing)
    }
}

fn check_gpg_error(
    homedir: Option<&str>,
    status: ExitStatus,
    stderr: &[u8],
    keyid: &str,
) -> Error {
    let msg = String::from_utf8_lossy(stderr);

    if msg.contains("Permission denied") || msg.contains("permission denied") {
        return Error::PermissionDenied;
    }

    if msg.contains("No public key") {
        return Error::KeyNotFound(keyid.to_string());
    }

    if let Some(dir) = homedir
        && msg.contains("No such file or directory")
        && msg.contains(dir)
    {
        return Error::KeyringNotInitialized;
    }

    Error::Gpg {
        status: status.code().unwrap_or(-1),
        stderr: msg.trim().to_string(),
    }
}
