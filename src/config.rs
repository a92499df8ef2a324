use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use clap::error::ErrorKind;

use crate::error::{Error, Result};
use crate::keyring::GpgKeyring;
use crate::validation::{
    validate_homedir, validate_keyid, validate_timeout_secs, validate_warning_days,
};

/// Command line surface of `check_gpg_key`.
///
/// Values are taken as strings and validated separately so that every
/// malformed argument is reported the same way as any other check failure.
#[derive(Debug, Parser)]
#[command(name = "check_gpg_key", version)]
#[command(about = "Report expiry and revocation state of a GPG key as a monitoring check")]
struct Cli {
    /// Report WARNING if the key expires within this many days
    #[arg(short = 'w', value_name = "DAYS", allow_hyphen_values = true)]
    warning_days: Option<String>,

    /// Do not refresh the key from keyservers before checking
    #[arg(long)]
    no_refresh: bool,

    /// GnuPG home directory holding the keyring
    #[arg(long, value_name = "PATH", env = "GNUPGHOME")]
    gnupg_homedir: Option<PathBuf>,

    /// Give up on the keyserver refresh after this many seconds
    #[arg(long, value_name = "SECS")]
    refresh_timeout: Option<String>,

    /// Key ID, fingerprint or user ID of the key to check
    key_id: Option<String>,
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Run the key check.
    Check(CheckConfig),
    /// Print this `--help` or `--version` text and exit successfully.
    Info(String),
}

/// Validated parameters for one key check.
///
/// Built once per invocation and never modified afterwards. The warning
/// threshold is stored as an absolute instant derived from `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    key_id: String,
    warning_threshold: Option<DateTime<Utc>>,
    use_refresh: bool,
    homedir: Option<PathBuf>,
    refresh_timeout: Option<Duration>,
    now: DateTime<Utc>,
}

impl CheckConfig {
    /// Creates a configuration with refresh enabled and no warning threshold.
    pub fn new(key_id: &str, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            key_id: validate_keyid(key_id)?,
            warning_threshold: None,
            use_refresh: true,
            homedir: None,
            refresh_timeout: None,
            now,
        })
    }

    /// Sets the warning threshold to `now + days`.
    pub fn with_warning_days(mut self, days: u32) -> Result<Self> {
        let threshold = TimeDelta::try_days(i64::from(days))
            .and_then(|delta| self.now.checked_add_signed(delta))
            .ok_or_else(|| Error::InvalidWarningDays {
                value: days.to_string(),
                reason: "value is out of range".to_string(),
            })?;
        self.warning_threshold = Some(threshold);
        Ok(self)
    }

    #[must_use]
    pub fn with_refresh(mut self, use_refresh: bool) -> Self {
        self.use_refresh = use_refresh;
        self
    }

    pub fn with_homedir(mut self, path: &Path) -> Result<Self> {
        self.homedir = Some(validate_homedir(path)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Parses command line arguments (including the program name).
    ///
    /// `--help` and `--version` yield [`Invocation::Info`] with the text to
    /// print. Every other problem is returned as an error.
    pub fn from_args<I, T>(args: I, now: DateTime<Utc>) -> Result<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                return Ok(Invocation::Info(e.render().to_string()));
            }
            Err(e) => return Err(Error::Usage(usage_message(&e))),
        };

        Self::from_cli(cli, now).map(Invocation::Check)
    }

    fn from_cli(cli: Cli, now: DateTime<Utc>) -> Result<Self> {

        let key_id = cli.key_id.ok_or(Error::MissingKeyId)?;
        let mut config = Self::new(&key_id, now)?.with_refresh(!cli.no_refresh);

        if let Some(days) = cli.warning_days {
            config = config.with_warning_days(validate_warning_days(&days)?)?;
        }

        if let Some(path) = cli.gnupg_homedir {
            config = config.with_homedir(&path)?;
        }

        if let Some(secs) = cli.refresh_timeout {
            let secs = validate_timeout_secs(&secs)?;
            config = config.with_refresh_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn warning_threshold(&self) -> Option<DateTime<Utc>> {
        self.warning_threshold
    }

    pub fn use_refresh(&self) -> bool {
        self.use_refresh
    }

    pub fn homedir(&self) -> Option<&Path> {
        self.homedir.as_deref()
    }

    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.refresh_timeout
    }

    /// Time the check was started at. All expiry comparisons use this instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Builds the gpg-backed keyring this configuration points at.
    pub fn keyring(&self) -> GpgKeyring {
        let mut keyring = GpgKeyring::new();
        if let Some(homedir) = &self.homedir {
            keyring = keyring.with_homedir(homedir);
        }
        if let Some(timeout) = self.refresh_timeout {
            keyring = keyring.with_refresh_timeout(timeout);
        }
        keyring
    }
}

/// First line of a clap error without its "error: " prefix.
fn usage_message(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}
