use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("command execution failed: {0}")]
    Command(#[from] io::Error),

    #[error("gpg exited with status {status}: {stderr}")]
    Gpg { status: i32, stderr: String },

    #[error("invalid key ID '{keyid}': {reason}")]
    InvalidKeyId { keyid: String, reason: String },

    #[error("missing required argument: key ID")]
    MissingKeyId,

    #[error("invalid warning threshold '{value}': {reason}")]
    InvalidWarningDays { value: String, reason: String },

    #[error("invalid refresh timeout '{value}': {reason}")]
    InvalidTimeout { value: String, reason: String },

    #[error("invalid GnuPG home directory '{}': {reason}", path.display())]
    InvalidHomedir { path: PathBuf, reason: String },

    #[error("invalid arguments: {0}")]
    Usage(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("keyring not initialized")]
    KeyringNotInitialized,

    #[error("permission denied reading keyring")]
    PermissionDenied,

    #[error("malformed gpg output on line '{line}': {reason}")]
    MalformedOutput { line: String, reason: String },

    #[error("operation timed out after {0} seconds")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
