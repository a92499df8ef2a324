use std::io::{self, Write};

use crate::types::CheckResult;

/// Status line as expected by the monitoring framework. Multi-line messages
/// (gpg stderr, mostly) are folded onto one line.
impl std::fmt::Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.state)?;
        for (i, line) in self.message.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(line.trim())?;
        }
        Ok(())
    }
}

impl CheckResult {
    /// Plugin exit code for this result.
    pub fn exit_code(&self) -> i32 {
        self.state.code()
    }

    /// Writes the status line to `out` and returns the exit code to use.
    pub fn report<W: Write>(&self, out: &mut W) -> io::Result<i32> {
        writeln!(out, "{}", self)?;
        out.flush()?;
        Ok(self.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceState;

    #[test]
    fn test_status_line() {
        let result = CheckResult::critical("key DEADBEEF has been revoked");
        assert_eq!(result.to_string(), "CRITICAL: key DEADBEEF has been revoked");
    }

    #[test]
    fn test_multiline_message_folded() {
        let result = CheckResult::unknown(
            "failed to refresh key DEADBEEF: gpg exited with status 2: gpg: keyserver refresh failed\ngpg: No keyserver available\n",
        );
        assert_eq!(
            result.to_string(),
            "UNKNOWN: failed to refresh key DEADBEEF: gpg exited with status 2: \
             gpg: keyserver refresh failed; gpg: No keyserver available"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CheckResult::ok("").exit_code(), 0);
        assert_eq!(CheckResult::warning("").exit_code(), 1);
        assert_eq!(CheckResult::critical("").exit_code(), 2);
        assert_eq!(CheckResult::unknown("").exit_code(), 3);
    }

    #[test]
    fn test_report_writes_single_line() {
        let result = CheckResult::warning("key DEADBEEF expires in 5 days");
        let mut out = Vec::new();

        let code = result.report(&mut out).unwrap();

        assert_eq!(code, ServiceState::Warning.code());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "WARNING: key DEADBEEF expires in 5 days\n"
        );
    }
}
