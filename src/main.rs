use std::io::Write;
use std::process;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use check_gpg_key::{CheckConfig, CheckResult, Invocation, ServiceState, evaluate};

/// Environment variable holding an `EnvFilter` directive for diagnostics.
const LOG_ENV: &str = "CHECK_GPG_KEY_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let result = match CheckConfig::from_args(std::env::args_os(), Utc::now()) {
        Ok(Invocation::Check(config)) => evaluate(&config, &config.keyring()).await,
        Ok(Invocation::Info(text)) => {
            print!("{text}");
            let _ = std::io::stdout().flush();
            process::exit(ServiceState::Ok.code());
        }
        Err(e) => CheckResult::unknown(e.to_string()),
    };

    let code = result
        .report(&mut std::io::stdout().lock())
        .unwrap_or(ServiceState::Unknown.code());
    process::exit(code);
}

/// Diagnostics go to stderr and only when `CHECK_GPG_KEY_LOG` is set, so
/// stdout carries nothing but the status line.
fn init_logging() {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
