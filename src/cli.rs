use clap::Parser;
use std::path::PathBuf;

use mailpush::config::{
    AppConfig, Concurrency, DEFAULT_MAX_CONCURRENT, DEFAULT_SOCKET_PATH, Environment, LogTarget,
};

pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Exit(u8),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();

    let concurrency = match resolve_concurrency(&cli) {
        Ok(concurrency) => concurrency,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };

    RunOutcome::Serve(into_config(cli, concurrency))
}

/// Listens on a Unix socket and sends new-mail notifications to devices.
///
/// The expected input on the socket is a single line holding the path to a
/// Maildir, e.g. `echo /path/to/maildir | nc -U /var/run/courier/courierapns.socket`.
#[derive(Parser, Debug)]
#[command(name = "mailpush", version)]
struct Cli {
    /// Path to certificate file.
    crt: PathBuf,
    /// Path to private key file.
    key: PathBuf,
    /// Path to use for the Unix socket.
    #[arg(short, long, env = "MAILPUSH_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,
    /// Use syslog instead of standard error.
    #[arg(short = 'd', long, env = "MAILPUSH_SYSLOG")]
    syslog: bool,
    /// Enable concurrent request handling.
    #[arg(short, long, env = "MAILPUSH_CONCURRENT")]
    concurrent: bool,
    /// Upper bound on requests in flight when concurrent.
    #[arg(long, env = "MAILPUSH_MAX_CONCURRENT", default_value_t = DEFAULT_MAX_CONCURRENT)]
    max_concurrent: usize,
    /// Send to the development push environment.
    #[arg(long, env = "MAILPUSH_SANDBOX")]
    sandbox: bool,
    #[arg(long, env = "MAILPUSH_LOG", default_value = "info")]
    log_level: String,
}

fn resolve_concurrency(cli: &Cli) -> Result<Concurrency, String> {
    if !cli.concurrent {
        return Ok(Concurrency::Serialized);
    }
    if cli.max_concurrent == 0 {
        return Err("--max-concurrent must be greater than 0".to_string());
    }
    Ok(Concurrency::Concurrent {
        max_in_flight: cli.max_concurrent,
    })
}

fn into_config(cli: Cli, concurrency: Concurrency) -> AppConfig {
    AppConfig {
        certificate: cli.crt,
        private_key: cli.key,
        socket: cli.socket,
        log_target: if cli.syslog {
            LogTarget::Syslog
        } else {
            LogTarget::Stderr
        },
        log_level: cli.log_level,
        concurrency,
        environment: if cli.sandbox {
            Environment::Sandbox
        } else {
            Environment::Production
        },
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("parse args")
    }

    #[test]
    fn cli__should_apply_defaults() {
        // When
        let cli = parse(&["mailpush", "cert.pem", "key.pem"]);
        let concurrency = resolve_concurrency(&cli).expect("concurrency");
        let config = into_config(cli, concurrency);

        // Then
        assert_eq!(config.certificate, PathBuf::from("cert.pem"));
        assert_eq!(config.private_key, PathBuf::from("key.pem"));
        assert_eq!(config.socket, PathBuf::from(DEFAULT_SOCKET_PATH));
        assert_eq!(config.log_target, LogTarget::Stderr);
        assert_eq!(config.concurrency, Concurrency::Serialized);
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn cli__should_parse_short_flags() {
        // When
        let cli = parse(&[
            "mailpush", "-d", "-c", "-s", "/tmp/push.sock", "cert.pem", "key.pem",
        ]);
        let concurrency = resolve_concurrency(&cli).expect("concurrency");
        let config = into_config(cli, concurrency);

        // Then
        assert_eq!(config.socket, PathBuf::from("/tmp/push.sock"));
        assert_eq!(config.log_target, LogTarget::Syslog);
        assert_eq!(
            config.concurrency,
            Concurrency::Concurrent {
                max_in_flight: DEFAULT_MAX_CONCURRENT
            }
        );
    }

    #[test]
    fn cli__should_require_certificate_and_key() {
        assert!(Cli::try_parse_from(["mailpush", "cert.pem"]).is_err());
    }

    #[test]
    fn resolve_concurrency__should_reject_zero_bound() {
        // Given
        let cli = parse(&[
            "mailpush",
            "--concurrent",
            "--max-concurrent",
            "0",
            "cert.pem",
            "key.pem",
        ]);

        // Then
        assert!(resolve_concurrency(&cli).is_err());
    }

    #[test]
    fn resolve_concurrency__should_ignore_bound_when_serialized() {
        let cli = parse(&["mailpush", "--max-concurrent", "0", "cert.pem", "key.pem"]);

        assert_eq!(
            resolve_concurrency(&cli).expect("concurrency"),
            Concurrency::Serialized
        );
    }
}
