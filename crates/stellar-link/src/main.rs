mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::exit::{CliError, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "stellar-link",
    version,
    about = "Local IPC listener for robot diagnostics messages"
)]
struct Cli {
    /// Output format for listener reports (stdout).
    #[arg(long, value_name = "FORMAT", default_value = "pretty", global = true)]
    format: OutputFormat,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))
        .and_then(|runtime| runtime.block_on(cmd::run(cli.command, cli.format)));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn listen_defaults_to_well_known_socket() {
        let cli = Cli::try_parse_from(["stellar-link", "listen"]).expect("listen should parse");
        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.path, PathBuf::from("/tmp/unixSocket"));
                assert!(!args.once);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.format, OutputFormat::Pretty);
    }

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "stellar-link",
            "send",
            "/tmp/test.sock",
            "--json",
            "{\"current_position\":1}",
        ])
        .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "stellar-link",
            "send",
            "/tmp/test.sock",
            "--json",
            "{}",
            "--file",
            "payload.json",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn send_requires_a_payload() {
        let err = Cli::try_parse_from(["stellar-link", "send", "/tmp/test.sock"])
            .expect_err("payload is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn once_conflicts_with_count() {
        let err = Cli::try_parse_from(["stellar-link", "listen", "--once", "--count", "2"])
            .expect_err("--once and --count conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn global_format_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stellar-link",
            "listen",
            "/tmp/test.sock",
            "--format",
            "json",
            "--framing",
            "lines",
        ])
        .expect("global flags should parse after the subcommand");
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
