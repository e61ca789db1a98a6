use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use stellar_link_message::Framing;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Listen for messages and report their current position.
    Listen(ListenArgs),
    /// Send a single message to a listener.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format).await,
        Command::Send(args) => send::run(args).await,
        Command::Version(args) => version::run(args),
    }
}

/// Message boundaries on the wire.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FramingArg {
    /// One message per connection, ended by the sender closing its side.
    #[default]
    Eof,
    /// Newline-delimited JSON, any number of messages per connection.
    Lines,
}

impl From<FramingArg> for Framing {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Eof => Framing::Eof,
            FramingArg::Lines => Framing::Lines,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    #[arg(env = "STELLAR_LINK_SOCKET", default_value = stellar_link_transport::DEFAULT_SOCKET_PATH)]
    pub path: PathBuf,
    /// Exit after serving one connection.
    #[arg(long, conflicts_with = "count")]
    pub once: bool,
    /// Exit after serving N connections.
    #[arg(long)]
    pub count: Option<usize>,
    /// Message framing.
    #[arg(long, value_enum, default_value_t = FramingArg::Eof)]
    pub framing: FramingArg,
    /// Maximum message size in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = stellar_link_message::DEFAULT_MAX_MESSAGE_SIZE)]
    pub max_size: usize,
    /// Per-message read timeout (e.g. 5s, 500ms).
    #[arg(long, value_name = "DUR")]
    pub read_timeout: Option<String>,
    /// Socket file permissions, octal.
    #[arg(long, value_name = "OCTAL", default_value = "600")]
    pub mode: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    #[arg(env = "STELLAR_LINK_SOCKET", default_value = stellar_link_transport::DEFAULT_SOCKET_PATH)]
    pub path: PathBuf,
    /// JSON object payload.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub json: Option<String>,
    /// Read the JSON object payload from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Message framing.
    #[arg(long, value_enum, default_value_t = FramingArg::Eof)]
    pub framing: FramingArg,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<std::time::Duration> {
    use std::time::Duration;

    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
