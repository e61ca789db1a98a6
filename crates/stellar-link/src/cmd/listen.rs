use std::num::NonZeroUsize;
use std::sync::Arc;

use stellar_link_listener::{ListenMode, Listener, ListenerConfig, ShutdownHandle};
use tracing::{debug, info};

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{listener_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{CliReporter, OutputFormat};

pub async fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = listener_config(&args)?;
    let limited = config.mode.limit().is_some();

    let listener =
        Listener::start(&args.path, config).map_err(|err| listener_error("bind failed", err))?;
    install_ctrlc_handler(listener.shutdown_handle());

    let summary = listener
        .run(Arc::new(CliReporter::stdout(format)))
        .await
        .map_err(|err| listener_error("listen failed", err))?;

    info!(
        connections = summary.connections,
        messages = summary.messages,
        failed = summary.failed_connections,
        "done"
    );

    if limited && summary.failed_connections > 0 {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

fn listener_config(args: &ListenArgs) -> CliResult<ListenerConfig> {
    let mode = match (args.once, args.count) {
        (true, _) => ListenMode::once(),
        (false, Some(count)) => NonZeroUsize::new(count)
            .map(ListenMode::Limit)
            .ok_or_else(|| CliError::new(USAGE, "--count must be greater than zero"))?,
        (false, None) => ListenMode::Persistent,
    };

    if args.max_size == 0 {
        return Err(CliError::new(USAGE, "--max-size must be greater than zero"));
    }

    Ok(ListenerConfig {
        socket_mode: parse_mode(&args.mode)?,
        max_message_size: args.max_size,
        read_timeout: args.read_timeout.as_deref().map(parse_duration).transpose()?,
        framing: args.framing.into(),
        mode,
    })
}

fn parse_mode(input: &str) -> CliResult<u32> {
    let digits = input.trim().trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| CliError::new(USAGE, format!("invalid octal mode: {input}")))?;
    if mode > 0o777 {
        return Err(CliError::new(USAGE, format!("mode out of range: {input}")));
    }
    Ok(mode)
}

fn install_ctrlc_handler(shutdown: ShutdownHandle) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                debug!("interrupt received");
                shutdown.shutdown();
            }
            Err(err) => debug!(error = %err, "signal handler unavailable"),
        }
    });
}
