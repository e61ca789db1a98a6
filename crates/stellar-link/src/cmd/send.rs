use std::fs;

use stellar_link_listener::send_message;
use stellar_link_message::Message;
use tracing::warn;

use crate::cmd::SendArgs;
use crate::exit::{
    io_error, listener_error, message_error, CliError, CliResult, FAILURE, SUCCESS, USAGE,
};

pub async fn run(args: SendArgs) -> CliResult<i32> {
    let message = resolve_message(&args)?;

    let delivered = send_message(&args.path, &message, args.framing.into())
        .await
        .map_err(|err| listener_error("send failed", err))?;

    if !delivered {
        warn!(path = ?args.path, "nobody is listening");
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

fn resolve_message(args: &SendArgs) -> CliResult<Message> {
    let raw = match (&args.json, &args.file) {
        (Some(json), _) => json.as_bytes().to_vec(),
        (None, Some(path)) => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        (None, None) => {
            return Err(CliError::new(USAGE, "one of --json or --file is required"));
        }
    };
    Message::decode(&raw).map_err(|err| message_error("invalid payload", err))
}
