use stellar_link_message::{Framing, DEFAULT_MAX_MESSAGE_SIZE};
use stellar_link_transport::{UnixDomainSocket, DEFAULT_SOCKET_PATH};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("stellar-link {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: stellar-link");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("STELLAR_LINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("default_socket: {DEFAULT_SOCKET_PATH}");
    println!("default_framing: {}", Framing::default().name());
    println!("max_message_size: {DEFAULT_MAX_MESSAGE_SIZE}");
    println!("max_path_len: {}", UnixDomainSocket::MAX_PATH_LEN);

    Ok(SUCCESS)
}
