use std::fs;

use bytes::Bytes;
use relaywire_frame::{Frame, FrameConfig};
use relaywire_relay::Relay;

use crate::cmd::SendArgs;
use crate::exit::{io_error, relay_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, config: FrameConfig, format: OutputFormat) -> CliResult<i32> {
    let body = resolve_body(&args)?;
    let peer = args.endpoint.to_string();

    let mut relay = Relay::with_config(args.endpoint, config)
        .map_err(|err| relay_error("invalid configuration", err))?;
    relay
        .connect()
        .map_err(|err| relay_error("connect failed", err))?;

    relay
        .send(&Frame::new(args.flags, body))
        .map_err(|err| relay_error("send failed", err))?;
    tracing::debug!(endpoint = %peer, flags = args.flags, "frame sent");

    let mut code = SUCCESS;
    if args.wait {
        let reply = relay
            .wait_frame()
            .map_err(|err| relay_error("receive failed", err))?;
        print_frame(&reply, &peer, format);
        code = reply_code(&reply);
    }

    relay
        .close()
        .map_err(|err| relay_error("close failed", err))?;
    Ok(code)
}

fn resolve_body(args: &SendArgs) -> CliResult<Bytes> {
    if let Some(data) = &args.data {
        return Ok(Bytes::copy_from_slice(data.as_bytes()));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map(Bytes::from)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Bytes::new())
}

/// A reply carrying the error flag fails the command.
fn reply_code(reply: &Frame) -> i32 {
    if reply.is_error() {
        FAILURE
    } else {
        SUCCESS
    }
}
