use std::sync::atomic::Ordering;

use relaywire_frame::{Frame, FrameConfig, FrameError};
use relaywire_relay::{RelayError, RelayListener};

use crate::cmd::{install_ctrlc_handler, EchoArgs};
use crate::exit::{relay_error, CliResult, SUCCESS};
use crate::output::flag_names;

/// What to do with a session after a failed receive.
enum RecvErrorDisposition {
    /// The peer hung up between frames.
    Close,
    /// Tell the peer why, then drop the connection.
    Reject(Frame),
    /// Drop the connection without a reply.
    Drop,
}

pub fn run(args: EchoArgs, config: FrameConfig) -> CliResult<i32> {
    let listener = RelayListener::bind_with_config(&args.endpoint, config)
        .map_err(|err| relay_error("bind failed", err))?;
    tracing::info!(
        endpoint = %args.endpoint,
        transport = listener.transport_name(),
        "echo server listening"
    );

    let running = install_ctrlc_handler()?;

    while running.load(Ordering::SeqCst) {
        let mut session = listener
            .accept()
            .map_err(|err| relay_error("accept failed", err))?;
        tracing::info!(peer = session.peer(), "peer connected");

        while running.load(Ordering::SeqCst) {
            let frame = match session.recv() {
                Ok(frame) => frame,
                Err(err) => {
                    match classify_recv_error(&err) {
                        RecvErrorDisposition::Close => {
                            tracing::info!(peer = session.peer(), "peer disconnected");
                        }
                        RecvErrorDisposition::Reject(reply) => {
                            tracing::warn!(peer = session.peer(), error = %err, "rejecting peer");
                            if let Err(send_err) = session.send(&reply) {
                                tracing::warn!(error = %send_err, "failed sending error reply");
                            }
                        }
                        RecvErrorDisposition::Drop => {
                            tracing::warn!(peer = session.peer(), error = %err, "dropping peer");
                        }
                    }
                    break;
                }
            };

            tracing::info!(
                flags = frame.flags,
                flag_names = %flag_names(frame.flags),
                size = frame.body.len(),
                "echoing frame"
            );

            if let Err(err) = session.send(&frame) {
                tracing::warn!(peer = session.peer(), error = %err, "echo send failed");
                break;
            }
        }
    }

    Ok(SUCCESS)
}

/// One bad peer ends its own session; the server keeps accepting.
fn classify_recv_error(err: &RelayError) -> RecvErrorDisposition {
    match err {
        RelayError::Disconnected => RecvErrorDisposition::Close,
        RelayError::Prefix(
            frame_err @ (FrameError::InvalidPrefix { .. } | FrameError::BodyTooLarge { .. }),
        ) => RecvErrorDisposition::Reject(Frame::error(frame_err.to_string())),
        _ => RecvErrorDisposition::Drop,
    }
}
