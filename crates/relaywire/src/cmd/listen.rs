use std::sync::atomic::Ordering;

use relaywire_frame::FrameConfig;
use relaywire_relay::{RelayError, RelayListener};

use crate::cmd::{install_ctrlc_handler, ListenArgs};
use crate::exit::{relay_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ListenArgs, config: FrameConfig, format: OutputFormat) -> CliResult<i32> {
    let listener = RelayListener::bind_with_config(&args.endpoint, config)
        .map_err(|err| relay_error("bind failed", err))?;
    tracing::info!(endpoint = %args.endpoint, "listening");

    let running = install_ctrlc_handler()?;
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut session = listener
            .accept()
            .map_err(|err| relay_error("accept failed", err))?;

        while running.load(Ordering::SeqCst) {
            let frame = match session.recv() {
                Ok(frame) => frame,
                Err(RelayError::Disconnected) => break,
                Err(err) => return Err(relay_error("receive failed", err)),
            };

            print_frame(&frame, session.peer(), format);
            printed = printed.saturating_add(1);

            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}
