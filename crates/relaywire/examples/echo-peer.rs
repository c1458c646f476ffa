//! Minimal echo peer: accepts connections and echoes every frame back.
//!
//! Run with:
//!   cargo run --example echo-peer -- 127.0.0.1:7700
//!
//! In another terminal:
//!   cargo run --example ping-client -- 127.0.0.1:7700

use relaywire::{Endpoint, RelayError, RelayListener};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint: Endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7700".to_string())
        .parse()?;

    let listener = RelayListener::bind(&endpoint)?;
    eprintln!("Listening on {}", listener.local_endpoint()?);

    loop {
        let mut session = listener.accept()?;
        eprintln!("Peer connected: {}", session.peer());

        loop {
            match session.recv() {
                Ok(frame) => {
                    eprintln!(
                        "Received {} bytes with flags {:#04x}",
                        frame.body.len(),
                        frame.flags
                    );
                    session.send(&frame)?;
                }
                Err(RelayError::Disconnected) => {
                    eprintln!("Peer disconnected");
                    break;
                }
                Err(e) => {
                    eprintln!("Dropping peer: {e}");
                    break;
                }
            }
        }
    }
}
