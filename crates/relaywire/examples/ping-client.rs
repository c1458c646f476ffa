//! Sends a few frames to an echo peer and checks what comes back.
//!
//! Run with:
//!   cargo run --example ping-client -- 127.0.0.1:7700

use std::time::Instant;

use relaywire::{flags, Endpoint, Frame, Relay};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint: Endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7700".to_string())
        .parse()?;

    let mut relay = Relay::new(endpoint);
    relay.connect()?;

    let requests = [
        Frame::new(0, "ping"),
        Frame::new(flags::EMPTY, ""),
        Frame::new(0, vec![0xA5u8; 1 << 20]),
    ];

    for request in &requests {
        let started = Instant::now();
        relay.send(request)?;
        let reply = relay.wait_frame()?;
        println!(
            "{} bytes, flags {:#04x}, round trip {:?}",
            reply.body.len(),
            reply.flags,
            started.elapsed()
        );
        if &reply != request {
            return Err("echo mismatch".into());
        }
    }

    relay.close()?;
    Ok(())
}
