use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use relaywire_frame::{flags, Frame};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    flags: u8,
    flag_names: String,
    size: usize,
    body: String,
    peer: &'a str,
    timestamp: String,
}

pub fn print_frame(frame: &Frame, peer: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                flags: frame.flags,
                flag_names: flag_names(frame.flags),
                size: frame.body.len(),
                body: body_preview(frame.body.as_ref()),
                peer,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FLAGS", "SIZE", "PEER", "BODY"])
                .add_row(vec![
                    format!("{:#04x} {}", frame.flags, flag_names(frame.flags)),
                    frame.body.len().to_string(),
                    peer.to_string(),
                    body_preview(frame.body.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "flags={:#04x} ({}) size={} peer={} body={}",
                frame.flags,
                flag_names(frame.flags),
                frame.body.len(),
                peer,
                body_preview(frame.body.as_ref())
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.body.as_ref());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Names of the conventional flag bits that are set, joined with `|`.
///
/// Unnamed bits are shown as `0x..`; no flags at all is `-`.
pub fn flag_names(value: u8) -> String {
    const NAMED: [(u8, &str); 3] = [
        (flags::ERROR, "ERROR"),
        (flags::EMPTY, "EMPTY"),
        (flags::COMPRESSED, "COMPRESSED"),
    ];

    let mut names: Vec<String> = NAMED
        .iter()
        .filter(|(bit, _)| flags::has_flag(value, *bit))
        .map(|(_, name)| name.to_string())
        .collect();

    let known = NAMED.iter().fold(0u8, |acc, (bit, _)| acc | bit);
    let rest = value & !known;
    if rest != 0 {
        names.push(format!("{rest:#04x}"));
    }

    if names.is_empty() {
        "-".to_string()
    } else {
        names.join("|")
    }
}

fn body_preview(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", body.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
