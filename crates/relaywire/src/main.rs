mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use relaywire_frame::{FrameConfig, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_BODY};

use crate::cmd::Command;
use crate::exit::{CliError, CliResult, USAGE};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "relaywire", version, about = "Length-prefixed frame relay CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Largest single read request while receiving a body, in bytes.
    #[arg(
        long,
        value_name = "BYTES",
        env = "RELAYWIRE_BUFFER_SIZE",
        default_value_t = DEFAULT_BUFFER_SIZE,
        global = true
    )]
    buffer_size: usize,

    /// Largest frame body accepted or sent, in bytes.
    #[arg(
        long,
        value_name = "BYTES",
        env = "RELAYWIRE_MAX_BODY_SIZE",
        default_value_t = DEFAULT_MAX_BODY,
        global = true
    )]
    max_body_size: usize,

    /// Socket read/write timeout (e.g. 5s, 500ms). Default: block forever.
    #[arg(long, value_name = "DURATION", env = "RELAYWIRE_TIMEOUT", global = true)]
    timeout: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn frame_config(&self) -> CliResult<FrameConfig> {
        if self.buffer_size == 0 {
            return Err(CliError::new(USAGE, "--buffer-size must be greater than zero"));
        }

        let timeout = self
            .timeout
            .as_deref()
            .map(cmd::parse_duration)
            .transpose()?;

        Ok(FrameConfig {
            max_body_size: self.max_body_size,
            buffer_size: self.buffer_size,
            read_timeout: timeout,
            write_timeout: timeout,
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cli
        .frame_config()
        .and_then(|config| cmd::run(cli.command, config, format));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
