//! strstream CLI
//!
//! Replays a file over a simulated serial line at a fixed baud rate.

mod config;
mod replay;

use anyhow::{Context, Result};
use clap::Parser;
use config::ReplayConfig;
use log::{debug, info};
use replay::{ByteWriter, OutputMode};
use std::io;
use std::path::PathBuf;
use strstream_core::{BoundedString, StringStream};

/// Send a file over a simulated serial line
#[derive(Parser, Debug)]
#[command(name = "strstream")]
#[command(version)]
#[command(about = "Replay a file at a simulated baud rate", long_about = None)]
struct Args {
    /// File whose contents are sent over the line
    input: PathBuf,

    /// Baud rate (0 sends everything at once)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Data bits per character (5-8)
    #[arg(long)]
    data_bits: Option<u8>,

    /// Parity (none, even, odd)
    #[arg(long)]
    parity: Option<String>,

    /// Stop bits (1 or 2)
    #[arg(long)]
    stop_bits: Option<u8>,

    /// Print bytes as hex lines instead of raw
    #[arg(long)]
    hex: bool,

    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply(&self, config: &mut ReplayConfig) {
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(bits) = self.data_bits {
            config.data_bits = bits;
        }
        if let Some(parity) = &self.parity {
            config.parity = parity.clone();
        }
        if let Some(bits) = self.stop_bits {
            config.stop_bits = bits;
        }
        config.hex |= self.hex;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let mut config = ReplayConfig::resolve(args.config.as_deref())?;
    args.apply(&mut config);
    debug!("{config:?}");

    let pacing = config.pacing().context("invalid line settings")?;
    let data = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let capacity = config.capacity.unwrap_or(data.len());
    let mut source = BoundedString::new(capacity);
    source
        .extend_from_slice(&data)
        .with_context(|| format!("{} does not fit the source buffer", args.input.display()))?;

    info!(
        "sending {} bytes from {} at {} baud ({} bits per character)",
        data.len(),
        args.input.display(),
        pacing.baud_rate,
        pacing.frame_bits()
    );

    let mut stream = StringStream::new();
    stream.begin_with_config(&mut source, pacing);
    if let Some(us) = stream.micros_per_byte() {
        debug!("{us} us per byte on the line");
    }

    let mode = if config.hex {
        OutputMode::Hex {
            bytes_per_line: config.bytes_per_line,
        }
    } else {
        OutputMode::Raw
    };
    let mut out = ByteWriter::new(io::stdout().lock(), mode);
    let stats = replay::replay(&mut stream, &mut out, std::thread::sleep)?;
    out.finish()?;

    match stats.bytes_per_second() {
        Some(rate) => info!(
            "sent {} bytes in {:.3}s ({rate:.1} bytes/s)",
            stats.bytes,
            stats.elapsed_us as f64 / 1_000_000.0
        ),
        None => info!("sent {} bytes", stats.bytes),
    }

    Ok(())
}
