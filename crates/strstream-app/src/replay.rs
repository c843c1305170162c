use std::io::{self, Write};
use std::time::Duration;
use strstream_core::{ByteSource, Clock, StringStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Raw,
    Hex { bytes_per_line: usize },
}

/// Writes released bytes either verbatim or as lines of hex.
pub struct ByteWriter<W: Write> {
    out: W,
    mode: OutputMode,
    line: Vec<u8>,
}

impl<W: Write> ByteWriter<W> {
    pub fn new(out: W, mode: OutputMode) -> Self {
        Self {
            out,
            mode,
            line: Vec::new(),
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.mode {
            OutputMode::Raw => self.out.write_all(bytes)?,
            OutputMode::Hex { bytes_per_line } => {
                let per_line = bytes_per_line.max(1);
                for &byte in bytes {
                    self.line.push(byte);
                    if self.line.len() == per_line {
                        self.emit_line()?;
                    }
                }
            }
        }
        self.out.flush()
    }

    fn emit_line(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", hex::encode(&self.line))?;
        self.line.clear();
        Ok(())
    }

    /// Writes out any partial hex line and returns the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.line.is_empty() {
            self.emit_line()?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub bytes: usize,
    pub elapsed_us: u64,
}

impl ReplayStats {
    pub fn bytes_per_second(&self) -> Option<f64> {
        if self.elapsed_us == 0 {
            return None;
        }
        Some(self.bytes as f64 * 1_000_000.0 / self.elapsed_us as f64)
    }
}

/// Polls `stream` until its source is drained, forwarding every released
/// byte to `out` and calling `sleep` while waiting on the line.
pub fn replay<S, C, W, F>(
    stream: &mut StringStream<'_, S, C>,
    out: &mut ByteWriter<W>,
    mut sleep: F,
) -> io::Result<ReplayStats>
where
    S: ByteSource + ?Sized,
    C: Clock,
    W: Write,
    F: FnMut(Duration),
{
    let start = stream.clock().now_micros();
    let mut chunk = [0u8; 64];
    let mut bytes = 0;

    while stream.pending() > 0 {
        let n = stream.read_bytes(&mut chunk);
        if n > 0 {
            out.write_bytes(&chunk[..n])?;
            bytes += n;
            continue;
        }
        if let Some(us) = stream.micros_until_next() {
            sleep(Duration::from_micros(us));
        }
    }

    Ok(ReplayStats {
        bytes,
        elapsed_us: stream.clock().now_micros().saturating_sub(start),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strstream_core::{BoundedString, MockClock};

    #[test]
    fn test_replay_raw_takes_line_time() {
        let clock = MockClock::new();
        let mut src = BoundedString::from_str_with_capacity("hello", 5).unwrap();
        let mut stream = StringStream::with_clock(clock.clone());
        stream.begin(&mut src, 10_000);

        let mut out = ByteWriter::new(Vec::new(), OutputMode::Raw);
        let sleeper = clock.clone();
        let stats = replay(&mut stream, &mut out, |d| {
            sleeper.advance(d.as_micros() as u64)
        })
        .unwrap();

        assert_eq!(out.finish().unwrap(), b"hello".to_vec());
        assert_eq!(stats.bytes, 5);
        assert_eq!(stats.elapsed_us, 5_000);
        assert_eq!(stats.bytes_per_second(), Some(1_000.0));
    }

    #[test]
    fn test_replay_unpaced_never_sleeps() {
        let mut src = BoundedString::from_str_with_capacity("abc", 3).unwrap();
        let mut stream = StringStream::with_clock(MockClock::new());
        stream.begin(&mut src, 0);

        let mut out = ByteWriter::new(Vec::new(), OutputMode::Raw);
        let stats = replay(&mut stream, &mut out, |_| panic!("slept")).unwrap();
        assert_eq!(stats.bytes, 3);
        assert_eq!(stats.bytes_per_second(), None);
    }

    #[test]
    fn test_hex_lines() {
        let mut out = ByteWriter::new(Vec::new(), OutputMode::Hex { bytes_per_line: 2 });
        out.write_bytes(&[0xde, 0xad, 0xbe]).unwrap();
        out.write_bytes(&[0xef, 0x01]).unwrap();
        let text = String::from_utf8(out.finish().unwrap()).unwrap();
        assert_eq!(text, "dead\nbeef\n01\n");
    }
}
