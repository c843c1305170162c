use crate::rxbuf::RxSink;
use crate::{BoundedString, ByteSource, Clock, Pacer, PacingConfig, SystemClock};
use log::{debug, trace};
use std::cell::Cell;
use std::io;

/// Generic single-byte stream, in the shape serial drivers usually expose.
///
/// Nothing blocks and nothing fails loudly: a full receive side reports 0
/// bytes written, an empty or not-yet-released transmit side reports `None`.
pub trait ByteStream {
    /// Queues one byte, returning how many bytes were accepted (0 or 1).
    fn write(&mut self, byte: u8) -> usize;

    /// Bytes that can be read right now.
    fn available(&self) -> usize;

    fn read(&mut self) -> Option<u8>;

    fn peek(&self) -> Option<u8>;

    /// Bytes that can be written right now without being dropped.
    fn available_for_write(&self) -> usize;

    fn flush(&mut self) {}
}

/// A serial-like stream that releases the contents of a caller-owned buffer
/// no faster than a simulated baud rate.
///
/// The source buffer is borrowed for `'a`: it must outlive the bound session,
/// and it can be swapped for another one with [`begin`](Self::begin) at any
/// time. Bytes written to the stream land in a small receive buffer (8 bytes
/// unless a custom one was supplied) which the application drains itself.
///
/// Pacing is polled, not timed: every call to [`available`](Self::available)
/// or [`read`](Self::read) works out from `C`'s current time how many bytes the
/// line would have delivered. The first byte becomes readable one byte-time
/// after binding. Those polls update the pacing state in place, so a stream
/// is not `Sync`.
pub struct StringStream<'a, S: ByteSource + ?Sized = BoundedString, C: Clock = SystemClock> {
    source: Option<&'a mut S>,
    rx: RxSink<'a>,
    config: PacingConfig,
    pacer: Cell<Pacer>,
    clock: C,
}

impl<'a, S: ByteSource + ?Sized> StringStream<'a, S, SystemClock> {
    /// An unbound stream on the system clock; it reads as empty until
    /// [`begin`](Self::begin) is called.
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }

    /// A stream bound to `source` with pacing disabled.
    pub fn with_source(source: &'a mut S) -> Self {
        let mut stream = Self::new();
        stream.begin(source, 0);
        stream
    }

    /// Like [`with_source`](Self::with_source), collecting written bytes in
    /// `rx` instead of the internal buffer.
    pub fn with_source_and_rx(source: &'a mut S, rx: &'a mut BoundedString) -> Self {
        Self::with_source(source).with_rx_buffer(rx)
    }
}

impl<'a, S: ByteSource + ?Sized> Default for StringStream<'a, S, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S: ByteSource + ?Sized, C: Clock> StringStream<'a, S, C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            source: None,
            rx: RxSink::internal(),
            config: PacingConfig::default(),
            pacer: Cell::new(Pacer::unlimited()),
            clock,
        }
    }

    /// Replaces the receive buffer with `rx`, which is cleared first.
    pub fn with_rx_buffer(mut self, rx: &'a mut BoundedString) -> Self {
        self.rx = RxSink::external(rx);
        self
    }

    /// Binds `source` and starts releasing it at `baud_rate` (8N1 framing).
    /// A rate of 0 makes every byte available at once. The receive buffer is
    /// emptied.
    pub fn begin(&mut self, source: &'a mut S, baud_rate: u32) {
        self.begin_with_config(source, PacingConfig::with_baud(baud_rate));
    }

    pub fn begin_with_config(&mut self, source: &'a mut S, config: PacingConfig) {
        debug!(
            "{} source: {} bytes pending, {} baud",
            if self.source.is_some() { "rebinding" } else { "binding" },
            source.unread(),
            config.baud_rate
        );
        self.source = Some(source);
        self.restart_with_config(config);
    }

    /// Restarts pacing at `baud_rate` on the source already bound, keeping
    /// the current framing. Like [`begin`](Self::begin), this empties the
    /// receive buffer.
    pub fn restart(&mut self, baud_rate: u32) {
        self.restart_with_config(PacingConfig {
            baud_rate,
            ..self.config
        });
    }

    fn restart_with_config(&mut self, config: PacingConfig) {
        let now = self.clock.now_micros();
        debug!("pacing restarted at {} baud", config.baud_rate);
        let mut pacer = self.pacer.get();
        pacer.reset(&config, now, self.pending());
        self.pacer.set(pacer);
        self.config = config;
        self.rx.clear();
    }

    /// Detaches the source and hands the borrow back.
    pub fn unbind(&mut self) -> Option<&'a mut S> {
        let source = self.source.take();
        if source.is_some() {
            debug!("source unbound");
        }
        source
    }

    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    pub fn baud_rate(&self) -> u32 {
        self.pacer.get().baud_rate()
    }

    /// Time one byte occupies the line, `None` when unpaced.
    pub fn micros_per_byte(&self) -> Option<u64> {
        self.pacer.get().micros_per_byte()
    }

    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable access to the bound source, e.g. to append more data.
    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_deref_mut()
    }

    /// Unread bytes left in the source, released or not.
    pub fn pending(&self) -> usize {
        self.source.as_deref().map_or(0, |s| s.unread())
    }

    pub fn available(&self) -> usize {
        let Some(source) = self.source.as_deref() else {
            return 0;
        };
        let mut pacer = self.pacer.get();
        let n = pacer.sync(self.clock.now_micros(), source.unread());
        self.pacer.set(pacer);
        n
    }

    fn on_release(&self) {
        let mut pacer = self.pacer.get();
        pacer.on_release();
        self.pacer.set(pacer);
    }

    pub fn read(&mut self) -> Option<u8> {
        if self.available() == 0 {
            return None;
        }
        let byte = self.source.as_deref_mut()?.pop_front()?;
        self.on_release();
        Some(byte)
    }

    /// Reads as many released bytes as fit in `buf`.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let n = self.available().min(buf.len());
        let mut read = 0;
        for slot in &mut buf[..n] {
            match self.source.as_deref_mut().and_then(|s| s.pop_front()) {
                Some(byte) => {
                    *slot = byte;
                    self.on_release();
                    read += 1;
                }
                None => break,
            }
        }
        read
    }

    pub fn peek(&self) -> Option<u8> {
        if self.available() == 0 {
            return None;
        }
        self.source.as_deref()?.front()
    }

    /// Microseconds until pacing releases another byte. `None` when unbound,
    /// unpaced, or when every pending byte is already released.
    pub fn micros_until_next(&self) -> Option<u64> {
        if self.available() >= self.pending() {
            return None;
        }
        self.pacer.get().micros_until_next(self.clock.now_micros())
    }

    pub fn write(&mut self, byte: u8) -> usize {
        usize::from(self.push_rx(byte))
    }

    fn push_rx(&mut self, byte: u8) -> bool {
        match self.rx.push(byte) {
            Ok(()) => true,
            Err(err) => {
                trace!("rx byte {byte:#04x} rejected: {err}");
                false
            }
        }
    }

    pub fn available_for_write(&self) -> usize {
        self.rx.remaining()
    }

    /// Size of the receive buffer when empty.
    pub fn rx_capacity(&self) -> usize {
        self.rx.capacity()
    }

    pub fn flush(&mut self) {}

    /// Bytes sitting in the receive buffer.
    pub fn received_len(&self) -> usize {
        self.rx.len()
    }

    /// Drains the receive buffer.
    pub fn take_received(&mut self) -> Vec<u8> {
        self.rx.take()
    }

    pub fn clear_received(&mut self) {
        self.rx.clear();
    }
}

impl<'a, S: ByteSource + ?Sized, C: Clock> ByteStream for StringStream<'a, S, C> {
    fn write(&mut self, byte: u8) -> usize {
        StringStream::write(self, byte)
    }

    fn available(&self) -> usize {
        StringStream::available(self)
    }

    fn read(&mut self) -> Option<u8> {
        StringStream::read(self)
    }

    fn peek(&self) -> Option<u8> {
        StringStream::peek(self)
    }

    fn available_for_write(&self) -> usize {
        StringStream::available_for_write(self)
    }
}

impl<'a, S: ByteSource + ?Sized, C: Clock> io::Read for StringStream<'a, S, C> {
    /// `Ok(0)` means the source is unbound, or exhausted and unable to grow.
    /// `WouldBlock` means bytes are pending but none has been released yet,
    /// or the source is empty but a producer may still append to it.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pending() == 0 {
            return match self.source.as_deref() {
                Some(source) if source.can_grow() => Err(io::ErrorKind::WouldBlock.into()),
                _ => Ok(0),
            };
        }
        match self.read_bytes(buf) {
            0 => Err(io::ErrorKind::WouldBlock.into()),
            n => Ok(n),
        }
    }
}

impl<'a, S: ByteSource + ?Sized, C: Clock> io::Write for StringStream<'a, S, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut written = 0;
        for &byte in buf {
            if !self.push_rx(byte) {
                break;
            }
            written += 1;
        }
        if written == 0 {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockClock;

    fn paced<'a>(clock: &MockClock) -> StringStream<'a, BoundedString, MockClock> {
        StringStream::with_clock(clock.clone())
    }

    #[test]
    fn test_unbound_reads_as_empty() {
        let mut stream: StringStream<'_> = StringStream::new();
        assert!(!stream.is_bound());
        assert_eq!(stream.available(), 0);
        assert_eq!(stream.pending(), 0);
        assert_eq!(stream.read(), None);
        assert_eq!(stream.peek(), None);
        assert_eq!(stream.micros_until_next(), None);
    }

    #[test]
    fn test_unbound_still_accepts_writes() {
        let mut stream: StringStream<'_> = StringStream::new();
        assert_eq!(stream.write(b'x'), 1);
        assert_eq!(stream.available_for_write(), 7);
        assert_eq!(stream.take_received(), b"x".to_vec());
    }

    #[test]
    fn test_read_advances_pacing_reference() {
        let clock = MockClock::new();
        let mut src = BoundedString::from_str_with_capacity("0123456789", 16).unwrap();
        let mut stream = StringStream::with_clock(clock.clone());
        stream.begin(&mut src, 10_000);

        clock.advance(2_500);
        assert_eq!(stream.read(), Some(b'0'));
        assert_eq!(stream.available(), 1);
        assert_eq!(stream.micros_until_next(), Some(500));
        clock.advance(500);
        assert_eq!(stream.available(), 2);
    }

    #[test]
    fn test_peek_does_not_consume_or_pace() {
        let clock = MockClock::new();
        let mut src = BoundedString::from_str_with_capacity("xy", 4).unwrap();
        let mut stream = paced(&clock);
        stream.begin(&mut src, 10_000);

        assert_eq!(stream.peek(), None);
        clock.advance(1_000);
        assert_eq!(stream.peek(), Some(b'x'));
        assert_eq!(stream.peek(), Some(b'x'));
        assert_eq!(stream.available(), 1);
        assert_eq!(stream.read(), Some(b'x'));
    }

    #[test]
    fn test_restart_keeps_source_and_resets_clock() {
        let clock = MockClock::new();
        let mut src = BoundedString::from_str_with_capacity("abcd", 4).unwrap();
        let mut stream = paced(&clock);
        stream.begin(&mut src, 10_000);
        clock.advance(10_000);
        assert_eq!(stream.available(), 4);

        stream.restart(5_000);
        assert_eq!(stream.baud_rate(), 5_000);
        assert_eq!(stream.available(), 0);
        clock.advance(2_000);
        assert_eq!(stream.available(), 1);
    }

    #[test]
    fn test_unbind_returns_source() {
        let mut src = BoundedString::from_str_with_capacity("q", 1).unwrap();
        let mut stream = StringStream::with_source(&mut src);
        assert_eq!(stream.read(), Some(b'q'));
        let back = stream.unbind().unwrap();
        assert!(back.is_empty());
        assert!(!stream.is_bound());
        assert_eq!(stream.available(), 0);
    }
}
