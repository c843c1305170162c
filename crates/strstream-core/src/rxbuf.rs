use crate::{BoundedString, BufferError};

/// Capacity of the receive buffer a stream allocates for itself.
pub const RX_CAPACITY: usize = 8;

/// Fixed-size receive buffer holding at most `N` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> RxBuffer<N> {
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    pub fn push(&mut self, byte: u8) -> Result<(), BufferError> {
        if self.len == N {
            return Err(BufferError::Full { capacity: N });
        }
        self.buf[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn remaining(&self) -> usize {
        N - self.len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Returns the buffered bytes and empties the buffer.
    pub fn take(&mut self) -> Vec<u8> {
        let out = self.as_bytes().to_vec();
        self.len = 0;
        out
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<const N: usize> Default for RxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Where bytes written to a stream end up.
#[derive(Debug)]
pub enum RxSink<'a> {
    Internal(RxBuffer<RX_CAPACITY>),
    External(&'a mut BoundedString),
}

impl<'a> RxSink<'a> {
    pub fn internal() -> Self {
        RxSink::Internal(RxBuffer::new())
    }

    /// Uses `buf` as the receive buffer. Its previous contents are discarded.
    pub fn external(buf: &'a mut BoundedString) -> Self {
        buf.clear();
        RxSink::External(buf)
    }

    pub fn push(&mut self, byte: u8) -> Result<(), BufferError> {
        match self {
            RxSink::Internal(rx) => rx.push(byte),
            RxSink::External(rx) => rx.push(byte),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RxSink::Internal(rx) => rx.len(),
            RxSink::External(rx) => rx.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match self {
            RxSink::Internal(rx) => rx.capacity(),
            RxSink::External(rx) => rx.capacity(),
        }
    }

    pub fn remaining(&self) -> usize {
        match self {
            RxSink::Internal(rx) => rx.remaining(),
            RxSink::External(rx) => rx.remaining(),
        }
    }

    pub fn take(&mut self) -> Vec<u8> {
        match self {
            RxSink::Internal(rx) => rx.take(),
            RxSink::External(rx) => rx.drain_all(),
        }
    }

    pub fn clear(&mut self) {
        match self {
            RxSink::Internal(rx) => rx.clear(),
            RxSink::External(rx) => rx.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rx_buffer_rejects_overflow() {
        let mut rx = RxBuffer::<3>::new();
        for b in b"abc" {
            rx.push(*b).unwrap();
        }
        assert_eq!(rx.push(b'd'), Err(BufferError::Full { capacity: 3 }));
        assert_eq!(rx.as_bytes(), b"abc");
        assert_eq!(rx.remaining(), 0);
        assert_eq!(rx.capacity(), 3);
    }

    #[test]
    fn test_rx_buffer_take_resets() {
        let mut rx = RxBuffer::<4>::new();
        rx.push(1).unwrap();
        rx.push(2).unwrap();
        assert_eq!(rx.take(), vec![1, 2]);
        assert!(rx.is_empty());
        assert_eq!(rx.remaining(), 4);
    }

    #[test]
    fn test_external_sink_is_cleared_and_bounded() {
        let mut backing = BoundedString::from_str_with_capacity("old", 4).unwrap();
        let mut sink = RxSink::external(&mut backing);
        assert!(sink.is_empty());
        assert_eq!(sink.capacity(), 4);
        assert_eq!(sink.remaining(), 4);
        for b in b"wxyz" {
            sink.push(*b).unwrap();
        }
        assert!(sink.push(b'!').is_err());
        assert_eq!(sink.take(), b"wxyz".to_vec());
    }
}
