use crate::{BoundedString, BufferError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Outgoing data a [`StringStream`](crate::StringStream) releases from.
///
/// Implementors hand out bytes in FIFO order.
pub trait ByteSource {
    /// Number of bytes not yet consumed.
    fn unread(&self) -> usize;

    fn front(&self) -> Option<u8>;

    fn pop_front(&mut self) -> Option<u8>;

    /// Whether more bytes may still be appended behind the stream's back.
    fn can_grow(&self) -> bool {
        false
    }
}

impl ByteSource for BoundedString {
    fn unread(&self) -> usize {
        self.len()
    }

    fn front(&self) -> Option<u8> {
        BoundedString::front(self)
    }

    fn pop_front(&mut self) -> Option<u8> {
        BoundedString::pop_front(self)
    }
}

impl ByteSource for VecDeque<u8> {
    fn unread(&self) -> usize {
        self.len()
    }

    fn front(&self) -> Option<u8> {
        VecDeque::front(self).copied()
    }

    fn pop_front(&mut self) -> Option<u8> {
        VecDeque::pop_front(self)
    }
}

/// A [`BoundedString`] that can be appended to while a stream drains it.
///
/// Clones share the same buffer: bind one clone to the stream and keep
/// feeding data through another.
#[derive(Debug, Clone)]
pub struct SharedSource {
    inner: Arc<Mutex<BoundedString>>,
}

impl SharedSource {
    pub fn new(capacity: usize) -> Self {
        Self::from(BoundedString::new(capacity))
    }

    pub fn push_str(&self, s: &str) -> Result<(), BufferError> {
        self.inner.lock().push_str(s)
    }

    pub fn extend_from_slice(&self, bytes: &[u8]) -> Result<(), BufferError> {
        self.inner.lock().extend_from_slice(bytes)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.inner.lock().remaining()
    }
}

impl From<BoundedString> for SharedSource {
    fn from(buf: BoundedString) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buf)),
        }
    }
}

impl ByteSource for SharedSource {
    fn unread(&self) -> usize {
        self.inner.lock().len()
    }

    fn front(&self) -> Option<u8> {
        self.inner.lock().front()
    }

    fn pop_front(&mut self) -> Option<u8> {
        self.inner.lock().pop_front()
    }

    /// True while another handle to the buffer is alive.
    fn can_grow(&self) -> bool {
        Arc::strong_count(&self.inner) > 1
    }
}
