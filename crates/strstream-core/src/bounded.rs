use crate::BufferError;
use std::collections::VecDeque;
use std::fmt;

/// A mutable byte string that never grows past the capacity it was created with.
///
/// Appends that would overflow are rejected whole and the contents stay as they
/// were. Bytes are consumed from the front, so the same type can act as a
/// source of outgoing data and as a receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedString {
    data: VecDeque<u8>,
    capacity: usize,
}

impl BoundedString {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn from_str_with_capacity(s: &str, capacity: usize) -> Result<Self, BufferError> {
        let mut buf = Self::new(capacity);
        buf.push_str(s)?;
        Ok(buf)
    }

    pub fn push(&mut self, byte: u8) -> Result<(), BufferError> {
        if self.data.len() >= self.capacity {
            return Err(BufferError::Full {
                capacity: self.capacity,
            });
        }
        self.data.push_back(byte);
        Ok(())
    }

    pub fn push_str(&mut self, s: &str) -> Result<(), BufferError> {
        self.extend_from_slice(s.as_bytes())
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let remaining = self.remaining();
        if bytes.len() > remaining {
            return Err(BufferError::Overflow {
                requested: bytes.len(),
                remaining,
                capacity: self.capacity,
            });
        }
        self.data.extend(bytes.iter().copied());
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<u8> {
        self.data.pop_front()
    }

    pub fn front(&self) -> Option<u8> {
        self.data.front().copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Removes and returns every byte currently held.
    pub fn drain_all(&mut self) -> Vec<u8> {
        self.data.drain(..).collect()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.iter().copied().collect()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.to_vec()).into_owned()
    }
}

impl fmt::Display for BoundedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
