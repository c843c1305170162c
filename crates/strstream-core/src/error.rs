use thiserror::Error;

/// Errors raised by the bounded buffers when data does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("buffer full ({capacity} bytes)")]
    Full { capacity: usize },

    #[error("cannot append {requested} bytes: {remaining} of {capacity} free")]
    Overflow {
        requested: usize,
        remaining: usize,
        capacity: usize,
    },
}

/// Errors raised while building a [`PacingConfig`](crate::PacingConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported data bits: {0} (expected 5..=8)")]
    DataBits(u8),

    #[error("unsupported stop bits: {0} (expected 1 or 2)")]
    StopBits(u8),

    #[error("unknown parity: {0:?} (expected none, even or odd)")]
    Parity(String),
}
